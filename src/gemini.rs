use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Identity questions answered locally, without a network call.
const IDENTITY_KEYWORDS: &[&str] = &["nama", "siapa kamu", "what is your name", "who are you"];
pub const IDENTITY_REPLY: &str = "Saya adalah TwinkleTalk, asisten AI Anda!";
/// Returned when a response arrives but carries no candidate text.
pub const FALLBACK_REPLY: &str = "TwinkleTalk is here to help!";
/// Returned when the request itself fails.
pub const ERROR_REPLY: &str = "Error occurred in TwinkleTalk";

/// Fixed reply for "who are you"-style questions, if the text matches.
pub fn canned_reply(user_text: &str) -> Option<&'static str> {
    let lower = user_text.to_lowercase();
    IDENTITY_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
        .then_some(IDENTITY_REPLY)
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

// Every level of the response is optional so a missing field falls back
// instead of failing the whole parse.

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Walk `candidates[0].content.parts[0].text`.
fn first_candidate_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates?
        .into_iter()
        .next()?
        .content?
        .parts?
        .into_iter()
        .next()?
        .text
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }

    /// Fetch the assistant reply for one user message.
    ///
    /// Always resolves to a displayable string: canned identity answer,
    /// candidate text, or one of the fixed fallback strings.
    pub async fn reply(&self, user_text: &str) -> String {
        if let Some(reply) = canned_reply(user_text) {
            return reply.to_string();
        }

        let Some(api_key) = &self.api_key else {
            warn!("generative API key not configured");
            return FALLBACK_REPLY.to_string();
        };

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: user_text.to_string(),
                }],
            }],
        };

        let result = self
            .client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await;

        match result {
            Ok(response) => match response.text().await {
                Ok(body) => decode_reply(&body),
                Err(err) => {
                    error!(error = %err, "failed to read generative response");
                    ERROR_REPLY.to_string()
                }
            },
            Err(err) => {
                error!(error = %err, "generative request failed");
                ERROR_REPLY.to_string()
            }
        }
    }
}

/// Turn a response body into a displayable reply: candidate text, the
/// fallback when the shape carries none, or the error string when the
/// body is not valid JSON.
fn decode_reply(body: &str) -> String {
    match serde_json::from_str::<GenerateResponse>(body) {
        Ok(response) => first_candidate_text(response).unwrap_or_else(|| FALLBACK_REPLY.to_string()),
        Err(err) => {
            error!(error = %err, "failed to parse generative response");
            ERROR_REPLY.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_keywords_match_case_insensitively() {
        assert_eq!(canned_reply("siapa kamu"), Some(IDENTITY_REPLY));
        assert_eq!(canned_reply("What Is Your NAME?"), Some(IDENTITY_REPLY));
        assert_eq!(canned_reply("tell me, WHO ARE YOU exactly"), Some(IDENTITY_REPLY));
        assert_eq!(canned_reply("Siapa NAMA kamu?"), Some(IDENTITY_REPLY));
    }

    #[test]
    fn ordinary_questions_are_not_canned() {
        assert_eq!(canned_reply("Hello"), None);
        assert_eq!(canned_reply("what is the weather today"), None);
        assert_eq!(canned_reply(""), None);
    }

    #[test]
    fn full_response_yields_candidate_text() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Hi there!"}, {"text": "ignored"}]}},
                {"content": {"parts": [{"text": "second candidate"}]}}
            ]
        }"#;
        let response: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(first_candidate_text(response), Some("Hi there!".to_string()));
    }

    #[test]
    fn missing_levels_fall_back_to_none() {
        for json in [
            r#"{}"#,
            r#"{"candidates": []}"#,
            r#"{"candidates": [{}]}"#,
            r#"{"candidates": [{"content": {}}]}"#,
            r#"{"candidates": [{"content": {"parts": []}}]}"#,
            r#"{"candidates": [{"content": {"parts": [{}]}}]}"#,
        ] {
            let response: GenerateResponse = serde_json::from_str(json).unwrap();
            assert_eq!(first_candidate_text(response), None, "shape: {json}");
        }
    }

    #[test]
    fn malformed_body_decodes_to_error_reply() {
        assert_eq!(decode_reply("not json"), ERROR_REPLY);
        assert_eq!(decode_reply(""), ERROR_REPLY);
        assert_eq!(decode_reply(r#"{"candidates": "oops"}"#), ERROR_REPLY);
    }

    #[test]
    fn decoded_body_without_text_falls_back() {
        let json = r#"{"candidates": [{"content": {"parts": [{"text": "Hi there!"}]}}]}"#;
        assert_eq!(decode_reply(json), "Hi there!");
        assert_eq!(decode_reply("{}"), FALLBACK_REPLY);
    }
}
