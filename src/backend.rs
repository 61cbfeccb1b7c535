use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;

use crate::app::ChatMessage;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Non-2xx answer; the message is surfaced to the user.
    #[error("{message}")]
    Server { message: String },
    /// The request never produced an HTTP status; logged only.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Persist one message on the chat backend. Any 2xx status is success;
    /// on failure the server's `message` field becomes the error text when
    /// present.
    pub async fn save_message(
        &self,
        token: &str,
        message: &ChatMessage,
    ) -> Result<(), PersistError> {
        let url = format!("{}/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(message)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| "Failed to save message".to_string());
        Err(PersistError::Server { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let client = BackendClient::new("http://localhost:5000/").unwrap();
        assert_eq!(client.base_url, "http://localhost:5000");
    }

    #[test]
    fn server_error_displays_its_message() {
        let err = PersistError::Server {
            message: "token expired".to_string(),
        };
        assert_eq!(err.to_string(), "token expired");
    }
}
