use tracing::error;

use crate::app::{ChatMessage, Notice, Sender};
use crate::backend::{BackendClient, PersistError};
use crate::gemini::GeminiClient;
use crate::storage::{Storage, KEY_TOKEN};

/// Result of one background submit, folded back into the screen state by
/// the main loop.
pub struct SubmitOutcome {
    pub reply: ChatMessage,
    pub notices: Vec<Notice>,
    pub redirect_to_login: bool,
}

/// Run one send/receive exchange: persist the user message, fetch the
/// assistant reply, persist the reply. Strictly sequential; a failed
/// persist never blocks the reply fetch, and the user message is never
/// rolled back.
pub async fn run_submit(
    backend: BackendClient,
    gemini: GeminiClient,
    storage: Storage,
    user_message: ChatMessage,
) -> SubmitOutcome {
    let mut notices = Vec::new();
    let mut redirect_to_login = false;

    persist(&backend, &storage, &user_message, &mut notices, &mut redirect_to_login).await;

    let reply_text = gemini.reply(&user_message.text).await;
    let reply = ChatMessage {
        text: reply_text,
        sender: Sender::Assistant,
    };

    persist(&backend, &storage, &reply, &mut notices, &mut redirect_to_login).await;

    SubmitOutcome {
        reply,
        notices,
        redirect_to_login,
    }
}

/// Best-effort persistence of one message. Fully contains its own failure
/// reporting: auth and server failures become notices, transport failures
/// are only logged.
async fn persist(
    backend: &BackendClient,
    storage: &Storage,
    message: &ChatMessage,
    notices: &mut Vec<Notice>,
    redirect_to_login: &mut bool,
) {
    if *redirect_to_login {
        // Token already known missing; don't alert twice.
        return;
    }

    let Some(token) = storage.get(KEY_TOKEN) else {
        notices.push(Notice::error("User not authenticated"));
        *redirect_to_login = true;
        return;
    };

    match backend.save_message(&token, message).await {
        Ok(()) => {}
        Err(PersistError::Server { message }) => {
            notices.push(Notice::error(message));
        }
        Err(err @ PersistError::Transport(_)) => {
            error!(error = %err, "failed to save message");
        }
    }
}
