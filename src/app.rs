use std::collections::VecDeque;

use ratatui::widgets::ListState;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::backend::BackendClient;
use crate::chat::SubmitOutcome;
use crate::gemini::GeminiClient;
use crate::storage::Storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    Chat,
    Login,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// A single exchanged message. Never mutated once created.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub text: String,
    pub sender: Sender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Success,
}

/// A blocking alert shown as a modal popup until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, text: text.into() }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, text: text.into() }
    }
}

pub struct Category {
    pub title: &'static str,
    pub blurb: &'static str,
}

pub const CATEGORIES: &[Category] = &[
    Category {
        title: "Tanya Apa Saja",
        blurb: "Dapatkan jawaban instan untuk semua pertanyaanmu.",
    },
    Category {
        title: "Motivasi Harian",
        blurb: "Mulai harimu dengan kata-kata inspiratif.",
    },
    Category {
        title: "Resep Masakan",
        blurb: "Temukan resep lezat untuk setiap kesempatan.",
    },
    Category {
        title: "Jelajahi Kota",
        blurb: "Temukan tempat menarik, acara, dan tips di sekitarmu.",
    },
];

pub const MENU_ITEMS: &[&str] = &["Logout", "Cancel"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Token,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Chat state
    pub draft: String,
    pub draft_cursor: usize,
    /// Message log, newest first.
    pub log: Vec<ChatMessage>,
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub submit_task: Option<JoinHandle<SubmitOutcome>>,
    pub animation_frame: u8,

    // Home state
    pub menu_visible: bool,
    pub menu_state: ListState,
    pub category_state: ListState,

    // Login form
    pub login_field: LoginField,
    pub email_input: String,
    pub email_cursor: usize,
    pub token_input: String,
    pub token_cursor: usize,

    // Alerts, shown one at a time
    pub notices: VecDeque<Notice>,

    // Collaborators
    pub storage: Storage,
    pub backend: BackendClient,
    pub gemini: GeminiClient,
}

impl App {
    pub fn new(storage: Storage, backend: BackendClient, gemini: GeminiClient) -> Self {
        let mut category_state = ListState::default();
        category_state.select(Some(0));

        Self {
            should_quit: false,
            screen: Screen::Home,
            input_mode: InputMode::Normal,

            draft: String::new(),
            draft_cursor: 0,
            log: Vec::new(),
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            submit_task: None,
            animation_frame: 0,

            menu_visible: false,
            menu_state: ListState::default(),
            category_state,

            login_field: LoginField::Email,
            email_input: String::new(),
            email_cursor: 0,
            token_input: String::new(),
            token_cursor: 0,

            notices: VecDeque::new(),

            storage,
            backend,
            gemini,
        }
    }

    // Session menu

    pub fn open_menu(&mut self) {
        self.menu_visible = true;
        if self.menu_state.selected().is_none() {
            self.menu_state.select(Some(0));
        }
    }

    pub fn close_menu(&mut self) {
        self.menu_visible = false;
    }

    pub fn menu_nav_down(&mut self) {
        let i = self.menu_state.selected().unwrap_or(0);
        self.menu_state.select(Some((i + 1).min(MENU_ITEMS.len() - 1)));
    }

    pub fn menu_nav_up(&mut self) {
        let i = self.menu_state.selected().unwrap_or(0);
        self.menu_state.select(Some(i.saturating_sub(1)));
    }

    pub fn category_nav_down(&mut self) {
        let i = self.category_state.selected().unwrap_or(0);
        self.category_state.select(Some((i + 1).min(CATEGORIES.len() - 1)));
    }

    pub fn category_nav_up(&mut self) {
        let i = self.category_state.selected().unwrap_or(0);
        self.category_state.select(Some(i.saturating_sub(1)));
    }

    // Chat submit flow

    pub fn submitting(&self) -> bool {
        self.submit_task.is_some()
    }

    /// Validate the draft and append the user message to the log.
    ///
    /// Returns the message to hand to the background flow, or `None` when
    /// the draft is blank (a blocking notice is queued) or a submit is
    /// already in flight (one message at a time).
    pub fn begin_submit(&mut self) -> Option<ChatMessage> {
        if self.draft.trim().is_empty() {
            self.push_notice(Notice::error("Message cannot be empty"));
            return None;
        }
        if self.submitting() {
            return None;
        }

        let message = ChatMessage {
            text: self.draft.clone(),
            sender: Sender::User,
        };
        self.log.insert(0, message.clone());
        self.draft.clear();
        self.draft_cursor = 0;
        Some(message)
    }

    /// Fold a finished submit back into the screen state. The user message
    /// stays in the log no matter what the flow reported.
    pub fn apply_submit_outcome(&mut self, outcome: SubmitOutcome) {
        self.log.insert(0, outcome.reply);
        for notice in outcome.notices {
            self.push_notice(notice);
        }
        if outcome.redirect_to_login {
            self.screen = Screen::Login;
            self.input_mode = InputMode::Editing;
        }
        self.scroll_chat_to_bottom();
    }

    /// Await the background submit once it has finished.
    pub async fn poll_submit(&mut self) {
        let finished = self
            .submit_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        if let Some(task) = self.submit_task.take() {
            match task.await {
                Ok(outcome) => self.apply_submit_outcome(outcome),
                Err(err) => {
                    tracing::error!(error = %err, "submit task failed");
                    self.push_notice(Notice::error("An error occurred. Please try again."));
                }
            }
        }
    }

    // Alerts

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }

    pub fn current_notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn dismiss_notice(&mut self) {
        self.notices.pop_front();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.submitting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Scroll the chat so the newest message (and the thinking indicator)
    /// is visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        // Rendered oldest to newest, label line + wrapped content + blank.
        for msg in self.log.iter().rev() {
            total_lines += 1;
            for line in msg.text.lines() {
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += char_count.div_ceil(wrap_width) as u16;
                }
            }
            total_lines += 1;
        }

        if self.submitting() {
            // Label + "Thinking..." indicator
            total_lines += 2;
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::SubmitOutcome;

    fn test_app() -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("session.json"));
        let backend = BackendClient::new("http://localhost:5000").unwrap();
        let gemini = GeminiClient::new("http://localhost:5001/generate", None).unwrap();
        (App::new(storage, backend, gemini), dir)
    }

    #[test]
    fn empty_draft_is_rejected() {
        let (mut app, _dir) = test_app();
        app.draft = "   \t ".to_string();

        assert!(app.begin_submit().is_none());
        assert!(app.log.is_empty());
        assert_eq!(
            app.current_notice(),
            Some(&Notice::error("Message cannot be empty"))
        );
    }

    #[test]
    fn submit_prepends_user_message_and_clears_draft() {
        let (mut app, _dir) = test_app();
        app.draft = "Hello".to_string();
        app.draft_cursor = 5;

        let message = app.begin_submit().expect("submit accepted");
        assert_eq!(message.text, "Hello");
        assert_eq!(message.sender, Sender::User);
        assert_eq!(app.log.len(), 1);
        assert_eq!(app.log[0].text, "Hello");
        assert!(app.draft.is_empty());
        assert_eq!(app.draft_cursor, 0);
        assert!(app.current_notice().is_none());
    }

    #[test]
    fn outcome_keeps_log_newest_first() {
        let (mut app, _dir) = test_app();
        app.draft = "Hello".to_string();
        app.begin_submit().unwrap();

        app.apply_submit_outcome(SubmitOutcome {
            reply: ChatMessage {
                text: "Hi there".to_string(),
                sender: Sender::Assistant,
            },
            notices: Vec::new(),
            redirect_to_login: false,
        });

        assert_eq!(app.log.len(), 2);
        assert_eq!(app.log[0].sender, Sender::Assistant);
        assert_eq!(app.log[0].text, "Hi there");
        assert_eq!(app.log[1].sender, Sender::User);
        assert_eq!(app.log[1].text, "Hello");
    }

    #[test]
    fn outcome_redirects_to_login_when_flagged() {
        let (mut app, _dir) = test_app();
        app.screen = Screen::Chat;

        app.apply_submit_outcome(SubmitOutcome {
            reply: ChatMessage {
                text: "reply".to_string(),
                sender: Sender::Assistant,
            },
            notices: vec![Notice::error("User not authenticated")],
            redirect_to_login: true,
        });

        assert_eq!(app.screen, Screen::Login);
        assert_eq!(
            app.current_notice(),
            Some(&Notice::error("User not authenticated"))
        );
    }

    #[tokio::test]
    async fn submit_is_single_flight() {
        let (mut app, _dir) = test_app();
        app.submit_task = Some(tokio::spawn(async {
            SubmitOutcome {
                reply: ChatMessage {
                    text: "pending".to_string(),
                    sender: Sender::Assistant,
                },
                notices: Vec::new(),
                redirect_to_login: false,
            }
        }));

        app.draft = "second message".to_string();
        assert!(app.begin_submit().is_none());
        // The draft is kept so nothing typed is lost.
        assert_eq!(app.draft, "second message");
        assert!(app.log.is_empty());
    }

    #[test]
    fn scroll_counts_exact_width_lines_once() {
        let (mut app, _dir) = test_app();
        app.chat_width = 10;
        app.chat_height = 3;

        // Exactly one wrapped line: label + content + blank = 3 lines,
        // which fits the visible height with no scrolling.
        app.log.insert(
            0,
            ChatMessage {
                text: "0123456789".to_string(),
                sender: Sender::User,
            },
        );
        app.scroll_chat_to_bottom();
        assert_eq!(app.chat_scroll, 0);

        // 25 chars at width 10 wrap to three lines: 5 lines total.
        app.log.clear();
        app.log.insert(
            0,
            ChatMessage {
                text: "a".repeat(25),
                sender: Sender::User,
            },
        );
        app.scroll_chat_to_bottom();
        assert_eq!(app.chat_scroll, 2);
    }

    #[test]
    fn menu_toggles_are_idempotent() {
        let (mut app, _dir) = test_app();

        app.open_menu();
        app.open_menu();
        assert!(app.menu_visible);
        assert_eq!(app.menu_state.selected(), Some(0));

        app.close_menu();
        app.close_menu();
        assert!(!app.menu_visible);
    }

    #[test]
    fn message_serializes_with_lowercase_sender() {
        let message = ChatMessage {
            text: "Hello".to_string(),
            sender: Sender::User,
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["text"], "Hello");
        assert_eq!(json["sender"], "user");

        let reply = ChatMessage {
            text: "Hi".to_string(),
            sender: Sender::Assistant,
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["sender"], "assistant");
    }
}
