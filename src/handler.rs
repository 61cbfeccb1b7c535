use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{error, info};

use crate::app::{App, InputMode, LoginField, Notice, Screen};
use crate::chat;
use crate::storage::{KEY_EMAIL, KEY_TOKEN};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line editing shared by the draft and the login fields. Returns
/// whether the key was consumed.
fn edit_line(input: &mut String, cursor: &mut usize, code: KeyCode) -> bool {
    match code {
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = input.chars().count();
            if *cursor < char_count {
                let byte_pos = char_to_byte_index(input, *cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            *cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = input.chars().count();
            *cursor = (*cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(input, *cursor);
            input.insert(byte_pos, c);
            *cursor += 1;
        }
        _ => return false,
    }
    true
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global quit works in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // A visible notice blocks everything else until dismissed.
    if app.current_notice().is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.dismiss_notice();
        }
        return;
    }

    match app.screen {
        Screen::Home => handle_home(app, key),
        Screen::Chat => handle_chat(app, key),
        Screen::Login => handle_login(app, key),
    }
}

fn handle_home(app: &mut App, key: KeyEvent) {
    // The session menu captures input while open
    if app.menu_visible {
        match key.code {
            KeyCode::Esc => app.close_menu(),
            KeyCode::Char('j') | KeyCode::Down => app.menu_nav_down(),
            KeyCode::Char('k') | KeyCode::Up => app.menu_nav_up(),
            KeyCode::Enter => match app.menu_state.selected() {
                Some(0) => logout(app),
                _ => app.close_menu(),
            },
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('m') => app.open_menu(),
        KeyCode::Char('j') | KeyCode::Down => app.category_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.category_nav_up(),
        // Every category leads to the assistant chat
        KeyCode::Enter => {
            if app.category_state.selected().is_some() {
                app.screen = Screen::Chat;
                app.input_mode = InputMode::Editing;
                app.draft_cursor = app.draft.chars().count();
            }
        }
        _ => {}
    }
}

fn handle_chat(app: &mut App, key: KeyEvent) {
    match app.input_mode {
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Left => {
                app.screen = Screen::Home;
            }
            KeyCode::Char('i') | KeyCode::Tab => {
                app.input_mode = InputMode::Editing;
                app.draft_cursor = app.draft.chars().count();
            }
            KeyCode::Char('j') | KeyCode::Down => {
                app.chat_scroll = app.chat_scroll.saturating_add(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                app.chat_scroll = app.chat_scroll.saturating_sub(1);
            }
            KeyCode::Char('g') => app.chat_scroll = 0,
            KeyCode::Char('G') => app.scroll_chat_to_bottom(),
            _ => {}
        },
        InputMode::Editing => match key.code {
            KeyCode::Esc => app.input_mode = InputMode::Normal,
            KeyCode::Enter => submit(app),
            code => {
                edit_line(&mut app.draft, &mut app.draft_cursor, code);
            }
        },
    }
}

/// Kick off one send/receive exchange on a background task.
fn submit(app: &mut App) {
    let Some(user_message) = app.begin_submit() else {
        return;
    };
    app.scroll_chat_to_bottom();

    let backend = app.backend.clone();
    let gemini = app.gemini.clone();
    let storage = app.storage.clone();
    app.submit_task = Some(tokio::spawn(async move {
        chat::run_submit(backend, gemini, storage, user_message).await
    }));
}

/// Clear the stored session and return to the login screen. The two
/// removals are independent and not transactional; on any failure the
/// stored state is left as-is and no navigation happens.
fn logout(app: &mut App) {
    app.close_menu();

    let removed = app
        .storage
        .remove(KEY_TOKEN)
        .and_then(|()| app.storage.remove(KEY_EMAIL));

    match removed {
        Ok(()) => {
            info!("user logged out");
            app.push_notice(Notice::success("You have been logged out!"));
            app.screen = Screen::Login;
            app.input_mode = InputMode::Editing;
            app.login_field = LoginField::Email;
        }
        Err(err) => {
            error!(error = %err, "error during logout");
            app.push_notice(Notice::error("Failed to log out"));
        }
    }
}

fn handle_login(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab | KeyCode::Down | KeyCode::Up => {
            app.login_field = match app.login_field {
                LoginField::Email => LoginField::Token,
                LoginField::Token => LoginField::Email,
            };
        }
        KeyCode::Enter => save_session(app),
        code => {
            match app.login_field {
                LoginField::Email => {
                    edit_line(&mut app.email_input, &mut app.email_cursor, code);
                }
                LoginField::Token => {
                    edit_line(&mut app.token_input, &mut app.token_cursor, code);
                }
            };
        }
    }
}

fn save_session(app: &mut App) {
    let email = app.email_input.trim().to_string();
    let token = app.token_input.trim().to_string();
    if email.is_empty() || token.is_empty() {
        app.push_notice(Notice::error("Email and token are required"));
        return;
    }

    let stored = app
        .storage
        .set(KEY_EMAIL, &email)
        .and_then(|()| app.storage.set(KEY_TOKEN, &token));

    match stored {
        Ok(()) => {
            info!("session stored");
            app.email_input.clear();
            app.email_cursor = 0;
            app.token_input.clear();
            app.token_cursor = 0;
            app.screen = Screen::Home;
            app.input_mode = InputMode::Normal;
        }
        Err(err) => {
            error!(error = %err, "failed to store session");
            app.push_notice(Notice::error("Failed to store session"));
        }
    }
}
