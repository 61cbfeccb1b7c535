use std::sync::Arc;

use anyhow::{anyhow, Result};

mod app;
mod backend;
mod chat;
mod config;
mod gemini;
mod handler;
mod storage;
mod tui;
mod ui;

use app::{App, InputMode, Screen};
use backend::BackendClient;
use config::Config;
use gemini::GeminiClient;
use storage::Storage;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    // Env vars first, then config file, then defaults. Credentials never
    // live in source.
    let settings = Config::load().unwrap_or_else(|_| Config::new()).resolve();

    let storage = Storage::open_default()?;
    let backend = BackendClient::new(&settings.api_base_url)?;
    let gemini = GeminiClient::new(&settings.generative_endpoint, settings.api_key)?;

    let mut app = App::new(storage, backend, gemini);

    // No stored session yet: start on the login screen.
    if app.storage.get(storage::KEY_TOKEN).is_none() {
        app.screen = Screen::Login;
        app.input_mode = InputMode::Editing;
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(&mut app, event)?;
        }

        // Apply a finished background submit, if any.
        app.poll_submit().await;
    }

    tui::restore()?;
    Ok(())
}

fn init_logging() -> Result<()> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("twinkletalk");
    std::fs::create_dir_all(&dir)?;

    let file = std::fs::File::options()
        .create(true)
        .append(true)
        .open(dir.join("twinkletalk.log"))?;

    tracing_subscriber::fmt()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
