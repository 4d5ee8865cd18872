use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod app;
mod claude;
mod config;
mod handler;
mod markdown;
mod tui;
mod ui;

use app::App;
use claude::ChatClient;
use config::Config;

#[derive(Parser)]
#[command(name = "charla")]
#[command(about = "Chat with Claude from the terminal")]
struct Cli {
    /// Model to chat with (overrides the configured default)
    #[arg(short, long)]
    model: Option<String>,

    /// Print known model identifiers and exit
    #[arg(long)]
    list_models: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_models {
        for model in ChatClient::list_models() {
            println!("{model}");
        }
        return Ok(());
    }

    init_logging()?;

    let config = Config::load_or_init().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "could not load config, using defaults");
        Config::new()
    });

    // Environment wins over the config file.
    let api_key = std::env::var("ANTHROPIC_API_KEY")
        .ok()
        .or_else(|| config.api_key.clone())
        .context("No API key. Set ANTHROPIC_API_KEY or add \"api_key\" to the config file.")?;

    let model = cli
        .model
        .or_else(|| config.default_model.clone())
        .unwrap_or_else(|| claude::DEFAULT_MODEL.to_string());
    let max_tokens = config.max_tokens.unwrap_or(claude::DEFAULT_MAX_TOKENS);

    let mut app = App::new(ChatClient::new(&api_key), model, max_tokens);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run(&mut app, &mut terminal, &mut events).await;

    tui::restore()?;
    result
}

async fn run(app: &mut App, terminal: &mut tui::Tui, events: &mut tui::EventHandler) -> Result<()> {
    loop {
        poll_pending_reply(app).await;

        terminal.draw(|frame| ui::render(app, frame))?;

        if app.should_quit {
            break;
        }

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}

/// Fold a finished completion task back into the conversation. The tick
/// event keeps the loop turning, so a finished task is picked up within
/// one tick interval.
async fn poll_pending_reply(app: &mut App) {
    let finished = app
        .pending
        .as_ref()
        .map(|task| task.is_finished())
        .unwrap_or(false);
    if !finished {
        return;
    }

    if let Some(task) = app.pending.take() {
        let result = match task.await {
            Ok(result) => result,
            Err(err) => Err(anyhow::anyhow!("completion task failed: {err}")),
        };
        app.complete_reply(result);
    }
}

fn init_logging() -> Result<()> {
    let log_path = Config::log_path()?;
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("could not open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}
