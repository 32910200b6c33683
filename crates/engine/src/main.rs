//! Chatbridge - Main entry point.
//!
//! Runs one console game: stdin lines are chat events, replies go to stdout.

use std::sync::Arc;

use anyhow::Context;
use chatbridge_domain::Color;
use chatbridge_engine::infrastructure::console::{
    parse_console_line, ConsoleGame, StaticChallenges, StaticEngine, StdoutTransport,
};
use chatbridge_engine::infrastructure::settings::ChatSettings;
use chatbridge_engine::App;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary is usually run from `crates/engine`).
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatbridge_engine=debug,chatbridge_domain=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting chatbridge v{}", chatbridge_engine::app::VERSION);

    let settings = ChatSettings::from_env().context("invalid AI chat settings")?;
    tracing::info!(
        url = %settings.url,
        enabled = settings.enabled,
        local_fallback = settings.local_fallback,
        "AI chat configured"
    );

    let bot_name = std::env::var("CHATBRIDGE_BOT_NAME").unwrap_or_else(|_| "chatbridge".into());
    let game_id = std::env::var("CHATBRIDGE_GAME_ID").unwrap_or_else(|_| "console".into());
    let color = match std::env::var("CHATBRIDGE_BOT_COLOR").as_deref() {
        Ok("black") => Color::Black,
        _ => Color::White,
    };
    let engine_name =
        std::env::var("CHATBRIDGE_ENGINE_NAME").unwrap_or_else(|_| "Stockfish".into());
    // Stat lines separated by `;`, e.g. "Evaluation: +0.35;Depth: 18".
    let engine_stats: Vec<String> = std::env::var("CHATBRIDGE_ENGINE_STATS")
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let app = App::new(settings, Arc::new(StdoutTransport));
    let conversation = app
        .start_conversation(
            Arc::new(ConsoleGame::new(game_id, bot_name, color)),
            Arc::new(StaticEngine::new(engine_name, engine_stats)),
            Arc::new(StaticChallenges::default()),
        )
        .await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut deliveries = Vec::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(handle) = conversation.react(parse_console_line(&line)).await {
                    deliveries.retain(|h: &tokio::task::JoinHandle<()>| !h.is_finished());
                    deliveries.push(handle);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
        }
    }

    // Let replies still being generated reach the console.
    for handle in deliveries {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Reply delivery task failed");
        }
    }

    let backend = app.remote_state().snapshot();
    tracing::info!(
        endpoint = %backend.endpoint,
        connected = backend.connected,
        model = ?backend.model_id,
        disconnects = backend.disconnect_count,
        "Chatbridge stopped"
    );
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
