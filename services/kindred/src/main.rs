mod config;
mod protocol;

use crate::config::Config;
use anyhow::{Context, Result};
use clap::Parser;
use kindred_core::domain::Vibe;
use kindred_core::reasoning::ReasoningClient;
use kindred_core::session::{self, FacilitationSession};
use kindred_core::Command;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(about = "Conversation facilitation engine: reads transcript events on stdin, emits questions on stdout")]
struct Cli {
    /// The vibe for the session: fun, thoughtful, deep or mixed
    #[arg(default_value = "mixed")]
    vibe: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    // Logs go to stderr; stdout carries the command stream.
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();
    let vibe: Vibe = args
        .vibe
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("Failed to parse vibe argument")?;

    tracing::info!("Configuration loaded. Starting a {vibe} session...");

    // --- 4. Initialize the Reasoning Client ---
    let reasoning = Arc::new(ReasoningClient::new(
        config.openai_api_key.clone(),
        config.chat_model.clone(),
        config.timing_model.clone(),
    ));

    // --- 5. Wire Up the Engine ---
    let (event_tx, event_rx) = tokio::sync::mpsc::channel(64);
    let (command_tx, mut command_rx) = tokio::sync::mpsc::channel::<Command>(16);

    let facilitation = FacilitationSession::new(reasoning, vibe, command_tx, session::now_ms());
    let engine = tokio::spawn(facilitation.run(event_rx));

    // This task executes engine commands as side effects: each one becomes a
    // JSON line on stdout. It finishes once the session report is written.
    let printer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(command) = command_rx.recv().await {
            let is_final = matches!(command, Command::SessionComplete(_));
            match protocol::render_command(&command) {
                Ok(mut line) => {
                    line.push('\n');
                    if let Err(e) = stdout.write_all(line.as_bytes()).await {
                        tracing::error!("failed to write command to stdout: {e}");
                        break;
                    }
                    let _ = stdout.flush().await;
                }
                Err(e) => tracing::error!("failed to render command: {e:#}"),
            }
            if is_final {
                break;
            }
        }
    });

    // --- 6. Consume the Collaborator Stream ---
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match protocol::parse_event(line) {
            Ok(event) => {
                let ended = matches!(event, protocol::ClientEvent::End);
                if event_tx.send(event.into()).await.is_err() {
                    tracing::warn!("engine stopped, no longer accepting events");
                    break;
                }
                if ended {
                    break;
                }
            }
            Err(e) => tracing::warn!("ignoring event line: {e:#}"),
        }
    }

    // EOF on stdin ends the session: closing the event channel makes the
    // engine run its final summarization and emit the report.
    drop(event_tx);

    engine.await.context("engine task panicked")?;
    printer.await.context("printer task panicked")?;

    tracing::info!("Session complete.");
    Ok(())
}
