//! Interactive console for a voicewire conversation endpoint.
//!
//! This binary is responsible for:
//! 1. Resolving configuration from the command line and environment.
//! 2. Initializing logging.
//! 3. Connecting a conversation client and printing its state changes.
//! 4. Forwarding stdin lines as text messages until quit or Ctrl+C.

mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use config::Config;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use voicewire_client::{ClientError, ConversationClient, ConversationObserver};
use voicewire_protocol::{ConversationItem, Role};

/// Talk to a conversation server from the terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// WebSocket endpoint of the conversation server.
    #[arg(long)]
    endpoint: Option<String>,
}

/// Prints conversation state changes to the terminal. Audio deltas are
/// only counted; playback is somebody else's job.
struct ConsoleObserver;

impl ConversationObserver for ConsoleObserver {
    fn history_replaced(&self, history: &[ConversationItem]) {
        println!("--- conversation ({} turns) ---", history.len());
        for item in history {
            let speaker = match item.role {
                Role::User => "you",
                Role::Assistant => "agent",
                Role::System => "system",
            };
            println!("{speaker}: {}", item.content);
        }
    }

    fn agent_changed(&self, name: Option<&str>) {
        if let Some(name) = name {
            println!("[agent: {name}]");
        }
    }

    fn readiness_changed(&self, ready: bool) {
        println!("{}", if ready { "[connected]" } else { "[disconnected]" });
    }

    fn awaiting_changed(&self, awaiting: bool) {
        if awaiting {
            println!("[waiting for reply...]");
        }
    }

    fn error_set(&self, error: &ClientError) {
        eprintln!("[error] {error}");
    }

    fn audio_delta(&self, samples: &[i16]) {
        info!(samples = samples.len(), "received audio delta");
    }

    fn audio_done(&self) {
        info!("audio response complete");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(args.endpoint).context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();

    info!(endpoint = %config.endpoint, "starting conversation console");
    let mut client = ConversationClient::new(config.endpoint, Arc::new(ConsoleObserver));
    client
        .start()
        .await
        .context("Failed to open the conversation socket")?;

    println!("Type a message and press enter. /reset clears the conversation, /quit exits.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "" => {}
                    "/quit" => break,
                    "/reset" => {
                        if let Err(e) = client.reset_conversation().await {
                            warn!(error = %e, "reset failed");
                        }
                    }
                    text => {
                        if let Err(e) = client.send_text_message(text).await {
                            warn!(error = %e, "message not sent");
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal. Shutting down gracefully...");
                break;
            }
        }
    }

    client.stop().await;
    info!("console session ended");
    Ok(())
}
