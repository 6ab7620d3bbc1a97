//! appointment-dm: Voice-driven dialogue manager for creating appointments
//!
//! This daemon provides:
//! - A hierarchical dialogue state machine that greets the user, detects
//!   appointment intent, and collects person, day, whole-day flag and time
//! - A fixed grammar for interpreting recognised utterances
//! - A console speech transport (stdout for speech, stdin for recognition)
//! - IPC server for starting the dialogue and observing its status
//!
//! Scope:
//! - One active dialogue at a time, state kept in memory only
//! - NO persistence of created appointments

mod config;
mod dialogue;
mod events;
mod grammar;
mod ipc;
mod lifecycle;
mod transport;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::dialogue::{DialogueMachine, DialogueState};
use crate::events::{Command, DialogueEvent, StateEvent};
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;
use crate::transport::ConsoleTransport;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, stdout carries the spoken side of the dialogue
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "appointment-dm starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(
        ?config.socket_path,
        locale = %config.speech.locale,
        auto_start = config.auto_start,
        "configuration loaded"
    );

    let mut shutdown = ShutdownSignal::new()?;

    // Transport and IPC -> dialogue machine
    let (dialogue_tx, dialogue_rx) = mpsc::channel::<DialogueEvent>(32);
    // Dialogue machine -> transport
    let (command_tx, command_rx) = mpsc::channel::<Command>(32);
    // Dialogue machine -> observers
    let (event_tx, _event_rx) = broadcast::channel::<StateEvent>(64);

    let mut machine = DialogueMachine::new(event_tx.clone());
    let mut transport = ConsoleTransport::stdio(config.speech.clone(), dialogue_tx.clone());
    let server = Server::new(&config.socket_path, dialogue_tx.clone(), event_tx.clone())?;

    let mut observer_rx = event_tx.subscribe();
    let waiting = DialogueState::WaitToStart.to_string();

    info!("daemon initialized, entering main loop");

    tokio::select! {
        _ = machine.run(dialogue_rx, command_tx) => {
            info!("dialogue machine exited");
        }

        result = transport.run(command_rx) => {
            match result {
                Ok(()) => info!("speech transport exited"),
                Err(e) => error!(?e, "speech transport error"),
            }
        }

        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Keep the IPC status current and handle auto-start
        _ = async {
            loop {
                match observer_rx.recv().await {
                    Ok(event) => {
                        info!(%event, "dialogue event");
                        server.observe(&event).await;

                        let ready = matches!(&event, StateEvent::StateChanged { to, .. } if *to == waiting);
                        if config.auto_start && ready && dialogue_tx.send(DialogueEvent::Start).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "dialogue event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("dialogue observer exited");
        }

        // Wait for shutdown signal
        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    server.shutdown().await;

    info!("appointment-dm stopped");

    Ok(())
}
