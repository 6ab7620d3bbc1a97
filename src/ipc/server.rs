//! Unix domain socket server for IPC
//!
//! Provides request-response communication, forwards the start trigger
//! to the dialogue, and pushes dialogue notifications to subscribed
//! clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::events::{DialogueEvent, StateEvent};

use super::protocol::{DialogueStatus, Notification, Request, Response, MAX_MESSAGE_LEN};

type Incoming = serde_json::Result<Request>;

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    shared: Arc<Shared>,
    shutdown_tx: broadcast::Sender<()>,
}

/// State shared with every client handler
struct Shared {
    state: RwLock<ServerState>,
    /// Where start triggers go
    trigger_tx: mpsc::Sender<DialogueEvent>,
    /// Source of notifications for subscribers
    event_tx: broadcast::Sender<StateEvent>,
}

struct ServerState {
    status: DialogueStatus,
    start_time: std::time::Instant,
}

impl Server {
    /// Create a new IPC server
    pub fn new(
        socket_path: &Path,
        trigger_tx: mpsc::Sender<DialogueEvent>,
        event_tx: broadcast::Sender<StateEvent>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path)
            .context("failed to bind Unix socket")?;

        // Owner-only access
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let shared = Arc::new(Shared {
            state: RwLock::new(ServerState {
                status: DialogueStatus::default(),
                start_time: std::time::Instant::now(),
            }),
            trigger_tx,
            event_tx,
        });

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            shared,
            shutdown_tx,
        })
    }

    /// Fold a dialogue notification into the served status
    pub async fn observe(&self, event: &StateEvent) {
        let mut state = self.shared.state.write().await;
        let old_state = state.status.state.clone();
        state.status.apply(event);

        if old_state != state.status.state {
            debug!(from = %old_state, to = %state.status.state, "IPC server: status updated");
        }
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref()
            .context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let shared = Arc::clone(&self.shared);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, shared) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(stream: UnixStream, shared: Arc<Shared>) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let (request_tx, request_rx) = mpsc::channel(8);
        let reader_task = tokio::spawn(Self::read_requests(reader, request_tx));

        let result = Self::serve_client(&mut writer, request_rx, &shared).await;
        reader_task.abort();
        result
    }

    /// Read length-prefixed frames until the client goes away
    async fn read_requests(mut reader: OwnedReadHalf, request_tx: mpsc::Sender<Incoming>) -> Result<()> {
        let mut len_buf = [0u8; 4];

        loop {
            // Read message length (4-byte little-endian)
            match reader.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    debug!("client disconnected");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len > MAX_MESSAGE_LEN {
                warn!(len, "message too large, disconnecting");
                return Ok(());
            }

            let mut msg_buf = vec![0u8; len];
            reader.read_exact(&mut msg_buf).await?;

            if request_tx.send(serde_json::from_slice(&msg_buf)).await.is_err() {
                return Ok(());
            }
        }
    }

    /// Answer requests and push notifications once subscribed
    async fn serve_client(
        writer: &mut OwnedWriteHalf,
        mut request_rx: mpsc::Receiver<Incoming>,
        shared: &Shared,
    ) -> Result<()> {
        let mut notifications: Option<broadcast::Receiver<StateEvent>> = None;

        loop {
            tokio::select! {
                incoming = request_rx.recv() => {
                    let Some(incoming) = incoming else {
                        return Ok(());
                    };

                    let response = match incoming {
                        Ok(request) => {
                            debug!(?request, "received request");
                            Self::process_request(request, shared).await
                        }
                        Err(e) => Response::Error {
                            code: "bad_request".to_string(),
                            message: e.to_string(),
                        },
                    };

                    if response == Response::Subscribed && notifications.is_none() {
                        debug!("client subscribed to notifications");
                        notifications = Some(shared.event_tx.subscribe());
                    }

                    Self::send_message(writer, &response).await?;
                }

                event = next_notification(&mut notifications) => match event {
                    Ok(event) => {
                        Self::send_message(writer, &Notification::Dialogue { event }).await?;
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!(skipped = n, "subscriber lagged");
                    }
                    Err(RecvError::Closed) => {
                        notifications = None;
                    }
                },
            }
        }
    }

    /// Send a length-prefixed JSON message
    async fn send_message<T: serde::Serialize>(writer: &mut OwnedWriteHalf, msg: &T) -> Result<()> {
        let msg_bytes = serde_json::to_vec(msg)?;
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();

        writer.write_all(&msg_len).await?;
        writer.write_all(&msg_bytes).await?;

        Ok(())
    }

    /// Process a request and return a response
    async fn process_request(request: Request, shared: &Shared) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => {
                let mut state = shared.state.write().await;
                state.status.uptime_secs = state.start_time.elapsed().as_secs();
                Response::Status(state.status.clone())
            }

            Request::Start => match shared.trigger_tx.send(DialogueEvent::Start).await {
                Ok(()) => {
                    info!("start trigger received via IPC");
                    Response::Started
                }
                Err(_) => Response::Error {
                    code: "dialogue_stopped".to_string(),
                    message: "the dialogue is no longer running".to_string(),
                },
            },

            Request::Subscribe => Response::Subscribed,
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

async fn next_notification(
    notifications: &mut Option<broadcast::Receiver<StateEvent>>,
) -> Result<StateEvent, RecvError> {
    match notifications {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn socket_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("appointment-dm-{}-{}.sock", name, std::process::id()))
    }

    async fn send(stream: &mut UnixStream, request: &Request) {
        let bytes = serde_json::to_vec(request).unwrap();
        stream.write_all(&(bytes.len() as u32).to_le_bytes()).await.unwrap();
        stream.write_all(&bytes).await.unwrap();
    }

    async fn receive(stream: &mut UnixStream) -> serde_json::Value {
        let mut len_buf = [0u8; 4];
        stream.read_exact(&mut len_buf).await.unwrap();
        let mut body = vec![0u8; u32::from_le_bytes(len_buf) as usize];
        stream.read_exact(&mut body).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn start_server(
        name: &str,
    ) -> (Arc<Server>, PathBuf, mpsc::Receiver<DialogueEvent>, broadcast::Sender<StateEvent>) {
        let path = socket_path(name);
        let (trigger_tx, trigger_rx) = mpsc::channel(4);
        let (event_tx, _) = broadcast::channel(16);
        let server = Arc::new(Server::new(&path, trigger_tx, event_tx.clone()).unwrap());

        let running = Arc::clone(&server);
        tokio::spawn(async move { running.run().await });

        (server, path, trigger_rx, event_tx)
    }

    #[tokio::test]
    async fn test_ping_and_start() {
        let (server, path, mut trigger_rx, _events) = start_server("start");
        let mut stream = UnixStream::connect(&path).await.unwrap();

        send(&mut stream, &Request::Ping).await;
        assert_eq!(receive(&mut stream).await["type"], "pong");

        send(&mut stream, &Request::Start).await;
        assert_eq!(receive(&mut stream).await["type"], "started");
        assert_eq!(trigger_rx.recv().await, Some(DialogueEvent::Start));

        server.shutdown().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_status_and_notifications() {
        let (server, path, _trigger_rx, events) = start_server("notify");
        let mut stream = UnixStream::connect(&path).await.unwrap();

        let change = StateEvent::StateChanged {
            from: "Prepare".to_string(),
            to: "WaitToStart".to_string(),
        };
        server.observe(&change).await;

        send(&mut stream, &Request::GetStatus).await;
        let status = receive(&mut stream).await;
        assert_eq!(status["type"], "status");
        assert_eq!(status["state"], "WaitToStart");

        send(&mut stream, &Request::Subscribe).await;
        assert_eq!(receive(&mut stream).await["type"], "subscribed");

        events.send(change).unwrap();

        let note = receive(&mut stream).await;
        assert_eq!(note["type"], "dialogue");
        assert_eq!(note["event"]["type"], "state_changed");
        assert_eq!(note["event"]["to"], "WaitToStart");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_request_gets_error() {
        let (server, path, _trigger_rx, _events) = start_server("malformed");
        let mut stream = UnixStream::connect(&path).await.unwrap();

        let body = br#"{"type":"launch"}"#;
        stream.write_all(&(body.len() as u32).to_le_bytes()).await.unwrap();
        stream.write_all(body).await.unwrap();

        let response = receive(&mut stream).await;
        assert_eq!(response["type"], "error");
        assert_eq!(response["code"], "bad_request");

        server.shutdown().await;
    }
}
