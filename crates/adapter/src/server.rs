//! WebSocket server hosting one debug session per connection.
//!
//! Each connection gets its own [`Session`], its own timer set, and its own
//! outgoing frame channel. Commands are handled strictly in arrival order on
//! the connection task; everything the server sends (responses and events,
//! including timer-fired events) funnels through one writer task, so frames
//! reach the client in the order they were produced and with monotonically
//! increasing sequence numbers.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use eyre::Result;
use futures::{SinkExt, StreamExt};
use sdb_common::types::{EventFrame, Frame, ResponseFrame};
use tokio::{
    sync::{mpsc, oneshot, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::handler::{handle_command, OutgoingEvent, ScheduledAction};
use crate::session::Session;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on; `0` picks an ephemeral port
    pub port: u16,
    /// Reject unrecognized commands instead of acknowledging them
    pub strict: bool,
    /// Delay before the entry stop after `configurationDone`
    pub entry_delay: Duration,
    /// Delay before the breakpoint scan after `continue`
    pub continue_delay: Duration,
    /// Delay before the line advance after a step command
    pub step_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8765,
            strict: false,
            entry_delay: Duration::from_millis(100),
            continue_delay: Duration::from_millis(200),
            step_delay: Duration::from_millis(150),
        }
    }
}

/// Handle to the running adapter server
#[derive(Debug)]
pub struct ServerHandle {
    /// Address the server is listening on
    addr: SocketAddr,
    /// Shutdown signal
    shutdown_tx: oneshot::Sender<()>,
}

impl ServerHandle {
    /// Get the server address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// WebSocket URL clients connect to
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Gracefully shut the server down
    pub fn shutdown(self) -> Result<()> {
        if self.shutdown_tx.send(()).is_err() {
            warn!("adapter server already shut down");
        }
        Ok(())
    }
}

/// Start the adapter server on the configured port.
///
/// Binds first and reports the actual address in the returned handle, so
/// `port: 0` works for tests.
pub async fn start_server(config: ServerConfig) -> Result<ServerHandle> {
    let port = config.port;
    let app = Router::new().route("/", get(ws_handler)).with_state(Arc::new(config));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("adapter server failed");
    });

    info!("debug adapter server listening on {}", actual_addr);

    Ok(ServerHandle { addr: actual_addr, shutdown_tx })
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(config): State<Arc<ServerConfig>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, config))
}

/// One outbound message, sequenced by the writer task at send time
enum Outbound {
    Response {
        /// Seq of the request being answered
        request_seq: u64,
        /// Echo of the command
        command: String,
        /// Success flag
        success: bool,
        /// Failure message
        message: Option<String>,
        /// Response body
        body: Option<serde_json::Value>,
    },
    Event(OutgoingEvent),
}

/// Handle a WebSocket connection for its whole lifetime
async fn handle_socket(socket: WebSocket, config: Arc<ServerConfig>) {
    info!("debug client connected");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Outbound>(64);

    // Single writer: assigns outgoing seqs in send order, so the client
    // never observes reordered or repeated sequence numbers.
    let writer = tokio::spawn(async move {
        let mut next_seq: u64 = 1;
        while let Some(outbound) = rx.recv().await {
            let seq = next_seq;
            next_seq += 1;
            let frame = match outbound {
                Outbound::Response { request_seq, command, success, message, body } => {
                    Frame::Response(ResponseFrame {
                        seq,
                        request_seq,
                        success,
                        command,
                        message,
                        body,
                    })
                }
                Outbound::Event(event) => {
                    Frame::Event(EventFrame::new(seq, event.name, event.body))
                }
            };
            match frame.encode() {
                Ok(text) => {
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("failed to encode outgoing frame: {e}"),
            }
        }
    });

    let session = Arc::new(Mutex::new(Session::new()));
    let mut timers: Vec<JoinHandle<()>> = Vec::new();

    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                error!("WebSocket error: {e}");
                break;
            }
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => {
                info!("client closed connection");
                break;
            }
            _ => continue,
        };

        // Malformed frames are dropped and logged; the connection survives.
        let request = match Frame::decode(&text) {
            Ok(Frame::Request(request)) => request,
            Ok(_) => {
                warn!("ignoring non-request frame from client");
                continue;
            }
            Err(e) => {
                warn!("dropping malformed frame: {e}");
                continue;
            }
        };

        let outcome = {
            let mut session = session.lock().await;
            handle_command(&mut session, &config, &request)
        };

        let response = Outbound::Response {
            request_seq: request.seq,
            command: request.command,
            success: outcome.success,
            message: outcome.message,
            body: outcome.body,
        };
        if tx.send(response).await.is_err() {
            break;
        }
        for event in outcome.events {
            if tx.send(Outbound::Event(event)).await.is_err() {
                break;
            }
        }
        for scheduled in outcome.scheduled {
            timers.push(spawn_timer(scheduled, session.clone(), tx.clone()));
        }

        // teardown commands cancel whatever is still pending
        if session.lock().await.is_terminal() {
            cancel_timers(&mut timers);
        }
        timers.retain(|t| !t.is_finished());
    }

    // connection gone: no timer may fire on a dead session
    cancel_timers(&mut timers);
    {
        let mut session = session.lock().await;
        if !session.is_terminal() {
            session.terminate();
        }
    }
    drop(tx);
    let _ = writer.await;

    info!("debug client disconnected");
}

fn cancel_timers(timers: &mut Vec<JoinHandle<()>>) {
    for timer in timers.drain(..) {
        timer.abort();
    }
}

/// Run a deferred session action after its delay.
///
/// The action is dropped silently when the session has moved to a new epoch
/// (relaunched or torn down) since it was scheduled.
fn spawn_timer(
    scheduled: ScheduledAction,
    session: Arc<Mutex<Session>>,
    tx: mpsc::Sender<Outbound>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(scheduled.delay).await;
        let events = {
            let mut session = session.lock().await;
            if session.epoch() != scheduled.epoch {
                debug!("skipping timer scheduled for an earlier session epoch");
                return;
            }
            scheduled.action.apply(&mut session)
        };
        for event in events {
            if tx.send(Outbound::Event(event)).await.is_err() {
                return;
            }
        }
    })
}
