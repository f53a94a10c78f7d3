// SDB - SQL Script Debugger
// Copyright (C) 2026 The SDB Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! The correlation layer: awaitable requests over an event-driven socket.
//!
//! Every outgoing request gets a fresh sequence number and a one-shot
//! resolver; the reader task matches incoming responses back by
//! `request_seq` and fans events out to the subscriber registry. When the
//! connection closes, every in-flight request fails with
//! [`ClientError::ConnectionClosed`] atomically and no further events are
//! delivered.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};

use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use parking_lot::Mutex;
use sdb_common::types::{
    Breakpoint, Capabilities, EventFrame, Frame, RequestFrame, ResponseFrame, Scope,
    SourceBreakpoint, StackFrame, Thread, Variable,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::{net::TcpStream, sync::oneshot, task::JoinHandle};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Thread id used for execution-control requests; the adapter simulates a
/// single thread
const THREAD_ID: u64 = 1;

/// Errors surfaced to callers of the client
#[derive(Debug, Error)]
pub enum ClientError {
    /// The WebSocket handshake failed
    #[error("failed to connect: {0}")]
    Connect(String),
    /// A request frame could not be encoded
    #[error("could not encode request: {0}")]
    Encode(String),
    /// The adapter answered with `success: false`
    #[error("remote error: {0}")]
    Remote(String),
    /// The connection closed before a matching response arrived
    #[error("connection closed")]
    ConnectionClosed,
    /// A successful response did not carry the expected payload
    #[error("unexpected response payload: {0}")]
    UnexpectedPayload(String),
}

/// Sequence allocation and the in-flight request map.
///
/// Owned exclusively by one client; cleared as a whole on disconnect.
struct Correlation {
    next_seq: AtomicU64,
    pending: Mutex<HashMap<u64, oneshot::Sender<ResponseFrame>>>,
}

impl Correlation {
    fn new() -> Self {
        Self { next_seq: AtomicU64::new(1), pending: Mutex::new(HashMap::new()) }
    }

    /// Allocate the next sequence number and register its resolver
    fn register(&self) -> (u64, oneshot::Receiver<ResponseFrame>) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(seq, tx);
        (seq, rx)
    }

    /// Drop the resolver for a request that could not be transmitted
    fn forget(&self, seq: u64) {
        self.pending.lock().remove(&seq);
    }

    /// Resolve the pending request matching this response, if any.
    ///
    /// A response with no pending entry is dropped silently; duplicate or
    /// late deliveries must never take the connection down.
    fn complete(&self, response: ResponseFrame) {
        match self.pending.lock().remove(&response.request_seq) {
            Some(resolver) => {
                let _ = resolver.send(response);
            }
            None => {
                debug!(request_seq = response.request_seq, "dropping unmatched response");
            }
        }
    }

    /// Fail every in-flight request at once by dropping its resolver
    fn fail_all(&self) {
        self.pending.lock().clear();
    }

    fn in_flight(&self) -> usize {
        self.pending.lock().len()
    }
}

struct ClientInner {
    correlation: Correlation,
    events: crate::events::EventRegistry,
    sink: tokio::sync::Mutex<WsSink>,
    closed: AtomicBool,
}

impl ClientInner {
    /// Mark the connection dead: fail all pending requests atomically and
    /// stop delivering events
    fn shut_down(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let abandoned = self.correlation.in_flight();
        if abandoned > 0 {
            debug!(abandoned, "failing in-flight requests on close");
        }
        self.correlation.fail_all();
        self.events.clear();
    }
}

/// Client for one debug adapter connection.
///
/// A value of this type exists only once the WebSocket handshake has
/// completed, so requests cannot race the connection setup.
pub struct DebugClient {
    inner: Arc<ClientInner>,
    reader: JoinHandle<()>,
}

impl DebugClient {
    /// Connect to an adapter.
    ///
    /// Resolves once the transport reports the connection open; a failed
    /// handshake fails the connect itself.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (socket, _) =
            connect_async(url).await.map_err(|e| ClientError::Connect(e.to_string()))?;
        debug!("connected to debug adapter at {url}");

        let (sink, stream) = socket.split();
        let inner = Arc::new(ClientInner {
            correlation: Correlation::new(),
            events: crate::events::EventRegistry::new(),
            sink: tokio::sync::Mutex::new(sink),
            closed: AtomicBool::new(false),
        });
        let reader = tokio::spawn(read_loop(inner.clone(), stream));

        Ok(Self { inner, reader })
    }

    /// Whether the connection is still open
    pub fn is_connected(&self) -> bool {
        !self.inner.closed.load(Ordering::SeqCst)
    }

    /// Send a raw command and await its response.
    ///
    /// Resolves with the response frame on `success`, fails with
    /// [`ClientError::Remote`] when the adapter rejects the request, and
    /// with [`ClientError::ConnectionClosed`] when the connection dies
    /// before a matching response arrives.
    pub async fn send_request(
        &self,
        command: &str,
        arguments: Option<Value>,
    ) -> Result<ResponseFrame, ClientError> {
        if !self.is_connected() {
            return Err(ClientError::ConnectionClosed);
        }

        let (seq, resolver) = self.inner.correlation.register();
        // the connection may have died between the check above and the
        // registration; a resolver registered after the close sweep would
        // otherwise wait forever
        if !self.is_connected() {
            self.inner.correlation.forget(seq);
            return Err(ClientError::ConnectionClosed);
        }
        let frame = Frame::Request(RequestFrame::new(seq, command, arguments));
        let text = match frame.encode() {
            Ok(text) => text,
            Err(e) => {
                self.inner.correlation.forget(seq);
                return Err(ClientError::Encode(e.to_string()));
            }
        };

        if let Err(e) = self.inner.sink.lock().await.send(Message::Text(text.into())).await {
            warn!("failed to transmit request: {e}");
            self.inner.correlation.forget(seq);
            return Err(ClientError::ConnectionClosed);
        }

        match resolver.await {
            Ok(response) if response.success => Ok(response),
            Ok(response) => Err(ClientError::Remote(
                response.message.unwrap_or_else(|| format!("request '{command}' failed")),
            )),
            Err(_) => Err(ClientError::ConnectionClosed),
        }
    }

    /// Close the connection, failing any in-flight requests
    pub async fn close(&self) {
        let _ = self.inner.sink.lock().await.send(Message::Close(None)).await;
        self.inner.shut_down();
    }

    // --- event subscription ---

    /// Subscribe a handler to an event name
    pub fn on_event<F>(&self, event: &str, handler: F) -> crate::events::SubscriptionId
    where
        F: Fn(&EventFrame) -> eyre::Result<()> + Send + Sync + 'static,
    {
        self.inner.events.subscribe(event, handler)
    }

    /// Remove an event subscription
    pub fn off_event(&self, event: &str, id: crate::events::SubscriptionId) -> bool {
        self.inner.events.unsubscribe(event, id)
    }

    /// Subscribe to `stopped` events
    pub fn on_stopped<F>(&self, handler: F) -> crate::events::SubscriptionId
    where
        F: Fn(&EventFrame) -> eyre::Result<()> + Send + Sync + 'static,
    {
        self.on_event("stopped", handler)
    }

    /// Subscribe to `terminated` events
    pub fn on_terminated<F>(&self, handler: F) -> crate::events::SubscriptionId
    where
        F: Fn(&EventFrame) -> eyre::Result<()> + Send + Sync + 'static,
    {
        self.on_event("terminated", handler)
    }

    /// Subscribe to `exited` events
    pub fn on_exited<F>(&self, handler: F) -> crate::events::SubscriptionId
    where
        F: Fn(&EventFrame) -> eyre::Result<()> + Send + Sync + 'static,
    {
        self.on_event("exited", handler)
    }

    /// Subscribe to `output` events
    pub fn on_output<F>(&self, handler: F) -> crate::events::SubscriptionId
    where
        F: Fn(&EventFrame) -> eyre::Result<()> + Send + Sync + 'static,
    {
        self.on_event("output", handler)
    }

    // --- typed protocol requests ---

    /// Negotiate capabilities with the adapter
    pub async fn initialize(&self, client_name: &str) -> Result<Capabilities, ClientError> {
        let response = self
            .send_request(
                "initialize",
                Some(json!({
                    "clientID": "sdb",
                    "clientName": client_name,
                    "adapterID": "sdb-adapter",
                    "linesStartAt1": true,
                    "columnsStartAt1": true,
                    "pathFormat": "path",
                    "supportsVariableType": true,
                })),
            )
            .await?;
        let body = response
            .body
            .ok_or_else(|| ClientError::UnexpectedPayload("empty initialize body".to_string()))?;
        serde_json::from_value(body).map_err(|e| ClientError::UnexpectedPayload(e.to_string()))
    }

    /// Replace the breakpoint set for a source, returning the verified set
    pub async fn set_breakpoints(
        &self,
        source_path: &str,
        breakpoints: &[SourceBreakpoint],
    ) -> Result<Vec<Breakpoint>, ClientError> {
        let response = self
            .send_request(
                "setBreakpoints",
                Some(json!({
                    "source": {"name": file_name(source_path), "path": source_path},
                    "breakpoints": breakpoints,
                })),
            )
            .await?;
        body_field(&response, "breakpoints")
    }

    /// Configure exception-breakpoint filters (acknowledged, not simulated)
    pub async fn set_exception_breakpoints(&self, filters: &[&str]) -> Result<(), ClientError> {
        self.send_request("setExceptionBreakpoints", Some(json!({"filters": filters})))
            .await
            .map(drop)
    }

    /// Launch a debug run of the given script
    pub async fn launch(
        &self,
        program: &str,
        line_count: Option<u32>,
    ) -> Result<(), ClientError> {
        let mut args = json!({
            "type": "sql",
            "request": "launch",
            "name": "SQL Debug Session",
            "program": program,
        });
        if let Some(lines) = line_count {
            args["lineCount"] = json!(lines);
        }
        self.send_request("launch", Some(args)).await.map(drop)
    }

    /// Attach to a running script (treated as launch by the mock adapter)
    pub async fn attach(&self) -> Result<(), ClientError> {
        self.send_request("attach", None).await.map(drop)
    }

    /// Signal that breakpoint configuration is finished
    pub async fn configuration_done(&self) -> Result<(), ClientError> {
        self.send_request("configurationDone", None).await.map(drop)
    }

    /// Resume execution until the next breakpoint or completion
    pub async fn continue_(&self) -> Result<(), ClientError> {
        self.send_request("continue", Some(json!({"threadId": THREAD_ID}))).await.map(drop)
    }

    /// Step over the current line
    pub async fn next(&self) -> Result<(), ClientError> {
        self.send_request("next", Some(json!({"threadId": THREAD_ID}))).await.map(drop)
    }

    /// Step into the current line
    pub async fn step_in(&self) -> Result<(), ClientError> {
        self.send_request("stepIn", Some(json!({"threadId": THREAD_ID}))).await.map(drop)
    }

    /// Step out of the current line
    pub async fn step_out(&self) -> Result<(), ClientError> {
        self.send_request("stepOut", Some(json!({"threadId": THREAD_ID}))).await.map(drop)
    }

    /// Pause execution in place
    pub async fn pause(&self) -> Result<(), ClientError> {
        self.send_request("pause", Some(json!({"threadId": THREAD_ID}))).await.map(drop)
    }

    /// List execution threads
    pub async fn threads(&self) -> Result<Vec<Thread>, ClientError> {
        let response = self.send_request("threads", None).await?;
        body_field(&response, "threads")
    }

    /// Fetch the current call stack
    pub async fn stack_trace(&self) -> Result<Vec<StackFrame>, ClientError> {
        let response =
            self.send_request("stackTrace", Some(json!({"threadId": THREAD_ID}))).await?;
        body_field(&response, "stackFrames")
    }

    /// Fetch the scopes of the topmost frame
    pub async fn scopes(&self) -> Result<Vec<Scope>, ClientError> {
        let response = self.send_request("scopes", Some(json!({"frameId": 1}))).await?;
        body_field(&response, "scopes")
    }

    /// Fetch the variables behind a `variablesReference`
    pub async fn variables(&self, reference: u64) -> Result<Vec<Variable>, ClientError> {
        let response = self
            .send_request("variables", Some(json!({"variablesReference": reference})))
            .await?;
        body_field(&response, "variables")
    }

    /// Evaluate an expression in the paused context
    pub async fn evaluate(&self, expression: &str) -> Result<String, ClientError> {
        let response = self
            .send_request("evaluate", Some(json!({"expression": expression, "context": "hover"})))
            .await?;
        body_field(&response, "result")
    }

    /// Tear the session down and keep the connection
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.send_request("disconnect", None).await.map(drop)
    }

    /// Terminate the debuggee
    pub async fn terminate(&self) -> Result<(), ClientError> {
        self.send_request("terminate", None).await.map(drop)
    }

    /// Restart the session in place
    pub async fn restart(&self) -> Result<(), ClientError> {
        self.send_request("restart", None).await.map(drop)
    }
}

impl Drop for DebugClient {
    fn drop(&mut self) {
        self.reader.abort();
        self.inner.shut_down();
    }
}

/// Reader task: dispatches incoming frames until the connection dies
async fn read_loop(inner: Arc<ClientInner>, mut stream: WsStream) {
    while let Some(msg) = stream.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                warn!("transport error: {e}");
                break;
            }
        };
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => {
                debug!("adapter closed the connection");
                break;
            }
            _ => continue,
        };
        match Frame::decode(text.as_str()) {
            Ok(Frame::Response(response)) => inner.correlation.complete(response),
            Ok(Frame::Event(event)) => inner.events.dispatch(&event),
            Ok(Frame::Request(_)) => warn!("ignoring request frame from adapter"),
            // malformed frames are dropped; the connection survives
            Err(e) => warn!("dropping malformed frame: {e}"),
        }
    }
    inner.shut_down();
}

fn body_field<T: DeserializeOwned>(
    response: &ResponseFrame,
    field: &str,
) -> Result<T, ClientError> {
    let value = response
        .body
        .as_ref()
        .and_then(|body| body.get(field))
        .cloned()
        .ok_or_else(|| {
            ClientError::UnexpectedPayload(format!(
                "missing '{field}' in {} response",
                response.command
            ))
        })?;
    serde_json::from_value(value).map_err(|e| ClientError::UnexpectedPayload(e.to_string()))
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
