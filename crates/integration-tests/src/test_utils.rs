//! Shared helpers for end-to-end tests.
//!
//! Adapters under test bind an ephemeral port and run with short timer
//! delays so scenarios finish quickly without sleeping through the
//! production pacing.

use std::time::Duration;

use eyre::Result;
use sdb_adapter::{start_server, ServerConfig, ServerHandle};
use sdb_client::DebugClient;
use sdb_common::types::EventFrame;
use tokio::sync::mpsc;

/// Timeout for every awaited event in tests
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for an adapter under test: ephemeral port, fast timers
pub fn test_config() -> ServerConfig {
    ServerConfig {
        port: 0,
        strict: false,
        entry_delay: Duration::from_millis(10),
        continue_delay: Duration::from_millis(10),
        step_delay: Duration::from_millis(10),
    }
}

/// Start an adapter server for a test
pub async fn start_test_adapter() -> Result<ServerHandle> {
    sdb_common::logging::ensure_test_logging();
    Ok(start_server(test_config()).await?)
}

/// Start an adapter that rejects unrecognized commands
pub async fn start_strict_adapter() -> Result<ServerHandle> {
    sdb_common::logging::ensure_test_logging();
    Ok(start_server(ServerConfig { strict: true, ..test_config() }).await?)
}

/// Connect a client to an adapter under test
pub async fn connect_client(handle: &ServerHandle) -> Result<DebugClient> {
    Ok(DebugClient::connect(&handle.url()).await?)
}

/// Pipe every event with the given name into a channel the test can await
pub fn event_channel(
    client: &DebugClient,
    event: &str,
) -> mpsc::UnboundedReceiver<EventFrame> {
    let (tx, rx) = mpsc::unbounded_channel();
    client.on_event(event, move |frame| {
        let _ = tx.send(frame.clone());
        Ok(())
    });
    rx
}

/// Await the next event from a channel, panicking on timeout
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<EventFrame>) -> EventFrame {
    tokio::time::timeout(EVENT_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}
