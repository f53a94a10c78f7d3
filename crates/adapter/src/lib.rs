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

//! SDB Adapter - the debug session engine
//!
//! Owns one [`session::Session`] per WebSocket connection, interprets debug
//! commands against a simulated line-by-line SQL execution model, and emits
//! lifecycle events back to the client. Command handling is strictly
//! serialized per connection; delayed transitions (the entry stop, the scan
//! after `continue`) run as cancelable timers tied to the connection.

/// Deterministic expression evaluation and breakpoint-condition checks
pub mod eval;
/// Command dispatch: one request in, one response plus scheduled actions out
pub mod handler;
/// The per-connection session state machine
pub mod session;
/// The WebSocket server hosting one session per connection
pub mod server;
/// Lazy scope/variable projection keyed by pause generation
pub mod variables;

pub use handler::{handle_command, CommandOutcome, ScheduledAction, SessionAction};
pub use server::{start_server, ServerConfig, ServerHandle};
pub use session::{Session, SessionState};
