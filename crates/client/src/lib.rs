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

//! SDB Client - the editor-facing side of the debug protocol
//!
//! [`client::DebugClient`] turns the asynchronous WebSocket connection into
//! awaitable request/response pairs and fans unsolicited events out to
//! subscribers. [`breakpoints::BreakpointManager`] holds the lines the
//! editor has marked, and [`local::LocalStepper`] simulates stepping
//! offline with the same algorithm the adapter uses.

/// Editor-facing breakpoint bookkeeping
pub mod breakpoints;
/// The correlation layer over a WebSocket connection
pub mod client;
/// Event-subscriber registry keyed by event name
pub mod events;
/// Offline step simulation for UI use without a server
pub mod local;

pub use breakpoints::BreakpointManager;
pub use client::{ClientError, DebugClient};
pub use events::{EventRegistry, SubscriptionId};
pub use local::LocalStepper;
