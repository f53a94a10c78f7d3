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

//! Wire-frame definitions for the debug session protocol
//!
//! Every message exchanged between a client and the adapter is exactly one
//! of three frame kinds: a request carrying a command, a response answering
//! a request by sequence number, or an unsolicited event. Frames travel as
//! whole JSON objects over a message-oriented transport; the codec here
//! checks shape only, never business rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised by [`Frame::encode`] and [`Frame::decode`].
///
/// Decoding fails when the payload is not well-formed JSON or lacks a
/// recognized `type` discriminator. Codec errors are connection-scoped:
/// callers log and drop the offending message rather than tearing down
/// the connection.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload could not be parsed into any frame kind
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
}

/// One protocol message, discriminated by the `type` field on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Frame {
    /// A command sent by the client, answered by exactly one response
    Request(RequestFrame),
    /// The adapter's answer to a request, matched via `request_seq`
    Response(ResponseFrame),
    /// An unsolicited notification from the adapter
    Event(EventFrame),
}

impl Frame {
    /// Serialize this frame to its wire representation
    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(|e| CodecError::MalformedFrame(e.to_string()))
    }

    /// Parse a single wire message into a frame.
    ///
    /// Shape validation only: an unknown `command` or `event` name decodes
    /// fine; an unknown `type` does not.
    pub fn decode(text: &str) -> Result<Self, CodecError> {
        serde_json::from_str(text).map_err(|e| CodecError::MalformedFrame(e.to_string()))
    }
}

/// Request frame sent from client to adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFrame {
    /// Sender-side sequence number, monotonic from 1, never reused
    pub seq: u64,
    /// Command name (e.g. `continue`, `setBreakpoints`)
    pub command: String,
    /// Command arguments; absent for argument-less commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
}

impl RequestFrame {
    /// Create a request frame
    pub fn new(seq: u64, command: impl Into<String>, arguments: Option<serde_json::Value>) -> Self {
        Self { seq, command: command.into(), arguments }
    }
}

/// Response frame sent from adapter to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFrame {
    /// Sender-side sequence number of this response itself
    pub seq: u64,
    /// Sequence number of the request this response answers
    pub request_seq: u64,
    /// Whether the request was serviced
    pub success: bool,
    /// Echo of the request's command name
    pub command: String,
    /// Human-readable failure explanation, present when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Command-specific result payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl ResponseFrame {
    /// Create a success response
    pub fn success(
        seq: u64,
        request_seq: u64,
        command: impl Into<String>,
        body: Option<serde_json::Value>,
    ) -> Self {
        Self { seq, request_seq, success: true, command: command.into(), message: None, body }
    }

    /// Create a failure response with an explanatory message
    pub fn failure(
        seq: u64,
        request_seq: u64,
        command: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            seq,
            request_seq,
            success: false,
            command: command.into(),
            message: Some(message.into()),
            body: None,
        }
    }
}

/// Event frame sent from adapter to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    /// Sender-side sequence number of this event
    pub seq: u64,
    /// Event name (e.g. `stopped`, `terminated`)
    pub event: String,
    /// Event payload; absent for bare notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl EventFrame {
    /// Create an event frame
    pub fn new(seq: u64, event: impl Into<String>, body: Option<serde_json::Value>) -> Self {
        Self { seq, event: event.into(), body }
    }
}
