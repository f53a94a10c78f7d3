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

//! Command dispatch for the debug session.
//!
//! One request in, one [`CommandOutcome`] out: the response payload, any
//! events to emit immediately after it, and any [`SessionAction`]s to run
//! later on a timer. Handlers never block and never touch the transport;
//! the server task owns scheduling and frame I/O.

use std::time::Duration;

use sdb_common::{
    next_stop,
    types::{Capabilities, RequestFrame, SourceBreakpoint},
    StepKind,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::{
    eval,
    server::ServerConfig,
    session::{Session, SessionState, THREAD_ID},
    variables,
};

/// An event ready to be framed and sent
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEvent {
    /// Event name on the wire
    pub name: String,
    /// Event payload
    pub body: Option<Value>,
}

impl OutgoingEvent {
    fn new(name: &str, body: Value) -> Self {
        Self { name: name.to_string(), body: Some(body) }
    }
}

/// A session mutation to run after a delay, on the connection's timer.
///
/// The `epoch` stamp pins the action to the session run that scheduled it;
/// a launch, restart or teardown in between makes the action a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledAction {
    /// How long to wait before applying
    pub delay: Duration,
    /// Session epoch at scheduling time
    pub epoch: u64,
    /// What to apply
    pub action: SessionAction,
}

/// Deferred transitions of the simulated engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// First stop after `configurationDone`
    EntryStop,
    /// Scan for the next breakpoint after `continue`, from the given cursor
    ContinueScan {
        /// Line the session was paused at when `continue` arrived
        from: Option<u32>,
    },
    /// Advance one line after `next`/`stepIn`/`stepOut`
    StepStop {
        /// Line the session was paused at when the step arrived
        from: u32,
    },
}

impl SessionAction {
    /// Apply the action to the session, returning the events to emit.
    ///
    /// Returns nothing when the session moved on since scheduling (state no
    /// longer matches) — a fired timer must never resurrect a dead or
    /// already-moved session.
    pub fn apply(self, session: &mut Session) -> Vec<OutgoingEvent> {
        match self {
            Self::EntryStop => {
                if session.state != SessionState::Running {
                    return Vec::new();
                }
                let line = session.breakpoints.first_line().unwrap_or(1);
                session.stop_at(line);
                session.seed_entry_state();
                vec![OutgoingEvent::new(
                    "stopped",
                    json!({
                        "reason": "entry",
                        "threadId": THREAD_ID,
                        "line": line,
                        "text": "Entry point reached",
                        "preserveFocusHint": false,
                        "allThreadsStopped": false,
                    }),
                )]
            }
            Self::ContinueScan { from } => {
                if session.state != SessionState::Running {
                    return Vec::new();
                }
                let lines = session.breakpoints.lines();
                let mut cursor = from;
                while let Some(line) =
                    next_stop(cursor, &lines, session.last_line, StepKind::Continue)
                {
                    let hits = session.count_hit(line);
                    let breakpoint = session
                        .breakpoints
                        .get(line)
                        .cloned()
                        .unwrap_or_else(|| SourceBreakpoint::at(line));
                    if eval::condition_met(session, &breakpoint)
                        && hits >= eval::hit_threshold(&breakpoint)
                    {
                        session.stop_at(line);
                        let id = lines.iter().position(|&l| l == line).unwrap_or(0) + 1;
                        return vec![OutgoingEvent::new(
                            "stopped",
                            json!({
                                "reason": "breakpoint",
                                "threadId": THREAD_ID,
                                "line": line,
                                "hitBreakpointIds": [id],
                            }),
                        )];
                    }
                    cursor = Some(line);
                }
                // no breakpoint ahead: the script ran to completion
                session.terminate();
                vec![
                    OutgoingEvent::new("exited", json!({"exitCode": 0})),
                    OutgoingEvent::new("terminated", json!({})),
                ]
            }
            Self::StepStop { from } => {
                if session.state != SessionState::Paused {
                    return Vec::new();
                }
                let lines = session.breakpoints.lines();
                let line = next_stop(Some(from), &lines, session.last_line, StepKind::Step)
                    .unwrap_or(from);
                session.stop_at(line);
                session.refresh_rows();
                vec![OutgoingEvent::new(
                    "stopped",
                    json!({
                        "reason": "step",
                        "threadId": THREAD_ID,
                        "line": line,
                    }),
                )]
            }
        }
    }
}

/// What the dispatcher decided about one request
#[derive(Debug)]
pub struct CommandOutcome {
    /// Whether the response reports success
    pub success: bool,
    /// Failure explanation when `success` is false
    pub message: Option<String>,
    /// Response body
    pub body: Option<Value>,
    /// Events to emit immediately after the response, in order
    pub events: Vec<OutgoingEvent>,
    /// Actions to run later on the connection's timer
    pub scheduled: Vec<ScheduledAction>,
}

impl CommandOutcome {
    fn ack(body: Value) -> Self {
        Self { success: true, message: None, body: Some(body), events: Vec::new(), scheduled: Vec::new() }
    }

    fn invalid_state(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            body: None,
            events: Vec::new(),
            scheduled: Vec::new(),
        }
    }

    fn with_event(mut self, event: OutgoingEvent) -> Self {
        self.events.push(event);
        self
    }

    fn with_scheduled(mut self, delay: Duration, session: &Session, action: SessionAction) -> Self {
        self.scheduled.push(ScheduledAction { delay, epoch: session.epoch(), action });
        self
    }
}

/// Interpret one command against the session.
///
/// Business-rule validation happens here; the codec has already checked
/// shape. Unrecognized commands degrade to an empty success unless the
/// server was configured strict.
pub fn handle_command(
    session: &mut Session,
    config: &ServerConfig,
    request: &RequestFrame,
) -> CommandOutcome {
    let args = request.arguments.as_ref();
    debug!(command = %request.command, state = ?session.state, "handling command");

    match request.command.as_str() {
        "initialize" => {
            if session.is_terminal() {
                return CommandOutcome::invalid_state("session already terminated");
            }
            session.initialize();
            CommandOutcome::ack(json!(Capabilities::default()))
        }

        "setBreakpoints" => {
            if session.is_terminal() {
                return CommandOutcome::invalid_state("session already terminated");
            }
            let requested: Vec<SourceBreakpoint> = args
                .and_then(|a| a.get("breakpoints"))
                .and_then(|bps| serde_json::from_value(bps.clone()).ok())
                .unwrap_or_default();
            session.breakpoints.replace(requested);
            CommandOutcome::ack(json!({"breakpoints": session.breakpoints.verified()}))
        }

        "setExceptionBreakpoints" => CommandOutcome::ack(json!({})),

        "launch" | "attach" => {
            if session.is_terminal() {
                return CommandOutcome::invalid_state("session already terminated");
            }
            session.launch(args);
            CommandOutcome::ack(json!({})).with_event(OutgoingEvent::new("initialized", json!({})))
        }

        "configurationDone" => {
            if session.is_terminal() {
                return CommandOutcome::invalid_state("session already terminated");
            }
            session.configuration_done();
            CommandOutcome::ack(json!({})).with_scheduled(
                config.entry_delay,
                session,
                SessionAction::EntryStop,
            )
        }

        "continue" => {
            if session.is_terminal() {
                return CommandOutcome::invalid_state("session already terminated");
            }
            let from = session.current_line;
            session.resume();
            CommandOutcome::ack(json!({"allThreadsContinued": false})).with_scheduled(
                config.continue_delay,
                session,
                SessionAction::ContinueScan { from },
            )
        }

        "next" | "stepIn" | "stepOut" => {
            // stepIn/stepOut collapse onto next: the simulated engine has no
            // call-stack depth to enter or leave
            let Some(from) = session.current_line else {
                return CommandOutcome::invalid_state("session is not paused");
            };
            CommandOutcome::ack(json!({})).with_scheduled(
                config.step_delay,
                session,
                SessionAction::StepStop { from },
            )
        }

        "pause" => {
            if session.is_terminal() {
                return CommandOutcome::invalid_state("session already terminated");
            }
            session.pause_in_place();
            let line = session.current_line;
            CommandOutcome::ack(json!({})).with_event(OutgoingEvent::new(
                "stopped",
                json!({
                    "reason": "pause",
                    "threadId": THREAD_ID,
                    "line": line,
                }),
            ))
        }

        "threads" => CommandOutcome::ack(json!({"threads": session.threads()})),

        "stackTrace" => CommandOutcome::ack(json!({
            "stackFrames": session.call_stack(),
            "totalFrames": session.call_stack().len(),
        })),

        "scopes" => CommandOutcome::ack(json!({"scopes": variables::scopes(session)})),

        "variables" => {
            let reference = args
                .and_then(|a| a.get("variablesReference"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            CommandOutcome::ack(json!({"variables": variables::resolve(session, reference)}))
        }

        "evaluate" => {
            let expression =
                args.and_then(|a| a.get("expression")).and_then(Value::as_str).unwrap_or("");
            CommandOutcome::ack(json!({
                "result": eval::evaluate(session, expression),
                "type": "string",
                "variablesReference": 0,
                "presentationHint": {"kind": "code"},
            }))
        }

        "restart" => {
            if session.is_terminal() {
                return CommandOutcome::invalid_state("session already terminated");
            }
            session.restart();
            CommandOutcome::ack(json!({})).with_event(OutgoingEvent::new("initialized", json!({})))
        }

        "disconnect" | "terminate" => {
            session.terminate();
            CommandOutcome::ack(json!({}))
        }

        unknown => {
            if config.strict {
                CommandOutcome::invalid_state(format!("unsupported command '{unknown}'"))
            } else {
                debug!(command = %unknown, "acknowledging unrecognized command");
                CommandOutcome::ack(json!({}))
            }
        }
    }
}
