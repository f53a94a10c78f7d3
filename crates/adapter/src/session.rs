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

//! The per-connection debug session.
//!
//! A [`Session`] is the mutable execution context behind one WebSocket
//! connection. It is owned exclusively by that connection's handler task;
//! no session state is shared across connections. The simulated engine
//! executes a SQL script line by line, so the whole execution model is a
//! line cursor, a breakpoint set, and the variable/row bindings visible
//! while paused.

use std::collections::HashMap;

use sdb_common::types::{BreakpointSet, StackFrame, Source, Thread, Variable};
use serde_json::{json, Value};

/// Thread id of the single simulated execution thread
pub const THREAD_ID: u64 = 1;
/// Name of the single simulated execution thread
pub const THREAD_NAME: &str = "SQL Thread";

/// Lifecycle states of a debug session.
///
/// `Terminated` is absorbing; every other state can reach it via
/// `disconnect`/`terminate` or connection close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No `initialize` request seen yet
    Uninitialized,
    /// Capabilities negotiated, waiting for `launch`
    Initialized,
    /// Launched, waiting for `configurationDone`
    Configuring,
    /// Simulated execution in flight
    Running,
    /// Stopped at a line; variables and stack are observable
    Paused,
    /// Torn down; only rejected or no-op commands from here on
    Terminated,
}

/// The mutable execution context of one debugging connection
#[derive(Debug)]
pub struct Session {
    /// Current lifecycle state
    pub state: SessionState,
    /// Line the session is paused at; `Some` iff `state == Paused`
    pub current_line: Option<u32>,
    /// Breakpoints for the script, unique by line, sorted ascending
    pub breakpoints: BreakpointSet,
    /// Variable bindings visible while paused
    variables: HashMap<String, Variable>,
    /// Simulated result rows backing the query scope
    rows: Vec<Value>,
    /// Synthetic call stack, topmost frame first
    call_stack: Vec<StackFrame>,
    /// Last line of the script; steps clamp here
    pub last_line: u32,
    /// Times each breakpoint line has been reached during `continue` scans
    hit_counts: HashMap<u32, u32>,
    /// Bumped on launch/restart/terminate; timers from an older epoch are stale
    epoch: u64,
    /// Bumped on every stop; variable references from older generations are dead
    generation: u64,
    /// References handed out to the client, tagged with their generation
    live_refs: HashMap<u64, u64>,
    /// Script path reported in stack frames
    program: String,
}

impl Session {
    /// Create a fresh session for a new connection
    pub fn new() -> Self {
        Self {
            state: SessionState::Uninitialized,
            current_line: None,
            breakpoints: BreakpointSet::new(),
            variables: HashMap::new(),
            rows: Vec::new(),
            call_stack: Vec::new(),
            last_line: u32::MAX,
            hit_counts: HashMap::new(),
            epoch: 0,
            generation: 0,
            live_refs: HashMap::new(),
            program: "/query.sql".to_string(),
        }
    }

    /// Whether the session has reached the absorbing state
    pub fn is_terminal(&self) -> bool {
        self.state == SessionState::Terminated
    }

    /// Epoch stamp for scheduled timers; a fired timer whose stamp no longer
    /// matches must not touch the session
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Current pause generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record `initialize`: capabilities negotiated
    pub fn initialize(&mut self) {
        self.state = SessionState::Initialized;
    }

    /// Record `launch`: reset the run state and wait for configuration.
    ///
    /// The breakpoint set survives the launch; breakpoints may arrive before
    /// or after it in the configuration sequence.
    pub fn launch(&mut self, arguments: Option<&Value>) {
        self.reset_run_state();
        if let Some(args) = arguments {
            if let Some(program) = args.get("program").and_then(Value::as_str) {
                self.program = program.to_string();
            }
            if let Some(lines) = args.get("lineCount").and_then(Value::as_u64) {
                self.last_line = lines.max(1) as u32;
            }
        }
        self.state = SessionState::Configuring;
        self.epoch += 1;
    }

    /// Record `restart`: back to the post-launch state, same script
    pub fn restart(&mut self) {
        self.reset_run_state();
        self.state = SessionState::Configuring;
        self.epoch += 1;
    }

    /// Record `configurationDone`: the first stop may now be scheduled
    pub fn configuration_done(&mut self) {
        self.state = SessionState::Running;
    }

    /// Resume simulated execution
    pub fn resume(&mut self) {
        self.state = SessionState::Running;
        self.current_line = None;
    }

    /// Stop at `line`: pause, rebuild the stack, invalidate old references
    pub fn stop_at(&mut self, line: u32) {
        self.state = SessionState::Paused;
        self.current_line = Some(line);
        self.call_stack = vec![StackFrame {
            id: 1,
            name: "executeSQL".to_string(),
            source: Source { name: script_name(&self.program), path: self.program.clone() },
            line,
            column: 1,
        }];
        self.generation += 1;
        self.live_refs.clear();
    }

    /// Pause in place without moving the cursor; a session that never
    /// stopped pauses at line 1
    pub fn pause_in_place(&mut self) {
        let line = self.current_line.unwrap_or(1);
        self.stop_at(line);
    }

    /// Tear the session down; absorbing
    pub fn terminate(&mut self) {
        self.state = SessionState::Terminated;
        self.current_line = None;
        self.call_stack.clear();
        self.live_refs.clear();
        self.epoch += 1;
    }

    fn reset_run_state(&mut self) {
        self.current_line = None;
        self.variables.clear();
        self.rows.clear();
        self.call_stack.clear();
        self.hit_counts.clear();
        self.live_refs.clear();
    }

    /// Bind the simulated variables and rows seen at the entry stop
    pub fn seed_entry_state(&mut self) {
        self.add_variable("query", "SELECT * FROM users", "string");
        self.add_variable("connection", "localhost:5432", "string");
        self.set_rows(vec![
            json!({"id": 1, "name": "Alice"}),
            json!({"id": 2, "name": "Bob"}),
        ]);
    }

    /// Refresh the simulated rows after a step, as if another statement ran
    pub fn refresh_rows(&mut self) {
        self.set_rows(vec![
            json!({"id": 1, "name": "Alice", "email": "alice@example.com"}),
            json!({"id": 2, "name": "Bob", "email": "bob@example.com"}),
            json!({"id": 3, "name": "Charlie", "email": "charlie@example.com"}),
        ]);
    }

    fn set_rows(&mut self, rows: Vec<Value>) {
        let execution_time = format!("{}ms", 35 + 5 * rows.len());
        self.add_variable("rows", rows.len().to_string(), "integer");
        self.add_variable("execution_time", execution_time, "string");
        self.rows = rows;
    }

    /// Bind a terminal variable
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        ty: impl Into<String>,
    ) {
        let name = name.into();
        self.variables.insert(name.clone(), Variable::terminal(name, value, ty));
    }

    /// Value of a bound variable, if any
    pub fn variable_value(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(|v| v.value.as_str())
    }

    /// All bound variables, name-sorted for stable output
    pub fn sorted_variables(&self) -> Vec<Variable> {
        let mut vars: Vec<Variable> = self.variables.values().cloned().collect();
        vars.sort_by(|a, b| a.name.cmp(&b.name));
        vars
    }

    /// Simulated result rows
    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    /// The synthetic call stack, topmost frame first
    pub fn call_stack(&self) -> &[StackFrame] {
        &self.call_stack
    }

    /// The fixed single-thread list
    pub fn threads(&self) -> Vec<Thread> {
        vec![Thread { id: THREAD_ID, name: THREAD_NAME.to_string() }]
    }

    /// Count one more arrival at a breakpoint line, returning the new total
    pub fn count_hit(&mut self, line: u32) -> u32 {
        let hits = self.hit_counts.entry(line).or_insert(0);
        *hits += 1;
        *hits
    }

    /// Hand a variables reference out to the client, valid for the current
    /// pause generation only
    pub fn mint_reference(&mut self, reference: u64) {
        self.live_refs.insert(reference, self.generation);
    }

    /// Whether a reference was minted in the current pause generation
    pub fn reference_is_live(&self, reference: u64) -> bool {
        self.live_refs.get(&reference) == Some(&self.generation)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn script_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdb_common::types::SourceBreakpoint;

    #[test]
    fn test_current_line_tracks_paused_state() {
        let mut session = Session::new();
        assert_eq!(session.current_line, None);

        session.initialize();
        session.launch(None);
        session.configuration_done();
        assert_eq!(session.current_line, None);

        session.stop_at(5);
        assert_eq!(session.state, SessionState::Paused);
        assert_eq!(session.current_line, Some(5));

        session.resume();
        assert_eq!(session.current_line, None);

        session.terminate();
        assert_eq!(session.current_line, None);
    }

    #[test]
    fn test_launch_preserves_breakpoints() {
        let mut session = Session::new();
        session.initialize();
        session.breakpoints.replace(vec![SourceBreakpoint::at(5), SourceBreakpoint::at(9)]);
        session.launch(None);
        assert_eq!(session.breakpoints.lines(), vec![5, 9]);
    }

    #[test]
    fn test_launch_reads_program_and_line_count() {
        let mut session = Session::new();
        session.initialize();
        session.launch(Some(&serde_json::json!({
            "program": "/scripts/report.sql",
            "lineCount": 42,
        })));
        assert_eq!(session.last_line, 42);
        session.stop_at(3);
        let frame = &session.call_stack()[0];
        assert_eq!(frame.source.path, "/scripts/report.sql");
        assert_eq!(frame.source.name, "report.sql");
    }

    #[test]
    fn test_stop_invalidates_prior_references() {
        let mut session = Session::new();
        session.stop_at(3);
        session.mint_reference(1000);
        assert!(session.reference_is_live(1000));

        session.stop_at(4);
        assert!(!session.reference_is_live(1000));
    }

    #[test]
    fn test_pause_before_first_stop_lands_on_line_one() {
        let mut session = Session::new();
        session.initialize();
        session.launch(None);
        session.configuration_done();
        session.pause_in_place();
        assert_eq!(session.current_line, Some(1));
    }

    #[test]
    fn test_entry_state_binds_query_variables() {
        let mut session = Session::new();
        session.seed_entry_state();
        assert_eq!(session.variable_value("query"), Some("SELECT * FROM users"));
        assert_eq!(session.variable_value("rows"), Some("2"));
        assert_eq!(session.rows().len(), 2);
    }

    #[test]
    fn test_step_refresh_grows_rows() {
        let mut session = Session::new();
        session.seed_entry_state();
        session.refresh_rows();
        assert_eq!(session.rows().len(), 3);
        assert_eq!(session.variable_value("rows"), Some("3"));
    }

    #[test]
    fn test_hit_counting() {
        let mut session = Session::new();
        assert_eq!(session.count_hit(5), 1);
        assert_eq!(session.count_hit(5), 2);
        assert_eq!(session.count_hit(9), 1);
    }
}
