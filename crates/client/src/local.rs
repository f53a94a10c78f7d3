//! Offline step simulation.
//!
//! Lets the editor walk a script without any adapter connection, using the
//! same [`next_stop`] algorithm the adapter runs server-side, so offline and
//! connected stepping land on identical lines.

use sdb_common::{next_stop, StepKind};

/// A local, serverless stepping simulator over one script
#[derive(Debug, Clone)]
pub struct LocalStepper {
    current_line: Option<u32>,
    line_count: u32,
    breakpoints: Vec<u32>,
}

impl LocalStepper {
    /// Create a stepper for a script with `line_count` lines
    pub fn new(line_count: u32) -> Self {
        Self { current_line: None, line_count: line_count.max(1), breakpoints: Vec::new() }
    }

    /// Replace the breakpoint lines; deduplicated and sorted ascending
    pub fn set_breakpoints(&mut self, mut lines: Vec<u32>) {
        lines.sort_unstable();
        lines.dedup();
        self.breakpoints = lines;
    }

    /// Line the simulation is paused at, if any
    pub fn current_line(&self) -> Option<u32> {
        self.current_line
    }

    /// Whether a simulated run is in progress
    pub fn is_active(&self) -> bool {
        self.current_line.is_some()
    }

    /// Begin a run: pause at the first breakpoint, or at line 1
    pub fn start(&mut self) -> u32 {
        let line = self.breakpoints.first().copied().unwrap_or(1);
        self.current_line = Some(line);
        line
    }

    /// Advance one line, clamped to the end of the script
    pub fn step(&mut self) -> Option<u32> {
        let line = next_stop(self.current_line, &self.breakpoints, self.line_count, StepKind::Step);
        self.current_line = line;
        line
    }

    /// Run to the next breakpoint; `None` means the run finished and the
    /// stepper stopped
    pub fn continue_(&mut self) -> Option<u32> {
        let line =
            next_stop(self.current_line, &self.breakpoints, self.line_count, StepKind::Continue);
        self.current_line = line;
        line
    }

    /// End the run and clear the cursor
    pub fn stop(&mut self) {
        self.current_line = None;
    }
}
