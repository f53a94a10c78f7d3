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

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::normalize_expression;

/// A breakpoint as requested by the client in `setBreakpoints`.
///
/// Identified by line number; the condition must evaluate to true for the
/// breakpoint to trigger, and the hit condition gates triggering on how many
/// times the line has been reached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBreakpoint {
    /// Line number in the script (1-based)
    pub line: u32,
    /// Optional condition expression gating the breakpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Optional minimum hit count before the breakpoint triggers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_condition: Option<String>,
}

impl SourceBreakpoint {
    /// Create an unconditional breakpoint at the given line
    pub fn at(line: u32) -> Self {
        Self { line, condition: None, hit_condition: None }
    }

    /// Attach a condition expression, normalizing its whitespace
    pub fn with_condition(mut self, condition: &str) -> Self {
        self.condition = Some(normalize_expression(condition));
        self
    }
}

impl Display for SourceBreakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.line)?;
        if let Some(cond) = &self.condition {
            write!(f, " if {cond}")?;
        }
        Ok(())
    }
}

/// A breakpoint as echoed back to the client, carrying verification status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    /// Line number the breakpoint was bound to
    pub line: u32,
    /// Whether the adapter accepted the breakpoint
    pub verified: bool,
    /// Condition carried over from the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Hit condition carried over from the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_condition: Option<String>,
}

/// The breakpoint set of one session: unique by line, kept sorted ascending.
///
/// Replacing the set with entries containing duplicate lines keeps the most
/// recently supplied condition and hit condition for that line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakpointSet {
    entries: Vec<SourceBreakpoint>,
}

impl BreakpointSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole set, deduplicating by line (last entry wins) and
    /// sorting ascending
    pub fn replace(&mut self, breakpoints: Vec<SourceBreakpoint>) {
        let mut entries: Vec<SourceBreakpoint> = Vec::with_capacity(breakpoints.len());
        for bp in breakpoints {
            if let Some(existing) = entries.iter_mut().find(|e| e.line == bp.line) {
                *existing = bp;
            } else {
                entries.push(bp);
            }
        }
        entries.sort_by_key(|bp| bp.line);
        self.entries = entries;
    }

    /// All breakpoint lines, ascending
    pub fn lines(&self) -> Vec<u32> {
        self.entries.iter().map(|bp| bp.line).collect()
    }

    /// The breakpoint bound at `line`, if any
    pub fn get(&self, line: u32) -> Option<&SourceBreakpoint> {
        self.entries.iter().find(|bp| bp.line == line)
    }

    /// Iterate the set in ascending line order
    pub fn iter(&self) -> impl Iterator<Item = &SourceBreakpoint> {
        self.entries.iter()
    }

    /// Number of breakpoints in the set
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Smallest breakpoint line, if any breakpoint is set
    pub fn first_line(&self) -> Option<u32> {
        self.entries.first().map(|bp| bp.line)
    }

    /// Project the set into verified wire breakpoints for the
    /// `setBreakpoints` response
    pub fn verified(&self) -> Vec<Breakpoint> {
        self.entries
            .iter()
            .map(|bp| Breakpoint {
                line: bp.line,
                verified: true,
                condition: bp.condition.clone(),
                hit_condition: bp.hit_condition.clone(),
            })
            .collect()
    }
}
