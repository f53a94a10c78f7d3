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

//! The stepping algorithm: where execution stops next.
//!
//! Both the adapter's session machine and the client's offline stepper
//! advance the simulated line cursor through this one function, so the two
//! sides can never disagree about where a command lands.

/// How the cursor is being advanced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Run to the next breakpoint, or to completion
    Continue,
    /// Advance exactly one line, ignoring breakpoints
    Step,
}

/// Compute the next stop line.
///
/// `breakpoint_lines` must be sorted ascending and unique by line (the
/// shape [`crate::types::BreakpointSet::lines`] produces).
///
/// - [`StepKind::Continue`] stops at the smallest breakpoint line strictly
///   greater than `current` (a cursor that never ran counts as line 0).
///   `None` means execution ran to completion.
/// - [`StepKind::Step`] advances exactly one line, clamped to `last_line`,
///   regardless of breakpoint placement.
pub fn next_stop(
    current: Option<u32>,
    breakpoint_lines: &[u32],
    last_line: u32,
    op: StepKind,
) -> Option<u32> {
    match op {
        StepKind::Continue => {
            let cursor = current.unwrap_or(0);
            breakpoint_lines.iter().copied().find(|&line| line > cursor)
        }
        StepKind::Step => Some((current.unwrap_or(1) + 1).min(last_line)),
    }
}
