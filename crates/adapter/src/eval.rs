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

//! Expression evaluation against the session's bindings.
//!
//! `evaluate` requests pattern-match a small set of known tokens; breakpoint
//! conditions are single comparisons checked deterministically against the
//! bound variable values. There is no coin flip anywhere: the same session
//! state always produces the same verdict.

use sdb_common::{parse_comparison, types::SourceBreakpoint};

use crate::session::Session;

/// Evaluate a watch/hover/REPL expression.
///
/// Known tokens resolve to live session state; anything else echoes back,
/// so a client never sees an evaluation error from the mock engine.
pub fn evaluate(session: &Session, expression: &str) -> String {
    let expr = expression.trim();
    if expr.contains("rowcount") {
        session.rows().len().to_string()
    } else if expr.contains("current") {
        session.current_line.unwrap_or(0).to_string()
    } else if let Some(value) = session.variable_value(expr) {
        value.to_string()
    } else {
        format!("Evaluated: {expr}")
    }
}

/// Whether a breakpoint's condition holds in the current session state.
///
/// A breakpoint without a condition always triggers. A condition that does
/// not parse as a comparison, or that names an unbound variable, is treated
/// as met: stopping on a breakpoint the user asked for beats silently
/// running past it.
pub fn condition_met(session: &Session, breakpoint: &SourceBreakpoint) -> bool {
    let Some(condition) = &breakpoint.condition else {
        return true;
    };
    let Some(comparison) = parse_comparison(condition) else {
        return true;
    };
    match session.variable_value(&comparison.name) {
        Some(actual) => comparison.holds_for(actual),
        None => true,
    }
}

/// Minimum number of arrivals before a breakpoint triggers.
///
/// Parsed from the breakpoint's `hitCondition`; absent or unparsable hit
/// conditions mean "trigger on the first arrival".
pub fn hit_threshold(breakpoint: &SourceBreakpoint) -> u32 {
    breakpoint
        .hit_condition
        .as_deref()
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .map(|n| n.max(1))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_bindings() -> Session {
        let mut session = Session::new();
        session.stop_at(7);
        session.seed_entry_state();
        session
    }

    #[test]
    fn test_evaluate_rowcount() {
        let session = session_with_bindings();
        assert_eq!(evaluate(&session, "rowcount"), "2");
        assert_eq!(evaluate(&session, "select rowcount"), "2");
    }

    #[test]
    fn test_evaluate_current_line() {
        let session = session_with_bindings();
        assert_eq!(evaluate(&session, "current"), "7");
    }

    #[test]
    fn test_evaluate_current_line_defaults_to_zero_when_running() {
        let mut session = session_with_bindings();
        session.resume();
        assert_eq!(evaluate(&session, "current"), "0");
    }

    #[test]
    fn test_evaluate_named_variable() {
        let session = session_with_bindings();
        assert_eq!(evaluate(&session, "query"), "SELECT * FROM users");
        assert_eq!(evaluate(&session, "connection"), "localhost:5432");
    }

    #[test]
    fn test_evaluate_falls_back_to_echo() {
        let session = session_with_bindings();
        assert_eq!(evaluate(&session, "no_such_thing"), "Evaluated: no_such_thing");
    }

    #[test]
    fn test_unconditional_breakpoint_triggers() {
        let session = session_with_bindings();
        assert!(condition_met(&session, &SourceBreakpoint::at(5)));
    }

    #[test]
    fn test_condition_is_deterministic_against_bindings() {
        let session = session_with_bindings();
        // "rows" is bound to "2" at the entry stop
        assert!(condition_met(&session, &SourceBreakpoint::at(5).with_condition("rows >= 2")));
        assert!(!condition_met(&session, &SourceBreakpoint::at(5).with_condition("rows > 2")));
        assert!(condition_met(
            &session,
            &SourceBreakpoint::at(5).with_condition("query == 'SELECT * FROM users'")
        ));
    }

    #[test]
    fn test_unparsable_condition_is_treated_as_met() {
        let session = session_with_bindings();
        assert!(condition_met(&session, &SourceBreakpoint::at(5).with_condition("garbage")));
    }

    #[test]
    fn test_unknown_variable_is_treated_as_met() {
        let session = session_with_bindings();
        assert!(condition_met(&session, &SourceBreakpoint::at(5).with_condition("ghost > 3")));
    }

    #[test]
    fn test_hit_threshold_parsing() {
        assert_eq!(hit_threshold(&SourceBreakpoint::at(5)), 1);

        let mut bp = SourceBreakpoint::at(5);
        bp.hit_condition = Some("3".to_string());
        assert_eq!(hit_threshold(&bp), 3);

        bp.hit_condition = Some("0".to_string());
        assert_eq!(hit_threshold(&bp), 1);

        bp.hit_condition = Some("whenever".to_string());
        assert_eq!(hit_threshold(&bp), 1);
    }
}
