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

//! Variable, scope and call-stack value types.
//!
//! Variables form a lazy two-level tree: a scope hands out a
//! `variablesReference`, and the variables behind it are only fetched when a
//! client asks for that reference. A reference of `0` marks a terminal value
//! with nothing to expand.

use serde::{Deserialize, Serialize};

/// Reference handed out for the flat locals scope
pub const LOCALS_REFERENCE: u64 = 1000;
/// Reference handed out for the SQL query (result-row) scope
pub const QUERY_REFERENCE: u64 = 2000;
/// Base reference for per-row synthetic entries; row *i* gets `ROW_REFERENCE_BASE + i`
pub const ROW_REFERENCE_BASE: u64 = 3000;

/// A named value visible while the session is paused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Variable name
    pub name: String,
    /// Rendered value
    pub value: String,
    /// Value type label (`string`, `integer`, `object`, ...)
    #[serde(rename = "type")]
    pub ty: String,
    /// Handle for fetching children; `0` means not expandable
    pub variables_reference: u64,
}

impl Variable {
    /// Create a terminal (non-expandable) variable
    pub fn terminal(name: impl Into<String>, value: impl Into<String>, ty: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), ty: ty.into(), variables_reference: 0 }
    }
}

/// A named group of variables, fetched lazily via its reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    /// Scope name shown to the user
    pub name: String,
    /// Handle the client passes to `variables` to fetch the scope's content
    pub variables_reference: u64,
    /// Whether fetching this scope is costly
    pub expensive: bool,
    /// Rendering hint (`locals`, `registers`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_hint: Option<String>,
}

/// The script a stack frame points into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Display name
    pub name: String,
    /// Path of the script
    pub path: String,
}

/// One frame of the (synthetic) call stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Frame identifier
    pub id: u64,
    /// Frame name shown in the stack view
    pub name: String,
    /// Script the frame executes
    pub source: Source,
    /// Current line within the script (1-based)
    pub line: u32,
    /// Current column within the line (1-based)
    pub column: u32,
}

/// An execution thread; the simulated engine always reports exactly one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Thread identifier
    pub id: u64,
    /// Thread name
    pub name: String,
}

/// Why a `stopped` event was emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopReason {
    /// First stop after configuration finished
    Entry,
    /// A breakpoint was hit
    Breakpoint,
    /// A step command completed
    Step,
    /// An explicit pause request
    Pause,
}

/// Capability flags negotiated during `initialize`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// The adapter expects a `configurationDone` request
    pub supports_configuration_done_request: bool,
    /// `evaluate` may be used for editor hovers
    pub supports_evaluate_for_hovers: bool,
    /// Breakpoints may carry condition expressions
    pub supports_conditional_breakpoints: bool,
    /// Breakpoints may carry hit-count conditions
    pub supports_hit_conditional_breakpoints: bool,
    /// Variables can be modified from the client
    pub supports_set_variable: bool,
    /// Function breakpoints are not simulated
    pub supports_function_breakpoints: bool,
    /// Data breakpoints are not simulated
    pub supports_data_breakpoints: bool,
    /// The adapter answers breakpoint-location queries
    pub supports_breakpoint_locations_request: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            supports_configuration_done_request: true,
            supports_evaluate_for_hovers: true,
            supports_conditional_breakpoints: true,
            supports_hit_conditional_breakpoints: true,
            supports_set_variable: true,
            supports_function_breakpoints: false,
            supports_data_breakpoints: false,
            supports_breakpoint_locations_request: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_variable_has_zero_reference() {
        let var = Variable::terminal("rows", "2", "integer");
        assert_eq!(var.variables_reference, 0);
        let json = serde_json::to_string(&var).unwrap();
        assert!(json.contains("\"variablesReference\":0"));
        assert!(json.contains("\"type\":\"integer\""));
    }

    #[test]
    fn test_scope_serialization() {
        let scope = Scope {
            name: "Local".to_string(),
            variables_reference: LOCALS_REFERENCE,
            expensive: false,
            presentation_hint: Some("locals".to_string()),
        };
        let json = serde_json::to_string(&scope).unwrap();
        assert!(json.contains("\"variablesReference\":1000"));
        assert!(json.contains("\"presentationHint\":\"locals\""));
    }

    #[test]
    fn test_stop_reason_wire_names() {
        assert_eq!(serde_json::to_string(&StopReason::Entry).unwrap(), "\"entry\"");
        assert_eq!(serde_json::to_string(&StopReason::Breakpoint).unwrap(), "\"breakpoint\"");
        assert_eq!(serde_json::to_string(&StopReason::Step).unwrap(), "\"step\"");
        assert_eq!(serde_json::to_string(&StopReason::Pause).unwrap(), "\"pause\"");
    }

    #[test]
    fn test_default_capabilities() {
        let caps = Capabilities::default();
        assert!(caps.supports_configuration_done_request);
        assert!(caps.supports_conditional_breakpoints);
        assert!(!caps.supports_function_breakpoints);
        let json = serde_json::to_string(&caps).unwrap();
        assert!(json.contains("\"supportsConfigurationDoneRequest\":true"));
        assert!(json.contains("\"supportsDataBreakpoints\":false"));
    }
}
