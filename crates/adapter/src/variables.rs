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

//! Lazy scope/variable projection.
//!
//! Scopes hand out opaque `variablesReference` handles; the variables behind
//! a handle are materialized only when the client asks for that handle. A
//! handle is valid for one pause generation: after the next `stopped` event
//! it resolves to an empty list rather than stale data (or an error).

use sdb_common::types::{
    Scope, Variable, LOCALS_REFERENCE, QUERY_REFERENCE, ROW_REFERENCE_BASE,
};
use serde_json::Value;

use crate::session::Session;

/// The fixed two scopes of a paused session, minting their references for
/// the current pause generation
pub fn scopes(session: &mut Session) -> Vec<Scope> {
    session.mint_reference(LOCALS_REFERENCE);
    session.mint_reference(QUERY_REFERENCE);
    vec![
        Scope {
            name: "Local".to_string(),
            variables_reference: LOCALS_REFERENCE,
            expensive: false,
            presentation_hint: Some("locals".to_string()),
        },
        Scope {
            name: "SQL Query".to_string(),
            variables_reference: QUERY_REFERENCE,
            expensive: false,
            presentation_hint: Some("registers".to_string()),
        },
    ]
}

/// Resolve a `variablesReference` to its variable list.
///
/// References from a previous pause generation, and references that were
/// never handed out, resolve to an empty list.
pub fn resolve(session: &mut Session, reference: u64) -> Vec<Variable> {
    if !session.reference_is_live(reference) {
        return Vec::new();
    }

    if reference == LOCALS_REFERENCE {
        session.sorted_variables()
    } else if reference == QUERY_REFERENCE {
        let rows: Vec<Value> = session.rows().to_vec();
        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                let row_reference = ROW_REFERENCE_BASE + index as u64;
                session.mint_reference(row_reference);
                Variable {
                    name: format!("row_{index}"),
                    value: row.to_string(),
                    ty: "object".to_string(),
                    variables_reference: row_reference,
                }
            })
            .collect()
    } else if reference >= ROW_REFERENCE_BASE {
        let index = (reference - ROW_REFERENCE_BASE) as usize;
        session
            .rows()
            .get(index)
            .and_then(Value::as_object)
            .map(|columns| {
                columns
                    .iter()
                    .map(|(name, value)| column_variable(name, value))
                    .collect()
            })
            .unwrap_or_default()
    } else {
        Vec::new()
    }
}

fn column_variable(name: &str, value: &Value) -> Variable {
    let ty = match value {
        Value::Number(_) => "integer",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
        _ => "string",
    };
    let rendered = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Variable::terminal(name, rendered, ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paused_session() -> Session {
        let mut session = Session::new();
        session.initialize();
        session.launch(None);
        session.configuration_done();
        session.stop_at(1);
        session.seed_entry_state();
        session
    }

    #[test]
    fn test_scopes_are_fixed() {
        let mut session = paused_session();
        let scopes = scopes(&mut session);
        assert_eq!(scopes.len(), 2);
        assert_eq!(scopes[0].name, "Local");
        assert_eq!(scopes[0].variables_reference, LOCALS_REFERENCE);
        assert_eq!(scopes[1].name, "SQL Query");
        assert_eq!(scopes[1].variables_reference, QUERY_REFERENCE);
    }

    #[test]
    fn test_locals_resolve_to_flat_list() {
        let mut session = paused_session();
        scopes(&mut session);
        let vars = resolve(&mut session, LOCALS_REFERENCE);
        let names: Vec<&str> = vars.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["connection", "execution_time", "query", "rows"]);
        assert!(vars.iter().all(|v| v.variables_reference == 0));
    }

    #[test]
    fn test_query_scope_resolves_to_rows() {
        let mut session = paused_session();
        scopes(&mut session);
        let vars = resolve(&mut session, QUERY_REFERENCE);
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].name, "row_0");
        assert_eq!(vars[0].variables_reference, ROW_REFERENCE_BASE);
        assert_eq!(vars[1].variables_reference, ROW_REFERENCE_BASE + 1);
    }

    #[test]
    fn test_row_reference_resolves_to_columns() {
        let mut session = paused_session();
        scopes(&mut session);
        resolve(&mut session, QUERY_REFERENCE);
        let columns = resolve(&mut session, ROW_REFERENCE_BASE);
        let names: Vec<&str> = columns.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert!(columns.iter().all(|v| v.variables_reference == 0));
    }

    #[test]
    fn test_stale_reference_resolves_to_empty() {
        let mut session = paused_session();
        scopes(&mut session);
        assert!(!resolve(&mut session, LOCALS_REFERENCE).is_empty());

        // a new stop invalidates everything handed out before it
        session.stop_at(2);
        assert!(resolve(&mut session, LOCALS_REFERENCE).is_empty());
        assert!(resolve(&mut session, QUERY_REFERENCE).is_empty());
    }

    #[test]
    fn test_unknown_reference_resolves_to_empty() {
        let mut session = paused_session();
        assert!(resolve(&mut session, 999).is_empty());
        assert!(resolve(&mut session, ROW_REFERENCE_BASE + 50).is_empty());
    }
}
