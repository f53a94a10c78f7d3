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

//! Condition-expression helpers.
//!
//! Breakpoint conditions are single comparisons of the form
//! `<variable> <op> <literal>`. The adapter evaluates them against the
//! session's variable bindings; anything it cannot parse is treated as met,
//! so a typo stops execution instead of silently running past a breakpoint.

/// Normalize an expression by replacing any contiguous whitespace with a single space
pub fn normalize_expression(expr: &str) -> String {
    expr.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Comparison operator of a condition expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

/// A parsed condition: `name op literal`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// Variable name on the left-hand side
    pub name: String,
    /// Comparison operator
    pub op: CmpOp,
    /// Right-hand-side literal, quotes stripped
    pub literal: String,
}

// Two-character operators must be tried before their one-character prefixes.
const OPERATORS: &[(&str, CmpOp)] = &[
    ("==", CmpOp::Eq),
    ("!=", CmpOp::Ne),
    (">=", CmpOp::Ge),
    ("<=", CmpOp::Le),
    (">", CmpOp::Gt),
    ("<", CmpOp::Lt),
];

/// Parse a condition expression into a [`Comparison`].
///
/// Returns `None` when the expression is not a single comparison with a
/// non-empty variable name and literal.
pub fn parse_comparison(expr: &str) -> Option<Comparison> {
    let expr = normalize_expression(expr);
    for (symbol, op) in OPERATORS {
        if let Some(pos) = expr.find(symbol) {
            let name = expr[..pos].trim();
            let literal = expr[pos + symbol.len()..].trim();
            if name.is_empty() || literal.is_empty() {
                return None;
            }
            return Some(Comparison {
                name: name.to_string(),
                op: *op,
                literal: strip_quotes(literal).to_string(),
            });
        }
    }
    None
}

fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if s.len() >= 2 && (bytes[0] == b'\'' || bytes[0] == b'"') && bytes[s.len() - 1] == bytes[0] {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

impl Comparison {
    /// Evaluate the comparison against an actual value.
    ///
    /// When both sides parse as numbers the comparison is numeric,
    /// otherwise lexicographic on the raw strings.
    pub fn holds_for(&self, actual: &str) -> bool {
        let ordering = match (actual.parse::<f64>(), self.literal.parse::<f64>()) {
            (Ok(lhs), Ok(rhs)) => lhs.partial_cmp(&rhs),
            _ => Some(actual.cmp(self.literal.as_str())),
        };
        let Some(ordering) = ordering else {
            // NaN on either side compares unequal to everything
            return self.op == CmpOp::Ne;
        };
        match self.op {
            CmpOp::Eq => ordering.is_eq(),
            CmpOp::Ne => ordering.is_ne(),
            CmpOp::Gt => ordering.is_gt(),
            CmpOp::Ge => ordering.is_ge(),
            CmpOp::Lt => ordering.is_lt(),
            CmpOp::Le => ordering.is_le(),
        }
    }
}
