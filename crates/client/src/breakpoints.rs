//! Breakpoint bookkeeping for editor integration.
//!
//! The editor reports gutter clicks as line numbers; this manager holds the
//! marked lines (with optional conditions) and renders them back as an
//! ordered list, both for decoration updates and for `setBreakpoints`
//! requests. Shared between UI callbacks via cheap clones.

use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;
use sdb_common::types::SourceBreakpoint;

/// Shared breakpoint manager for the editor-facing side of a session
#[derive(Debug, Clone, Default)]
pub struct BreakpointManager {
    /// Marked lines (1-based) with their optional conditions
    marks: Arc<RwLock<BTreeMap<u32, Option<String>>>>,
}

impl BreakpointManager {
    /// Create a new breakpoint manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a line; keeps an existing condition if the line is already set
    pub fn add(&self, line: u32) {
        self.marks.write().entry(line).or_insert(None);
    }

    /// Mark a line with a condition, replacing any earlier condition
    pub fn add_conditional(&self, line: u32, condition: impl Into<String>) {
        self.marks.write().insert(line, Some(condition.into()));
    }

    /// Unmark a line; returns whether it was marked
    pub fn remove(&self, line: u32) -> bool {
        self.marks.write().remove(&line).is_some()
    }

    /// Toggle a line; returns whether the line is marked afterwards
    pub fn toggle(&self, line: u32) -> bool {
        let mut marks = self.marks.write();
        if marks.remove(&line).is_some() {
            false
        } else {
            marks.insert(line, None);
            true
        }
    }

    /// Whether a line is marked
    pub fn has(&self, line: u32) -> bool {
        self.marks.read().contains_key(&line)
    }

    /// All marked lines, ascending
    pub fn lines(&self) -> Vec<u32> {
        self.marks.read().keys().copied().collect()
    }

    /// Number of marked lines
    pub fn count(&self) -> usize {
        self.marks.read().len()
    }

    /// Drop every mark
    pub fn clear(&self) {
        self.marks.write().clear();
    }

    /// Render the marks as wire breakpoints for a `setBreakpoints` request
    pub fn to_source_breakpoints(&self) -> Vec<SourceBreakpoint> {
        self.marks
            .read()
            .iter()
            .map(|(&line, condition)| match condition {
                Some(condition) => SourceBreakpoint::at(line).with_condition(condition),
                None => SourceBreakpoint::at(line),
            })
            .collect()
    }
}
