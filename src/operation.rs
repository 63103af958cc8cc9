//! Edit script construction.

use crate::matcher::Match;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Equal,
    Insert,
    Delete,
    Replace,
}

/// Half-open token ranges on both sides. Insert has an empty old range,
/// Delete an empty new range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Operation {
    pub action: Action,
    pub start_in_old: usize,
    pub end_in_old: usize,
    pub start_in_new: usize,
    pub end_in_new: usize,
}

impl Operation {
    pub fn new(action: Action, start_in_old: usize, end_in_old: usize, start_in_new: usize, end_in_new: usize) -> Self {
        Self { action, start_in_old, end_in_old, start_in_new, end_in_new }
    }

    /// Tokens this operation covers in `old_words`
    pub fn old_slice<'w>(&self, old_words: &'w [String]) -> &'w [String] {
        &old_words[self.start_in_old..self.end_in_old]
    }

    /// Tokens this operation covers in `new_words`
    pub fn new_slice<'w>(&self, new_words: &'w [String]) -> &'w [String] {
        &new_words[self.start_in_new..self.end_in_new]
    }
}

/// Turn an ordered match list (ending with the sentinel) into operations
/// that cover both token streams exactly once, in order.
pub fn build_operations(matches: &[Match]) -> Vec<Operation> {
    let mut operations = Vec::with_capacity(matches.len() * 2);
    let mut position_in_old = 0;
    let mut position_in_new = 0;

    for m in matches {
        let at_old = position_in_old == m.start_in_old;
        let at_new = position_in_new == m.start_in_new;

        let gap = match (at_old, at_new) {
            (false, false) => Some(Action::Replace),
            (true, false) => Some(Action::Insert),
            (false, true) => Some(Action::Delete),
            // leading words are the same in both versions
            (true, true) => None,
        };

        if let Some(action) = gap {
            operations.push(Operation::new(
                action,
                position_in_old,
                m.start_in_old,
                position_in_new,
                m.start_in_new,
            ));
        }

        if m.size > 0 {
            operations.push(Operation::new(
                Action::Equal,
                m.start_in_old,
                m.end_in_old(),
                m.start_in_new,
                m.end_in_new(),
            ));
        }

        position_in_old = m.end_in_old();
        position_in_new = m.end_in_new();
    }

    operations
}
