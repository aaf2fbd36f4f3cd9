//! Bounded undo/redo history over whole-document snapshots.
//!
//! Callers record the document *before* mutating it. `undo` then swaps the
//! live document with the most recent snapshot, parking the live one on the
//! redo stack. Recording anything new clears the redo stack.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use crate::consts::HISTORY_LIMIT;
use crate::doc::Document;

/// Undo/redo stacks of immutable document copies.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Document>,
    future: Vec<Document>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(HISTORY_LIMIT)
    }
}

impl History {
    /// Create a history keeping at most `limit` undo entries (minimum 1).
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { past: VecDeque::new(), future: Vec::new(), limit: limit.max(1) }
    }

    /// Push a copy of `doc` as an undo point and drop any redo entries.
    pub fn record(&mut self, doc: &Document) {
        self.past.push_back(doc.clone());
        self.future.clear();
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
    }

    /// Restore the previous snapshot into `doc`. Returns false if there is none.
    pub fn undo(&mut self, doc: &mut Document) -> bool {
        let Some(prev) = self.past.pop_back() else {
            return false;
        };
        self.future.push(std::mem::replace(doc, prev));
        true
    }

    /// Re-apply the most recently undone snapshot. Returns false if there is none.
    pub fn redo(&mut self, doc: &mut Document) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        self.past.push_back(std::mem::replace(doc, next));
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        true
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of undo entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.past.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.past.is_empty()
    }
}
