//! # Undo/Redo History
//!
//! Step batches recorded per transaction.
//!
//! - Each batch keeps its steps and their inverses (in undo order)
//! - Undo applies the inverses and moves the batch to the redo stack
//! - Redo reapplies the steps
//! - A new batch clears the redo stack
//! - Depth is bounded; the oldest batch is dropped first

use crate::error::StepError;
use crate::node::Node;
use crate::selection::Selection;
use crate::transform::{Step, Transaction};

/// Depth used when none is configured
pub const DEFAULT_DEPTH: usize = 100;

/// Steps of one transaction, undone and redone together
#[derive(Debug, Clone)]
pub struct StepBatch {
    /// Steps in application order
    pub steps: Vec<Step>,

    /// Inverses in undo order (reverse of `steps`)
    pub inverses: Vec<Step>,

    pub selection_before: Selection,
    pub selection_after: Selection,

    pub description: Option<String>,
}

impl StepBatch {
    pub fn from_transaction(tr: &Transaction) -> Self {
        Self {
            steps: tr.steps().to_vec(),
            inverses: tr.inverses().iter().rev().cloned().collect(),
            selection_before: tr.selection_before().clone(),
            selection_after: tr.selection(),
            description: tr.get_meta("description").map(str::to_string),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Bounded undo/redo stacks
#[derive(Debug, Clone)]
pub struct History {
    /// Applied batches (most recent last)
    undo_stack: Vec<StepBatch>,

    /// Undone batches (most recent last)
    redo_stack: Vec<StepBatch>,

    /// Maximum number of undo levels (0 = unlimited)
    max_depth: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_depth(DEFAULT_DEPTH)
    }

    pub fn with_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Record a batch. Clears the redo stack.
    pub fn push(&mut self, batch: StepBatch) {
        if batch.steps.is_empty() {
            return;
        }
        self.undo_stack.push(batch);

        if self.max_depth > 0 && self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }

        self.redo_stack.clear();
    }

    /// Undo the most recent batch against `doc`. Returns the restored document
    /// and selection, or `None` when there is nothing to undo. On a step
    /// failure the stacks are left untouched.
    pub fn undo(&mut self, doc: &Node) -> Result<Option<(Node, Selection)>, StepError> {
        let Some(batch) = self.undo_stack.last() else {
            return Ok(None);
        };
        let restored = replay(doc, &batch.inverses)?;
        let selection = batch.selection_before.clone();
        if let Some(batch) = self.undo_stack.pop() {
            self.redo_stack.push(batch);
        }
        Ok(Some((restored, selection)))
    }

    /// Redo the most recently undone batch against `doc`
    pub fn redo(&mut self, doc: &Node) -> Result<Option<(Node, Selection)>, StepError> {
        let Some(batch) = self.redo_stack.last() else {
            return Ok(None);
        };
        let restored = replay(doc, &batch.steps)?;
        let selection = batch.selection_after.clone();
        if let Some(batch) = self.redo_stack.pop() {
            self.undo_stack.push(batch);
        }
        Ok(Some((restored, selection)))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

fn replay(doc: &Node, steps: &[Step]) -> Result<Node, StepError> {
    let mut doc = doc.clone();
    for step in steps {
        doc = step.apply(&doc)?;
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::Fragment;

    fn batch(steps: usize) -> StepBatch {
        let steps: Vec<Step> = (0..steps)
            .map(|_| Step::Replace {
                from: 0,
                to: 0,
                content: Fragment::empty(),
            })
            .collect();
        StepBatch {
            inverses: steps.clone(),
            steps,
            selection_before: Selection::All,
            selection_after: Selection::All,
            description: None,
        }
    }

    #[test]
    fn test_history_creation() {
        let history = History::new();
        assert_eq!(history.undo_depth(), 0);
        assert_eq!(history.redo_depth(), 0);
        assert_eq!(history.max_depth(), DEFAULT_DEPTH);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_batches_are_ignored() {
        let mut history = History::new();
        history.push(batch(0));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_max_depth_enforced() {
        let mut history = History::with_depth(2);
        history.push(batch(1).with_description("first"));
        history.push(batch(1).with_description("second"));
        history.push(batch(1).with_description("third"));
        assert_eq!(history.undo_depth(), 2);
        assert_eq!(history.undo_description(), Some("third"));
    }

    #[test]
    fn test_unlimited_depth() {
        let mut history = History::with_depth(0);
        for _ in 0..150 {
            history.push(batch(1));
        }
        assert_eq!(history.undo_depth(), 150);
    }
}
