//! Undo history of whole outline states.
//!
//! # Invariants
//! - Snapshots are restored wholesale, most recent first.
//! - The stack never holds more than its capacity; the oldest entry goes.

use crate::model::graph::Graph;
use crate::tree::representation::Tree;
use std::collections::VecDeque;

/// Default number of snapshots kept by [`UndoStack::new`].
pub const DEFAULT_UNDO_CAPACITY: usize = 100;

/// One restorable `(Graph, Tree)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub graph: Graph,
    pub tree: Tree,
}

/// Bounded stack of snapshots taken before each edit.
#[derive(Debug, Clone)]
pub struct UndoStack {
    snapshots: VecDeque<Snapshot>,
    capacity: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_UNDO_CAPACITY)
    }

    /// Creates a stack keeping at most `capacity` snapshots (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Records the state as it was before an edit.
    pub fn push(&mut self, graph: &Graph, tree: &Tree) {
        if self.snapshots.len() == self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(Snapshot {
            graph: graph.clone(),
            tree: tree.clone(),
        });
    }

    /// Takes the most recent snapshot, if any.
    pub fn pop(&mut self) -> Option<Snapshot> {
        self.snapshots.pop_back()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
