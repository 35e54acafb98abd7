//! Snapshots of previously detected loops.
//!
//! Loop detection happens elsewhere; the verifier only needs the label of
//! the loop's root and the tasks it covered when it was detected.

use std::collections::BTreeSet;

use pmtree_core::{NodeIndex, Tree};

/// A detected loop: root label and the reachable task set at detection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSnapshot {
    pub root_label: String,
    pub tasks: BTreeSet<String>,
}

impl LoopSnapshot {
    pub fn new<I, S>(root_label: impl Into<String>, tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root_label: root_label.into(),
            tasks: tasks.into_iter().map(Into::into).collect(),
        }
    }

    /// Record the loop rooted at `idx` as it currently stands. `None` if
    /// `idx` is not a loop operator.
    pub fn capture(tree: &Tree, idx: NodeIndex) -> Option<Self> {
        if !tree.operator(idx)?.is_loop() {
            return None;
        }
        let label = tree.label(idx)?.to_string();
        Some(Self {
            root_label: label,
            tasks: tree.task_labels(idx),
        })
    }

    /// Whether the loop is still intact in `tree`: either its root is gone
    /// or the node with its label covers exactly the recorded tasks.
    pub fn preserved_in(&self, tree: &Tree) -> Result<(), NodeIndex> {
        match tree.find_by_label(&self.root_label) {
            Some(idx) if tree.task_labels(idx) != self.tasks => Err(idx),
            _ => Ok(()),
        }
    }
}
