//! Sentinel start anchoring.
//!
//! A process whose first tree starts with a LOOP has no definite entry
//! point. Prepending a sentinel TASK in a SEQ gives it one; releasing the
//! sentinel afterwards restores the minimal form.

use pmtree_core::{Node, NodeId, Operator, Tree};
use pmtree_transform::{clean, reduce};
use tracing::debug;
use uuid::Uuid;

use crate::error::ConstraintError;

/// Default label of the sentinel task.
pub const DUMMY_START_LABEL: &str = "__start__";

/// Factory for sentinel start tasks. Every sentinel it produces carries the
/// same reserved id, so it can be found again regardless of its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DummyStart {
    id: NodeId,
    label: String,
}

impl Default for DummyStart {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyStart {
    pub fn new() -> Self {
        Self::with_label(DUMMY_START_LABEL)
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// A fresh sentinel node.
    pub fn sentinel(&self) -> Node {
        Node::with_id(self.id, Operator::Task, self.label.clone())
    }

    /// Whether `tree` currently contains the sentinel.
    pub fn is_anchored(&self, tree: &Tree) -> bool {
        tree.find_by_id(self.id).is_some()
    }

    /// Rewrite `tree` into `SEQ(sentinel, tree)` and flatten. Returns
    /// `false` if the sentinel was already present.
    pub fn anchor_tree(&self, tree: &mut Tree) -> Result<bool, ConstraintError> {
        if self.is_anchored(tree) {
            return Ok(false);
        }
        let sentinel = tree.add_node(self.sentinel());
        match tree.root() {
            None => tree.set_root(Some(sentinel))?,
            Some(old_root) => {
                let seq = tree.add_node(Node::operator(Operator::Seq));
                tree.set_root(Some(seq))?;
                tree.push_child(seq, sentinel)?;
                tree.push_child(seq, old_root)?;
                reduce(tree)?;
            }
        }
        debug!(tree = %tree, "anchored dummy start");
        Ok(true)
    }

    /// Anchor the first tree of an ordered list. Returns `false` for an
    /// empty list or an already anchored first tree.
    pub fn anchor(&self, trees: &mut [Tree]) -> Result<bool, ConstraintError> {
        match trees.first_mut() {
            Some(first) => self.anchor_tree(first),
            None => Ok(false),
        }
    }

    /// Remove the sentinel and restore minimal form (clean, then flatten).
    /// Returns `false` if the sentinel was not found.
    pub fn release(&self, tree: &mut Tree) -> Result<bool, ConstraintError> {
        let Some(idx) = tree.find_by_id(self.id) else {
            return Ok(false);
        };
        tree.free_subtree(idx)?;
        clean(tree)?;
        reduce(tree)?;
        debug!(tree = %tree, "released dummy start");
        Ok(true)
    }
}
