//! Tree construction API.
//!
//! The `TreeBuilder` is the node factory: it assigns identities and wires
//! parent/child links while operators are opened and closed in nesting
//! order. Errors are deferred to [`TreeBuilder::build`] so construction reads
//! as one chain.
//!
//! # Example
//!
//! ```rust
//! use pmtree_core::builder::TreeBuilder;
//! use pmtree_core::tree::node::Operator;
//!
//! let mut builder = TreeBuilder::new();
//! builder
//!     .open(Operator::Seq)
//!     .task("A")
//!     .open(Operator::Par)
//!     .task("B")
//!     .task("C")
//!     .close()
//!     .close();
//!
//! let tree = builder.build().unwrap();
//! assert_eq!(tree.to_string(), "SEQ(A,PAR(B,C))");
//! ```

use crate::tree::node::{Node, NodeId, NodeIndex, Operator};
use crate::tree::{Tree, TreeError};

/// A builder for process-model trees.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    tree: Tree,
    /// Stack of open operator nodes for nested construction.
    open: Vec<(Operator, NodeIndex)>,
    error: Option<TreeError>,
}

impl TreeBuilder {
    /// Create a new empty tree builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn place(&mut self, node: Node) -> NodeIndex {
        let idx = self.tree.add_node(node);
        if self.error.is_some() {
            return idx;
        }
        let result = match self.open.last() {
            Some(&(_, parent)) => self.tree.push_child(parent, idx),
            None if self.tree.root().is_none() => self.tree.set_root(Some(idx)),
            None => Err(TreeError::MultipleRoots),
        };
        if let Err(e) = result {
            self.error = Some(e);
        }
        idx
    }

    /// Add a TASK leaf under the innermost open operator.
    pub fn task(&mut self, label: impl Into<String>) -> &mut Self {
        self.place(Node::task(label));
        self
    }

    /// Add a TASK leaf with a reserved identity.
    pub fn task_with_id(&mut self, id: NodeId, label: impl Into<String>) -> &mut Self {
        self.place(Node::with_id(id, Operator::Task, label));
        self
    }

    /// Open an operator node labelled with its keyword.
    pub fn open(&mut self, op: Operator) -> &mut Self {
        self.open_labelled(op, op.keyword())
    }

    /// Open an operator node with an explicit label (loop roots are looked
    /// up by label).
    pub fn open_labelled(&mut self, op: Operator, label: impl Into<String>) -> &mut Self {
        let idx = self.place(Node::new(op, label));
        self.open.push((op, idx));
        self
    }

    /// Close the innermost open operator.
    pub fn close(&mut self) -> &mut Self {
        if self.open.pop().is_none() && self.error.is_none() {
            self.error = Some(TreeError::UnbalancedClose);
        }
        self
    }

    /// Finish construction.
    pub fn build(self) -> Result<Tree, TreeError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if let Some(&(op, _)) = self.open.last() {
            return Err(TreeError::UnclosedOperator(op));
        }
        Ok(self.tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn nested_construction() {
        let mut b = TreeBuilder::new();
        b.open(Operator::Xor)
            .open_labelled(Operator::Loop, "L1")
            .task("A")
            .close()
            .task("B")
            .close();
        let tree = b.build().unwrap();
        assert_eq!(tree.to_string(), "XOR(LOOP(A),B)");
        assert!(tree.find_by_label("L1").is_some());
    }

    #[test]
    fn reserved_identity_is_kept() {
        let id = Uuid::new_v4();
        let mut b = TreeBuilder::new();
        b.open(Operator::Seq).task_with_id(id, "start").task("A").close();
        let tree = b.build().unwrap();
        let idx = tree.find_by_id(id).unwrap();
        assert_eq!(tree.label(idx), Some("start"));
    }

    #[test]
    fn unbalanced_close_rejected() {
        let mut b = TreeBuilder::new();
        b.task("A").close();
        assert!(matches!(b.build(), Err(TreeError::UnbalancedClose)));
    }

    #[test]
    fn unclosed_operator_rejected() {
        let mut b = TreeBuilder::new();
        b.open(Operator::Par).task("A");
        assert!(matches!(
            b.build(),
            Err(TreeError::UnclosedOperator(Operator::Par))
        ));
    }

    #[test]
    fn second_root_rejected() {
        let mut b = TreeBuilder::new();
        b.task("A").task("B");
        assert!(matches!(b.build(), Err(TreeError::MultipleRoots)));
    }
}
