//! Process-model trees: an arena of nodes with owned child lists and
//! parent back-references.
//!
//! Every node lives in an indexed slot of its [`Tree`]. Children are held by
//! index in document order; each node records the index of its parent. The
//! safe mutators below update both directions in one place, so a tree built
//! and rewritten only through them always has consistent back-references.
//! The `*_unchecked` mutators bypass that bookkeeping and exist to build
//! deliberately malformed trees for the integrity verifier.

pub mod node;
mod text;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use self::node::{Node, NodeId, NodeIndex, Operator};
use crate::hash::{content_hash, ContentHash};

pub use self::text::Shape;

/// Errors raised by tree construction and surgery.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeIndex),

    #[error("node {child} is not a child of {parent}")]
    NotAChild {
        parent: NodeIndex,
        child: NodeIndex,
    },

    #[error("node {0} is already attached to a tree position")]
    AlreadyAttached(NodeIndex),

    #[error("node {0} is not attached to a parent or the root")]
    NotAttached(NodeIndex),

    #[error("linking {child} under {parent} would create a cycle")]
    WouldCycle {
        parent: NodeIndex,
        child: NodeIndex,
    },

    #[error("child position {position} out of range for node {node}")]
    PositionOutOfRange { node: NodeIndex, position: usize },

    #[error("tree is empty")]
    EmptyTree,

    #[error("close() without a matching open()")]
    UnbalancedClose,

    #[error("operator {0} opened but never closed")]
    UnclosedOperator(Operator),

    #[error("a tree has exactly one root")]
    MultipleRoots,

    #[error("parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },
}

/// A process-model tree with a replaceable root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tree {
    slots: Vec<Option<Node>>,
    root: Option<NodeIndex>,
}

impl Tree {
    /// Create a new empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// A tree consisting of a single TASK node.
    pub fn task(label: impl Into<String>) -> Self {
        let mut tree = Self::new();
        let idx = tree.add_node(Node::task(label));
        tree.root = Some(idx);
        tree
    }

    /// An elementary constraint: `op(left, right)` over two TASK leaves.
    pub fn constraint(op: Operator, left: impl Into<String>, right: impl Into<String>) -> Self {
        let mut tree = Self::new();
        let parent = tree.add_node(Node::operator(op));
        let l = tree.add_node(Node::task(left));
        let r = tree.add_node(Node::task(right));
        tree.slot_mut(parent).children = vec![l, r];
        tree.slot_mut(l).parent = Some(parent);
        tree.slot_mut(r).parent = Some(parent);
        tree.root = Some(parent);
        tree
    }


    /// Insert a detached node into the arena.
    pub fn add_node(&mut self, mut node: Node) -> NodeIndex {
        node.children.clear();
        node.parent = None;
        let idx = NodeIndex(self.slots.len());
        self.slots.push(Some(node));
        idx
    }

    /// Look up a node by index.
    pub fn node(&self, idx: NodeIndex) -> Option<&Node> {
        self.slots.get(idx.0).and_then(Option::as_ref)
    }

    /// Look up a node by index, failing if the slot is empty.
    pub fn get(&self, idx: NodeIndex) -> Result<&Node, TreeError> {
        self.node(idx).ok_or(TreeError::NodeNotFound(idx))
    }

    /// Mutable access to a node's kind, label and identity. Links stay
    /// private to the tree.
    pub fn get_mut(&mut self, idx: NodeIndex) -> Result<&mut Node, TreeError> {
        self.slots
            .get_mut(idx.0)
            .and_then(Option::as_mut)
            .ok_or(TreeError::NodeNotFound(idx))
    }

    fn slot_mut(&mut self, idx: NodeIndex) -> &mut Node {
        match self.slots.get_mut(idx.0).and_then(Option::as_mut) {
            Some(node) => node,
            None => unreachable!("slot {idx} checked by caller"),
        }
    }

    /// Whether `idx` names a live slot.
    pub fn contains(&self, idx: NodeIndex) -> bool {
        self.node(idx).is_some()
    }

    /// Number of arena slots, live or released.
    pub fn arena_len(&self) -> usize {
        self.slots.len()
    }

    /// All live slots, attached or not.
    pub fn slots(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|n| (NodeIndex(i), n)))
    }


    /// Index of the root, if any.
    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    /// The root node, if any.
    pub fn root_node(&self) -> Option<&Node> {
        self.root.and_then(|r| self.node(r))
    }

    /// Make `idx` the root. The node must not have a parent.
    pub fn set_root(&mut self, idx: Option<NodeIndex>) -> Result<(), TreeError> {
        if let Some(idx) = idx {
            if self.get(idx)?.parent.is_some() {
                return Err(TreeError::AlreadyAttached(idx));
            }
        }
        self.root = idx;
        Ok(())
    }

    /// Whether the tree has no root.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }


    /// Children of `idx` in document order; empty for a released slot.
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.node(idx).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Back-reference of `idx`.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.node(idx).and_then(|n| n.parent)
    }

    /// Operator of `idx`.
    pub fn operator(&self, idx: NodeIndex) -> Option<Operator> {
        self.node(idx).map(|n| n.operator)
    }

    /// Label of `idx`.
    pub fn label(&self, idx: NodeIndex) -> Option<&str> {
        self.node(idx).map(|n| n.label.as_str())
    }

    /// Whether the node hangs under a parent or is the root.
    pub fn is_attached(&self, idx: NodeIndex) -> bool {
        self.parent(idx).is_some() || self.root == Some(idx)
    }

    /// Whether `ancestor` appears on the parent chain of `idx` (inclusive).
    pub fn is_ancestor(&self, ancestor: NodeIndex, idx: NodeIndex) -> bool {
        let mut current = Some(idx);
        let mut steps = 0;
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.slots.len() {
                return false;
            }
            current = self.parent(c);
        }
        false
    }

    /// Nodes reachable from the root in pre-order. Each node is reported
    /// once even if the structure is aliased.
    pub fn preorder(&self) -> Vec<NodeIndex> {
        match self.root {
            Some(root) => self.preorder_from(root),
            None => Vec::new(),
        }
    }

    /// Nodes reachable from `start` in pre-order, each reported once.
    pub fn preorder_from(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let mut seen = vec![false; self.slots.len()];
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            let Some(node) = self.node(idx) else { continue };
            if std::mem::replace(&mut seen[idx.0], true) {
                continue;
            }
            order.push(idx);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// Number of nodes reachable from the root.
    pub fn node_count(&self) -> usize {
        self.preorder().len()
    }

    /// TASK nodes under `idx`, in document order.
    pub fn task_nodes(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.preorder_from(idx)
            .into_iter()
            .filter(|&i| self.operator(i) == Some(Operator::Task))
            .collect()
    }

    /// Childless nodes under `idx`, in document order. Includes empty
    /// operators such as `LOOP_OPTIONAL()`.
    pub fn leaves(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.preorder_from(idx)
            .into_iter()
            .filter(|&i| self.children(i).is_empty())
            .collect()
    }

    /// Reachable task set: labels of all TASK leaves under `idx`.
    pub fn task_labels(&self, idx: NodeIndex) -> BTreeSet<String> {
        self.task_nodes(idx)
            .into_iter()
            .filter_map(|i| self.label(i).map(str::to_string))
            .collect()
    }

    /// Labels of every TASK reachable from the root.
    pub fn all_task_labels(&self) -> BTreeSet<String> {
        self.root.map(|r| self.task_labels(r)).unwrap_or_default()
    }

    /// First node (pre-order) carrying `label`.
    pub fn find_by_label(&self, label: &str) -> Option<NodeIndex> {
        self.preorder()
            .into_iter()
            .find(|&i| self.label(i) == Some(label))
    }

    /// The reachable node with identity `id`.
    pub fn find_by_id(&self, id: NodeId) -> Option<NodeIndex> {
        self.preorder()
            .into_iter()
            .find(|&i| self.node(i).is_some_and(|n| n.id == id))
    }

    /// Labels of the two TASK leaves of an elementary constraint.
    pub fn endpoints(&self) -> Option<(&str, &str)> {
        let root = self.root_node()?;
        if root.operator.is_task() {
            return None;
        }
        match root.children.as_slice() {
            [l, r] => {
                let l = self.node(*l)?;
                let r = self.node(*r)?;
                (l.operator.is_task() && r.operator.is_task())
                    .then_some((l.label.as_str(), r.label.as_str()))
            }
            _ => None,
        }
    }


    /// Clear every `available` marker.
    pub fn reset_flags(&mut self) {
        for node in self.slots.iter_mut().flatten() {
            node.available = false;
        }
    }

    /// Set the transient `available` marker of `idx`.
    pub fn set_available(&mut self, idx: NodeIndex, available: bool) -> Result<(), TreeError> {
        self.get_mut(idx)?.available = available;
        Ok(())
    }

    /// Whether `idx` is marked available.
    pub fn is_available(&self, idx: NodeIndex) -> bool {
        self.node(idx).is_some_and(|n| n.available)
    }


    fn check_linkable(&self, parent: NodeIndex, child: NodeIndex) -> Result<(), TreeError> {
        self.get(parent)?;
        self.get(child)?;
        if self.is_attached(child) {
            return Err(TreeError::AlreadyAttached(child));
        }
        if self.is_ancestor(child, parent) {
            return Err(TreeError::WouldCycle { parent, child });
        }
        Ok(())
    }

    /// Append a detached node to `parent`'s children.
    pub fn push_child(&mut self, parent: NodeIndex, child: NodeIndex) -> Result<(), TreeError> {
        self.check_linkable(parent, child)?;
        self.slot_mut(parent).children.push(child);
        self.slot_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Insert a detached node at `position` among `parent`'s children.
    pub fn insert_child(
        &mut self,
        parent: NodeIndex,
        position: usize,
        child: NodeIndex,
    ) -> Result<(), TreeError> {
        self.check_linkable(parent, child)?;
        if position > self.get(parent)?.children.len() {
            return Err(TreeError::PositionOutOfRange {
                node: parent,
                position,
            });
        }
        self.slot_mut(parent).children.insert(position, child);
        self.slot_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Unlink `child` from `parent`, returning its former position.
    pub fn remove_child(&mut self, parent: NodeIndex, child: NodeIndex) -> Result<usize, TreeError> {
        let position = self
            .get(parent)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NotAChild { parent, child })?;
        self.slot_mut(parent).children.remove(position);
        if let Some(node) = self.slots.get_mut(child.0).and_then(Option::as_mut) {
            if node.parent == Some(parent) {
                node.parent = None;
            }
        }
        Ok(position)
    }

    /// Put detached `new` in `old`'s place under `parent`; `old` becomes detached.
    pub fn replace_child(
        &mut self,
        parent: NodeIndex,
        old: NodeIndex,
        new: NodeIndex,
    ) -> Result<(), TreeError> {
        self.get(new)?;
        if self.is_attached(new) {
            return Err(TreeError::AlreadyAttached(new));
        }
        let position = self.remove_child(parent, old)?;
        self.insert_child(parent, position, new)
    }

    /// Put detached `new` wherever `old` is attached (under its parent or as root).
    pub fn replace_node(&mut self, old: NodeIndex, new: NodeIndex) -> Result<(), TreeError> {
        match self.parent(old) {
            Some(parent) => self.replace_child(parent, old, new),
            None if self.root == Some(old) => {
                if self.is_attached(new) {
                    return Err(TreeError::AlreadyAttached(new));
                }
                self.root = Some(new);
                Ok(())
            }
            None => Err(TreeError::NotAttached(old)),
        }
    }

    /// Unlink a node from its parent, or clear the root if it is the root.
    pub fn detach(&mut self, idx: NodeIndex) -> Result<(), TreeError> {
        match self.parent(idx) {
            Some(parent) => self.remove_child(parent, idx).map(|_| ()),
            None if self.root == Some(idx) => {
                self.root = None;
                Ok(())
            }
            None => {
                self.get(idx)?;
                Ok(())
            }
        }
    }

    /// Unlink every child of `idx` and return them in order.
    pub fn take_children(&mut self, idx: NodeIndex) -> Result<Vec<NodeIndex>, TreeError> {
        let children = std::mem::take(&mut self.get_mut(idx)?.children);
        for &child in &children {
            if let Some(node) = self.slots.get_mut(child.0).and_then(Option::as_mut) {
                if node.parent == Some(idx) {
                    node.parent = None;
                }
            }
        }
        Ok(children)
    }

    /// Detach `idx` and release the slots of its whole subtree.
    pub fn free_subtree(&mut self, idx: NodeIndex) -> Result<(), TreeError> {
        self.detach(idx)?;
        for i in self.preorder_from(idx) {
            self.slots[i.0] = None;
        }
        Ok(())
    }

    /// Detach a single node and release its slot. Any remaining children
    /// are unlinked and left detached in the arena.
    pub fn free_node(&mut self, idx: NodeIndex) -> Result<(), TreeError> {
        self.detach(idx)?;
        self.take_children(idx)?;
        self.slots[idx.0] = None;
        Ok(())
    }


    /// Append `child` to `parent`'s child list without touching any
    /// back-reference or checking for cycles and aliasing.
    pub fn link_child_unchecked(&mut self, parent: NodeIndex, child: NodeIndex) -> Result<(), TreeError> {
        self.get(child)?;
        self.get_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Overwrite a node's back-reference without touching any child list.
    pub fn set_parent_unchecked(
        &mut self,
        child: NodeIndex,
        parent: Option<NodeIndex>,
    ) -> Result<(), TreeError> {
        self.get_mut(child)?.parent = parent;
        Ok(())
    }


    /// Copy the subtree of `src` rooted at `src_idx` into this arena with
    /// fresh identities. The copy is returned detached.
    pub fn graft(&mut self, src: &Tree, src_idx: NodeIndex) -> Result<NodeIndex, TreeError> {
        let top = self.add_node(src.get(src_idx)?.detached_copy());
        let mut seen = vec![false; src.slots.len()];
        seen[src_idx.0] = true;
        let mut stack = vec![(src_idx, top)];
        while let Some((from, to)) = stack.pop() {
            for &child in src.children(from) {
                let Some(node) = src.node(child) else { continue };
                if std::mem::replace(&mut seen[child.0], true) {
                    continue;
                }
                let copy = self.add_node(node.detached_copy());
                self.slot_mut(to).children.push(copy);
                self.slot_mut(copy).parent = Some(to);
                stack.push((child, copy));
            }
        }
        Ok(top)
    }

    /// Independent deep copy of the subtree at `idx`, as its own tree.
    pub fn copy_subtree(&self, idx: NodeIndex) -> Result<Tree, TreeError> {
        let mut tree = Tree::new();
        let root = tree.graft(self, idx)?;
        tree.root = Some(root);
        Ok(tree)
    }

    /// Drop every slot not reachable from the root and renumber the rest
    /// in pre-order, keeping node identities. Released slots are never
    /// reused otherwise, so long-lived trees should be compacted after
    /// heavy rewriting. Invalidates every outstanding [`NodeIndex`].
    /// Returns the number of slots reclaimed.
    pub fn compact(&mut self) -> usize {
        let before = self.slots.len();
        let order = self.preorder();
        let mut remap = vec![None; before];
        for (new, old) in order.iter().enumerate() {
            remap[old.0] = Some(NodeIndex(new));
        }
        let lookup = |idx: NodeIndex| remap.get(idx.0).copied().flatten();

        let mut slots = Vec::with_capacity(order.len());
        for old in &order {
            if let Some(mut node) = self.slots[old.0].take() {
                node.children = node.children.iter().filter_map(|&c| lookup(c)).collect();
                node.parent = node.parent.and_then(lookup);
                slots.push(Some(node));
            }
        }
        self.root = self.root.and_then(lookup);
        self.slots = slots;
        before - self.slots.len()
    }

    /// Independent deep copy: identical structure and labels, fresh ids,
    /// compacted slots.
    pub fn deep_copy(&self) -> Tree {
        match self.root {
            Some(root) => self.copy_subtree(root).unwrap_or_default(),
            None => Tree::new(),
        }
    }


    /// Identity-free shape of the subtree at `idx`.
    pub fn shape_of(&self, idx: NodeIndex) -> Option<Shape> {
        Shape::of(self, idx)
    }

    /// Identity-free shape of the whole tree.
    pub fn shape(&self) -> Option<Shape> {
        self.root.and_then(|r| self.shape_of(r))
    }

    /// Content hash of the tree's shape. Equal for trees with the same
    /// operators, labels and child order, regardless of node identity.
    pub fn structural_hash(&self) -> ContentHash {
        content_hash(&self.shape())
    }

    /// Whether both trees have the same shape.
    pub fn same_structure(&self, other: &Tree) -> bool {
        self.shape() == other.shape()
    }
}
