//! Removal of degenerate SEQ/PAR nodes.
//!
//! A SEQ or PAR with fewer than two children combines nothing. With no
//! children it is dropped; with one child that child takes its place (or
//! becomes the root). Removing a node can leave its parent degenerate, so
//! scanning repeats until a scan finds nothing. XOR and TASK nodes are never
//! touched.

use pmtree_core::{NodeIndex, Operator, Tree};
use tracing::{debug, trace};

use crate::error::TransformError;
use crate::transform::TreeTransform;

#[derive(Debug, Clone, Copy, Default)]
pub struct Cleaner;

impl TreeTransform for Cleaner {
    fn name(&self) -> &str {
        "clean"
    }

    fn rewrite(&self, tree: &mut Tree) -> Result<usize, TransformError> {
        clean(tree)
    }
}

fn is_degenerate(tree: &Tree, idx: NodeIndex) -> bool {
    tree.node(idx).is_some_and(|n| {
        matches!(n.operator, Operator::Seq | Operator::Par) && n.arity() <= 1
    })
}

/// Eliminate degenerate SEQ/PAR nodes until none remain. Returns the number
/// of eliminated nodes.
pub fn clean(tree: &mut Tree) -> Result<usize, TransformError> {
    let mut eliminated = 0;
    let mut scans = 0;
    loop {
        let view: &Tree = tree;
        let targets: Vec<NodeIndex> = view
            .preorder()
            .into_iter()
            .filter(|&idx| is_degenerate(view, idx))
            .collect();
        if targets.is_empty() {
            break;
        }
        scans += 1;
        for idx in targets {
            // An earlier elimination in this scan may have changed it.
            if !is_degenerate(tree, idx) || !tree.is_attached(idx) {
                continue;
            }
            eliminate(tree, idx)?;
            eliminated += 1;
        }
    }
    debug!(eliminated, scans, "clean");
    Ok(eliminated)
}

fn eliminate(tree: &mut Tree, idx: NodeIndex) -> Result<(), TransformError> {
    match tree.children(idx).first().copied() {
        None => {
            trace!(%idx, "drop empty operator");
            tree.free_subtree(idx)?;
        }
        Some(only) => {
            trace!(%idx, %only, "promote sole child");
            tree.remove_child(idx, only)?;
            tree.replace_node(idx, only)?;
            tree.free_node(idx)?;
        }
    }
    Ok(())
}
