//! Associativity flattening: `SEQ(SEQ(a,b),c)` becomes `SEQ(a,b,c)`.

use pmtree_core::{NodeIndex, Tree};
use tracing::{debug, trace};

use crate::error::TransformError;
use crate::transform::TreeTransform;

/// Splices out every child that carries its parent's operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reductor;

impl TreeTransform for Reductor {
    fn name(&self) -> &str {
        "reduce"
    }

    fn rewrite(&self, tree: &mut Tree) -> Result<usize, TransformError> {
        reduce(tree)
    }
}

/// Flatten nested same-operator nodes bottom-up, preserving child order.
/// Returns the number of spliced nodes.
pub fn reduce(tree: &mut Tree) -> Result<usize, TransformError> {
    let Some(root) = tree.root() else {
        return Ok(0);
    };
    let spliced = reduce_node(tree, root)?;
    debug!(spliced, "reduce");
    Ok(spliced)
}

fn reduce_node(tree: &mut Tree, idx: NodeIndex) -> Result<usize, TransformError> {
    let node = tree.get(idx)?;
    if node.operator.is_task() {
        return Ok(0);
    }
    let op = node.operator;
    let mut spliced = 0;
    for child in node.children().to_vec() {
        spliced += reduce_node(tree, child)?;
    }

    // Children are already flat, so one level of splicing suffices.
    for child in tree.take_children(idx)? {
        if tree.operator(child) == Some(op) {
            let grandchildren = tree.take_children(child)?;
            tree.free_node(child)?;
            trace!(%idx, %child, promoted = grandchildren.len(), "splice");
            for grandchild in grandchildren {
                tree.push_child(idx, grandchild)?;
            }
            spliced += 1;
        } else {
            tree.push_child(idx, child)?;
        }
    }
    Ok(spliced)
}
