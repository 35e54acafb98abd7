//! Decomposition of a tree into its elementary pairwise constraints.
//!
//! Leaves are marked available and availability propagates upward: a node
//! becomes available once all of its children are. At that moment it emits
//! the constraints between its children, then propagation continues at its
//! parent.

use std::collections::HashSet;

use pmtree_core::{NodeIndex, Operator, Tree};
use tracing::{debug, trace};

use crate::error::TransformError;
use crate::reduce::reduce;

/// Elementary constraints entailed by `tree`, in emission order and without
/// structural duplicates.
///
/// The tree is flattened first and its availability flags are reset, so it
/// is taken mutably. SEQ emits only between adjacent children; PAR and XOR
/// emit between every pair; loops emit nothing of their own. A pair of
/// children yields one two-task tree per combination of their reachable
/// tasks.
pub fn split(tree: &mut Tree) -> Result<Vec<Tree>, TransformError> {
    tree.reset_flags();
    reduce(tree)?;
    let Some(root) = tree.root() else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let leaves = tree.leaves(root);
    for &leaf in &leaves {
        tree.set_available(leaf, true)?;
    }
    for leaf in leaves {
        let mut current = tree.parent(leaf);
        while let Some(node) = current {
            if tree.is_available(node) {
                break;
            }
            if !tree.children(node).iter().all(|&c| tree.is_available(c)) {
                break;
            }
            tree.set_available(node, true)?;
            for constraint in emit(tree, node) {
                if seen.insert(constraint.structural_hash()) {
                    out.push(constraint);
                }
            }
            current = tree.parent(node);
        }
    }
    debug!(constraints = out.len(), "split");
    Ok(out)
}

fn emit(tree: &Tree, node: NodeIndex) -> Vec<Tree> {
    let Some(op) = tree.operator(node) else {
        return Vec::new();
    };
    let children = tree.children(node);
    let pairs: Vec<(NodeIndex, NodeIndex)> = match op {
        Operator::Seq => children.windows(2).map(|w| (w[0], w[1])).collect(),
        Operator::Par | Operator::Xor => children
            .iter()
            .enumerate()
            .flat_map(|(i, &x)| children[i + 1..].iter().map(move |&y| (x, y)))
            .collect(),
        _ => return Vec::new(),
    };

    let mut constraints = Vec::new();
    for (x, y) in pairs {
        let left = tree.task_labels(x);
        let right = tree.task_labels(y);
        for l in &left {
            for r in &right {
                trace!(%node, %op, left = %l, right = %r, "emit");
                constraints.push(Tree::constraint(op, l.as_str(), r.as_str()));
            }
        }
    }
    constraints
}
