//! Tree canonicalization: degenerate-operator removal, then associativity
//! flattening.

use pmtree_core::Tree;

use crate::clean::clean;
use crate::error::TransformError;
use crate::reduce::reduce;

/// Statistics about canonicalization rewrites applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalizationStats {
    /// Number of degenerate SEQ/PAR nodes eliminated.
    pub nodes_eliminated: usize,
    /// Number of same-operator children spliced into their parent.
    pub nodes_flattened: usize,
    /// Node count before canonicalization.
    pub initial_node_count: usize,
    /// Node count after canonicalization.
    pub final_node_count: usize,
}

/// Canonicalize a tree. The result has no SEQ/PAR node with fewer than two
/// children and no child sharing its parent's operator.
///
/// Cleaning runs first: eliminating `SEQ(x)` can bring a nested SEQ next to
/// its grandparent, which flattening then absorbs. Flattening never lowers
/// an arity, so no second cleaning is needed.
pub fn canonicalize(mut tree: Tree) -> Result<(Tree, CanonicalizationStats), TransformError> {
    let initial_node_count = tree.node_count();

    let nodes_eliminated = clean(&mut tree)?;
    let nodes_flattened = reduce(&mut tree)?;

    let stats = CanonicalizationStats {
        nodes_eliminated,
        nodes_flattened,
        initial_node_count,
        final_node_count: tree.node_count(),
    };
    Ok((tree, stats))
}
