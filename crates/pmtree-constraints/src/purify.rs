//! Structural deduplication of constraint lists.

use std::collections::HashSet;

use pmtree_core::{hash_hex, Tree};
use tracing::{debug, trace};

/// Remove structural duplicates in place, keeping the first occurrence and
/// the relative order of survivors. Returns the number removed.
pub fn purify(trees: &mut Vec<Tree>) -> usize {
    let before = trees.len();
    let mut seen = HashSet::new();
    trees.retain(|t| {
        let hash = t.structural_hash();
        let first = seen.insert(hash);
        if !first {
            trace!(constraint = %t, hash = %hash_hex(&hash), "drop duplicate");
        }
        first
    });
    let removed = before - trees.len();
    debug!(removed, kept = trees.len(), "purify");
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmtree_core::Operator;

    #[test]
    fn keeps_first_occurrence_in_order() {
        let mut trees = vec![
            Tree::constraint(Operator::Seq, "A", "B"),
            Tree::constraint(Operator::Par, "B", "C"),
            Tree::constraint(Operator::Seq, "A", "B"),
            Tree::constraint(Operator::Seq, "B", "A"),
            Tree::constraint(Operator::Par, "B", "C"),
        ];
        let first_id = trees[0].root_node().unwrap().id;
        assert_eq!(purify(&mut trees), 2);
        let texts: Vec<String> = trees.iter().map(Tree::to_string).collect();
        assert_eq!(texts, ["SEQ(A,B)", "PAR(B,C)", "SEQ(B,A)"]);
        assert_eq!(trees[0].root_node().unwrap().id, first_id);
    }

    #[test]
    fn empty_list() {
        let mut trees = Vec::new();
        assert_eq!(purify(&mut trees), 0);
    }
}
