//! Choice relaxation: merging XOR branches that nothing forces apart.
//!
//! Constraint-driven reconstruction tends to over-approximate exclusivity:
//! any two branches that never co-occur in the input end up under a common
//! XOR. The caller names the choices that are genuinely exclusive
//! (mandatory XOR constraints); every other pair of XOR branches is wrapped
//! into a PAR.
//!
//! Scanning is deterministic. XOR nodes are visited in preorder and their
//! children pairwise as `(i, j)` with `i < j` in child order; the first
//! mergeable pair found is merged, the tree is flattened, and scanning starts
//! over. A merge never changes the task set below any node other than the
//! merged pair, so restarting from the root finds exactly the pairs a
//! node-local fixed point would. Each merge removes one XOR child, which
//! bounds the number of rounds.
//!
//! Merging the last two branches of a choice leaves the XOR with a single
//! PAR child. That XOR is kept; the verifier reports it as
//! `INVALID_OPERATORS` and the caller decides what to do with it.

use std::collections::BTreeSet;

use pmtree_core::{Node, NodeIndex, Operator, Tree};
use tracing::{debug, trace};

use crate::error::TransformError;
use crate::reduce::reduce;
use crate::transform::TreeTransform;

/// A pair of task labels that must stay mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MandatoryChoice {
    pub left: String,
    pub right: String,
}

impl MandatoryChoice {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Whether merging branches with task sets `a` and `b` would erase
    /// this exclusivity, in either orientation.
    pub fn separates(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
        (a.contains(&self.left) && b.contains(&self.right))
            || (a.contains(&self.right) && b.contains(&self.left))
    }
}

/// Relaxes XOR nodes against a fixed list of mandatory choices.
#[derive(Debug, Clone, Default)]
pub struct ChoiceReducer {
    mandatory: Vec<MandatoryChoice>,
}

impl ChoiceReducer {
    pub fn new(mandatory: Vec<MandatoryChoice>) -> Self {
        Self { mandatory }
    }

    /// Build from elementary constraint trees. Only two-leaf XOR trees
    /// name a mandatory choice; anything else is skipped.
    pub fn from_constraints<'a>(constraints: impl IntoIterator<Item = &'a Tree>) -> Self {
        let mut mandatory = Vec::new();
        for tree in constraints {
            let is_choice = tree.root_node().map(|n| n.operator) == Some(Operator::Xor);
            match tree.endpoints() {
                Some((l, r)) if is_choice => mandatory.push(MandatoryChoice::new(l, r)),
                _ => debug!(constraint = %tree, "not a mandatory choice, skipped"),
            }
        }
        Self { mandatory }
    }

    pub fn mandatory(&self) -> &[MandatoryChoice] {
        &self.mandatory
    }

    fn mergeable(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> bool {
        !self.mandatory.iter().any(|m| m.separates(a, b))
    }

    /// First mergeable pair of children of `xor`, by child order.
    fn find_pair(&self, tree: &Tree, xor: NodeIndex) -> Option<(NodeIndex, NodeIndex)> {
        let children = tree.children(xor);
        let sets: Vec<BTreeSet<String>> = children.iter().map(|&c| tree.task_labels(c)).collect();
        for i in 0..children.len() {
            for j in (i + 1)..children.len() {
                if self.mergeable(&sets[i], &sets[j]) {
                    return Some((children[i], children[j]));
                }
            }
        }
        None
    }

    fn find_merge(&self, tree: &Tree) -> Option<(NodeIndex, NodeIndex, NodeIndex)> {
        tree.preorder()
            .into_iter()
            .filter(|&idx| tree.operator(idx) == Some(Operator::Xor))
            .find_map(|xor| self.find_pair(tree, xor).map(|(a, b)| (xor, a, b)))
    }

    /// Merge mergeable XOR branches until none remain. Returns the number
    /// of merges.
    pub fn relax(&self, tree: &mut Tree) -> Result<usize, TransformError> {
        let mut merges = 0;
        while let Some((xor, first, second)) = self.find_merge(tree) {
            merge(tree, xor, first, second)?;
            reduce(tree)?;
            merges += 1;
        }
        debug!(merges, mandatory = self.mandatory.len(), "relax choices");
        Ok(merges)
    }
}

impl TreeTransform for ChoiceReducer {
    fn name(&self) -> &str {
        "relax-choices"
    }

    fn rewrite(&self, tree: &mut Tree) -> Result<usize, TransformError> {
        self.relax(tree)
    }
}

/// Replace `first` and `second` under `xor` by `PAR(first, second)` at
/// `first`'s position. The XOR is never emptied.
fn merge(
    tree: &mut Tree,
    xor: NodeIndex,
    first: NodeIndex,
    second: NodeIndex,
) -> Result<(), TransformError> {
    if tree.children(xor).len() < 2 {
        return Err(TransformError::InvariantViolated {
            pass: "relax-choices",
            message: format!("choice node {xor} has fewer than two branches to merge"),
        });
    }
    trace!(%xor, %first, %second, "merge branches");
    let position = tree.remove_child(xor, first)?;
    tree.remove_child(xor, second)?;
    let par = tree.add_node(Node::operator(Operator::Par));
    tree.push_child(par, first)?;
    tree.push_child(par, second)?;
    tree.insert_child(xor, position, par)?;

    if tree.children(xor).is_empty() {
        return Err(TransformError::InvariantViolated {
            pass: "relax-choices",
            message: format!("choice node {xor} emptied by merge"),
        });
    }
    Ok(())
}

/// Relax `tree` against the mandatory XOR constraints in `mandatory`.
pub fn relax_choices(tree: &mut Tree, mandatory: &[Tree]) -> Result<usize, TransformError> {
    ChoiceReducer::from_constraints(mandatory).relax(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relaxed(src: &str, mandatory: &[(&str, &str)]) -> (String, usize) {
        let reducer = ChoiceReducer::new(
            mandatory
                .iter()
                .map(|(l, r)| MandatoryChoice::new(*l, *r))
                .collect(),
        );
        let mut tree: Tree = src.parse().unwrap();
        let merges = reducer.relax(&mut tree).unwrap();
        (tree.to_string(), merges)
    }

    #[test]
    fn mandatory_choice_blocks_merge() {
        assert_eq!(
            relaxed("XOR(PAR(A,B),C)", &[("A", "C")]),
            ("XOR(PAR(A,B),C)".into(), 0)
        );
        // Orientation does not matter.
        assert_eq!(
            relaxed("XOR(PAR(A,B),C)", &[("C", "A")]),
            ("XOR(PAR(A,B),C)".into(), 0)
        );
    }

    #[test]
    fn unconstrained_choice_becomes_parallel() {
        assert_eq!(relaxed("XOR(A,B)", &[]), ("XOR(PAR(A,B))".into(), 1));
        assert_eq!(relaxed("XOR(A,B,C)", &[]), ("XOR(PAR(A,B,C))".into(), 2));
    }

    #[test]
    fn fully_merged_choice_keeps_its_node() {
        let mut tree: Tree = "XOR(A,B)".parse().unwrap();
        let xor = tree.root().unwrap();
        relax_choices(&mut tree, &[]).unwrap();
        assert_eq!(tree.root(), Some(xor));
        assert_eq!(tree.operator(xor), Some(Operator::Xor));
        assert_eq!(tree.children(xor).len(), 1);
        assert_eq!(
            pmtree_verify::verify_integrity(&tree, &[]),
            pmtree_verify::IntegrityStatus::InvalidOperators
        );
    }

    #[test]
    fn merge_on_single_branch_choice_fails() {
        let mut tree: Tree = "XOR(PAR(A,B))".parse().unwrap();
        let xor = tree.root().unwrap();
        let only = tree.children(xor)[0];
        let err = merge(&mut tree, xor, only, only).unwrap_err();
        assert!(matches!(err, TransformError::InvariantViolated { .. }));
    }

    #[test]
    fn merged_parallel_is_flattened() {
        assert_eq!(
            relaxed("SEQ(X,XOR(PAR(A,B),C,D))", &[("A", "D")]),
            ("SEQ(X,XOR(PAR(A,B,C),D))".into(), 1)
        );
    }

    #[test]
    fn merged_choice_stays_under_parent_parallel() {
        assert_eq!(
            relaxed("PAR(X,XOR(A,B))", &[]),
            ("PAR(X,XOR(PAR(A,B)))".into(), 1)
        );
    }

    #[test]
    fn nested_choices_are_relaxed() {
        assert_eq!(
            relaxed("XOR(SEQ(A,XOR(B,C)),D)", &[("A", "D")]),
            ("XOR(SEQ(A,XOR(PAR(B,C))),D)".into(), 1)
        );
    }

    #[test]
    fn mandatory_pairs_survive() {
        let (out, _) = relaxed("XOR(A,B,C,D)", &[("A", "B"), ("C", "D")]);
        let tree: Tree = out.parse().unwrap();
        for idx in tree.preorder() {
            if tree.operator(idx) != Some(Operator::Par) {
                continue;
            }
            let labels = tree.task_labels(idx);
            assert!(!(labels.contains("A") && labels.contains("B")), "{out}");
            assert!(!(labels.contains("C") && labels.contains("D")), "{out}");
        }
        assert_eq!(out, "XOR(PAR(A,C),PAR(B,D))");
    }

    #[test]
    fn from_constraints_keeps_only_choices() {
        let constraints = vec![
            Tree::constraint(Operator::Xor, "A", "B"),
            Tree::constraint(Operator::Seq, "A", "C"),
            Tree::task("Z"),
        ];
        let reducer = ChoiceReducer::from_constraints(&constraints);
        assert_eq!(reducer.mandatory(), &[MandatoryChoice::new("A", "B")]);
    }

    #[test]
    fn relaxed_tree_keeps_back_references() {
        let mut tree: Tree = "SEQ(XOR(A,B,C),XOR(D,E))".parse().unwrap();
        relax_choices(&mut tree, &[Tree::constraint(Operator::Xor, "A", "C")]).unwrap();
        assert_eq!(tree.to_string(), "SEQ(XOR(PAR(A,B),C),XOR(PAR(D,E)))");
        let root = tree.root().unwrap();
        for idx in tree.preorder().into_iter().skip(1) {
            let parent = tree.parent(idx).unwrap();
            assert!(tree.children(parent).contains(&idx));
        }
        assert_eq!(tree.parent(root), None);
    }
}
