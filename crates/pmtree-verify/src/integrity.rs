//! Integrity verification: operator arity, loop preservation, and
//! parent/child back-reference consistency.
//!
//! The checks run in a fixed order and stop at the first failure:
//!
//! 1. every node's arity is accepted by its operator;
//! 2. every recorded loop still covers the same tasks;
//! 3. a top-down walk from the root never meets a node twice or a node
//!    listed as its own child;
//! 4. from every leaf of that walk, following parent references reaches the
//!    root without a node being its own parent;
//! 5. the node sets of steps 3 and 4 are identical.

use std::collections::BTreeSet;

use pmtree_core::{NodeIndex, Tree};
use tracing::debug;

use crate::loops::LoopSnapshot;
use crate::report::{IntegrityReport, IntegrityStatus};

/// Validator holding the loop snapshots a tree must still honor.
#[derive(Debug, Clone, Default)]
pub struct IntegrityVerifier {
    loops: Vec<LoopSnapshot>,
}

impl IntegrityVerifier {
    pub fn new(loops: Vec<LoopSnapshot>) -> Self {
        Self { loops }
    }

    pub fn loops(&self) -> &[LoopSnapshot] {
        &self.loops
    }

    /// Verdict only.
    pub fn verify(&self, tree: &Tree) -> IntegrityStatus {
        self.check(tree).status
    }

    /// Run every check and report the first failure.
    pub fn check(&self, tree: &Tree) -> IntegrityReport {
        let report = self.run(tree).err().unwrap_or_else(IntegrityReport::valid);
        debug!(status = %report.status, nodes = tree.node_count(), "integrity check");
        report
    }

    fn run(&self, tree: &Tree) -> Result<(), IntegrityReport> {
        let Some(root) = tree.root() else {
            return Ok(());
        };
        check_operators(tree)?;
        self.check_loops(tree)?;
        let (top_down, leaves) = walk_down(tree, root)?;
        let bottom_up = walk_up(tree, root, &leaves)?;
        if top_down != bottom_up {
            let stray = top_down
                .symmetric_difference(&bottom_up)
                .next()
                .copied();
            return Err(IntegrityReport::fail(
                IntegrityStatus::FullNodesInequality,
                stray,
                format!(
                    "{} nodes reachable from the root, {} reachable from the leaves",
                    top_down.len(),
                    bottom_up.len()
                ),
            ));
        }
        Ok(())
    }

    fn check_loops(&self, tree: &Tree) -> Result<(), IntegrityReport> {
        for snapshot in &self.loops {
            if let Err(idx) = snapshot.preserved_in(tree) {
                return Err(IntegrityReport::fail(
                    IntegrityStatus::ModifiedLoops,
                    Some(idx),
                    format!("loop '{}' changed its task set", snapshot.root_label),
                ));
            }
        }
        Ok(())
    }
}

/// Convenience wrapper: verify `tree` against `loops`.
pub fn verify_integrity(tree: &Tree, loops: &[LoopSnapshot]) -> IntegrityStatus {
    IntegrityVerifier::new(loops.to_vec()).verify(tree)
}

fn check_operators(tree: &Tree) -> Result<(), IntegrityReport> {
    for idx in tree.preorder() {
        let Some(node) = tree.node(idx) else { continue };
        if !node.operator.accepts_arity(node.arity()) {
            return Err(IntegrityReport::fail(
                IntegrityStatus::InvalidOperators,
                Some(idx),
                format!("{} with {} children", node.operator, node.arity()),
            ));
        }
    }
    Ok(())
}

/// Top-down walk. Returns every visited node and the leaves among them.
fn walk_down(
    tree: &Tree,
    root: NodeIndex,
) -> Result<(BTreeSet<NodeIndex>, Vec<NodeIndex>), IntegrityReport> {
    let mut visited = BTreeSet::from([root]);
    let mut leaves = Vec::new();
    let mut stack = vec![root];

    while let Some(idx) = stack.pop() {
        let children = tree.children(idx);
        if children.is_empty() {
            leaves.push(idx);
        }
        for &child in children {
            if child == idx {
                return Err(IntegrityReport::fail(
                    IntegrityStatus::NodeAndSuccessorEquality,
                    Some(idx),
                    "node lists itself as a child",
                ));
            }
            if !tree.contains(child) {
                return Err(IntegrityReport::fail(
                    IntegrityStatus::FullNodesInequality,
                    Some(idx),
                    format!("child {child} no longer exists"),
                ));
            }
            if !visited.insert(child) {
                return Err(IntegrityReport::fail(
                    IntegrityStatus::DuplicatedNodes,
                    Some(child),
                    "node reached along two child paths",
                ));
            }
            stack.push(child);
        }
    }
    Ok((visited, leaves))
}

/// Bottom-up walk from each leaf to the root along parent references.
fn walk_up(
    tree: &Tree,
    root: NodeIndex,
    leaves: &[NodeIndex],
) -> Result<BTreeSet<NodeIndex>, IntegrityReport> {
    let mut visited = BTreeSet::new();
    let limit = tree.slots().count();

    for &leaf in leaves {
        let mut current = leaf;
        let mut steps = 0;
        loop {
            visited.insert(current);
            if current == root {
                break;
            }
            let parent = match tree.parent(current) {
                Some(p) if p == current => {
                    return Err(IntegrityReport::fail(
                        IntegrityStatus::NodeAndPredecessorEquality,
                        Some(current),
                        "node is its own parent",
                    ));
                }
                Some(p) if tree.contains(p) => p,
                _ => {
                    return Err(IntegrityReport::fail(
                        IntegrityStatus::NodeAndPredecessorEquality,
                        Some(current),
                        format!("upward walk from leaf {leaf} ends before the root"),
                    ));
                }
            };
            steps += 1;
            if steps > limit {
                return Err(IntegrityReport::fail(
                    IntegrityStatus::NodeAndPredecessorEquality,
                    Some(current),
                    format!("upward walk from leaf {leaf} never reaches the root"),
                ));
            }
            current = parent;
        }
    }
    Ok(visited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmtree_core::{Node, Operator, TreeBuilder};

    fn sample() -> Tree {
        "SEQ(A,PAR(B,C),XOR(D,LOOP(E)))".parse().unwrap()
    }

    #[test]
    fn well_formed_tree_is_valid() {
        assert_eq!(verify_integrity(&sample(), &[]), IntegrityStatus::Valid);
        assert_eq!(verify_integrity(&Tree::new(), &[]), IntegrityStatus::Valid);
        assert_eq!(verify_integrity(&Tree::task("A"), &[]), IntegrityStatus::Valid);
    }

    #[test]
    fn degenerate_operator_rejected() {
        let tree: Tree = "SEQ(A,PAR(B))".parse().unwrap();
        let report = IntegrityVerifier::default().check(&tree);
        assert_eq!(report.status, IntegrityStatus::InvalidOperators);
        assert_eq!(tree.operator(report.node.unwrap()), Some(Operator::Par));

        let empty_loop: Tree = "SEQ(A,LOOP())".parse().unwrap();
        assert_eq!(
            verify_integrity(&empty_loop, &[]),
            IntegrityStatus::InvalidOperators
        );
        let optional: Tree = "SEQ(A,LOOP_OPTIONAL())".parse().unwrap();
        assert_eq!(verify_integrity(&optional, &[]), IntegrityStatus::Valid);
    }

    #[test]
    fn task_with_child_rejected() {
        let mut tree = sample();
        let a = tree.find_by_label("A").unwrap();
        let z = tree.add_node(Node::task("Z"));
        tree.push_child(a, z).unwrap();
        assert_eq!(verify_integrity(&tree, &[]), IntegrityStatus::InvalidOperators);
    }

    #[test]
    fn modified_loop_detected() {
        let mut b = TreeBuilder::new();
        b.open(Operator::Seq)
            .task("A")
            .open_labelled(Operator::Loop, "L1")
            .task("B")
            .close()
            .close();
        let tree = b.build().unwrap();

        let intact = LoopSnapshot::new("L1", ["B"]);
        let changed = LoopSnapshot::new("L1", ["A", "B"]);
        assert_eq!(verify_integrity(&tree, &[intact.clone()]), IntegrityStatus::Valid);
        assert_eq!(
            verify_integrity(&tree, &[intact, changed]),
            IntegrityStatus::ModifiedLoops
        );
    }

    #[test]
    fn self_child_detected() {
        let mut tree = sample();
        let root = tree.root().unwrap();
        tree.link_child_unchecked(root, root).unwrap();
        assert_eq!(
            verify_integrity(&tree, &[]),
            IntegrityStatus::NodeAndSuccessorEquality
        );
    }

    #[test]
    fn aliased_node_detected() {
        let mut tree = sample();
        let root = tree.root().unwrap();
        let b = tree.find_by_label("B").unwrap();
        let xor = tree.children(root)[2];
        tree.link_child_unchecked(xor, b).unwrap();
        assert_eq!(verify_integrity(&tree, &[]), IntegrityStatus::DuplicatedNodes);
    }

    #[test]
    fn self_parent_detected() {
        let mut tree = sample();
        let c = tree.find_by_label("C").unwrap();
        tree.set_parent_unchecked(c, Some(c)).unwrap();
        let report = IntegrityVerifier::default().check(&tree);
        assert_eq!(report.status, IntegrityStatus::NodeAndPredecessorEquality);
        assert_eq!(report.node, Some(c));
    }

    #[test]
    fn missing_back_reference_detected() {
        let mut tree = sample();
        let e = tree.find_by_label("E").unwrap();
        tree.set_parent_unchecked(e, None).unwrap();
        assert_eq!(
            verify_integrity(&tree, &[]),
            IntegrityStatus::NodeAndPredecessorEquality
        );
    }

    #[test]
    fn parent_cycle_detected() {
        let mut tree = sample();
        let root = tree.root().unwrap();
        let par = tree.children(root)[1];
        let b = tree.find_by_label("B").unwrap();
        tree.set_parent_unchecked(par, Some(b)).unwrap();
        assert_eq!(
            verify_integrity(&tree, &[]),
            IntegrityStatus::NodeAndPredecessorEquality
        );
    }

    #[test]
    fn stale_back_reference_detected() {
        // C's back-reference skips its PAR parent and points at the root.
        // Every upward walk still reaches the root, but PAR is only seen
        // because B still points at it; redirect B too.
        let mut tree = sample();
        let root = tree.root().unwrap();
        let b = tree.find_by_label("B").unwrap();
        let c = tree.find_by_label("C").unwrap();
        tree.set_parent_unchecked(b, Some(root)).unwrap();
        tree.set_parent_unchecked(c, Some(root)).unwrap();
        let report = IntegrityVerifier::default().check(&tree);
        assert_eq!(report.status, IntegrityStatus::FullNodesInequality);
        assert_eq!(report.node, Some(tree.children(root)[1]));
    }
}
