//! Contradiction detection for sets of elementary constraints.
//!
//! `SEQ(a,b)` forbids `PAR(a,b)` and `PAR(b,a)`; `XOR(a,b)` forbids
//! `SEQ(a,b)` and `SEQ(b,a)`. A set is consistent when no constraint's
//! forbidden signature is present in the set and every constraint is a
//! two-task SEQ, PAR or XOR.

use std::collections::HashSet;
use std::fmt;

use pmtree_core::{ContentHash, Operator, Tree};
use tracing::debug;

/// Why a constraint makes its set inconsistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// The set also holds this forbidden constraint.
    Forbids(String),
    /// The root operator is not SEQ, PAR or XOR.
    UnsupportedOperator(Operator),
    /// The tree does not have exactly two TASK leaves under its root.
    NotElementary,
}

/// One offending constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contradiction {
    /// Position in the analyzed list.
    pub index: usize,
    /// Canonical text of the offending constraint.
    pub constraint: String,
    pub reason: Reason,
}

impl fmt::Display for Contradiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}: ", self.index, self.constraint)?;
        match &self.reason {
            Reason::Forbids(other) => write!(f, "contradicts {other}"),
            Reason::UnsupportedOperator(op) => write!(f, "unsupported operator {op}"),
            Reason::NotElementary => f.write_str("not an elementary constraint"),
        }
    }
}

/// Constraints that may not coexist with `tree`.
pub fn forbidden_by(tree: &Tree) -> Result<Vec<Tree>, Reason> {
    let op = tree
        .root_node()
        .map(|n| n.operator)
        .ok_or(Reason::NotElementary)?;
    if !matches!(op, Operator::Seq | Operator::Par | Operator::Xor) {
        return Err(Reason::UnsupportedOperator(op));
    }
    let (a, b) = tree.endpoints().ok_or(Reason::NotElementary)?;
    Ok(match op {
        Operator::Seq => vec![
            Tree::constraint(Operator::Par, a, b),
            Tree::constraint(Operator::Par, b, a),
        ],
        Operator::Xor => vec![
            Tree::constraint(Operator::Seq, a, b),
            Tree::constraint(Operator::Seq, b, a),
        ],
        _ => Vec::new(),
    })
}

/// Every contradiction in `constraints`, in list order.
pub fn find_contradictions(constraints: &[Tree]) -> Vec<Contradiction> {
    let signatures: HashSet<ContentHash> =
        constraints.iter().map(Tree::structural_hash).collect();

    let mut found = Vec::new();
    for (index, tree) in constraints.iter().enumerate() {
        let reasons = match forbidden_by(tree) {
            Ok(forbidden) => forbidden
                .iter()
                .filter(|f| signatures.contains(&f.structural_hash()))
                .map(|f| Reason::Forbids(f.to_string()))
                .collect(),
            Err(reason) => vec![reason],
        };
        found.extend(reasons.into_iter().map(|reason| Contradiction {
            index,
            constraint: tree.to_string(),
            reason,
        }));
    }
    debug!(
        constraints = constraints.len(),
        contradictions = found.len(),
        "analyze constraints"
    );
    found
}

/// Stateless checker over constraint lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintsAnalyzer;

impl ConstraintsAnalyzer {
    /// Whether `constraints` can all hold at once.
    pub fn is_consistent(&self, constraints: &[Tree]) -> bool {
        find_contradictions(constraints).is_empty()
    }

    pub fn contradictions(&self, constraints: &[Tree]) -> Vec<Contradiction> {
        find_contradictions(constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(srcs: &[&str]) -> Vec<Tree> {
        srcs.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn order_contradicts_parallel() {
        let constraints = parse_all(&["SEQ(A,B)", "PAR(B,A)"]);
        let found = find_contradictions(&constraints);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].index, 0);
        assert_eq!(found[0].reason, Reason::Forbids("PAR(B,A)".into()));
        assert!(!ConstraintsAnalyzer.is_consistent(&constraints));
    }

    #[test]
    fn choice_contradicts_order() {
        let constraints = parse_all(&["XOR(A,B)", "SEQ(A,C)", "SEQ(B,A)"]);
        let found = find_contradictions(&constraints);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].to_string(), "#0 XOR(A,B): contradicts SEQ(B,A)");
    }

    #[test]
    fn compatible_facts_are_consistent() {
        let constraints = parse_all(&["SEQ(A,B)", "SEQ(B,C)", "PAR(A,D)", "XOR(C,E)"]);
        assert!(ConstraintsAnalyzer.is_consistent(&constraints));
    }

    #[test]
    fn parallel_and_choice_may_coexist() {
        let constraints = parse_all(&["PAR(A,B)", "XOR(A,B)"]);
        assert!(ConstraintsAnalyzer.is_consistent(&constraints));
    }

    #[test]
    fn unsupported_operator_fails() {
        let constraints = parse_all(&["SEQ(A,B)", "LOOP(A,B)"]);
        let found = ConstraintsAnalyzer.contradictions(&constraints);
        assert_eq!(found[0].index, 1);
        assert_eq!(found[0].reason, Reason::UnsupportedOperator(Operator::Loop));
    }

    #[test]
    fn composite_constraint_is_not_elementary() {
        let constraints = parse_all(&["SEQ(A,B,C)"]);
        assert_eq!(
            find_contradictions(&constraints)[0].reason,
            Reason::NotElementary
        );
        assert_eq!(forbidden_by(&Tree::new()).unwrap_err(), Reason::NotElementary);
    }
}
