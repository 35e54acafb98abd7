//! Constraint bridge: conversions between elementary constraint trees and
//! the dependency-graph form used for BPMN assembly.

use std::collections::{BTreeMap, BTreeSet};

use pmtree_core::{Operator, Tree};
use tracing::debug;

use crate::error::ConstraintError;
use crate::graph::DependencyGraph;

/// One `SEQ(key, dependent)` per entry of a transitive-closure mapping,
/// in key order then dependent order.
pub fn expand_closure(closure: &BTreeMap<String, BTreeSet<String>>) -> Vec<Tree> {
    closure
        .iter()
        .flat_map(|(key, deps)| {
            deps.iter()
                .map(move |dep| Tree::constraint(Operator::Seq, key.as_str(), dep.as_str()))
        })
        .collect()
}

/// Constraints sorted by operator, each bucket in input order.
#[derive(Debug, Clone, Default)]
pub struct Separated {
    pub sequences: Vec<Tree>,
    pub parallels: Vec<Tree>,
    pub choices: Vec<Tree>,
}

/// Sort constraints into SEQ, PAR and XOR buckets. Any other root operator
/// aborts with [`ConstraintError::UnexpectedOperator`].
pub fn separate(constraints: &[Tree]) -> Result<Separated, ConstraintError> {
    let mut out = Separated::default();
    for tree in constraints {
        let operator = tree
            .root_node()
            .map(|n| n.operator)
            .ok_or_else(|| ConstraintError::NotElementary(tree.to_string()))?;
        let bucket = match operator {
            Operator::Seq => &mut out.sequences,
            Operator::Par => &mut out.parallels,
            Operator::Xor => &mut out.choices,
            _ => {
                return Err(ConstraintError::UnexpectedOperator {
                    operator,
                    constraint: tree.to_string(),
                })
            }
        };
        bucket.push(tree.clone());
    }
    debug!(
        sequences = out.sequences.len(),
        parallels = out.parallels.len(),
        choices = out.choices.len(),
        "separate"
    );
    Ok(out)
}

fn endpoints(tree: &Tree) -> Result<(String, String), ConstraintError> {
    tree.endpoints()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .ok_or_else(|| ConstraintError::NotElementary(tree.to_string()))
}

/// `(from, to)` dependency edges of elementary SEQ constraints.
pub fn dependency_edges(sequences: &[Tree]) -> Result<Vec<(String, String)>, ConstraintError> {
    sequences
        .iter()
        .map(|tree| match tree.root_node().map(|n| n.operator) {
            Some(Operator::Seq) => endpoints(tree),
            Some(operator) => Err(ConstraintError::UnexpectedOperator {
                operator,
                constraint: tree.to_string(),
            }),
            None => Err(ConstraintError::NotElementary(tree.to_string())),
        })
        .collect()
}

/// Input for BPMN assembly: one graph per independent dependency group
/// plus the tasks no ordering constrains.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub graphs: Vec<DependencyGraph>,
    pub free_tasks: BTreeSet<String>,
}

/// Group SEQ constraints into independent dependency graphs. Tasks that
/// appear only in PAR constraints are free. Fails with
/// [`ConstraintError::NothingToConvert`] when both results are empty.
pub fn assemble(sequences: &[Tree], parallels: &[Tree]) -> Result<Assembly, ConstraintError> {
    let graph = DependencyGraph::from_edges(dependency_edges(sequences)?);

    let mut free_tasks = BTreeSet::new();
    for tree in parallels {
        let (a, b) = endpoints(tree)?;
        for task in [a, b] {
            if !graph.contains(&task) {
                free_tasks.insert(task);
            }
        }
    }

    let graphs = graph.groups();
    if graphs.is_empty() && free_tasks.is_empty() {
        return Err(ConstraintError::NothingToConvert);
    }
    debug!(groups = graphs.len(), free = free_tasks.len(), "assemble");
    Ok(Assembly { graphs, free_tasks })
}
