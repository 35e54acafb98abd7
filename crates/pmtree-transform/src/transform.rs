//! Transform trait and registry for whole-tree rewriting passes.

use std::fmt;

use pmtree_core::Tree;

use crate::error::TransformError;

/// Statistics from applying one rewriting pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Name of the pass.
    pub pass: String,
    /// Individual rewrites performed (splices, eliminations, merges).
    pub rewrites: usize,
    /// Reachable node count before the pass.
    pub nodes_before: usize,
    /// Reachable node count after the pass.
    pub nodes_after: usize,
}

impl TransformStats {
    pub fn changed(&self) -> bool {
        self.rewrites > 0
    }
}

/// A whole-tree rewriting pass.
///
/// Object-safe so passes can be stored in `Box<dyn TreeTransform>`.
pub trait TreeTransform: fmt::Debug {
    /// Human-readable name of this pass.
    fn name(&self) -> &str;

    /// Rewrite the tree in place, returning the number of rewrites.
    fn rewrite(&self, tree: &mut Tree) -> Result<usize, TransformError>;

    /// Apply the pass and collect statistics.
    fn apply(&self, tree: &mut Tree) -> Result<TransformStats, TransformError> {
        let nodes_before = tree.node_count();
        let rewrites = self.rewrite(tree)?;
        Ok(TransformStats {
            pass: self.name().to_string(),
            rewrites,
            nodes_before,
            nodes_after: tree.node_count(),
        })
    }
}

/// Ordered sequence of passes.
#[derive(Debug, Default)]
pub struct TransformRegistry {
    transforms: Vec<Box<dyn TreeTransform>>,
}

impl TransformRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pass; passes run in registration order.
    pub fn register(&mut self, transform: Box<dyn TreeTransform>) {
        self.transforms.push(transform);
    }

    pub fn transforms(&self) -> &[Box<dyn TreeTransform>] {
        &self.transforms
    }

    /// Apply all registered passes in order, stopping at the first error.
    pub fn apply_all(&self, tree: &mut Tree) -> Result<Vec<TransformStats>, TransformError> {
        self.transforms.iter().map(|t| t.apply(tree)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::Cleaner;
    use crate::reduce::Reductor;

    #[test]
    fn registry_runs_in_order() {
        let mut registry = TransformRegistry::new();
        registry.register(Box::new(Cleaner));
        registry.register(Box::new(Reductor));
        assert_eq!(registry.transforms().len(), 2);

        let mut tree: Tree = "SEQ(A,PAR(SEQ(B,C)))".parse().unwrap();
        let stats = registry.apply_all(&mut tree).unwrap();
        assert_eq!(stats[0].pass, "clean");
        assert_eq!(stats[0].rewrites, 1);
        assert_eq!(stats[1].pass, "reduce");
        assert_eq!(stats[1].rewrites, 1);
        assert_eq!(tree.to_string(), "SEQ(A,B,C)");
        assert_eq!(stats[1].nodes_after, 4);
    }

    #[test]
    fn stats_default_is_unchanged() {
        let stats = TransformStats::default();
        assert!(!stats.changed());
    }
}
