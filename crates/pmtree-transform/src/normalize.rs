//! Label normalization: replacing task names with short synthetic names.
//!
//! Names are handed out by a correspondence table keyed by node identity, in
//! first-seen preorder across the whole collection. Two TASK nodes with the
//! same label but different identities get different names; a node reused
//! through [`Clone`] (same identity) keeps its name.

use std::collections::{BTreeMap, HashMap};

use pmtree_core::{NodeId, NodeIndex, Tree};
use tracing::debug;

/// Synthetic name for the `index`-th task: one `A` per full 26, then the
/// letter for the remainder. `0 -> A`, `25 -> Z`, `26 -> AA`, `27 -> AB`,
/// `52 -> AAA`.
pub fn canonical_name(index: usize) -> String {
    let mut name = "A".repeat(index / 26);
    name.push(char::from(b'A' + (index % 26) as u8));
    name
}

fn tasks(tree: &Tree) -> Vec<NodeIndex> {
    tree.root().map(|r| tree.task_nodes(r)).unwrap_or_default()
}

/// Normalized trees plus the canonical-name to original-label map.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub trees: Vec<Tree>,
    pub reverse: BTreeMap<String, String>,
}

/// Correspondence table shared across a collection.
#[derive(Debug, Default)]
pub struct Normalizer {
    table: HashMap<NodeId, String>,
    reverse: BTreeMap<String, String>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn name_for(&mut self, id: NodeId, label: &str) -> String {
        if let Some(name) = self.table.get(&id) {
            return name.clone();
        }
        let name = canonical_name(self.table.len());
        self.table.insert(id, name.clone());
        self.reverse.insert(name.clone(), label.to_string());
        name
    }

    /// Normalized copy of `tree` with fresh identities.
    pub fn normalize(&mut self, tree: &Tree) -> Tree {
        // Clone keeps slot indices, so the preorder below addresses the copy.
        let mut copy = tree.clone();
        for idx in tasks(tree) {
            let Some(node) = tree.node(idx) else { continue };
            let name = self.name_for(node.id, &node.label);
            if let Ok(target) = copy.get_mut(idx) {
                target.label = name;
            }
        }
        copy.deep_copy()
    }

    /// The canonical-name to original-label map collected so far.
    pub fn reverse(&self) -> &BTreeMap<String, String> {
        &self.reverse
    }

    pub fn into_reverse(self) -> BTreeMap<String, String> {
        self.reverse
    }
}

/// Normalize a collection with one fresh correspondence table.
pub fn normalize(trees: &[Tree]) -> Normalized {
    let mut normalizer = Normalizer::new();
    let trees: Vec<Tree> = trees.iter().map(|t| normalizer.normalize(t)).collect();
    debug!(trees = trees.len(), names = normalizer.reverse.len(), "normalize");
    Normalized {
        trees,
        reverse: normalizer.into_reverse(),
    }
}

/// Restore original labels. Tasks whose label is not in `reverse` keep it.
pub fn denormalize(tree: &Tree, reverse: &BTreeMap<String, String>) -> Tree {
    let mut copy = tree.clone();
    for idx in tasks(tree) {
        let Some(original) = tree.label(idx).and_then(|l| reverse.get(l)) else {
            continue;
        };
        if let Ok(target) = copy.get_mut(idx) {
            target.label = original.clone();
        }
    }
    copy
}
