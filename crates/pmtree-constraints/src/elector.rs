//! Selection of the next constraint to integrate into a growing tree.

use std::collections::BTreeSet;

use pmtree_core::Tree;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ConstraintError;

/// How [`Elector::next_tree`] picks among several candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElectionStrategy {
    /// Prefer candidates whose endpoints the current tree already
    /// contains: both, then one, then the first candidate.
    #[default]
    MostCommonFirst,
    /// Uniformly random, reproducible from `seed`.
    Random { seed: u64 },
}

/// Elector configuration.
///
/// ```toml
/// [strategy]
/// kind = "random"
/// seed = 7
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElectorConfig {
    pub strategy: ElectionStrategy,
}

impl ElectorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConstraintError> {
        Ok(toml::from_str(s)?)
    }
}

#[derive(Debug)]
pub struct Elector {
    strategy: ElectionStrategy,
    rng: Option<StdRng>,
}

impl Default for Elector {
    fn default() -> Self {
        Self::new(ElectorConfig::default())
    }
}

impl Elector {
    pub fn new(config: ElectorConfig) -> Self {
        let rng = match config.strategy {
            ElectionStrategy::Random { seed } => Some(StdRng::seed_from_u64(seed)),
            ElectionStrategy::MostCommonFirst => None,
        };
        Self {
            strategy: config.strategy,
            rng,
        }
    }

    pub fn strategy(&self) -> ElectionStrategy {
        self.strategy
    }

    /// Index of the candidate to integrate next into `current`, or `None`
    /// if there are no candidates.
    pub fn next_tree(&mut self, candidates: &[Tree], current: &Tree) -> Option<usize> {
        let choice = match candidates.len() {
            0 => return None,
            1 => 0,
            n => match &mut self.rng {
                Some(rng) => rng.gen_range(0..n),
                None => most_common_first(candidates, &current.all_task_labels()),
            },
        };
        trace!(choice, candidates = candidates.len(), "elect");
        Some(choice)
    }
}

fn most_common_first(candidates: &[Tree], present: &BTreeSet<String>) -> usize {
    let shared = |tree: &Tree| -> usize {
        tree.endpoints()
            .map(|(a, b)| usize::from(present.contains(a)) + usize::from(present.contains(b)))
            .unwrap_or(0)
    };
    candidates
        .iter()
        .position(|t| shared(t) == 2)
        .or_else(|| candidates.iter().position(|t| shared(t) == 1))
        .unwrap_or(0)
}
