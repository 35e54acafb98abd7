//! Refinement pipeline orchestrator.

use std::time::Instant;

use pmtree_core::Tree;
use pmtree_verify::{IntegrityVerifier, LoopSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::canonicalize::canonicalize;
use crate::choice::ChoiceReducer;
use crate::clean::Cleaner;
use crate::error::TransformError;
use crate::reduce::Reductor;
use crate::report::RefinementReport;
use crate::transform::TransformRegistry;

/// Configuration for the refinement pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Merge XOR branches not protected by a mandatory choice.
    pub relax_choices: bool,
    /// Run the integrity verifier on the result.
    pub verify: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            relax_choices: true,
            verify: true,
        }
    }
}

impl PipelineConfig {
    /// Parse from TOML. Missing keys take their defaults.
    ///
    /// ```toml
    /// relax_choices = false
    /// verify = true
    /// ```
    pub fn from_toml_str(s: &str) -> Result<Self, TransformError> {
        Ok(toml::from_str(s)?)
    }
}

/// Output of a successful refinement run.
#[derive(Debug)]
pub struct PipelineOutput {
    /// The refined tree.
    pub tree: Tree,
    /// Pipeline report with statistics.
    pub report: RefinementReport,
}

/// Run the refinement pipeline:
/// canonicalize -> relax choices -> clean + reduce -> verify -> compact.
///
/// `mandatory` holds the XOR constraints whose exclusivity must survive;
/// `loops` the loop snapshots the result must still honor. A failed
/// verification is reported, not returned as an error.
pub fn refine(
    tree: Tree,
    mandatory: &[Tree],
    loops: &[LoopSnapshot],
    config: &PipelineConfig,
) -> Result<PipelineOutput, TransformError> {
    let start = Instant::now();

    // Stage 1: canonicalization
    let (mut tree, canonicalization) = canonicalize(tree)?;

    // Stage 2: choice relaxation, then restore minimal form
    let choices = ChoiceReducer::from_constraints(mandatory);
    let mandatory_choices = choices.mandatory().len();
    let mut registry = TransformRegistry::new();
    if config.relax_choices {
        registry.register(Box::new(choices));
    }
    registry.register(Box::new(Cleaner));
    registry.register(Box::new(Reductor));
    let transforms = registry.apply_all(&mut tree)?;

    // Stage 3: verification
    let integrity = config.verify.then(|| {
        let report = IntegrityVerifier::new(loops.to_vec()).check(&tree);
        if !report.status.is_valid() {
            warn!(%report, "refined tree failed integrity verification");
        }
        report
    });

    // Stage 4: release the slots freed by the rewrites
    let reclaimed = tree.compact();

    let report = RefinementReport {
        duration_ms: start.elapsed().as_millis() as u64,
        canonicalization,
        transforms,
        mandatory_choices,
        integrity,
    };
    info!(
        rewrites = report.total_rewrites(),
        nodes = tree.node_count(),
        reclaimed,
        "refinement complete"
    );
    Ok(PipelineOutput { tree, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmtree_core::Operator;
    use pmtree_verify::IntegrityStatus;

    #[test]
    fn refine_relaxes_and_flattens() {
        let tree: Tree = "SEQ(A,SEQ(XOR(B,C,E)),D)".parse().unwrap();
        let mandatory = [Tree::constraint(Operator::Xor, "B", "E")];
        let output = refine(tree, &mandatory, &[], &PipelineConfig::default()).unwrap();
        assert_eq!(output.tree.to_string(), "SEQ(A,XOR(PAR(B,C),E),D)");
        assert_eq!(output.report.verification_passed(), Some(true));
        assert_eq!(output.report.transforms.len(), 3);
        assert_eq!(output.report.transforms[0].pass, "relax-choices");
        assert_eq!(output.report.transforms[0].rewrites, 1);
    }

    #[test]
    fn fully_merged_choice_is_reported() {
        let tree: Tree = "SEQ(A,XOR(B,C))".parse().unwrap();
        let output = refine(tree, &[], &[], &PipelineConfig::default()).unwrap();
        assert_eq!(output.tree.to_string(), "SEQ(A,XOR(PAR(B,C)))");
        let integrity = output.report.integrity.unwrap();
        assert_eq!(integrity.status, IntegrityStatus::InvalidOperators);
    }

    #[test]
    fn refined_tree_is_compacted() {
        let tree: Tree = "SEQ(A,SEQ(PAR(B)),XOR(C,D,E))".parse().unwrap();
        let output = refine(tree, &[], &[], &PipelineConfig::default()).unwrap();
        assert_eq!(output.tree.arena_len(), output.tree.node_count());
        let root = output.tree.root().unwrap();
        assert_eq!(root.index(), 0);
        for idx in output.tree.preorder().into_iter().skip(1) {
            let parent = output.tree.parent(idx).unwrap();
            assert!(output.tree.children(parent).contains(&idx));
        }
    }

    #[test]
    fn mandatory_choices_survive() {
        let tree: Tree = "XOR(PAR(A,B),C)".parse().unwrap();
        let mandatory = [Tree::constraint(Operator::Xor, "A", "C")];
        let output = refine(tree, &mandatory, &[], &PipelineConfig::default()).unwrap();
        assert_eq!(output.tree.to_string(), "XOR(PAR(A,B),C)");
        assert_eq!(output.report.mandatory_choices, 1);
    }

    #[test]
    fn relaxation_can_be_disabled() {
        let config = PipelineConfig::from_toml_str("relax_choices = false").unwrap();
        assert!(config.verify);
        let tree: Tree = "XOR(A,B)".parse().unwrap();
        let output = refine(tree, &[], &[], &config).unwrap();
        assert_eq!(output.tree.to_string(), "XOR(A,B)");
        assert_eq!(output.report.transforms.len(), 2);
    }

    #[test]
    fn modified_loop_is_reported_not_raised() {
        let tree: Tree = "SEQ(A,LOOP(B))".parse().unwrap();
        let loops = [LoopSnapshot::new("LOOP", ["B", "C"])];
        let output = refine(tree, &[], &loops, &PipelineConfig::default()).unwrap();
        let integrity = output.report.integrity.unwrap();
        assert_eq!(integrity.status, IntegrityStatus::ModifiedLoops);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = PipelineConfig::from_toml_str("verify = 3").unwrap_err();
        assert!(matches!(err, TransformError::Config(_)));
    }
}
