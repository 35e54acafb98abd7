//! Refinement report aggregating all pipeline stages.

use std::fmt;

use pmtree_verify::IntegrityReport;

use crate::canonicalize::CanonicalizationStats;
use crate::transform::TransformStats;

/// Summary report of one refinement run.
#[derive(Debug, Clone)]
pub struct RefinementReport {
    /// Total pipeline duration in milliseconds.
    pub duration_ms: u64,
    /// Canonicalization statistics.
    pub canonicalization: CanonicalizationStats,
    /// Statistics from every pass after canonicalization.
    pub transforms: Vec<TransformStats>,
    /// Number of mandatory choices the relaxation honored.
    pub mandatory_choices: usize,
    /// Integrity verdict, if verification was enabled.
    pub integrity: Option<IntegrityReport>,
}

impl RefinementReport {
    /// Whether verification ran and passed. `None` when it was disabled.
    pub fn verification_passed(&self) -> Option<bool> {
        self.integrity.as_ref().map(|r| r.status.is_valid())
    }

    /// Total rewrites across canonicalization and every pass.
    pub fn total_rewrites(&self) -> usize {
        self.canonicalization.nodes_eliminated
            + self.canonicalization.nodes_flattened
            + self.transforms.iter().map(|t| t.rewrites).sum::<usize>()
    }
}

impl fmt::Display for RefinementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Refinement Report ===")?;
        writeln!(f, "Duration: {} ms", self.duration_ms)?;
        writeln!(f)?;

        writeln!(f, "--- Canonicalization ---")?;
        writeln!(
            f,
            "  Nodes: {} -> {} ({} eliminated, {} flattened)",
            self.canonicalization.initial_node_count,
            self.canonicalization.final_node_count,
            self.canonicalization.nodes_eliminated,
            self.canonicalization.nodes_flattened,
        )?;

        if !self.transforms.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "--- Passes ({}, {} mandatory choices) ---",
                self.transforms.len(),
                self.mandatory_choices
            )?;
            for stats in &self.transforms {
                writeln!(
                    f,
                    "  {}: {} rewrites, {} -> {} nodes",
                    stats.pass, stats.rewrites, stats.nodes_before, stats.nodes_after,
                )?;
            }
        }

        writeln!(f)?;
        match &self.integrity {
            Some(report) if report.status.is_valid() => {
                writeln!(f, "--- Verification: PASSED ---")?;
            }
            Some(report) => {
                writeln!(f, "--- Verification: FAILED ---")?;
                writeln!(f, "  {report}")?;
            }
            None => writeln!(f, "--- Verification: SKIPPED ---")?,
        }
        Ok(())
    }
}
