//! Structural integrity verification for process-model trees.
//!
//! Tree-rewriting passes restructure trees in place. The verifier catches
//! every way such surgery can corrupt a tree: operators left with the wrong
//! arity, detected loops whose membership silently changed, aliased or
//! self-referencing subtrees, and parent references that no longer agree
//! with child lists.

pub mod integrity;
pub mod loops;
pub mod report;

pub use integrity::{verify_integrity, IntegrityVerifier};
pub use loops::LoopSnapshot;
pub use report::{IntegrityReport, IntegrityStatus};
