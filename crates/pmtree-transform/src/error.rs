//! Transformation errors.

use pmtree_core::TreeError;
use thiserror::Error;

/// Errors that abort a rewriting pass.
///
/// Every variant means the tree no longer satisfies a precondition the
/// remaining pipeline relies on; none of them is retried internally.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("invariant violated in {pass}: {message}")]
    InvariantViolated { pass: &'static str, message: String },

    #[error("invalid pipeline configuration: {0}")]
    Config(#[from] toml::de::Error),
}
