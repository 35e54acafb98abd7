//! Error types for constraint handling.

use pmtree_core::{Operator, TreeError};
use pmtree_transform::TransformError;

/// Errors from constraint handling.
#[derive(Debug, thiserror::Error)]
pub enum ConstraintError {
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("unexpected operator {operator} in constraint {constraint}")]
    UnexpectedOperator {
        operator: Operator,
        constraint: String,
    },

    #[error("not an elementary constraint: {0}")]
    NotElementary(String),

    #[error("no dependency groups and no free tasks to convert")]
    NothingToConvert,

    #[error("invalid elector configuration: {0}")]
    Config(#[from] toml::de::Error),
}
