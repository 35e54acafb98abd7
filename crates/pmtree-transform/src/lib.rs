//! Rewriting passes over process-model trees.
//!
//! Every pass mutates a [`Tree`](pmtree_core::Tree) in place through its
//! safe surgery API, so parent back-references stay consistent:
//!
//! - [`reduce`]: associativity flattening (`SEQ(SEQ(a,b),c)` to `SEQ(a,b,c)`);
//! - [`clean`]: removal of SEQ/PAR nodes with fewer than two children;
//! - [`choice`]: merging XOR branches not protected by a mandatory choice;
//! - [`split`]: decomposition into elementary pairwise constraints;
//! - [`normalize`]: replacement of task labels by synthetic names.
//!
//! [`pipeline::refine`] chains them and verifies the result.

pub mod canonicalize;
pub mod choice;
pub mod clean;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod reduce;
pub mod report;
pub mod split;
pub mod transform;

pub use canonicalize::{canonicalize, CanonicalizationStats};
pub use choice::{relax_choices, ChoiceReducer, MandatoryChoice};
pub use clean::{clean, Cleaner};
pub use error::TransformError;
pub use normalize::{canonical_name, denormalize, normalize, Normalized, Normalizer};
pub use pipeline::{refine, PipelineConfig, PipelineOutput};
pub use reduce::{reduce, Reductor};
pub use report::RefinementReport;
pub use split::split;
pub use transform::{TransformRegistry, TransformStats, TreeTransform};
