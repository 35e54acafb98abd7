//! Elementary constraint handling for process-model trees.
//!
//! Reconstruction starts from a list of two-task constraint trees
//! (`SEQ(a,b)`, `PAR(a,b)`, `XOR(a,b)`). This crate prepares and inspects
//! that list and bridges it to the dependency-graph form:
//!
//! - [`purify`] drops structural duplicates;
//! - [`DummyStart`] anchors a sentinel start task and releases it again;
//! - [`ConstraintsAnalyzer`] detects mutually exclusive facts;
//! - [`Elector`] picks the next constraint to integrate;
//! - [`bridge`] and [`DependencyGraph`] convert to and from dependency
//!   edges, grouped for BPMN assembly.

pub mod anchor;
pub mod bridge;
pub mod conflict;
pub mod elector;
pub mod error;
pub mod graph;
pub mod purify;

pub use anchor::{DummyStart, DUMMY_START_LABEL};
pub use bridge::{assemble, dependency_edges, expand_closure, separate, Assembly, Separated};
pub use conflict::{find_contradictions, forbidden_by, Contradiction, ConstraintsAnalyzer, Reason};
pub use elector::{ElectionStrategy, Elector, ElectorConfig};
pub use error::ConstraintError;
pub use graph::DependencyGraph;
pub use purify::purify;
