//! Core data model for process-model trees.
//!
//! A process model is a tree of SEQ/PAR/XOR/LOOP operators over atomic
//! TASK leaves. Trees are stored in an arena ([`Tree`]) so that every
//! structural rewrite updates one authoritative table of child lists and
//! parent back-references.

pub mod builder;
pub mod hash;
pub mod tree;

pub use builder::TreeBuilder;
pub use hash::{content_hash, hash_hex, ContentHash};
pub use tree::node::{Node, NodeId, NodeIndex, Operator, UnknownOperator};
pub use tree::{Shape, Tree, TreeError};
