//! Operator kinds and the Node struct.
//!
//! A node is either a TASK leaf carrying a real task name, or an operator
//! combining its children under sequential, parallel, exclusive-choice, or
//! repetition semantics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique node identifier, assigned at construction.
pub type NodeId = Uuid;

/// Slot of a node inside its owning [`Tree`](super::Tree) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    /// Raw slot number.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operator {
    /// Atomic task (leaf).
    Task,
    /// Children run one after another, in order.
    Seq,
    /// Children run concurrently.
    Par,
    /// Exactly one child runs.
    Xor,
    Loop,
    LoopMandatory,
    LoopOptional,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Operator; 7] = [
        Operator::Task,
        Operator::Seq,
        Operator::Par,
        Operator::Xor,
        Operator::Loop,
        Operator::LoopMandatory,
        Operator::LoopOptional,
    ];

    /// Keyword used by the canonical text form.
    pub fn keyword(self) -> &'static str {
        match self {
            Operator::Task => "TASK",
            Operator::Seq => "SEQ",
            Operator::Par => "PAR",
            Operator::Xor => "XOR",
            Operator::Loop => "LOOP",
            Operator::LoopMandatory => "LOOP_MANDATORY",
            Operator::LoopOptional => "LOOP_OPTIONAL",
        }
    }

    /// Minimum number of children a well-formed node of this kind needs.
    ///
    /// TASK is the only kind with an upper bound (zero), see [`Operator::accepts_arity`].
    pub fn min_arity(self) -> usize {
        match self {
            Operator::Task | Operator::LoopOptional => 0,
            Operator::Loop | Operator::LoopMandatory => 1,
            Operator::Seq | Operator::Par | Operator::Xor => 2,
        }
    }

    /// Whether `arity` children is well-formed for this kind.
    pub fn accepts_arity(self, arity: usize) -> bool {
        match self {
            Operator::Task => arity == 0,
            other => arity >= other.min_arity(),
        }
    }

    pub fn is_task(self) -> bool {
        self == Operator::Task
    }

    pub fn is_loop(self) -> bool {
        matches!(
            self,
            Operator::Loop | Operator::LoopMandatory | Operator::LoopOptional
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Error returned when a keyword does not name an operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator keyword: {0}")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .into_iter()
            .find(|op| op.keyword() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

/// A node in a process-model tree.
///
/// Child and parent links are arena indices; they are maintained by the
/// owning tree's mutators and read through accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Globally unique identifier.
    pub id: NodeId,
    /// Node kind.
    pub operator: Operator,
    /// Display name. For TASK nodes this is the real task name.
    pub label: String,
    pub(crate) children: Vec<NodeIndex>,
    pub(crate) parent: Option<NodeIndex>,
    /// Transient marker used by decomposition passes.
    #[serde(skip)]
    pub(crate) available: bool,
}

impl Node {
    /// Create a new node with a random UUID.
    pub fn new(operator: Operator, label: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), operator, label)
    }

    /// Create a node with a specific ID (reserved sentinels, deserialization, tests).
    pub fn with_id(id: NodeId, operator: Operator, label: impl Into<String>) -> Self {
        Self {
            id,
            operator,
            label: label.into(),
            children: Vec::new(),
            parent: None,
            available: false,
        }
    }

    /// A TASK leaf.
    pub fn task(label: impl Into<String>) -> Self {
        Self::new(Operator::Task, label)
    }

    /// An operator node labelled with its own keyword.
    pub fn operator(operator: Operator) -> Self {
        Self::new(operator, operator.keyword())
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn arity(&self) -> usize {
        self.children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Same kind and label, fresh identity, no links.
    pub(crate) fn detached_copy(&self) -> Self {
        Self::new(self.operator, self.label.clone())
    }
}
