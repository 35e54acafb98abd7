//! Integrity verdicts and the diagnostic that accompanies them.

use std::fmt;

use pmtree_core::NodeIndex;

/// Outcome of an integrity check. Failures are information for the
/// caller, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegrityStatus {
    Valid,
    /// Some node has an arity its operator does not accept.
    InvalidOperators,
    /// A previously detected loop no longer covers the same tasks.
    ModifiedLoops,
    /// A node is reachable along two different child paths.
    DuplicatedNodes,
    /// A node lists itself as a child.
    NodeAndSuccessorEquality,
    /// A node is its own parent, or an upward walk ends before the root.
    NodeAndPredecessorEquality,
    /// Top-down and bottom-up traversals disagree on the node set.
    FullNodesInequality,
}

impl IntegrityStatus {
    pub fn is_valid(self) -> bool {
        self == IntegrityStatus::Valid
    }

    /// Hint for the caller on what usually produces this verdict.
    pub fn suggestion(self) -> Option<&'static str> {
        match self {
            IntegrityStatus::Valid => None,
            IntegrityStatus::InvalidOperators => {
                Some("run the cleaner to remove degenerate SEQ/PAR nodes")
            }
            IntegrityStatus::ModifiedLoops => {
                Some("retry the merge in a different order; a rewrite changed loop membership")
            }
            IntegrityStatus::DuplicatedNodes => {
                Some("copy subtrees before reusing them in a second position")
            }
            IntegrityStatus::NodeAndSuccessorEquality
            | IntegrityStatus::NodeAndPredecessorEquality
            | IntegrityStatus::FullNodesInequality => {
                Some("restructure through the tree's checked mutators only")
            }
        }
    }
}

impl fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntegrityStatus::Valid => "VALID",
            IntegrityStatus::InvalidOperators => "INVALID_OPERATORS",
            IntegrityStatus::ModifiedLoops => "MODIFIED_LOOPS",
            IntegrityStatus::DuplicatedNodes => "DUPLICATED_NODES",
            IntegrityStatus::NodeAndSuccessorEquality => "NODE_AND_SUCCESSOR_EQUALITY",
            IntegrityStatus::NodeAndPredecessorEquality => "NODE_AND_PREDECESSOR_EQUALITY",
            IntegrityStatus::FullNodesInequality => "FULL_NODES_INEQUALITY",
        };
        f.write_str(s)
    }
}

/// Verdict plus the node that triggered it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityReport {
    pub status: IntegrityStatus,
    pub node: Option<NodeIndex>,
    pub message: String,
}

impl IntegrityReport {
    pub fn valid() -> Self {
        Self {
            status: IntegrityStatus::Valid,
            node: None,
            message: String::new(),
        }
    }

    pub(crate) fn fail(
        status: IntegrityStatus,
        node: Option<NodeIndex>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            node,
            message: message.into(),
        }
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status)?;
        if let Some(node) = self.node {
            write!(f, " at node {node}")?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(hint) = self.status.suggestion() {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}
