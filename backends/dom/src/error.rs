use alloc::string::{String, ToString};

use brook_core::{NodeId, ReconcileError};

/// Error type produced by host-tree operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The node was destroyed or never existed.
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    /// An element operation targeted a text node.
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
    /// A text operation targeted an element.
    #[error("node {0} is not a text node")]
    NotText(NodeId),
    /// The reference node is not a child of the given parent.
    #[error("node {child} is not a child of {parent}")]
    NotAChild {
        /// The expected parent.
        parent: NodeId,
        /// The node that was expected to be its child.
        child: NodeId,
    },
    /// The insertion would make a node its own ancestor.
    #[error("inserting {child} under {parent} would create a cycle")]
    Cycle {
        /// The would-be parent.
        parent: NodeId,
        /// The node being inserted.
        child: NodeId,
    },
    /// The selector could not be parsed.
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
    /// The markup could not be parsed.
    #[error("malformed markup at byte {offset}: {reason}")]
    Parse {
        /// Byte offset of the failure.
        offset: usize,
        /// What went wrong.
        reason: String,
    },
}

impl From<DomError> for ReconcileError {
    fn from(value: DomError) -> Self {
        match value {
            DomError::UnknownNode(node) => Self::StaleNode(node),
            DomError::NotAnElement(node) => Self::NotAnElement(node),
            DomError::NotAChild { child, .. } => Self::Detached(child),
            other => Self::Host(other.to_string()),
        }
    }
}
