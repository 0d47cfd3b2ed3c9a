//! Error taxonomy shared by the reconciler, the stream renderer and the component shell.

use alloc::string::String;

use crate::node::NodeId;

/// A component's render step failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The render body reported a failure.
    #[error("render failed: {0}")]
    Failed(String),
    /// A prop the component cannot render without was not supplied.
    #[error("missing required prop `{0}`")]
    MissingProp(String),
    /// A lazily loaded component could not be produced.
    #[error("failed to load component: {0}")]
    Load(String),
}

impl RenderError {
    /// Shorthand for [`RenderError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Patching or mounting ran into an unexpected host-tree state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// A description node that should be mounted has no realized node.
    #[error("description node has no realized output")]
    NotMounted,
    /// A realized node was destroyed while still referenced.
    #[error("realized node {0} no longer exists")]
    StaleNode(NodeId),
    /// An element operation targeted a text node.
    #[error("realized node {0} is not an element")]
    NotAnElement(NodeId),
    /// A positional operation targeted a node without a parent.
    #[error("realized node {0} is not attached to a parent")]
    Detached(NodeId),
    /// Any other host failure.
    #[error("host error: {0}")]
    Host(String),
}

/// Configuration could not be loaded or updated.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The input was not a valid config object.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// The flag name is not known.
    #[error("unknown configuration flag `{0}`")]
    UnknownFlag(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages() {
        assert_eq!(
            RenderError::MissingProp("src".into()).to_string(),
            "missing required prop `src`"
        );
        assert_eq!(
            ReconcileError::StaleNode(NodeId::new(4)).to_string(),
            "realized node @4 no longer exists"
        );
    }
}
