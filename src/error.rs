//! Errors surfaced by the component shell.

use brook_core::{ReconcileError, RenderError};
use brook_dom::DomError;

/// Failure of a component lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The render step failed and self-healing is off.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Applying the output to the host tree failed and self-healing is off.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    /// The host tree rejected a direct query.
    #[error(transparent)]
    Dom(#[from] DomError),
    /// The operation needs a mounted component.
    #[error("component is not mounted")]
    NotMounted,
    /// The host document was borrowed elsewhere when the component tried to commit.
    #[error("host document is busy")]
    DocumentBusy,
}
