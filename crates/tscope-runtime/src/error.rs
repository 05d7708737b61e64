#![forbid(unsafe_code)]

use std::fmt;

use tscope_core::identifier::Identifier;
use tscope_core::payload_cache::FetchError;
use tscope_core::storage::StorageError;
use tscope_diff::batch::BatchError;
use tscope_diff::diff::DiffError;
use tscope_render::projection::ProjectionError;
use tscope_render::viewport::ViewportError;

/// Failures of [`Inspector`](crate::session::Inspector) operations.
///
/// A failed operation never changes the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The operation needs a displayed tensor.
    NoTensor,
    /// The identifier is not in the loaded catalog.
    UnknownIdentifier { identifier: Identifier },
    Projection(ProjectionError),
    Viewport(ViewportError),
    Storage(StorageError),
    Fetch(FetchError),
    Diff(DiffError),
    Batch(BatchError),
    /// The background batch thread died before reporting.
    WorkerLost,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTensor => f.write_str("no tensor is displayed"),
            Self::UnknownIdentifier { identifier } => {
                write!(f, "'{identifier}' is not in the catalog")
            }
            Self::Projection(e) => write!(f, "{e}"),
            Self::Viewport(e) => write!(f, "{e}"),
            Self::Storage(e) => write!(f, "{e}"),
            Self::Fetch(e) => write!(f, "{e}"),
            Self::Diff(e) => write!(f, "{e}"),
            Self::Batch(e) => write!(f, "{e}"),
            Self::WorkerLost => f.write_str("batch worker exited without a result"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Projection(e) => Some(e),
            Self::Viewport(e) => Some(e),
            Self::Storage(e) => Some(e),
            Self::Fetch(e) => Some(e),
            Self::Diff(e) => Some(e),
            Self::Batch(e) => Some(e),
            Self::NoTensor | Self::UnknownIdentifier { .. } | Self::WorkerLost => None,
        }
    }
}

impl SessionError {
    /// Short label for structured logs.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::NoTensor => "no_tensor",
            Self::UnknownIdentifier { .. } => "unknown_identifier",
            Self::Projection(_) => "projection",
            Self::Viewport(_) => "viewport",
            Self::Storage(_) => "storage",
            Self::Fetch(_) => "fetch",
            Self::Diff(_) => "diff",
            Self::Batch(_) => "batch",
            Self::WorkerLost => "worker_lost",
        }
    }
}

impl From<ProjectionError> for SessionError {
    fn from(e: ProjectionError) -> Self {
        Self::Projection(e)
    }
}

impl From<ViewportError> for SessionError {
    fn from(e: ViewportError) -> Self {
        Self::Viewport(e)
    }
}

impl From<StorageError> for SessionError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<FetchError> for SessionError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

impl From<DiffError> for SessionError {
    fn from(e: DiffError) -> Self {
        Self::Diff(e)
    }
}

impl From<BatchError> for SessionError {
    fn from(e: BatchError) -> Self {
        Self::Batch(e)
    }
}
