#![forbid(unsafe_code)]

//! tensorscope error model and recovery classification.
//!
//! # Design Principles
//!
//! 1. **Result everywhere**: nothing in the core panics on bad input.
//! 2. **Domain-specific errors**: each layer owns a typed error, and
//!    [`Error`] wraps them so applications can use one `?` path.
//! 3. **Recovery, not shutdown**: every variant maps to a [`RecoveryAction`].
//!    No failure is fatal; the component that failed keeps its last valid
//!    state.
//! 4. **Observability**: [`Error::error_type`] gives a stable label for the
//!    `error_type` field of log events.

use std::fmt;

use tscope_core::{FetchError, IdentifierError, StorageError, TensorError};
use tscope_diff::{BatchError, DiffError};
use tscope_render::{ProjectionError, ViewportError};
use tscope_runtime::{ConfigError, SessionError};
use tscope_style::ColorParseError;

// ── Unified Error ───────────────────────────────────────────────────────

/// Top-level error type for tensorscope applications.
#[derive(Debug)]
pub enum Error {
    /// A payload or element list could not become a tensor.
    Tensor(TensorError),
    /// A tensor identifier failed to parse.
    Identifier(IdentifierError),
    /// The storage collaborator failed.
    Storage(StorageError),
    /// A payload fetch failed (storage or decoding).
    Fetch(FetchError),
    /// Invalid axis selection or fixed index.
    Projection(ProjectionError),
    /// A pan or zoom would degenerate the viewport.
    Viewport(ViewportError),
    /// Two tensors could not be compared.
    Diff(DiffError),
    /// A batch comparison was rejected or cancelled.
    Batch(BatchError),
    /// Configuration could not be loaded or failed validation.
    Config(ConfigError),
    /// A color string failed to parse.
    Color(ColorParseError),
    /// Session-level failures with no layer error behind them.
    Session(SessionError),
    /// Raw I/O error (convenience variant for `?` on io::Result).
    Io(std::io::Error),
}

/// Standard result type for tensorscope APIs.
pub type Result<T> = std::result::Result<T, Error>;

// ── Recovery ────────────────────────────────────────────────────────────

/// What a caller should do after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Invalid interactive input. Nothing changed; keep going.
    RollBack,
    /// One comparison could not run. Continue with the rest.
    SkipComparison,
    /// Report to the user. The previous state is still displayed.
    SurfaceToUser,
}

impl Error {
    /// Classify this error for recovery.
    pub fn recovery(&self) -> RecoveryAction {
        match self {
            Self::Identifier(_) | Self::Projection(_) | Self::Viewport(_) | Self::Batch(_) => {
                RecoveryAction::RollBack
            }

            Self::Diff(_) => RecoveryAction::SkipComparison,

            Self::Session(
                SessionError::NoTensor
                | SessionError::UnknownIdentifier { .. }
                | SessionError::Projection(_)
                | SessionError::Viewport(_)
                | SessionError::Batch(_),
            ) => RecoveryAction::RollBack,
            Self::Session(SessionError::Diff(_)) => RecoveryAction::SkipComparison,
            Self::Session(
                SessionError::Storage(_) | SessionError::Fetch(_) | SessionError::WorkerLost,
            ) => RecoveryAction::SurfaceToUser,

            Self::Tensor(_)
            | Self::Storage(_)
            | Self::Fetch(_)
            | Self::Config(_)
            | Self::Color(_)
            | Self::Io(_) => RecoveryAction::SurfaceToUser,
        }
    }

    /// Error type label for logs.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Tensor(_) => "tensor",
            Self::Identifier(_) => "identifier",
            Self::Storage(_) => "storage",
            Self::Fetch(_) => "fetch",
            Self::Projection(_) => "projection",
            Self::Viewport(_) => "viewport",
            Self::Diff(_) => "diff",
            Self::Batch(_) => "batch",
            Self::Config(_) => "config",
            Self::Color(_) => "color",
            Self::Session(e) => e.error_type(),
            Self::Io(_) => "io",
        }
    }

    /// Always true: no tensorscope failure requires shutting down.
    pub fn is_recoverable(&self) -> bool {
        true
    }
}

// ── Display ─────────────────────────────────────────────────────────────

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tensor(err) => write!(f, "{err}"),
            Self::Identifier(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Fetch(err) => write!(f, "{err}"),
            Self::Projection(err) => write!(f, "{err}"),
            Self::Viewport(err) => write!(f, "{err}"),
            Self::Diff(err) => write!(f, "{err}"),
            Self::Batch(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Color(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "I/O: {err}"),
        }
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RollBack => write!(f, "roll_back"),
            Self::SkipComparison => write!(f, "skip_comparison"),
            Self::SurfaceToUser => write!(f, "surface_to_user"),
        }
    }
}

// ── std::error::Error ───────────────────────────────────────────────────

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tensor(err) => Some(err),
            Self::Identifier(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Fetch(err) => Some(err),
            Self::Projection(err) => Some(err),
            Self::Viewport(err) => Some(err),
            Self::Diff(err) => Some(err),
            Self::Batch(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Color(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

// ── From conversions ────────────────────────────────────────────────────

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<TensorError> for Error {
    fn from(err: TensorError) -> Self {
        Self::Tensor(err)
    }
}

impl From<IdentifierError> for Error {
    fn from(err: IdentifierError) -> Self {
        Self::Identifier(err)
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Self::Storage(err)
    }
}

impl From<FetchError> for Error {
    fn from(err: FetchError) -> Self {
        Self::Fetch(err)
    }
}

impl From<ProjectionError> for Error {
    fn from(err: ProjectionError) -> Self {
        Self::Projection(err)
    }
}

impl From<ViewportError> for Error {
    fn from(err: ViewportError) -> Self {
        Self::Viewport(err)
    }
}

impl From<DiffError> for Error {
    fn from(err: DiffError) -> Self {
        Self::Diff(err)
    }
}

impl From<BatchError> for Error {
    fn from(err: BatchError) -> Self {
        Self::Batch(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<ColorParseError> for Error {
    fn from(err: ColorParseError) -> Self {
        Self::Color(err)
    }
}

/// Session errors that wrap a layer error are unwrapped into that layer's
/// variant; the rest stay under [`Error::Session`].
impl From<SessionError> for Error {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Projection(e) => Self::Projection(e),
            SessionError::Viewport(e) => Self::Viewport(e),
            SessionError::Storage(e) => Self::Storage(e),
            SessionError::Fetch(e) => Self::Fetch(e),
            SessionError::Diff(e) => Self::Diff(e),
            SessionError::Batch(e) => Self::Batch(e),
            other @ (SessionError::NoTensor
            | SessionError::UnknownIdentifier { .. }
            | SessionError::WorkerLost) => Self::Session(other),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;

    use super::*;
    use tscope_core::Identifier;

    fn id(raw: &str) -> Identifier {
        Identifier::new(raw).unwrap()
    }

    // ── Classification ──────────────────────────────────────────────

    #[test]
    fn interactive_input_rolls_back() {
        let cases = [
            Error::from(ProjectionError::DuplicateAxis { axis: 1 }),
            Error::from(ViewportError::Degenerate { op: "zoom" }),
            Error::from(IdentifierError::Empty),
            Error::from(SessionError::NoTensor),
            Error::from(BatchError::Cancelled { done: 1, total: 3 }),
        ];
        for err in cases {
            assert_eq!(err.recovery(), RecoveryAction::RollBack, "{err}");
        }
    }

    #[test]
    fn shape_mismatch_skips_one_comparison() {
        let err = Error::from(DiffError::ShapeMismatch {
            left: vec![2, 2],
            right: vec![4],
        });
        assert_eq!(err.recovery(), RecoveryAction::SkipComparison);
        assert_eq!(err.error_type(), "diff");
    }

    #[test]
    fn storage_and_config_surface_to_user() {
        let cases = [
            Error::from(StorageError::unavailable("down")),
            Error::from(ConfigError::Validation(vec!["zoom_step".into()])),
            Error::from(SessionError::WorkerLost),
            Error::from(std::io::Error::other("disk")),
        ];
        for err in cases {
            assert_eq!(err.recovery(), RecoveryAction::SurfaceToUser, "{err}");
        }
    }

    #[test]
    fn every_error_is_recoverable() {
        let cases = [
            Error::from(TensorError::UnknownElementType { code: 9 }),
            Error::from(SessionError::UnknownIdentifier {
                identifier: id("a.b"),
            }),
            Error::from(ColorParseError {
                input: "red".into(),
            }),
        ];
        assert!(cases.iter().all(Error::is_recoverable));
    }

    // ── Conversions ─────────────────────────────────────────────────

    #[test]
    fn session_errors_unwrap_to_layer_variants() {
        let err = Error::from(SessionError::Projection(ProjectionError::DuplicateAxis {
            axis: 0,
        }));
        assert!(matches!(err, Error::Projection(_)));
        assert_eq!(err.error_type(), "projection");

        let err = Error::from(SessionError::UnknownIdentifier {
            identifier: id("x.y"),
        });
        assert_eq!(err.error_type(), "unknown_identifier");
        assert!(err.to_string().contains("x.y"));
    }

    #[test]
    fn source_chain_is_preserved() {
        let err = Error::from(StorageError::unavailable("gone"));
        assert!(StdError::source(&err).is_some());
        assert_eq!(RecoveryAction::SkipComparison.to_string(), "skip_comparison");
    }
}
