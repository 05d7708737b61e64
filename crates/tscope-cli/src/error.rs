use thiserror::Error;

use tscope::RecoveryAction;

pub type Result<T> = std::result::Result<T, CliError>;

/// Exit code for malformed arguments and rejected interactive input.
pub const EXIT_USAGE: i32 = 2;
/// Exit code when the store or configuration could not be used.
pub const EXIT_UNAVAILABLE: i32 = 3;
/// Exit code when two tensors could not be compared.
pub const EXIT_INCOMPARABLE: i32 = 4;
/// Exit code for `compare --fail-on-diff` when significant differences exist.
pub const EXIT_DIFFERENCES: i32 = 5;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Tscope(#[from] tscope::Error),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("logging setup failed: {message}")]
    Logging { message: String },

    #[error("{message}")]
    Exit { code: i32, message: String },
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exit { code, .. } => *code,
            Self::InvalidArgument { .. } => EXIT_USAGE,
            Self::Tscope(e) => match e.recovery() {
                RecoveryAction::RollBack => EXIT_USAGE,
                RecoveryAction::SkipComparison => EXIT_INCOMPARABLE,
                RecoveryAction::SurfaceToUser => EXIT_UNAVAILABLE,
            },
            _ => 1,
        }
    }

    #[must_use]
    pub fn exit(code: i32, message: impl Into<String>) -> Self {
        Self::Exit {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Label for the `error_type` field of the final log event.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Tscope(e) => e.error_type(),
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::Logging { .. } => "logging",
            Self::Exit { .. } => "exit",
        }
    }
}

macro_rules! via_tscope {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CliError {
                fn from(err: $ty) -> Self {
                    Self::Tscope(tscope::Error::from(err))
                }
            }
        )*
    };
}

via_tscope!(
    tscope::SessionError,
    tscope::StorageError,
    tscope::ConfigError,
    tscope::IdentifierError,
    tscope::TensorError,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_constructor_preserves_code_and_message() {
        let error = CliError::exit(42, "boom");
        assert_eq!(error.exit_code(), 42);
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn library_errors_map_by_recovery() {
        let storage = CliError::from(tscope::StorageError::unavailable("offline"));
        assert_eq!(storage.exit_code(), EXIT_UNAVAILABLE);
        assert_eq!(storage.error_type(), "storage");

        let input = CliError::from(tscope::SessionError::NoTensor);
        assert_eq!(input.exit_code(), EXIT_USAGE);

        let diff = CliError::from(tscope::SessionError::Diff(tscope::DiffError::ShapeMismatch {
            left: vec![1],
            right: vec![2],
        }));
        assert_eq!(diff.exit_code(), EXIT_INCOMPARABLE);
    }

    #[test]
    fn invalid_argument_is_usage_error() {
        let error = CliError::invalid("bad --axes");
        assert_eq!(error.exit_code(), EXIT_USAGE);
        assert!(error.to_string().contains("bad --axes"));
    }
}
