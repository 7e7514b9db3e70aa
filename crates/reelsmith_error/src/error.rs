//! Top-level error wrapper types.

use crate::{
    BackendError, ConfigError, GenerationError, GenerationErrorKind, JsonError, PipelineError,
    PipelineErrorKind, ValidationError,
};

/// Every error condition the workspace can report.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{ReelsmithError, ValidationError};
///
/// let err: ReelsmithError = ValidationError::new("Input text is empty").into();
/// assert!(format!("{}", err).contains("Validation Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ReelsmithErrorKind {
    /// Missing or invalid input
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Network or provider failure
    #[from(BackendError)]
    Backend(BackendError),
    /// Generation protocol failure
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Pipeline state machine rejection
    #[from(PipelineError)]
    Pipeline(PipelineError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON decoding error
    #[from(JsonError)]
    Json(JsonError),
}

/// Reelsmith error with kind discrimination.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{ConfigError, ReelsmithResult};
///
/// fn might_fail() -> ReelsmithResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Reelsmith Error: {}", _0)]
pub struct ReelsmithError(Box<ReelsmithErrorKind>);

impl ReelsmithError {
    /// Create a new error from a kind.
    pub fn new(kind: ReelsmithErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ReelsmithErrorKind {
        &self.0
    }

    /// True for input rejected before any backend call.
    pub fn is_validation(&self) -> bool {
        matches!(self.kind(), ReelsmithErrorKind::Validation(_))
    }

    /// True when the operation was refused because another one is in flight.
    pub fn is_already_in_progress(&self) -> bool {
        matches!(
            self.kind(),
            ReelsmithErrorKind::Pipeline(PipelineError {
                kind: PipelineErrorKind::AlreadyInProgress(_),
                ..
            })
        )
    }

    /// True when the operation was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.kind(),
            ReelsmithErrorKind::Generation(GenerationError {
                kind: GenerationErrorKind::Cancelled,
                ..
            })
        )
    }

    /// True for provider or generation failures, the class surfaced to the user
    /// after a backend call was attempted.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self.kind(),
            ReelsmithErrorKind::Backend(_)
                | ReelsmithErrorKind::Generation(_)
                | ReelsmithErrorKind::Json(_)
        )
    }
}

impl<T> From<T> for ReelsmithError
where
    T: Into<ReelsmithErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Reelsmith operations.
pub type ReelsmithResult<T> = std::result::Result<T, ReelsmithError>;
