//! Long-running generation protocol errors.

/// Failure conditions of a generation job, as opposed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GenerationErrorKind {
    /// The job finished but produced no usable media
    #[display("Generation finished without a result: {}", _0)]
    NoResult(String),
    /// The backend reported the job itself as failed
    #[display("Generation operation failed: {}", _0)]
    OperationFailed(String),
    /// The polling policy bounds were exceeded
    #[display("Generation timed out after {} polls ({}s elapsed)", attempts, elapsed_secs)]
    Timeout {
        /// Number of status polls issued
        attempts: usize,
        /// Seconds elapsed since submission
        elapsed_secs: u64,
    },
    /// The operation was cancelled by reset or session teardown
    #[display("Generation cancelled")]
    Cancelled,
}

/// Generation error with source location tracking.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::NoResult("no video uri".into()));
/// assert!(format!("{}", err).contains("without a result"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The kind of error that occurred
    pub kind: GenerationErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
