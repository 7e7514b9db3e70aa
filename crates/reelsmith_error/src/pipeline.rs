//! Pipeline state machine errors.

/// Specific error conditions for pipeline operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PipelineErrorKind {
    /// Another generation operation is in flight
    #[display("Cannot start '{}': another operation is already in progress", _0)]
    AlreadyInProgress(String),
    /// The requested stage change is not a legal edge
    #[display("Illegal stage transition from {} to {}", from, to)]
    IllegalTransition {
        /// Stage the pipeline is in
        from: String,
        /// Stage the operation would move to
        to: String,
    },
    /// A chat response is still streaming
    #[display("A chat response is still streaming")]
    ChatBusy,
}

/// Error type for pipeline operations.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::ChatBusy);
/// assert!(format!("{}", err).contains("streaming"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The specific error condition
    pub kind: PipelineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
