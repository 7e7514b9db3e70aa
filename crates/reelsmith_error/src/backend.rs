//! Generation backend errors and retry classification.

/// Failure conditions reported by a generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum BackendErrorKind {
    /// API key not found in configuration or environment
    #[display("GEMINI_API_KEY is not set and no api_key is configured")]
    MissingApiKey,
    /// HTTP error with status code and message
    #[display("HTTP {} error: {}", status_code, message)]
    Http {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },
    /// Request could not be sent or the connection dropped
    #[display("Request failed: {}", _0)]
    Request(String),
    /// Response body did not have the expected shape
    #[display("Invalid response: {}", _0)]
    InvalidResponse(String),
    /// Streamed response was interrupted
    #[display("Stream interrupted: {}", _0)]
    StreamInterrupted(String),
}

impl BackendErrorKind {
    /// Check if this error type should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendErrorKind::Http { status_code, .. } => {
                matches!(*status_code, 408 | 429 | 500 | 502 | 503 | 504)
            }
            BackendErrorKind::Request(_) => true,
            BackendErrorKind::StreamInterrupted(_) => true,
            _ => false,
        }
    }

    /// Get retry strategy parameters for this error type.
    ///
    /// Returns `(initial_backoff_ms, max_retries, max_delay_secs)`.
    pub fn retry_strategy_params(&self) -> (u64, usize, u64) {
        match self {
            BackendErrorKind::Http { status_code, .. } => match *status_code {
                429 => (5000, 3, 40),
                503 => (2000, 5, 60),
                500 | 502 | 504 => (1000, 3, 8),
                408 => (2000, 4, 30),
                _ => (2000, 5, 60),
            },
            BackendErrorKind::Request(_) => (1000, 3, 10),
            BackendErrorKind::StreamInterrupted(_) => (1000, 3, 10),
            _ => (2000, 5, 60),
        }
    }
}

/// Backend error with source location tracking.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{BackendError, BackendErrorKind};
///
/// let err = BackendError::new(BackendErrorKind::MissingApiKey);
/// assert!(format!("{}", err).contains("GEMINI_API_KEY"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Backend Error: {} at line {} in {}", kind, line, file)]
pub struct BackendError {
    /// The kind of error that occurred
    pub kind: BackendErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl BackendError {
    /// Create a new BackendError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: BackendErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Trait for errors that support retry logic.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{BackendError, BackendErrorKind, RetryableError};
///
/// let err = BackendError::new(BackendErrorKind::Http {
///     status_code: 503,
///     message: "Service unavailable".to_string(),
/// });
///
/// assert!(err.is_retryable());
/// let (backoff, retries, _max_delay) = err.retry_strategy_params();
/// assert_eq!(backoff, 2000);
/// assert_eq!(retries, 5);
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    ///
    /// Transient errors like 503, 429 or dropped connections return true.
    /// Permanent errors like 401 or 400 return false.
    fn is_retryable(&self) -> bool;

    /// Get retry strategy parameters for this error.
    ///
    /// Returns `(initial_backoff_ms, max_retries, max_delay_secs)`.
    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        (2000, 5, 60)
    }
}

impl RetryableError for BackendError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        self.kind.retry_strategy_params()
    }
}
