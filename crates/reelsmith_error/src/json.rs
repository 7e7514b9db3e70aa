//! Errors decoding model output and stream events.

/// Longest payload excerpt kept in a [`JsonError`], in characters.
const EXCERPT_CHARS: usize = 120;

/// A model reply or stream event that did not decode.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("JSON Error: {} at line {} in {}", message, line, file)]
pub struct JsonError {
    /// Decoder message, with a payload excerpt when one was attached
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl JsonError {
    /// Create a new JsonError with the given message at the current location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// Append the start of the offending payload.
    ///
    /// ```
    /// use reelsmith_error::JsonError;
    ///
    /// let err = JsonError::new("expected value").with_excerpt("{\"segments\": [oops");
    /// assert!(err.message.ends_with("in `{\"segments\": [oops`"));
    /// ```
    pub fn with_excerpt(mut self, payload: &str) -> Self {
        let payload = payload.trim();
        let excerpt: String = payload.chars().take(EXCERPT_CHARS).collect();
        let ellipsis = if excerpt.len() < payload.len() { "..." } else { "" };
        self.message = format!("{} in `{}{}`", self.message, excerpt, ellipsis);
        self
    }
}
