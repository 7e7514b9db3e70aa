//! Input validation errors.

/// Missing or invalid user input, detected before any backend call.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Validation Error: {} at line {} in {}", message, line, file)]
pub struct ValidationError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new ValidationError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use reelsmith_error::ValidationError;
    ///
    /// let err = ValidationError::new("No image uploaded");
    /// assert!(err.message.contains("image"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
