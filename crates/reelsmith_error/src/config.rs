//! Errors from layered configuration loading.

/// A configuration source could not be read, merged or deserialized.
///
/// `message` names the failing source when it is known, as in
/// `"./reelsmith.toml: invalid type: string \"soon\", expected u64"`.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// What went wrong, prefixed with the source name when known
    pub message: String,
    /// Line of the loader that raised it
    pub line: u32,
    /// File of the loader that raised it
    pub file: &'static str,
}

impl ConfigError {
    /// Report a loader failure at the caller's location.
    ///
    /// # Examples
    ///
    /// ```
    /// use reelsmith_error::ConfigError;
    ///
    /// let err = ConfigError::new("poll.interval_ms must be positive").in_source("reelsmith.toml");
    /// assert_eq!(err.message, "reelsmith.toml: poll.interval_ms must be positive");
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

    /// Attribute the failure to a named source (file path, `env`, `defaults`).
    pub fn in_source(mut self, source: impl std::fmt::Display) -> Self {
        self.message = format!("{}: {}", source, self.message);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_the_calling_line() {
        let line = line!() + 1;
        let err = ConfigError::new("bad value");
        assert_eq!(err.line, line);
        assert!(err.file.ends_with("config.rs"));
    }

    #[test]
    fn source_prefix_shows_in_display() {
        let err = ConfigError::new("missing").in_source("/etc/reelsmith.toml");
        assert!(err.to_string().starts_with("Configuration Error: /etc/reelsmith.toml: missing"));
    }
}
