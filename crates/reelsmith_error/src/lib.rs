//! Error types for the Reelsmith workspace.
//!
//! This crate provides the foundation error types used by the pipeline, the
//! backend adapters and the command-line host.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use reelsmith_error::{ReelsmithResult, ValidationError};
//!
//! fn require_text(text: &str) -> ReelsmithResult<&str> {
//!     if text.trim().is_empty() {
//!         Err(ValidationError::new("Input text is empty"))?
//!     }
//!     Ok(text)
//! }
//!
//! assert!(require_text("   ").is_err());
//! assert!(require_text("Once upon a time").is_ok());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod generation;
mod json;
mod pipeline;
mod validation;

pub use backend::{BackendError, BackendErrorKind, RetryableError};
pub use config::ConfigError;
pub use error::{ReelsmithError, ReelsmithErrorKind, ReelsmithResult};
pub use generation::{GenerationError, GenerationErrorKind};
pub use json::JsonError;
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use validation::ValidationError;
