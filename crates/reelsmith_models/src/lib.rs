//! Generation backends for Reelsmith.
//!
//! Currently one provider: [`GeminiBackend`], which talks to the Google
//! Generative Language REST API for text (Gemini), images and video (Veo).
//!
//! ```no_run
//! use reelsmith_models::{GeminiBackend, GeminiSettings};
//! use reelsmith_interface::ScriptAnalysis;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = GeminiBackend::new(GeminiSettings::default())?;
//! let breakdown = backend.analyze_text("A lighthouse keeper finds a message in a bottle.").await?;
//! println!("{} segments", breakdown.segments.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod gemini;

pub use gemini::{GeminiBackend, GeminiSettings, GeminiSettingsBuilder, SseDecoder};
