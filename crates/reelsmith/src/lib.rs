//! Reelsmith: raw text or an image in, a generated video out.
//!
//! Reelsmith drives a creative pipeline through script analysis, character
//! extraction, character concept art and video synthesis, with a streaming
//! chat assistant on the side. Model calls go through the capability traits in
//! [`reelsmith_interface`]; the bundled backend is [`GeminiBackend`].
//!
//! # Quick Start
//!
//! ```no_run
//! use reelsmith::{GeminiBackend, Pipeline, ReelsmithConfig, StudioBackend};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ReelsmithConfig::load()?;
//! let backend: Arc<dyn StudioBackend> = Arc::new(GeminiBackend::new(config.gemini.clone())?);
//! let pipeline = config.pipeline(backend);
//!
//! pipeline.set_raw_input("A lighthouse keeper finds a message in a bottle.");
//! pipeline.analyze().await?;
//! pipeline.extract_characters().await?;
//! println!("{:?}", pipeline.snapshot().characters);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `reelsmith_error` - Error types
//! - `reelsmith_core` - Project state, stages, segments, characters, catalogue
//! - `reelsmith_interface` - Backend capability traits
//! - `reelsmith_pipeline` - State machine, polling controller, chat session
//! - `reelsmith_models` - Gemini/Veo REST backend
//!
//! This crate re-exports all of them and adds layered configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;

pub use config::ReelsmithConfig;

pub use reelsmith_core::{
    Character, ChatMessage, ChatRole, DEFAULT_MODEL_ID, DataUrl, InputType, ModelInfo, ModelKind,
    ProjectState, ScriptSegment, SegmentKind, Stage, available_models, find_model, init_logging,
    mime_for_path,
};
pub use reelsmith_error::{
    ConfigError, GenerationError, GenerationErrorKind, ReelsmithError, ReelsmithErrorKind,
    ReelsmithResult, ValidationError,
};
pub use reelsmith_interface::{
    ChatChunk, ChatStreaming, GenerationBackend, ImageSynthesis, MediaLocator, ScriptAnalysis,
    StudioBackend, VideoSynthesis,
};
pub use reelsmith_models::{GeminiBackend, GeminiSettings};
pub use reelsmith_pipeline::{
    Backoff, ChatLog, ChatSession, ChatSettings, Pipeline, PipelineSettings, PollPolicy,
};
