//! Generation backend capability traits.
//!
//! The pipeline talks to generative models only through the traits in this
//! crate. A backend implements the base [`GenerationBackend`] trait plus one
//! capability trait per modality; anything implementing all of them is a
//! [`StudioBackend`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{
    ChatStream, ChatStreaming, GenerationBackend, ImageSynthesis, ScriptAnalysis, StudioBackend,
    VideoSynthesis,
};
pub use types::{
    ChatChunk, ChatTurn, FinishReason, MediaLocator, ScriptBreakdown, VideoOperation, VideoRequest,
};
