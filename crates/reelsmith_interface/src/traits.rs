//! Trait definitions for generation backends and their capabilities.

use crate::{ChatChunk, ChatTurn, MediaLocator, ScriptBreakdown, VideoOperation, VideoRequest};
use async_trait::async_trait;
use futures_util::stream::Stream;
use reelsmith_core::{Character, ScriptSegment};
use reelsmith_error::ReelsmithResult;
use std::pin::Pin;

/// Lazy, finite stream of chat fragments. Not restartable.
pub type ChatStream = Pin<Box<dyn Stream<Item = ReelsmithResult<ChatChunk>> + Send>>;

/// Base trait that every generation backend implements.
pub trait GenerationBackend: Send + Sync {
    /// Provider name (e.g., "gemini", "mock").
    fn provider_name(&self) -> &'static str;
}

/// Text understanding: script breakdown and character extraction.
#[async_trait]
pub trait ScriptAnalysis: GenerationBackend {
    /// Classify the input and split it into ordered script segments.
    async fn analyze_text(&self, text: &str) -> ReelsmithResult<ScriptBreakdown>;

    /// Extract the characters appearing in a script.
    async fn extract_characters(&self, segments: &[ScriptSegment])
    -> ReelsmithResult<Vec<Character>>;
}

/// Still image generation.
#[async_trait]
pub trait ImageSynthesis: GenerationBackend {
    /// Render a prompt, returning the image as a data URL.
    async fn generate_image(&self, visual_prompt: &str) -> ReelsmithResult<String>;
}

/// Long-running video generation.
///
/// Submission returns an operation handle that is polled until `done`.
#[async_trait]
pub trait VideoSynthesis: GenerationBackend {
    /// Submit a generation job.
    async fn start_video_generation(&self, request: &VideoRequest)
    -> ReelsmithResult<VideoOperation>;

    /// Re-query a job. Safe to call any number of times.
    async fn poll_video_operation(&self, operation: &VideoOperation)
    -> ReelsmithResult<VideoOperation>;

    /// Turn a finished job into a fetchable reference, if it produced one.
    async fn resolve_video_result(
        &self,
        operation: &VideoOperation,
    ) -> ReelsmithResult<Option<MediaLocator>>;
}

/// Streaming conversation.
#[async_trait]
pub trait ChatStreaming: GenerationBackend {
    /// Open a reply stream for `message` given the prior `history`.
    async fn open_chat_stream(
        &self,
        history: &[ChatTurn],
        message: &str,
    ) -> ReelsmithResult<ChatStream>;
}

/// Every capability the pipeline and chat need.
pub trait StudioBackend: ScriptAnalysis + ImageSynthesis + VideoSynthesis + ChatStreaming {}

impl<T> StudioBackend for T where
    T: ScriptAnalysis + ImageSynthesis + VideoSynthesis + ChatStreaming + ?Sized
{
}
