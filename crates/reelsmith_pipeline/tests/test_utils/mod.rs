//! Test utilities for pipeline tests.
//!
//! Provides a scripted [`MockBackend`] implementing every capability trait.

#![allow(dead_code)]

use async_trait::async_trait;
use reelsmith_core::{Character, InputType, ScriptSegment, SegmentKind};
use reelsmith_error::{BackendError, BackendErrorKind, ReelsmithError, ReelsmithResult};
use reelsmith_interface::{
    ChatChunk, ChatStream, ChatStreaming, ChatTurn, GenerationBackend, ImageSynthesis,
    MediaLocator, ScriptAnalysis, ScriptBreakdown, VideoOperation, VideoRequest, VideoSynthesis,
};
use reelsmith_pipeline::PollPolicy;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A valid image data URL for image-to-video tests.
pub const TEST_IMAGE: &str = "data:image/png;base64,iVBORw0KGgo=";

/// Poll policy fast enough for tests.
pub fn fast_poll() -> PollPolicy {
    PollPolicy::builder()
        .interval_ms(1)
        .max_attempts(Some(50))
        .build()
        .expect("valid poll policy")
}

pub fn segment(id: &str, kind: SegmentKind, content: &str) -> ScriptSegment {
    ScriptSegment::builder()
        .id(id)
        .kind(kind)
        .content(content)
        .visual_prompt(Some(format!("{} shot", content)))
        .build()
        .expect("valid segment")
}

pub fn character(id: &str, name: &str) -> Character {
    Character::builder()
        .id(id)
        .name(name)
        .description(format!("{} from the story", name))
        .visual_prompt(format!("portrait of {}", name))
        .build()
        .expect("valid character")
}

pub fn done_with(uri: &str) -> VideoOperation {
    VideoOperation {
        name: "operations/mock".to_string(),
        done: true,
        video_uri: Some(uri.to_string()),
        error: None,
    }
}

pub fn done_empty() -> VideoOperation {
    VideoOperation {
        name: "operations/mock".to_string(),
        done: true,
        video_uri: None,
        error: None,
    }
}

pub fn done_failed(message: &str) -> VideoOperation {
    VideoOperation {
        name: "operations/mock".to_string(),
        done: true,
        video_uri: None,
        error: Some(message.to_string()),
    }
}

pub fn pending() -> VideoOperation {
    VideoOperation::pending("operations/mock")
}

fn transport_error(message: &str) -> ReelsmithError {
    BackendError::new(BackendErrorKind::Http {
        status_code: 500,
        message: message.to_string(),
    })
    .into()
}

/// One scripted chat stream item.
#[derive(Debug, Clone)]
pub enum MockChunk {
    Text(String),
    Error(String),
}

/// Scripted backend with call counters.
pub struct MockBackend {
    pub segments: Vec<ScriptSegment>,
    pub characters: Vec<Character>,
    pub fail_analysis: bool,
    pub fail_extraction: bool,
    pub fail_images: bool,
    pub fail_chat_open: bool,
    pub video_ops: Mutex<VecDeque<VideoOperation>>,
    pub chat_chunks: Vec<MockChunk>,
    pub gate: Option<Arc<Notify>>,
    pub video_gate: Option<Arc<Notify>>,
    pub chat_gate: Option<Arc<Notify>>,

    pub analyze_calls: AtomicUsize,
    pub extract_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
    pub start_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,
    pub resolve_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,

    pub last_analysis_text: Mutex<Option<String>>,
    pub last_extraction: Mutex<Vec<ScriptSegment>>,
    pub last_image_prompt: Mutex<Option<String>>,
    pub last_video_request: Mutex<Option<VideoRequest>>,
    pub last_chat_history: Mutex<Vec<ChatTurn>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            segments: vec![
                segment("s1", SegmentKind::Scene, "A lighthouse at dusk"),
                segment("s2", SegmentKind::Dialogue, "Who goes there?"),
                segment("s3", SegmentKind::Action, "Mara climbs the stairs"),
            ],
            characters: vec![character("c1", "Mara"), character("c2", "Tomas")],
            fail_analysis: false,
            fail_extraction: false,
            fail_images: false,
            fail_chat_open: false,
            video_ops: Mutex::new(VecDeque::from(vec![
                pending(),
                pending(),
                done_with("https://video.example/clip.mp4"),
            ])),
            chat_chunks: vec![
                MockChunk::Text("Hel".to_string()),
                MockChunk::Text(String::new()),
                MockChunk::Text("lo".to_string()),
            ],
            gate: None,
            video_gate: None,
            chat_gate: None,
            analyze_calls: AtomicUsize::new(0),
            extract_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            resolve_calls: AtomicUsize::new(0),
            chat_calls: AtomicUsize::new(0),
            last_analysis_text: Mutex::new(None),
            last_extraction: Mutex::new(Vec::new()),
            last_image_prompt: Mutex::new(None),
            last_video_request: Mutex::new(None),
            last_chat_history: Mutex::new(Vec::new()),
        }
    }
}

impl MockBackend {
    /// Replace the scripted video operation sequence.
    pub fn with_video_ops(self, ops: Vec<VideoOperation>) -> Self {
        *self.video_ops.lock().unwrap() = VecDeque::from(ops);
        self
    }

    /// Total backend calls of any kind.
    pub fn total_calls(&self) -> usize {
        [
            &self.analyze_calls,
            &self.extract_calls,
            &self.image_calls,
            &self.start_calls,
            &self.poll_calls,
            &self.resolve_calls,
            &self.chat_calls,
        ]
        .iter()
        .map(|counter| counter.load(Ordering::SeqCst))
        .sum()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn next_operation(&self) -> VideoOperation {
        let mut ops = self.video_ops.lock().unwrap();
        match ops.len() {
            0 => pending(),
            1 => ops[0].clone(),
            _ => ops.pop_front().unwrap_or_else(pending),
        }
    }
}

impl GenerationBackend for MockBackend {
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

#[async_trait]
impl ScriptAnalysis for MockBackend {
    async fn analyze_text(&self, text: &str) -> ReelsmithResult<ScriptBreakdown> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_analysis_text.lock().unwrap() = Some(text.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_analysis {
            return Err(transport_error("analysis unavailable"));
        }
        Ok(ScriptBreakdown {
            input_type: InputType::Novel,
            segments: self.segments.clone(),
        })
    }

    async fn extract_characters(
        &self,
        segments: &[ScriptSegment],
    ) -> ReelsmithResult<Vec<Character>> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_extraction.lock().unwrap() = segments.to_vec();
        if self.fail_extraction {
            return Err(transport_error("extraction unavailable"));
        }
        Ok(self.characters.clone())
    }
}

#[async_trait]
impl ImageSynthesis for MockBackend {
    async fn generate_image(&self, visual_prompt: &str) -> ReelsmithResult<String> {
        let call = self.image_calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_image_prompt.lock().unwrap() = Some(visual_prompt.to_string());
        if self.fail_images {
            return Err(transport_error("image model unavailable"));
        }
        Ok(format!("data:image/png;base64,IMG{}", call))
    }
}

#[async_trait]
impl VideoSynthesis for MockBackend {
    async fn start_video_generation(
        &self,
        request: &VideoRequest,
    ) -> ReelsmithResult<VideoOperation> {
        if let Some(gate) = &self.video_gate {
            gate.notified().await;
        }
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_video_request.lock().unwrap() = Some(request.clone());
        Ok(self.next_operation())
    }

    async fn poll_video_operation(
        &self,
        _operation: &VideoOperation,
    ) -> ReelsmithResult<VideoOperation> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.next_operation())
    }

    async fn resolve_video_result(
        &self,
        operation: &VideoOperation,
    ) -> ReelsmithResult<Option<MediaLocator>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(operation
            .video_uri
            .as_ref()
            .map(|uri| MediaLocator(format!("{}?key=test", uri))))
    }
}

#[async_trait]
impl ChatStreaming for MockBackend {
    async fn open_chat_stream(
        &self,
        history: &[ChatTurn],
        _message: &str,
    ) -> ReelsmithResult<ChatStream> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_chat_history.lock().unwrap() = history.to_vec();
        if self.fail_chat_open {
            return Err(transport_error("chat unavailable"));
        }

        let chunks = self.chat_chunks.clone();
        let gate = self.chat_gate.clone();
        Ok(Box::pin(async_stream::stream! {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            for chunk in chunks {
                match chunk {
                    MockChunk::Text(text) => yield Ok::<ChatChunk, ReelsmithError>(ChatChunk::text(text)),
                    MockChunk::Error(message) => {
                        yield Err(ReelsmithError::from(BackendError::new(
                            BackendErrorKind::StreamInterrupted(message),
                        )))
                    }
                }
            }
        }))
    }
}
