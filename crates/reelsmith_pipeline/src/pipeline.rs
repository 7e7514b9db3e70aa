//! Project state machine.
//!
//! [`Pipeline`] owns the single [`ProjectState`] of a session and is the only
//! thing that mutates it. Every change publishes a fresh immutable snapshot on
//! a watch channel.
//!
//! Backend-calling operations are serialized by an in-flight lock. While one
//! runs, `is_processing` is true and a second operation fails with
//! `PipelineErrorKind::AlreadyInProgress`. An RAII guard clears
//! `is_processing` on every exit path, including when the operation future is
//! dropped.
//!
//! [`Pipeline::reset`] bumps a session epoch and cancels the in-flight
//! operation. Writes tagged with an older epoch are discarded, so a late
//! result never reaches the fresh state. An operation started after a reset
//! waits for the cancelled holder to release the lock instead of failing.

use crate::{PipelineSettings, PollPolicy, PollingController, until_cancelled};
use reelsmith_core::{
    DataUrl, ProjectState, ScriptSegment, Stage, find_model, truncate_chars,
};
use reelsmith_error::{
    GenerationError, GenerationErrorKind, PipelineError, PipelineErrorKind, ReelsmithError,
    ReelsmithResult, ValidationError,
};
use reelsmith_interface::{StudioBackend, VideoRequest};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use tokio::sync::{MutexGuard, watch};
use tokio_util::sync::CancellationToken;

/// Stateful driver of the creative workflow.
pub struct Pipeline {
    backend: Arc<dyn StudioBackend>,
    state: watch::Sender<Arc<ProjectState>>,
    in_flight: tokio::sync::Mutex<()>,
    epoch: AtomicU64,
    holder_epoch: AtomicU64,
    cancel: std::sync::Mutex<CancellationToken>,
    settings: PipelineSettings,
    poller: PollingController,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("provider", &self.backend.provider_name())
            .field("stage", &self.state.borrow().current_stage)
            .field("epoch", &self.epoch.load(Ordering::SeqCst))
            .finish()
    }
}

impl Pipeline {
    /// Create a pipeline in the initial state.
    pub fn new(
        backend: Arc<dyn StudioBackend>,
        settings: PipelineSettings,
        poll: PollPolicy,
    ) -> Self {
        let (state, _) = watch::channel(Arc::new(ProjectState::default()));
        Self {
            backend,
            state,
            in_flight: tokio::sync::Mutex::new(()),
            epoch: AtomicU64::new(0),
            holder_epoch: AtomicU64::new(0),
            cancel: std::sync::Mutex::new(CancellationToken::new()),
            settings,
            poller: PollingController::new(poll),
        }
    }

    /// Create a pipeline with default settings and poll policy.
    pub fn with_defaults(backend: Arc<dyn StudioBackend>) -> Self {
        Self::new(backend, PipelineSettings::default(), PollPolicy::default())
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> Arc<ProjectState> {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ProjectState>> {
        self.state.subscribe()
    }

    /// Active settings.
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Classify the raw input and break it into script segments.
    ///
    /// Requires stage `INPUT` and non-blank input. Input longer than
    /// `analysis_char_limit` characters is truncated before it is sent.
    #[tracing::instrument(skip(self), fields(provider = self.backend.provider_name()))]
    pub async fn analyze(&self) -> ReelsmithResult<()> {
        const OPERATION: &str = "analyze";
        let lock = self.acquire(OPERATION).await?;
        let state = self.snapshot();

        let text = match self.prepare_analysis(&state) {
            Ok(text) => text,
            Err(e) => return Err(self.reject(OPERATION, e)),
        };

        let flight = self.start(lock, None, |_| {});
        match until_cancelled(flight.token(), self.backend.analyze_text(&text)).await {
            Ok(breakdown) => {
                let segments = breakdown.segments.len();
                flight.succeed(OPERATION, |s| {
                    s.input_type = Some(breakdown.input_type);
                    s.script = breakdown.segments;
                    s.current_stage = Stage::Analysis;
                })?;
                tracing::info!(segments, stage = %Stage::Analysis, "Script analysed");
                Ok(())
            }
            Err(e) => Err(flight.fail(OPERATION, e)),
        }
    }

    fn prepare_analysis(&self, state: &ProjectState) -> ReelsmithResult<String> {
        require_stage(state, Stage::Input, Stage::Analysis)?;
        if state.raw_input.trim().is_empty() {
            Err(ValidationError::new("Input text is empty"))?
        }

        let limit = *self.settings.analysis_char_limit();
        let text = truncate_chars(&state.raw_input, limit);
        if text.len() < state.raw_input.len() {
            tracing::debug!(
                original_chars = state.raw_input.chars().count(),
                limit,
                "Truncating input for analysis"
            );
        }
        Ok(text.to_string())
    }

    /// Extract characters from the analysed script.
    #[tracing::instrument(skip(self), fields(provider = self.backend.provider_name()))]
    pub async fn extract_characters(&self) -> ReelsmithResult<()> {
        const OPERATION: &str = "extract_characters";
        let lock = self.acquire(OPERATION).await?;
        let state = self.snapshot();

        let segments = match self.prepare_extraction(&state) {
            Ok(segments) => segments,
            Err(e) => return Err(self.reject(OPERATION, e)),
        };

        let flight = self.start(lock, None, |_| {});
        match until_cancelled(flight.token(), self.backend.extract_characters(&segments)).await {
            Ok(characters) => {
                let count = characters.len();
                flight.succeed(OPERATION, |s| {
                    s.characters = characters;
                    s.current_stage = Stage::CharacterDesign;
                })?;
                tracing::info!(characters = count, stage = %Stage::CharacterDesign, "Characters extracted");
                Ok(())
            }
            Err(e) => Err(flight.fail(OPERATION, e)),
        }
    }

    fn prepare_extraction(&self, state: &ProjectState) -> ReelsmithResult<Vec<ScriptSegment>> {
        require_stage(state, Stage::Analysis, Stage::CharacterDesign)?;
        if state.script.is_empty() {
            Err(ValidationError::new("Script is empty; run analysis first"))?
        }
        Ok(bound_segments(
            &state.script,
            *self.settings.extraction_char_limit(),
        ))
    }

    /// Render concept art for one character.
    ///
    /// An unknown id is a no-op. The result replaces only that character's
    /// `image_url`, located by id when the image arrives.
    #[tracing::instrument(skip(self), fields(provider = self.backend.provider_name()))]
    pub async fn generate_character_image(&self, id: &str) -> ReelsmithResult<()> {
        const OPERATION: &str = "generate_character_image";
        if self.snapshot().character(id).is_none() {
            tracing::debug!(id, "Unknown character id, nothing to render");
            return Ok(());
        }

        let lock = self.acquire(OPERATION).await?;
        let Some(character) = self.snapshot().character(id).cloned() else {
            return Ok(());
        };

        let prompt = format!(
            "{} {}",
            self.settings.character_style_prefix().trim_end(),
            character.visual_prompt()
        );

        let flight = self.start(lock, None, |_| {});
        match until_cancelled(flight.token(), self.backend.generate_image(&prompt)).await {
            Ok(image_url) => {
                flight.succeed(OPERATION, |s| {
                    if let Some(target) = s.characters.iter_mut().find(|c| c.id() == id) {
                        target.set_image_url(image_url);
                    }
                })?;
                tracing::info!(id, name = %character.name(), "Character image generated");
                Ok(())
            }
            Err(e) => Err(flight.fail(OPERATION, e)),
        }
    }

    /// Move from character design to visual development.
    #[tracing::instrument(skip(self))]
    pub async fn advance_to_visual_dev(&self) -> ReelsmithResult<()> {
        const OPERATION: &str = "advance_to_visual_dev";
        let _lock = self.acquire(OPERATION).await?;
        let state = self.snapshot();
        if let Err(e) = require_stage(&state, Stage::CharacterDesign, Stage::VisualDev) {
            return Err(self.reject(OPERATION, e));
        }

        self.update(|s| {
            s.current_stage = Stage::VisualDev;
            s.last_error = None;
        });
        tracing::info!(stage = %Stage::VisualDev, "Advanced to visual development");
        Ok(())
    }

    /// Generate the film from the script and the first character.
    ///
    /// Requires stage `VISUAL_DEV`, at least one character and one scene or
    /// action segment. On any failure the stage reverts to `INPUT`.
    #[tracing::instrument(skip(self), fields(provider = self.backend.provider_name()))]
    pub async fn generate_video(&self) -> ReelsmithResult<()> {
        const OPERATION: &str = "generate_video";
        let lock = self.acquire(OPERATION).await?;
        let state = self.snapshot();

        let request = match prepare_video(&state) {
            Ok(request) => request,
            Err(e) => return Err(self.reject(OPERATION, e)),
        };

        let flight = self.start(lock, Some(Stage::Input), |s| {
            s.current_stage = Stage::VideoGen;
        });
        tracing::info!(stage = %Stage::VideoGen, "Starting video generation");
        self.finish_video(flight, OPERATION, &request).await
    }

    /// Generate a video directly from an uploaded image.
    ///
    /// Requires stage `INPUT`. A blank or absent prompt is replaced by the
    /// configured default.
    #[tracing::instrument(skip(self, image), fields(provider = self.backend.provider_name(), image_len = image.len()))]
    pub async fn generate_video_direct(
        &self,
        image: String,
        prompt: Option<String>,
    ) -> ReelsmithResult<()> {
        const OPERATION: &str = "generate_video_direct";
        let lock = self.acquire(OPERATION).await?;
        let state = self.snapshot();

        if let Err(e) = prepare_direct(&state, &image) {
            return Err(self.reject(OPERATION, e));
        }

        let prompt = prompt.filter(|p| !p.trim().is_empty());
        let request = VideoRequest {
            prompt: prompt
                .clone()
                .unwrap_or_else(|| self.settings.default_video_prompt().clone()),
            image: Some(image.clone()),
        };

        let flight = self.start(lock, Some(Stage::Input), |s| {
            s.uploaded_image = Some(image);
            s.video_prompt = prompt;
            s.current_stage = Stage::VideoGen;
        });
        tracing::info!(stage = %Stage::VideoGen, "Starting image-to-video generation");
        self.finish_video(flight, OPERATION, &request).await
    }

    async fn finish_video(
        &self,
        flight: InFlight<'_>,
        operation: &'static str,
        request: &VideoRequest,
    ) -> ReelsmithResult<()> {
        match self
            .poller
            .run(self.backend.as_ref(), request, flight.token())
            .await
        {
            Ok(locator) => {
                flight.succeed(operation, |s| {
                    s.generated_video_url = Some(locator.to_string());
                    s.current_stage = Stage::Complete;
                })?;
                tracing::info!(stage = %Stage::Complete, "Video ready");
                Ok(())
            }
            Err(e) => Err(flight.fail(operation, e)),
        }
    }

    /// Return to the initial state, cancelling any in-flight operation.
    #[tracing::instrument(skip(self))]
    pub fn reset(&self) {
        self.state.send_modify(|current| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *current = Arc::new(ProjectState::default());
        });
        self.replace_token();
        tracing::info!(stage = %Stage::Input, "Project reset");
    }

    /// Cancel the in-flight operation without resetting.
    ///
    /// The operation takes its failure path, so a cancelled video job
    /// reverts to `INPUT`.
    pub fn cancel(&self) {
        self.replace_token();
        tracing::info!("Cancellation requested");
    }

    /// Replace the raw input text.
    pub fn set_raw_input(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|s| s.raw_input = text);
    }

    /// Replace the image used for image-to-video.
    pub fn set_uploaded_image(&self, image: Option<String>) {
        self.update(|s| s.uploaded_image = image);
    }

    /// Replace the prompt used for image-to-video.
    pub fn set_video_prompt(&self, prompt: Option<String>) {
        self.update(|s| s.video_prompt = prompt);
    }

    /// Select a model from the catalogue.
    ///
    /// # Errors
    ///
    /// Returns a validation error for ids not in the catalogue.
    pub fn select_model(&self, id: u32) -> ReelsmithResult<()> {
        let model =
            find_model(id).ok_or_else(|| ValidationError::new(format!("Unknown model id {}", id)))?;
        self.update(|s| s.selected_model_id = id);
        tracing::info!(id, name = model.name, "Model selected");
        Ok(())
    }

    /// Take the in-flight lock.
    ///
    /// A holder from before the last reset has been cancelled and is about to
    /// release, so wait for it. A current holder rejects the call.
    async fn acquire(&self, operation: &'static str) -> ReelsmithResult<MutexGuard<'_, ()>> {
        let stale_holder =
            || self.holder_epoch.load(Ordering::SeqCst) != self.epoch.load(Ordering::SeqCst);
        let guard = match self.in_flight.try_lock() {
            Ok(guard) => guard,
            Err(_) if stale_holder() => {
                tracing::debug!(operation, "Waiting for the cancelled operation to release");
                self.in_flight.lock().await
            }
            Err(_) => {
                tracing::warn!(operation, "Rejected: another operation is in progress");
                return Err(PipelineError::new(PipelineErrorKind::AlreadyInProgress(
                    operation.to_string(),
                ))
                .into());
            }
        };
        self.holder_epoch
            .store(self.epoch.load(Ordering::SeqCst), Ordering::SeqCst);
        Ok(guard)
    }

    fn start<'a>(
        &'a self,
        lock: MutexGuard<'a, ()>,
        revert_to: Option<Stage>,
        prepare: impl FnOnce(&mut ProjectState),
    ) -> InFlight<'a> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let token = self.current_token();
        self.update_if(epoch, |s| {
            prepare(s);
            s.is_processing = true;
            s.last_error = None;
        });
        InFlight {
            pipeline: self,
            epoch,
            token,
            revert_to,
            settled: false,
            _lock: lock,
        }
    }

    fn reject(&self, operation: &'static str, error: ReelsmithError) -> ReelsmithError {
        tracing::warn!(operation, error = %error, "Operation rejected");
        let message = error.to_string();
        self.update(|s| s.last_error = Some(message));
        error
    }

    fn update(&self, f: impl FnOnce(&mut ProjectState)) {
        self.state.send_modify(|current| {
            let mut next = ProjectState::clone(current);
            f(&mut next);
            *current = Arc::new(next);
        });
    }

    fn update_if(&self, epoch: u64, f: impl FnOnce(&mut ProjectState)) -> bool {
        self.state.send_if_modified(|current| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            let mut next = ProjectState::clone(current);
            f(&mut next);
            *current = Arc::new(next);
            true
        })
    }

    fn current_token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_token(&self) {
        let mut token = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        token.cancel();
        *token = CancellationToken::new();
    }
}

/// Holds the in-flight lock for one backend-calling operation.
///
/// Dropping it unsettled clears `is_processing` and applies the revert
/// stage, which covers an operation future dropped mid-await.
struct InFlight<'a> {
    pipeline: &'a Pipeline,
    epoch: u64,
    token: CancellationToken,
    revert_to: Option<Stage>,
    settled: bool,
    _lock: MutexGuard<'a, ()>,
}

impl InFlight<'_> {
    fn token(&self) -> &CancellationToken {
        &self.token
    }

    fn succeed(
        mut self,
        operation: &'static str,
        apply: impl FnOnce(&mut ProjectState),
    ) -> ReelsmithResult<()> {
        self.settled = true;
        let applied = self.pipeline.update_if(self.epoch, |s| {
            apply(s);
            s.is_processing = false;
        });
        if !applied {
            tracing::debug!(operation, "Discarding result from before reset");
            Err(GenerationError::new(GenerationErrorKind::Cancelled))?
        }
        Ok(())
    }

    fn fail(mut self, operation: &'static str, error: ReelsmithError) -> ReelsmithError {
        self.settled = true;
        if error.is_cancelled() {
            tracing::warn!(operation, "Operation cancelled");
        } else {
            tracing::error!(operation, error = %error, "Operation failed");
        }
        let message = error.to_string();
        let revert_to = self.revert_to;
        self.pipeline.update_if(self.epoch, |s| {
            s.is_processing = false;
            s.last_error = Some(message);
            if let Some(stage) = revert_to {
                s.current_stage = stage;
            }
        });
        error
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let revert_to = self.revert_to;
        self.pipeline.update_if(self.epoch, |s| {
            s.is_processing = false;
            if let Some(stage) = revert_to {
                s.current_stage = stage;
            }
        });
    }
}

fn require_stage(state: &ProjectState, expected: Stage, next: Stage) -> ReelsmithResult<()> {
    if state.current_stage != expected || !expected.can_advance_to(next) {
        Err(PipelineError::new(PipelineErrorKind::IllegalTransition {
            from: state.current_stage.to_string(),
            to: next.to_string(),
        }))?
    }
    Ok(())
}

fn prepare_video(state: &ProjectState) -> ReelsmithResult<VideoRequest> {
    require_stage(state, Stage::VisualDev, Stage::VideoGen)?;
    let character = state
        .characters
        .first()
        .ok_or_else(|| ValidationError::new("No characters to feature in the video"))?;
    let segment = state
        .visual_segments()
        .next()
        .ok_or_else(|| ValidationError::new("Script has no scene or action segment"))?;

    Ok(VideoRequest {
        prompt: format!(
            "Cinematic shot. {}. Featuring a character looking like: {}",
            segment.shot_description(),
            character.visual_prompt()
        ),
        image: character.image_url().clone(),
    })
}

fn prepare_direct(state: &ProjectState, image: &str) -> ReelsmithResult<()> {
    require_stage(state, Stage::Input, Stage::VideoGen)?;
    if image.trim().is_empty() {
        Err(ValidationError::new("No image uploaded"))?
    }
    DataUrl::parse(image)?;
    Ok(())
}

/// Keep whole segments while their newline-joined content fits in `limit`
/// characters, truncating the first one that does not.
fn bound_segments(script: &[ScriptSegment], limit: usize) -> Vec<ScriptSegment> {
    let mut remaining = limit;
    let mut bounded = Vec::with_capacity(script.len());
    for segment in script {
        if !bounded.is_empty() {
            // separator
            remaining = remaining.saturating_sub(1);
        }
        if remaining == 0 {
            break;
        }
        let length = segment.content().chars().count();
        if length <= remaining {
            remaining -= length;
            bounded.push(segment.clone());
        } else {
            tracing::debug!(
                kept = bounded.len(),
                total = script.len(),
                limit,
                "Truncating script for character extraction"
            );
            bounded.push(segment.truncated(remaining));
            break;
        }
    }
    bounded
}
