//! Gemini / Veo REST client.

use super::conversion::{
    breakdown_from_dto, characters_from_dto, chunk_from_response, contents_from_turns,
    operation_from_dto, parse_model_json, with_api_key,
};
use super::dto::{AnalysisDto, CharacterDto, GenerateContentResponse, OperationDto};
use super::prompts::{analysis_prompt, analysis_schema, extraction_prompt, extraction_schema};
use super::settings::GeminiSettings;
use super::sse::SseDecoder;
use async_trait::async_trait;
use futures_util::StreamExt;
use reelsmith_core::{Character, DataUrl, ScriptSegment};
use reelsmith_error::{
    BackendError, BackendErrorKind, GenerationError, GenerationErrorKind, JsonError,
    ReelsmithError, ReelsmithResult, RetryableError,
};
use reelsmith_interface::{
    ChatChunk, ChatStream, ChatStreaming, ChatTurn, GenerationBackend, ImageSynthesis,
    MediaLocator, ScriptAnalysis, ScriptBreakdown, VideoOperation, VideoRequest, VideoSynthesis,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, info, instrument, warn};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Backend over the Google Generative Language REST API.
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    api_key: String,
    settings: GeminiSettings,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("base_url", self.settings.base_url())
            .field("text_model", self.settings.text_model())
            .field("video_model", self.settings.video_model())
            .finish_non_exhaustive()
    }
}

impl GeminiBackend {
    /// Creates a new backend.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No API key is configured and `GEMINI_API_KEY` is not set
    /// - The HTTP client cannot be initialized
    #[instrument(skip_all)]
    pub fn new(settings: GeminiSettings) -> ReelsmithResult<Self> {
        let api_key = settings
            .resolve_api_key()
            .ok_or_else(|| BackendError::new(BackendErrorKind::MissingApiKey))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(*settings.request_timeout_secs()))
            .build()
            .map_err(|e| {
                BackendError::new(BackendErrorKind::Request(format!(
                    "Failed to build HTTP client: {}",
                    e
                )))
            })?;

        Ok(Self {
            client,
            api_key,
            settings,
        })
    }

    /// Active settings.
    pub fn settings(&self) -> &GeminiSettings {
        &self.settings
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.settings.base_url(), model, method)
    }

    async fn generate_content(&self, model: &str, body: &Value) -> ReelsmithResult<GenerateContentResponse> {
        let url = self.model_url(model, "generateContent");
        debug!(url = %url, "Sending generateContent request");
        let response = self
            .execute(|| self.client.post(&url).header(API_KEY_HEADER, &self.api_key).json(body))
            .await?;
        decode(response).await
    }

    async fn generate_json<T: DeserializeOwned + Default>(
        &self,
        prompt: String,
        schema: Value,
    ) -> ReelsmithResult<T> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            }
        });
        let response = self.generate_content(self.settings.text_model(), &body).await?;
        if let Some(reason) = response.block_reason() {
            return Err(GenerationError::new(GenerationErrorKind::NoResult(format!(
                "prompt blocked: {}",
                reason
            )))
            .into());
        }
        let parsed: Option<T> = parse_model_json(&response.text())?;
        Ok(parsed.unwrap_or_default())
    }

    /// Send a request, retrying transient failures.
    ///
    /// The first failure selects the backoff parameters, as returned by
    /// [`RetryableError::retry_strategy_params`], capped by `max_retries`.
    async fn execute<F>(&self, build: F) -> ReelsmithResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let first = match send_once(build()).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        let max_retries = *self.settings.max_retries();
        if !first.is_retryable() || max_retries == 0 {
            warn!(error = %first, "Permanent API error, failing immediately");
            return Err(first.into());
        }

        let (initial_ms, retries, max_delay_secs) = first.retry_strategy_params();
        let retries = retries.min(max_retries);
        info!(
            error = %first,
            initial_backoff_ms = initial_ms,
            max_retries = retries,
            max_delay_secs,
            "API request failed, will retry with configured strategy"
        );

        let strategy = ExponentialBackoff::from_millis(2)
            .factor((initial_ms / 2).max(1))
            .max_delay(Duration::from_secs(max_delay_secs))
            .map(jitter)
            .take(retries);

        let build = &build;
        let response = Retry::spawn(strategy, move || async move {
            match send_once(build()).await {
                Ok(response) => Ok(response),
                Err(e) if e.is_retryable() => {
                    warn!(error = %e, "API request failed, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => {
                    warn!(error = %e, "Permanent API error, failing immediately");
                    Err(RetryError::Permanent(e))
                }
            }
        })
        .await?;

        Ok(response)
    }
}

async fn send_once(request: RequestBuilder) -> Result<Response, BackendError> {
    let response = request
        .send()
        .await
        .map_err(|e| BackendError::new(BackendErrorKind::Request(e.to_string())))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(BackendError::new(BackendErrorKind::Http {
        status_code: status.as_u16(),
        message: api_error_message(&message),
    }))
}

/// Extract `error.message` from a Google API error body, else the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> ReelsmithResult<T> {
    let body = response
        .text()
        .await
        .map_err(|e| BackendError::new(BackendErrorKind::Request(e.to_string())))?;
    serde_json::from_str(&body).map_err(|e| {
        BackendError::new(BackendErrorKind::InvalidResponse(format!(
            "Failed to parse response: {}",
            e
        )))
        .into()
    })
}

fn parse_stream_event(data: &str) -> ReelsmithResult<ChatChunk> {
    let response: GenerateContentResponse = serde_json::from_str(data)
        .map_err(|e| JsonError::new(format!("Invalid stream event: {}", e)).with_excerpt(data))?;
    Ok(chunk_from_response(&response))
}

impl GenerationBackend for GeminiBackend {
    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

#[async_trait]
impl ScriptAnalysis for GeminiBackend {
    #[instrument(skip(self, text), fields(model = %self.settings.text_model(), chars = text.len()))]
    async fn analyze_text(&self, text: &str) -> ReelsmithResult<ScriptBreakdown> {
        let dto: AnalysisDto = self
            .generate_json(analysis_prompt(text), analysis_schema())
            .await?;
        let breakdown = breakdown_from_dto(dto);
        debug!(
            input_type = %breakdown.input_type,
            segments = breakdown.segments.len(),
            "Analysis decoded"
        );
        Ok(breakdown)
    }

    #[instrument(skip(self, segments), fields(model = %self.settings.text_model(), segments = segments.len()))]
    async fn extract_characters(
        &self,
        segments: &[ScriptSegment],
    ) -> ReelsmithResult<Vec<Character>> {
        let context = segments
            .iter()
            .map(|segment| segment.content().as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let dtos: Vec<CharacterDto> = self
            .generate_json(extraction_prompt(&context), extraction_schema())
            .await?;
        Ok(characters_from_dto(dtos))
    }
}

#[async_trait]
impl ImageSynthesis for GeminiBackend {
    #[instrument(skip(self, visual_prompt), fields(model = %self.settings.image_model()))]
    async fn generate_image(&self, visual_prompt: &str) -> ReelsmithResult<String> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": visual_prompt }] }],
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"],
                "imageConfig": {
                    "aspectRatio": self.settings.image_aspect_ratio(),
                    "imageSize": self.settings.image_size(),
                }
            }
        });
        let response = self
            .generate_content(self.settings.image_model(), &body)
            .await?;

        let image = response.inline_data().ok_or_else(|| {
            let detail = match response.block_reason() {
                Some(reason) => format!("image blocked: {}", reason),
                None => "image model returned no image".to_string(),
            };
            GenerationError::new(GenerationErrorKind::NoResult(detail))
        })?;
        Ok(DataUrl::new(image.mime_type.clone(), image.data.clone()).to_string())
    }
}

#[async_trait]
impl VideoSynthesis for GeminiBackend {
    #[instrument(skip(self, request), fields(model = %self.settings.video_model(), has_image = request.image.is_some()))]
    async fn start_video_generation(
        &self,
        request: &VideoRequest,
    ) -> ReelsmithResult<VideoOperation> {
        let mut instance = json!({ "prompt": request.prompt });
        if let Some(image) = &request.image {
            let image = DataUrl::parse(image)?;
            instance["image"] = json!({
                "bytesBase64Encoded": image.data(),
                "mimeType": image.mime(),
            });
        }
        let body = json!({
            "instances": [instance],
            "parameters": {
                "aspectRatio": self.settings.video_aspect_ratio(),
                "resolution": self.settings.video_resolution(),
            }
        });

        let url = self.model_url(self.settings.video_model(), "predictLongRunning");
        let response = self
            .execute(|| self.client.post(&url).header(API_KEY_HEADER, &self.api_key).json(&body))
            .await?;
        let operation: OperationDto = decode(response).await?;
        Ok(operation_from_dto(operation))
    }

    #[instrument(skip(self, operation), fields(operation = %operation.name))]
    async fn poll_video_operation(
        &self,
        operation: &VideoOperation,
    ) -> ReelsmithResult<VideoOperation> {
        let url = format!("{}/{}", self.settings.base_url(), operation.name);
        let response = self
            .execute(|| self.client.get(&url).header(API_KEY_HEADER, &self.api_key))
            .await?;
        let polled: OperationDto = decode(response).await?;
        Ok(operation_from_dto(polled))
    }

    async fn resolve_video_result(
        &self,
        operation: &VideoOperation,
    ) -> ReelsmithResult<Option<MediaLocator>> {
        Ok(operation
            .video_uri
            .as_deref()
            .map(|uri| MediaLocator(with_api_key(uri, &self.api_key))))
    }
}

#[async_trait]
impl ChatStreaming for GeminiBackend {
    #[instrument(skip(self, history, message), fields(model = %self.settings.text_model(), turns = history.len()))]
    async fn open_chat_stream(
        &self,
        history: &[ChatTurn],
        message: &str,
    ) -> ReelsmithResult<ChatStream> {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": self.settings.system_instruction() }] },
            "contents": contents_from_turns(history, message),
        });
        let url = format!(
            "{}?alt=sse",
            self.model_url(self.settings.text_model(), "streamGenerateContent")
        );
        let response = self
            .execute(|| self.client.post(&url).header(API_KEY_HEADER, &self.api_key).json(&body))
            .await?;

        let mut bytes = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::default();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err::<ChatChunk, ReelsmithError>(
                            BackendError::new(BackendErrorKind::StreamInterrupted(e.to_string())).into(),
                        );
                        return;
                    }
                };
                for data in decoder.push(&chunk) {
                    yield parse_stream_event(&data);
                }
            }
            if let Some(data) = decoder.finish() {
                yield parse_stream_event(&data);
            }
        };

        Ok(Box::pin(stream))
    }
}
