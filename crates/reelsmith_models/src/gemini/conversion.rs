//! Conversions between API DTOs and Reelsmith types.

use super::dto::{AnalysisDto, CharacterDto, GenerateContentResponse, OperationDto, SegmentDto};
use reelsmith_core::{Character, InputType, ScriptSegment, SegmentKind};
use reelsmith_error::{JsonError, ReelsmithResult};
use reelsmith_interface::{ChatChunk, ChatTurn, FinishReason, ScriptBreakdown, VideoOperation};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Parse JSON returned as model text, tolerating a Markdown code fence.
pub(crate) fn parse_model_json<T: DeserializeOwned>(text: &str) -> ReelsmithResult<T> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);
    let body = if body.trim().is_empty() { "null" } else { body };

    serde_json::from_str(body)
        .map_err(|e| {
            JsonError::new(format!("Model returned invalid JSON: {}", e))
                .with_excerpt(body)
                .into()
        })
}

pub(crate) fn breakdown_from_dto(dto: AnalysisDto) -> ScriptBreakdown {
    ScriptBreakdown {
        input_type: dto
            .input_type
            .as_deref()
            .map(InputType::from_label)
            .unwrap_or_default(),
        segments: dto
            .segments
            .into_iter()
            .enumerate()
            .filter_map(|(index, segment)| segment_from_dto(index, segment))
            .collect(),
    }
}

fn segment_from_dto(index: usize, dto: SegmentDto) -> Option<ScriptSegment> {
    let content = dto.content.filter(|c| !c.trim().is_empty())?;
    let kind = match dto.kind.as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("dialogue") => SegmentKind::Dialogue,
        Some("action") => SegmentKind::Action,
        _ => SegmentKind::Scene,
    };
    ScriptSegment::builder()
        .id(dto.id.unwrap_or_else(|| format!("seg-{}", index + 1)))
        .kind(kind)
        .content(content)
        .visual_prompt(dto.visual_prompt)
        .build()
        .ok()
}

pub(crate) fn characters_from_dto(dtos: Vec<CharacterDto>) -> Vec<Character> {
    dtos.into_iter()
        .enumerate()
        .filter_map(|(index, dto)| {
            let name = dto.name.filter(|n| !n.trim().is_empty())?;
            let description = dto.description.unwrap_or_default();
            let visual_prompt = dto
                .visual_prompt
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| description.clone());
            Character::builder()
                .id(dto.id.unwrap_or_else(|| format!("char-{}", index + 1)))
                .name(name)
                .description(description)
                .visual_prompt(visual_prompt)
                .build()
                .ok()
        })
        .collect()
}

pub(crate) fn operation_from_dto(dto: OperationDto) -> VideoOperation {
    let video_uri = dto
        .response
        .and_then(|response| response.generate_video_response)
        .and_then(|video| video.generated_samples.into_iter().next())
        .and_then(|sample| sample.video)
        .and_then(|video| video.uri);
    let error = dto.error.map(|status| match status.code {
        Some(code) => format!("{} (code {})", status.message, code),
        None => status.message,
    });

    VideoOperation {
        name: dto.name,
        done: dto.done,
        video_uri,
        error,
    }
}

/// Append the API key so the URI can be fetched directly.
pub(crate) fn with_api_key(uri: &str, api_key: &str) -> String {
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{}{}key={}", uri, separator, api_key)
}

pub(crate) fn chunk_from_response(response: &GenerateContentResponse) -> ChatChunk {
    ChatChunk {
        text: response.text(),
        finish_reason: response.finish_reason().map(finish_reason_from_str),
    }
}

fn finish_reason_from_str(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
            FinishReason::ContentFilter
        }
        _ => FinishReason::Other,
    }
}

pub(crate) fn contents_from_turns(history: &[ChatTurn], message: &str) -> Vec<Value> {
    history
        .iter()
        .filter(|turn| turn.parts.iter().any(|part| !part.trim().is_empty()))
        .map(|turn| {
            let parts: Vec<Value> = turn.parts.iter().map(|text| json!({ "text": text })).collect();
            json!({ "role": turn.role.to_string(), "parts": parts })
        })
        .chain(std::iter::once(
            json!({ "role": "user", "parts": [{ "text": message }] }),
        ))
        .collect()
}
