//! Wire-neutral request and response types.

use reelsmith_core::{ChatRole, InputType, ScriptSegment};
use serde::{Deserialize, Serialize};

/// Result of script analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptBreakdown {
    /// Detected input classification
    #[serde(default)]
    pub input_type: InputType,
    /// Segments in narrative order
    #[serde(default)]
    pub segments: Vec<ScriptSegment>,
}

/// Video generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRequest {
    /// Text prompt
    pub prompt: String,
    /// Optional conditioning image as a data URL
    pub image: Option<String>,
}

/// Handle to a long-running video job.
///
/// # Examples
///
/// ```
/// use reelsmith_interface::VideoOperation;
///
/// let op = VideoOperation::pending("operations/abc");
/// assert!(!op.done);
/// assert!(op.video_uri.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoOperation {
    /// Backend identifier of the job
    pub name: String,
    /// Whether the job has finished
    pub done: bool,
    /// Result reference once done
    pub video_uri: Option<String>,
    /// Backend-reported failure once done
    pub error: Option<String>,
}

impl VideoOperation {
    /// A job that has been accepted but not finished.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            video_uri: None,
            error: None,
        }
    }
}

/// Complete, fetchable reference to generated media.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[display("{}", _0)]
pub struct MediaLocator(pub String);

impl MediaLocator {
    /// The locator as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Prior conversation turn sent with a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Author
    pub role: ChatRole,
    /// Text parts
    pub parts: Vec<String>,
}

/// A single fragment of a streamed chat reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatChunk {
    /// Incremental text, possibly empty
    pub text: String,
    /// Set on the final fragment when the backend reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl ChatChunk {
    /// A text fragment without a finish reason.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: None,
        }
    }
}

/// Why a streamed reply stopped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::EnumIter,
)]
pub enum FinishReason {
    /// Model completed naturally.
    Stop,
    /// Hit the output token limit.
    Length,
    /// Content was filtered.
    ContentFilter,
    /// Other/unknown reason.
    Other,
}
