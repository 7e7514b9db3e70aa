//! Script segments produced by analysis.

use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// The narrative role of a script segment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Establishing description of a place or moment
    #[display("scene")]
    Scene,
    /// Spoken lines
    #[display("dialogue")]
    Dialogue,
    /// Physical movement or events
    #[display("action")]
    Action,
}

/// One unit of the analysed script, in narrative order.
///
/// # Examples
///
/// ```
/// use reelsmith_core::{ScriptSegment, SegmentKind};
///
/// let segment = ScriptSegment::builder()
///     .id("s1")
///     .kind(SegmentKind::Scene)
///     .content("A lighthouse at dusk.")
///     .visual_prompt(Some("Wide shot of a lighthouse, orange sky".to_string()))
///     .build()
///     .unwrap();
///
/// assert!(segment.is_visual());
/// assert_eq!(segment.content(), "A lighthouse at dusk.");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, Builder)]
#[builder(setter(into))]
#[serde(rename_all = "camelCase")]
pub struct ScriptSegment {
    /// Stable identifier within the script
    id: String,
    /// Segment type
    #[serde(rename = "type")]
    kind: SegmentKind,
    /// Text of the segment
    content: String,
    /// Optional prompt describing how the segment looks on screen
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    visual_prompt: Option<String>,
}

impl ScriptSegment {
    /// Create a new builder for a script segment.
    pub fn builder() -> ScriptSegmentBuilder {
        ScriptSegmentBuilder::default()
    }

    /// Scene and action segments can be rendered as shots.
    pub fn is_visual(&self) -> bool {
        matches!(self.kind, SegmentKind::Scene | SegmentKind::Action)
    }

    /// The visual prompt when present and non-blank, else the content.
    pub fn shot_description(&self) -> &str {
        self.visual_prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or(&self.content)
    }

    /// Copy of this segment with content cut to `limit` characters.
    pub fn truncated(&self, limit: usize) -> Self {
        Self {
            content: crate::truncate_chars(&self.content, limit).to_string(),
            ..self.clone()
        }
    }
}
