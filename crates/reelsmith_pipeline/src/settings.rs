//! Tunable pipeline and chat settings.

use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Limits and fixed prompt fragments used by pipeline operations.
///
/// # Examples
///
/// ```
/// use reelsmith_pipeline::PipelineSettings;
///
/// let settings = PipelineSettings::default();
/// assert_eq!(*settings.analysis_char_limit(), 5000);
///
/// let small = PipelineSettings::builder()
///     .analysis_char_limit(100_usize)
///     .build()
///     .unwrap();
/// assert_eq!(*small.extraction_char_limit(), 8000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, Builder)]
#[builder(default, setter(into))]
pub struct PipelineSettings {
    /// Characters of raw input sent to analysis.
    #[serde(default = "default_analysis_char_limit")]
    analysis_char_limit: usize,

    /// Characters of script content sent to character extraction.
    #[serde(default = "default_extraction_char_limit")]
    extraction_char_limit: usize,

    /// Style prefix prepended to every character image prompt.
    #[serde(default = "default_character_style_prefix")]
    character_style_prefix: String,

    /// Prompt used for image-to-video when none is given.
    #[serde(default = "default_video_prompt")]
    default_video_prompt: String,
}

fn default_analysis_char_limit() -> usize {
    5000
}

fn default_extraction_char_limit() -> usize {
    8000
}

fn default_character_style_prefix() -> String {
    "Character Concept Art, high quality, detailed, white background.".to_string()
}

fn default_video_prompt() -> String {
    "Cinematic movement, high quality".to_string()
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            analysis_char_limit: default_analysis_char_limit(),
            extraction_char_limit: default_extraction_char_limit(),
            character_style_prefix: default_character_style_prefix(),
            default_video_prompt: default_video_prompt(),
        }
    }
}

impl PipelineSettings {
    /// Creates a new settings builder.
    pub fn builder() -> PipelineSettingsBuilder {
        PipelineSettingsBuilder::default()
    }
}

/// Fixed messages of the chat side-channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, Builder)]
#[builder(default, setter(into))]
pub struct ChatSettings {
    /// First model message of every chat log.
    #[serde(default = "default_welcome_message")]
    welcome_message: String,

    /// Message appended when a reply cannot be produced.
    #[serde(default = "default_fallback_message")]
    fallback_message: String,
}

fn default_welcome_message() -> String {
    "Hi! I'm your film creation assistant. Ask me about scripts, characters or shots."
        .to_string()
}

fn default_fallback_message() -> String {
    "Sorry, I couldn't reach the assistant just now. Please try again.".to_string()
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            welcome_message: default_welcome_message(),
            fallback_message: default_fallback_message(),
        }
    }
}

impl ChatSettings {
    /// Creates a new settings builder.
    pub fn builder() -> ChatSettingsBuilder {
        ChatSettingsBuilder::default()
    }
}
