//! Gemini backend settings.

use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Environment variable consulted when no key is configured.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Endpoint, model and request settings for [`crate::GeminiBackend`].
///
/// # Examples
///
/// ```
/// use reelsmith_models::GeminiSettings;
///
/// let settings = GeminiSettings::default();
/// assert_eq!(settings.text_model(), "gemini-2.5-flash");
/// assert_eq!(settings.video_model(), "veo-3.1-fast-generate-preview");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, Builder)]
#[builder(default, setter(into))]
pub struct GeminiSettings {
    /// API key; falls back to `GEMINI_API_KEY`.
    #[serde(default)]
    api_key: Option<String>,

    /// API root, without a trailing slash.
    #[serde(default = "default_base_url")]
    base_url: String,

    /// Model for analysis, extraction and chat.
    #[serde(default = "default_text_model")]
    text_model: String,

    /// Model for character images.
    #[serde(default = "default_image_model")]
    image_model: String,

    /// Model for video.
    #[serde(default = "default_video_model")]
    video_model: String,

    /// Video aspect ratio.
    #[serde(default = "default_video_aspect_ratio")]
    video_aspect_ratio: String,

    /// Video resolution.
    #[serde(default = "default_video_resolution")]
    video_resolution: String,

    /// Image aspect ratio.
    #[serde(default = "default_image_aspect_ratio")]
    image_aspect_ratio: String,

    /// Image size class.
    #[serde(default = "default_image_size")]
    image_size: String,

    /// System instruction for the chat assistant.
    #[serde(default = "default_system_instruction")]
    system_instruction: String,

    /// Retries for transient failures of unary calls.
    #[serde(default = "default_max_retries")]
    max_retries: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_image_model() -> String {
    "gemini-3-pro-image-preview".to_string()
}

fn default_video_model() -> String {
    "veo-3.1-fast-generate-preview".to_string()
}

fn default_video_aspect_ratio() -> String {
    "16:9".to_string()
}

fn default_video_resolution() -> String {
    "720p".to_string()
}

fn default_image_aspect_ratio() -> String {
    "1:1".to_string()
}

fn default_image_size() -> String {
    "1K".to_string()
}

fn default_system_instruction() -> String {
    "You are a professional film creation assistant. Help the user develop scripts, \
     explain video generation techniques and offer creative ideas. Answer concisely."
        .to_string()
}

fn default_max_retries() -> usize {
    3
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            video_model: default_video_model(),
            video_aspect_ratio: default_video_aspect_ratio(),
            video_resolution: default_video_resolution(),
            image_aspect_ratio: default_image_aspect_ratio(),
            image_size: default_image_size(),
            system_instruction: default_system_instruction(),
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl GeminiSettings {
    /// Creates a new settings builder.
    pub fn builder() -> GeminiSettingsBuilder {
        GeminiSettingsBuilder::default()
    }

    /// The configured key, else `GEMINI_API_KEY`, ignoring blank values.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }
}
