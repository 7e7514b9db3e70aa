//! Classification of the raw user input.

use serde::{Deserialize, Serialize};

/// What kind of text the user supplied.
///
/// Unknown values decode as [`InputType::Idea`].
///
/// # Examples
///
/// ```
/// use reelsmith_core::InputType;
///
/// let parsed: InputType = serde_json::from_str("\"screenplay\"").unwrap();
/// assert_eq!(parsed, InputType::Idea);
/// assert_eq!(InputType::from_label("SCRIPT"), InputType::Script);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Prose fiction
    #[display("novel")]
    Novel,
    /// Formatted screenplay
    #[display("script")]
    Script,
    /// Short premise or pitch
    #[default]
    #[display("idea")]
    #[serde(other)]
    Idea,
}

impl InputType {
    /// Parse a backend label case-insensitively, defaulting to `Idea`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "novel" => Self::Novel,
            "script" => Self::Script,
            _ => Self::Idea,
        }
    }
}
