//! Character records produced by extraction.

use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// A character extracted from the script.
///
/// Only `image_url` changes after extraction, and only through
/// [`Character::set_image_url`].
///
/// # Examples
///
/// ```
/// use reelsmith_core::Character;
///
/// let mut hero = Character::builder()
///     .id("c1")
///     .name("Mara")
///     .description("A lighthouse keeper")
///     .visual_prompt("weathered woman in a yellow raincoat")
///     .build()
///     .unwrap();
///
/// assert!(hero.image_url().is_none());
/// hero.set_image_url("data:image/png;base64,AAAA");
/// assert!(hero.image_url().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, Builder)]
#[builder(setter(into))]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Stable identifier
    id: String,
    /// Display name
    name: String,
    /// Narrative description
    description: String,
    /// Prompt used to render the character
    visual_prompt: String,
    /// Generated concept art, if any
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

impl Character {
    /// Create a new builder for a character.
    pub fn builder() -> CharacterBuilder {
        CharacterBuilder::default()
    }

    /// Replace the generated image.
    pub fn set_image_url(&mut self, url: impl Into<String>) {
        self.image_url = Some(url.into());
    }
}
