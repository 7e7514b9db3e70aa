//! Pipeline stages and their legal transitions.

use serde::{Deserialize, Serialize};

/// A step of the creative workflow.
///
/// # Examples
///
/// ```
/// use reelsmith_core::Stage;
///
/// assert!(Stage::Input.can_advance_to(Stage::Analysis));
/// assert!(Stage::Input.can_advance_to(Stage::VideoGen));
/// assert!(!Stage::Analysis.can_advance_to(Stage::VisualDev));
/// assert_eq!(Stage::VideoGen.to_string(), "VIDEO_GEN");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    /// Collecting raw text or an image
    #[default]
    #[display("INPUT")]
    Input,
    /// Script has been broken into segments
    #[display("ANALYSIS")]
    Analysis,
    /// Characters have been extracted
    #[display("CHARACTER_DESIGN")]
    CharacterDesign,
    /// Assets are being reviewed before video
    #[display("VISUAL_DEV")]
    VisualDev,
    /// Video generation in progress
    #[display("VIDEO_GEN")]
    VideoGen,
    /// Video is ready
    #[display("COMPLETE")]
    Complete,
}

impl Stage {
    /// Short caption for hosts.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Input => "User input",
            Stage::Analysis => "Script assistant",
            Stage::CharacterDesign => "Art assistant",
            Stage::VisualDev => "Art director",
            Stage::VideoGen => "Animator",
            Stage::Complete => "Complete",
        }
    }

    /// One-line description of the work done at this stage.
    pub fn description(&self) -> &'static str {
        match self {
            Stage::Input => "novel, script or idea",
            Stage::Analysis => "formatting and shot breakdown",
            Stage::CharacterDesign => "character design and concept art",
            Stage::VisualDev => "compositing and layout",
            Stage::VideoGen => "video generation",
            Stage::Complete => "finished video",
        }
    }

    /// Whether an operation may move the pipeline from `self` to `next`.
    ///
    /// Reset is not a transition and is always allowed.
    pub fn can_advance_to(&self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Input, Stage::Analysis)
                | (Stage::Input, Stage::VideoGen)
                | (Stage::Analysis, Stage::CharacterDesign)
                | (Stage::CharacterDesign, Stage::VisualDev)
                | (Stage::VisualDev, Stage::VideoGen)
                | (Stage::VideoGen, Stage::Complete)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn complete_is_terminal() {
        assert!(Stage::iter().all(|next| !Stage::Complete.can_advance_to(next)));
    }

    #[test]
    fn no_stage_advances_to_itself() {
        assert!(Stage::iter().all(|stage| !stage.can_advance_to(stage)));
    }

    #[test]
    fn serializes_screaming_snake() {
        let json = serde_json::to_string(&Stage::CharacterDesign).unwrap();
        assert_eq!(json, "\"CHARACTER_DESIGN\"");
    }
}
