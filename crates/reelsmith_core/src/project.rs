//! The aggregate project state.

use crate::{Character, InputType, ScriptSegment, Stage};
use serde::{Deserialize, Serialize};

/// Model selected for a fresh project.
pub const DEFAULT_MODEL_ID: u32 = 8;

/// Single source of truth for one creative session.
///
/// Hosts only ever see immutable snapshots of this value; the pipeline
/// publishes a new snapshot after every change.
///
/// # Examples
///
/// ```
/// use reelsmith_core::{ProjectState, Stage};
///
/// let state = ProjectState::default();
/// assert_eq!(state.current_stage, Stage::Input);
/// assert_eq!(state.selected_model_id, 8);
/// assert!(!state.is_processing);
/// assert!(state.script.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    /// Text entered by the user
    pub raw_input: String,
    /// Classification returned by analysis
    pub input_type: Option<InputType>,
    /// Analysed script, in narrative order
    pub script: Vec<ScriptSegment>,
    /// Extracted characters
    pub characters: Vec<Character>,
    /// Catalogue id of the selected generation model
    pub selected_model_id: u32,
    /// Current workflow stage
    pub current_stage: Stage,
    /// True while one generation operation is in flight
    pub is_processing: bool,
    /// Fetchable locator of the finished video
    pub generated_video_url: Option<String>,
    /// Image supplied for image-to-video, as a data URL
    pub uploaded_image: Option<String>,
    /// Prompt supplied for image-to-video
    pub video_prompt: Option<String>,
    /// User-visible message for the most recent failure
    pub last_error: Option<String>,
}

impl Default for ProjectState {
    fn default() -> Self {
        Self {
            raw_input: String::new(),
            input_type: None,
            script: Vec::new(),
            characters: Vec::new(),
            selected_model_id: DEFAULT_MODEL_ID,
            current_stage: Stage::Input,
            is_processing: false,
            generated_video_url: None,
            uploaded_image: None,
            video_prompt: None,
            last_error: None,
        }
    }
}

impl ProjectState {
    /// Look up a character by id.
    pub fn character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id() == id)
    }

    /// Segments that can be rendered as shots.
    pub fn visual_segments(&self) -> impl Iterator<Item = &ScriptSegment> {
        self.script.iter().filter(|segment| segment.is_visual())
    }
}
