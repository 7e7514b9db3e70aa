//! Core artifact types for the Reelsmith creative pipeline.
//!
//! This crate provides the data carried between pipeline stages: script
//! segments, characters, the aggregate [`ProjectState`], the chat log entries
//! and the selectable model catalogue.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod character;
mod chat;
mod input;
mod media;
mod model;
mod project;
mod segment;
mod stage;
mod telemetry;
mod text;

pub use character::{Character, CharacterBuilder};
pub use chat::{ChatMessage, ChatRole};
pub use input::InputType;
pub use media::{DataUrl, mime_for_path};
pub use model::{ModelInfo, ModelKind, available_models, find_model};
pub use project::{DEFAULT_MODEL_ID, ProjectState};
pub use segment::{ScriptSegment, ScriptSegmentBuilder, SegmentKind};
pub use stage::Stage;
pub use telemetry::init_logging;
pub use text::truncate_chars;
