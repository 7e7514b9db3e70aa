//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the reelsmith binary.

mod chat;
mod commands;
mod models;
mod run;
mod video;

pub use chat::run_chat;
pub use commands::{Cli, Commands};
pub use models::list_models;
pub use run::{RunOptions, run_pipeline};
pub use video::animate_image;

use reelsmith::{GeminiBackend, ReelsmithConfig, ReelsmithResult, StudioBackend};
use std::sync::Arc;

/// Build the configured backend.
pub(crate) fn backend(config: &ReelsmithConfig) -> ReelsmithResult<Arc<dyn StudioBackend>> {
    Ok(Arc::new(GeminiBackend::new(config.gemini.clone())?))
}
