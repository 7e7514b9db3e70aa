//! Google Generative Language API backend.

mod client;
mod conversion;
mod dto;
mod prompts;
mod settings;
mod sse;

pub use client::GeminiBackend;
pub use settings::{GeminiSettings, GeminiSettingsBuilder};
pub use sse::SseDecoder;
