//! Pipeline orchestration for Reelsmith.
//!
//! This crate owns the project state machine ([`Pipeline`]), the polling
//! protocol for long-running video jobs ([`PollingController`]) and the
//! conversational side-channel ([`ChatSession`]). All three talk to models
//! only through `reelsmith_interface`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod chat;
mod pipeline;
mod poll;
mod settings;

pub use chat::{ChatLog, ChatSession, StreamTarget, WELCOME_MESSAGE_ID};
pub use pipeline::Pipeline;
pub use poll::{Backoff, PollPolicy, PollPolicyBuilder, PollingController, until_cancelled};
pub use settings::{ChatSettings, ChatSettingsBuilder, PipelineSettings, PipelineSettingsBuilder};
