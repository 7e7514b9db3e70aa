//! Conversational side-channel.

use crate::ChatSettings;
use futures_util::StreamExt;
use reelsmith_core::{ChatMessage, ChatRole};
use reelsmith_error::{PipelineError, PipelineErrorKind, ReelsmithResult, ValidationError};
use reelsmith_interface::{ChatTurn, StudioBackend};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Id of the message every chat log starts with.
pub const WELCOME_MESSAGE_ID: &str = "welcome";

/// Opaque handle to the model message a stream is writing into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamTarget(String);

impl StreamTarget {
    fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Append-only ordered chat log.
///
/// The only way to change an existing message is
/// [`ChatLog::append_fragment`] on the placeholder of an open stream.
///
/// # Examples
///
/// ```
/// use reelsmith_core::ChatRole;
/// use reelsmith_pipeline::ChatLog;
///
/// let mut log = ChatLog::new("Welcome!");
/// log.push_user("Hi");
/// let target = log.open_stream();
/// log.append_fragment(&target, "Hel");
/// log.append_fragment(&target, "lo");
///
/// let last = log.messages().last().unwrap();
/// assert_eq!(last.role, ChatRole::Model);
/// assert_eq!(last.text, "Hello");
/// assert_eq!(log.messages().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    /// A log holding only the welcome message.
    pub fn new(welcome: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::with_id(
                WELCOME_MESSAGE_ID,
                ChatRole::Model,
                welcome,
            )],
        }
    }

    /// Messages in order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Append a user message.
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::new(ChatRole::User, text));
    }

    /// Append a complete model message.
    pub fn push_model(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::new(ChatRole::Model, text));
    }

    /// Append an empty model message and return the handle that grows it.
    pub fn open_stream(&mut self) -> StreamTarget {
        let target = StreamTarget::new();
        self.open_stream_as(&target);
        target
    }

    fn open_stream_as(&mut self, target: &StreamTarget) {
        self.messages
            .push(ChatMessage::with_id(target.0.clone(), ChatRole::Model, ""));
    }

    /// Append a streamed fragment to the message bound to `target`.
    ///
    /// Returns false when no such message exists.
    pub fn append_fragment(&mut self, target: &StreamTarget, fragment: &str) -> bool {
        match self.messages.iter_mut().rev().find(|m| m.id == target.0) {
            Some(message) => {
                message.text.push_str(fragment);
                true
            }
            None => false,
        }
    }

    /// History in backend form.
    pub fn to_turns(&self) -> Vec<ChatTurn> {
        self.messages
            .iter()
            .map(|message| ChatTurn {
                role: message.role,
                parts: vec![message.text.clone()],
            })
            .collect()
    }
}

/// Streaming chat with the backend, independent of the pipeline.
pub struct ChatSession {
    backend: Arc<dyn StudioBackend>,
    log: watch::Sender<ChatLog>,
    typing: AtomicBool,
    settings: ChatSettings,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("provider", &self.backend.provider_name())
            .field("messages", &self.log.borrow().messages().len())
            .field("typing", &self.is_typing())
            .finish()
    }
}

impl ChatSession {
    /// Create a session seeded with the welcome message.
    pub fn new(backend: Arc<dyn StudioBackend>, settings: ChatSettings) -> Self {
        let (log, _) = watch::channel(ChatLog::new(settings.welcome_message().clone()));
        Self {
            backend,
            log,
            typing: AtomicBool::new(false),
            settings,
        }
    }

    /// Current log.
    pub fn log(&self) -> ChatLog {
        self.log.borrow().clone()
    }

    /// Receiver that observes every change to the log.
    pub fn subscribe(&self) -> watch::Receiver<ChatLog> {
        self.log.subscribe()
    }

    /// True while a reply is streaming.
    pub fn is_typing(&self) -> bool {
        self.typing.load(Ordering::SeqCst)
    }

    /// Send a user message and stream the reply into the log.
    ///
    /// Transport failures append the fallback message and still return
    /// `Ok(())`.
    ///
    /// # Errors
    ///
    /// Fails with a validation error for blank text and with
    /// `PipelineErrorKind::ChatBusy` while another reply is streaming.
    #[tracing::instrument(skip(self, text), fields(provider = self.backend.provider_name(), chars = text.len()))]
    pub async fn send_message(&self, text: &str) -> ReelsmithResult<()> {
        let text = text.trim();
        if text.is_empty() {
            Err(ValidationError::new("Chat message is empty"))?
        }
        let _typing = TypingGuard::acquire(&self.typing)?;

        let history = self.log.borrow().to_turns();
        self.log.send_modify(|log| log.push_user(text));

        let mut stream = match self.backend.open_chat_stream(&history, text).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "Chat stream could not be opened");
                self.push_fallback();
                return Ok(());
            }
        };

        let target = StreamTarget::new();
        self.log.send_modify(|log| log.open_stream_as(&target));

        let mut fragments = 0_usize;
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) if chunk.text.is_empty() => {}
                Ok(chunk) => {
                    fragments += 1;
                    self.log.send_modify(|log| {
                        log.append_fragment(&target, &chunk.text);
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, fragments, "Chat stream interrupted");
                    self.push_fallback();
                    return Ok(());
                }
            }
        }

        tracing::debug!(fragments, "Chat reply complete");
        Ok(())
    }

    fn push_fallback(&self) {
        let fallback = self.settings.fallback_message().clone();
        self.log.send_modify(|log| log.push_model(fallback));
    }
}

struct TypingGuard<'a>(&'a AtomicBool);

impl<'a> TypingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> ReelsmithResult<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| PipelineError::new(PipelineErrorKind::ChatBusy))?;
        Ok(Self(flag))
    }
}

impl Drop for TypingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
