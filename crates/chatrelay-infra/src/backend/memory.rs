//! In-memory chat backend.
//!
//! Keeps per-chat history and stored uploads in process memory only
//! (`DashMap` tables, values cloned out, no guard held across an await).
//! Replies come from a pluggable [`Responder`] and are streamed word by
//! word, optionally paced by a fixed delay. Once a reply stream ends
//! cleanly, the user message and the full reply are appended to the chat's
//! history; a failed reply records only the user message. A reply that
//! outlives a `close_chat` of its chat records nothing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chatrelay_core::backend::{AttachmentEndpoint, ChatBackend, TokenStream};
use chatrelay_types::attachment::Attachment;
use chatrelay_types::chat::{ChatId, Message};
use chatrelay_types::error::BackendError;
use chatrelay_types::stream::StreamRequest;
use dashmap::DashMap;
use tracing::debug;

/// Produces the full text of a reply.
pub trait Responder: Send + Sync + 'static {
    fn respond(&self, request: &StreamRequest, history: &[Message]) -> Result<String, BackendError>;
}

impl<F> Responder for F
where
    F: Fn(&StreamRequest, &[Message]) -> Result<String, BackendError> + Send + Sync + 'static,
{
    fn respond(&self, request: &StreamRequest, history: &[Message]) -> Result<String, BackendError> {
        self(request, history)
    }
}

/// Repeats the user's message back, naming any attachments.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoResponder;

impl Responder for EchoResponder {
    fn respond(&self, request: &StreamRequest, history: &[Message]) -> Result<String, BackendError> {
        let mut reply = format!("You said: {}", request.user_message);
        if !request.attachments.is_empty() {
            let names: Vec<&str> = request.attachments.iter().map(|a| a.file_name()).collect();
            reply.push_str(&format!(" (attached: {})", names.join(", ")));
        }
        if let Some(system) = request
            .options
            .as_ref()
            .and_then(|o| o.system_message.as_deref())
        {
            reply.push_str(&format!(" [{system}]"));
        }
        let turns = history.len() / 2 + 1;
        reply.push_str(&format!(" (turn {turns})"));
        Ok(reply)
    }
}

/// Split a reply into word tokens, keeping the whitespace with each word.
fn tokenize(text: &str) -> Vec<String> {
    text.split_inclusive(' ').map(str::to_string).collect()
}

/// History of one open chat. `generation` changes whenever the chat is
/// released and opened again.
#[derive(Debug, Default)]
struct ChatState {
    generation: u64,
    messages: Vec<Message>,
}

/// Append to the history of `chat_id` only if it is still the generation the
/// reply started under.
fn record(
    histories: &DashMap<ChatId, ChatState>,
    chat_id: &ChatId,
    generation: u64,
    messages: impl IntoIterator<Item = Message>,
) -> bool {
    match histories.get_mut(chat_id) {
        Some(mut state) if state.generation == generation => {
            state.messages.extend(messages);
            true
        }
        _ => false,
    }
}

#[derive(Debug, Clone)]
struct StoredUpload {
    chat_id: ChatId,
    attachment: Attachment,
}

pub struct InMemoryChatBackend {
    histories: Arc<DashMap<ChatId, ChatState>>,
    generations: Arc<AtomicU64>,
    uploads: Arc<DashMap<String, StoredUpload>>,
    responder: Arc<dyn Responder>,
    token_delay: Duration,
    next_upload: AtomicU64,
}

impl InMemoryChatBackend {
    pub fn new() -> Self {
        Self::with_responder(EchoResponder)
    }

    pub fn with_responder(responder: impl Responder) -> Self {
        Self {
            histories: Arc::new(DashMap::new()),
            generations: Arc::new(AtomicU64::new(0)),
            uploads: Arc::new(DashMap::new()),
            responder: Arc::new(responder),
            token_delay: Duration::ZERO,
            next_upload: AtomicU64::new(0),
        }
    }

    /// Pause between tokens, to make streaming visible.
    pub fn with_token_delay(mut self, delay: Duration) -> Self {
        self.token_delay = delay;
        self
    }

    /// Replace a chat's history, e.g. to seed a demo conversation.
    pub fn seed_history(&self, chat_id: ChatId, messages: Vec<Message>) {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        self.histories.insert(chat_id, ChatState { generation, messages });
    }

    /// Number of uploads currently stored for `chat_id`.
    pub fn stored_uploads(&self, chat_id: &ChatId) -> usize {
        self.uploads
            .iter()
            .filter(|entry| &entry.value().chat_id == chat_id)
            .count()
    }
}

impl Default for InMemoryChatBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryChatBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryChatBackend")
            .field("chats", &self.histories.len())
            .field("uploads", &self.uploads.len())
            .field("token_delay", &self.token_delay)
            .finish()
    }
}

impl ChatBackend for InMemoryChatBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn stream(&self, request: StreamRequest) -> TokenStream {
        let histories = Arc::clone(&self.histories);
        let generations = Arc::clone(&self.generations);
        let responder = Arc::clone(&self.responder);
        let delay = self.token_delay;

        Box::pin(async_stream::try_stream! {
            let chat_id = request.chat_id.clone();
            let user = Message::user(request.user_message.clone())
                .with_attachments(request.attachments.iter().map(|a| a.to_ref()).collect());
            let (generation, history) = {
                let state = histories.entry(chat_id.clone()).or_insert_with(|| ChatState {
                    generation: generations.fetch_add(1, Ordering::Relaxed),
                    messages: Vec::new(),
                });
                (state.generation, state.messages.clone())
            };

            let reply = responder.respond(&request, &history);
            if reply.is_err() {
                record(&histories, &chat_id, generation, [user.clone()]);
            }
            let reply = reply?;

            for token in tokenize(&reply) {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                yield token;
            }

            let chars = reply.len();
            if record(&histories, &chat_id, generation, [user, Message::assistant(reply)]) {
                debug!(chat_id = %chat_id, chars, "Reply recorded");
            } else {
                debug!(chat_id = %chat_id, "Chat released during reply, not recorded");
            }
        })
    }

    async fn get_history(&self, chat_id: &ChatId) -> Result<Vec<Message>, BackendError> {
        Ok(self
            .histories
            .get(chat_id)
            .map(|state| state.messages.clone())
            .unwrap_or_default())
    }

    async fn close_chat(&self, chat_id: &ChatId) -> Result<(), BackendError> {
        self.histories.remove(chat_id);
        self.uploads.retain(|_, stored| &stored.chat_id != chat_id);
        debug!(chat_id = %chat_id, "Chat released");
        Ok(())
    }
}

impl AttachmentEndpoint for InMemoryChatBackend {
    async fn upload_attachment(
        &self,
        chat_id: &ChatId,
        attachment: &Attachment,
    ) -> Result<String, BackendError> {
        let n = self.next_upload.fetch_add(1, Ordering::Relaxed);
        let key = format!("{chat_id}/{n}");
        self.uploads.insert(
            key.clone(),
            StoredUpload {
                chat_id: chat_id.clone(),
                attachment: attachment.clone(),
            },
        );
        Ok(key)
    }

    async fn remove_attachment(&self, chat_id: &ChatId, key: &str) -> Result<(), BackendError> {
        match self
            .uploads
            .remove_if(key, |_, stored| &stored.chat_id == chat_id)
        {
            Some(_) => Ok(()),
            None => Err(BackendError::AttachmentNotFound(key.to_string())),
        }
    }
}
