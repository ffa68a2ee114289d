//! Test doubles shared by the core unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chatrelay_types::attachment::Attachment;
use chatrelay_types::chat::{ChatId, Message};
use chatrelay_types::error::BackendError;
use chatrelay_types::event::UiEvent;
use chatrelay_types::stream::StreamRequest;
use futures_util::stream;
use tokio::sync::Notify;

use crate::backend::{AttachmentEndpoint, ChatBackend, TokenStream};
use crate::ui::{UiDispatcher, UiHandle, UiSink};

/// Sink that records every raw signal it is handed.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<UiEvent>>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Token { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn histories(&self) -> Vec<Vec<Message>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::HistoryReplaced { messages, .. } => Some(messages),
                _ => None,
            })
            .collect()
    }

    /// Token, error and complete signals only, in delivery order.
    pub fn stream_signals(&self) -> Vec<UiEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, UiEvent::Token { .. }) || e.is_terminal())
            .collect()
    }
}

impl UiSink for Recorder {
    fn on_token(&mut self, _text: &str) {}
    fn on_error(&mut self, _message: &str) {}
    fn on_complete(&mut self) {}
    fn on_history_replaced(&mut self, _messages: &[Message]) {}

    fn handle(&mut self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn start_ui() -> (UiHandle, Recorder) {
    let recorder = Recorder::default();
    let (ui, _task) = UiDispatcher::spawn(recorder.clone(), 64);
    (ui, recorder)
}

/// Backend whose replies, histories and failures are scripted by the test.
#[derive(Default)]
pub struct ScriptedBackend {
    streams: Mutex<VecDeque<TokenStream>>,
    requests: Mutex<Vec<StreamRequest>>,
    histories: Mutex<HashMap<ChatId, Vec<Message>>>,
    closed: Mutex<Vec<ChatId>>,
    history_fails: AtomicBool,
    upload_fails: AtomicBool,
    upload_hold: AtomicBool,
    upload_started: Notify,
    upload_release: Notify,
    uploads: Mutex<Vec<(ChatId, String)>>,
    removed: Mutex<Vec<String>>,
    next_key: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_stream(&self, stream: TokenStream) {
        self.streams.lock().unwrap().push_back(stream);
    }

    pub fn push_tokens(&self, tokens: &[&str]) {
        let items: Vec<Result<String, BackendError>> =
            tokens.iter().map(|t| Ok(t.to_string())).collect();
        self.push_stream(Box::pin(stream::iter(items)));
    }

    pub fn push_failure(&self, tokens: &[&str], message: &str) {
        let mut items: Vec<Result<String, BackendError>> =
            tokens.iter().map(|t| Ok(t.to_string())).collect();
        items.push(Err(BackendError::provider(message)));
        // Anything after the error must never be relayed.
        items.push(Ok("after-error".to_string()));
        self.push_stream(Box::pin(stream::iter(items)));
    }

    pub fn requests(&self) -> Vec<StreamRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn set_history(&self, chat_id: &str, messages: Vec<Message>) {
        self.histories
            .lock()
            .unwrap()
            .insert(ChatId::from(chat_id), messages);
    }

    pub fn fail_history(&self, fail: bool) {
        self.history_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.upload_fails.store(fail, Ordering::SeqCst);
    }

    /// Park uploads until [`release_uploads`](Self::release_uploads).
    pub fn hold_uploads(&self, hold: bool) {
        self.upload_hold.store(hold, Ordering::SeqCst);
    }

    /// Wait until a held upload has reached the backend.
    pub async fn upload_started(&self) {
        self.upload_started.notified().await;
    }

    pub fn release_uploads(&self) {
        self.upload_release.notify_one();
    }

    pub fn closed_chats(&self) -> Vec<ChatId> {
        self.closed.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<(ChatId, String)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn removed_keys(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

impl ChatBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn stream(&self, request: StreamRequest) -> TokenStream {
        self.requests.lock().unwrap().push(request);
        self.streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Box::pin(stream::empty()))
    }

    async fn get_history(&self, chat_id: &ChatId) -> Result<Vec<Message>, BackendError> {
        if self.history_fails.load(Ordering::SeqCst) {
            return Err(BackendError::provider("history unavailable"));
        }
        Ok(self
            .histories
            .lock()
            .unwrap()
            .get(chat_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn close_chat(&self, chat_id: &ChatId) -> Result<(), BackendError> {
        self.closed.lock().unwrap().push(chat_id.clone());
        Ok(())
    }
}

impl AttachmentEndpoint for ScriptedBackend {
    async fn upload_attachment(
        &self,
        chat_id: &ChatId,
        attachment: &Attachment,
    ) -> Result<String, BackendError> {
        if self.upload_fails.load(Ordering::SeqCst) {
            return Err(BackendError::provider("upload refused"));
        }
        if self.upload_hold.load(Ordering::SeqCst) {
            self.upload_started.notify_one();
            self.upload_release.notified().await;
        }
        let key = format!(
            "key-{}-{}",
            self.next_key.fetch_add(1, Ordering::SeqCst),
            attachment.file_name()
        );
        self.uploads
            .lock()
            .unwrap()
            .push((chat_id.clone(), key.clone()));
        Ok(key)
    }

    async fn remove_attachment(&self, _chat_id: &ChatId, key: &str) -> Result<(), BackendError> {
        self.removed.lock().unwrap().push(key.to_string());
        Ok(())
    }
}
