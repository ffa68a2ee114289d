//! A sink that keeps the visible conversation.
//!
//! `Transcript` applies relay signals the way a chat view does: a history
//! replacement overwrites the list, the user's message is appended on send,
//! the first non-empty token opens an assistant message and later tokens
//! extend it. `working` is set from send until the terminal signal, or until
//! the history is replaced: after a chat switch the old reply's terminal
//! signal is never delivered.

use chatrelay_types::chat::{Message, MessageRole};

use super::sink::UiSink;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
    pending_files: Vec<String>,
    working: bool,
    last_error: Option<String>,
    /// Whether the current reply already has an assistant message to extend.
    reply_open: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn pending_files(&self) -> &[String] {
        &self.pending_files
    }

    /// True while a reply is outstanding.
    pub fn is_working(&self) -> bool {
        self.working
    }

    /// True when the last message is the user's and no reply has started.
    pub fn is_waiting(&self) -> bool {
        self.messages
            .last()
            .is_some_and(|m| m.role == MessageRole::User)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

impl UiSink for Transcript {
    fn on_token(&mut self, text: &str) {
        if self.reply_open {
            if let Some(last) = self.messages.last_mut() {
                last.content.push_str(text);
            }
        } else if !text.is_empty() {
            self.messages.push(Message::assistant(text));
            self.reply_open = true;
        }
    }

    fn on_error(&mut self, message: &str) {
        self.working = false;
        self.reply_open = false;
        self.last_error = Some(message.to_string());
    }

    fn on_complete(&mut self) {
        self.working = false;
        self.reply_open = false;
    }

    fn on_history_replaced(&mut self, messages: &[Message]) {
        self.messages = messages.to_vec();
        self.working = false;
        self.reply_open = false;
    }

    fn on_user_message(&mut self, message: &Message) {
        self.messages.push(message.clone());
        self.working = true;
        self.reply_open = false;
        self.last_error = None;
    }

    fn on_attachments_changed(&mut self, file_names: &[String]) {
        self.pending_files = file_names.to_vec();
    }
}
