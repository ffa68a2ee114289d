//! Signals delivered to the UI sink.
//!
//! `UiEvent` is the serializable record of every user-observable change the
//! relay produces. The dispatcher hands each one to the sink in the order it
//! was posted.

use serde::{Deserialize, Serialize};

use crate::chat::{ChatId, Message};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// The user's message was accepted for sending.
    UserMessage { chat_id: ChatId, message: Message },

    /// One increment of the assistant's streamed reply.
    Token { chat_id: ChatId, text: String },

    /// The stream failed; no further tokens follow for this send.
    Error { chat_id: ChatId, message: String },

    /// The stream finished cleanly.
    Complete { chat_id: ChatId },

    /// The visible history was replaced wholesale.
    HistoryReplaced {
        chat_id: ChatId,
        messages: Vec<Message>,
    },

    /// The list of pending attachments changed.
    AttachmentsChanged {
        chat_id: ChatId,
        file_names: Vec<String>,
    },
}

impl UiEvent {
    pub fn chat_id(&self) -> &ChatId {
        match self {
            UiEvent::UserMessage { chat_id, .. }
            | UiEvent::Token { chat_id, .. }
            | UiEvent::Error { chat_id, .. }
            | UiEvent::Complete { chat_id }
            | UiEvent::HistoryReplaced { chat_id, .. }
            | UiEvent::AttachmentsChanged { chat_id, .. } => chat_id,
        }
    }

    /// Whether this signal ends a send (error or completion).
    pub fn is_terminal(&self) -> bool {
        matches!(self, UiEvent::Error { .. } | UiEvent::Complete { .. })
    }
}
