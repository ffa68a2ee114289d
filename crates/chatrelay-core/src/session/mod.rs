//! Chat session lifecycle.
//!
//! A `ChatSession` owns one chat id, its pending attachments and its local
//! view of the history. It has two states: `Active` and `Closed`. Closing is
//! terminal; every operation on a closed session returns
//! [`SessionError::Closed`].

pub mod handle;

use std::fmt;
use std::sync::Arc;

use chatrelay_types::chat::{ChatId, Message};
use chatrelay_types::error::SessionError;
use chatrelay_types::event::UiEvent;
use tracing::{debug, info, warn};

use crate::attachment::buffer::AttachmentBuffer;
use crate::backend::BoxChatBackend;
use crate::ui::UiHandle;

pub use handle::SessionHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Active => write!(f, "active"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// One conversation as seen by the widget.
#[derive(Debug)]
pub struct ChatSession {
    handle: SessionHandle,
    backend: Arc<BoxChatBackend>,
    history: Vec<Message>,
}

impl ChatSession {
    /// Open a session on `chat_id` and load its history.
    pub async fn create(
        chat_id: ChatId,
        backend: Arc<BoxChatBackend>,
        ui: UiHandle,
    ) -> Result<Self, SessionError> {
        let mut session = Self {
            handle: SessionHandle::new(chat_id, ui),
            backend,
            history: Vec::new(),
        };
        info!(chat_id = %session.chat_id(), backend = session.backend.name(), "Chat session opened");
        session.refresh_history().await?;
        Ok(session)
    }

    pub fn chat_id(&self) -> ChatId {
        self.handle.chat_id()
    }

    pub fn state(&self) -> SessionState {
        if self.handle.is_closed() {
            SessionState::Closed
        } else {
            SessionState::Active
        }
    }

    /// A cloneable view for tasks that outlive a borrow of the session.
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    pub fn pending(&self) -> &AttachmentBuffer {
        self.handle.pending()
    }

    /// History as of the last refresh.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Switch the session to another chat.
    ///
    /// Pending attachments are discarded and the history is reloaded. When
    /// the id actually changes, the previous chat is released at the backend
    /// and signals still in flight for it are silenced.
    pub async fn set_chat_id(&mut self, chat_id: ChatId) -> Result<(), SessionError> {
        self.handle.ensure_active()?;

        if chat_id != self.chat_id() {
            let previous = self.handle.rescope(chat_id.clone());
            info!(from = %previous, to = %chat_id, "Switching chat");
            if let Err(err) = self.backend.close_chat(&previous).await {
                warn!(chat_id = %previous, error = %err, "Failed to release previous chat");
            }
        }

        self.handle.pending().clear();
        self.handle.publish_pending().await;
        self.refresh_history().await
    }

    /// Replace the local history with the backend's current history.
    pub async fn refresh_history(&mut self) -> Result<(), SessionError> {
        self.handle.ensure_active()?;

        let chat_id = self.chat_id();
        let messages = self.backend.get_history(&chat_id).await?;
        debug!(chat_id = %chat_id, count = messages.len(), "History loaded");

        self.history = messages.clone();
        self.handle
            .publish(UiEvent::HistoryReplaced { chat_id, messages })
            .await;
        Ok(())
    }

    /// Remove pending attachments by file name. Unknown names are a no-op.
    pub async fn remove_attachment(&self, file_name: &str) -> Result<usize, SessionError> {
        self.handle.ensure_active()?;
        let removed = self.handle.pending().remove_by_key(file_name);
        if removed > 0 {
            self.handle.publish_pending().await;
        }
        Ok(removed)
    }

    /// Close the session and release the chat at the backend.
    ///
    /// Streams still running are not cancelled, but nothing they emit
    /// reaches the sink anymore.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        self.handle.ensure_active()?;
        if !self.handle.mark_closed() {
            return Err(SessionError::Closed {
                chat_id: self.chat_id(),
            });
        }

        let chat_id = self.chat_id();
        self.handle.pending().clear();
        if let Err(err) = self.backend.close_chat(&chat_id).await {
            warn!(chat_id = %chat_id, error = %err, "Backend failed to close chat");
        }
        info!(chat_id = %chat_id, "Chat session closed");
        Ok(())
    }
}
