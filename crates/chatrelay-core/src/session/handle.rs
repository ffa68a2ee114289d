//! Shared, cloneable view of a chat session.
//!
//! The receiver and the stream relay run on their own tasks and outlive any
//! borrow of the `ChatSession`. They hold a `SessionHandle` instead: the
//! pending buffer, the current chat scope and the UI handle, all behind an
//! `Arc`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chatrelay_types::chat::ChatId;
use chatrelay_types::error::SessionError;
use chatrelay_types::event::UiEvent;
use tokio_util::sync::CancellationToken;

use crate::attachment::buffer::AttachmentBuffer;
use crate::ui::UiHandle;

/// The chat a session currently points at, plus the token that keeps
/// signals produced under it alive.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    pub(crate) chat_id: ChatId,
    pub(crate) liveness: CancellationToken,
}

#[derive(Debug)]
struct SessionShared {
    scope: Mutex<Scope>,
    closed: AtomicBool,
    pending: AttachmentBuffer,
    ui: UiHandle,
}

#[derive(Debug, Clone)]
pub struct SessionHandle {
    shared: Arc<SessionShared>,
}

impl SessionHandle {
    pub(crate) fn new(chat_id: ChatId, ui: UiHandle) -> Self {
        Self {
            shared: Arc::new(SessionShared {
                scope: Mutex::new(Scope {
                    chat_id,
                    liveness: CancellationToken::new(),
                }),
                closed: AtomicBool::new(false),
                pending: AttachmentBuffer::new(),
                ui,
            }),
        }
    }

    pub(crate) fn scope(&self) -> Scope {
        self.shared
            .scope
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Point the session at `chat_id` under a fresh liveness token.
    ///
    /// The previous token is cancelled, so queued and future signals from
    /// the previous scope never reach the sink.
    pub(crate) fn rescope(&self, chat_id: ChatId) -> ChatId {
        let mut scope = self
            .shared
            .scope
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        scope.liveness.cancel();
        scope.liveness = CancellationToken::new();
        std::mem::replace(&mut scope.chat_id, chat_id)
    }

    /// Mark the session closed and silence its scope. Returns `false` if it
    /// was already closed.
    pub(crate) fn mark_closed(&self) -> bool {
        let was_closed = self.shared.closed.swap(true, Ordering::SeqCst);
        self.scope().liveness.cancel();
        !was_closed
    }

    pub fn chat_id(&self) -> ChatId {
        self.scope().chat_id
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Fail fast when the session has been closed.
    pub fn ensure_active(&self) -> Result<(), SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed {
                chat_id: self.chat_id(),
            });
        }
        Ok(())
    }

    pub fn pending(&self) -> &AttachmentBuffer {
        &self.shared.pending
    }

    pub fn ui(&self) -> &UiHandle {
        &self.shared.ui
    }

    /// Post a signal under the current scope.
    pub(crate) async fn publish(&self, event: UiEvent) {
        let scope = self.scope();
        self.shared.ui.post(event, &scope.liveness).await;
    }

    /// Tell the sink the pending attachment list changed.
    pub(crate) async fn publish_pending(&self) {
        let scope = self.scope();
        self.shared
            .ui
            .post_pending_changed(scope.chat_id, &self.shared.pending, &scope.liveness)
            .await;
    }
}
