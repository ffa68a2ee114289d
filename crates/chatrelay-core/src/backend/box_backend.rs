//! BoxChatBackend -- object-safe dynamic dispatch wrapper for ChatBackend.
//!
//! 1. Define an object-safe `ChatBackendDyn` trait with boxed futures
//! 2. Blanket-impl `ChatBackendDyn` for all `T: ChatBackend`
//! 3. `BoxChatBackend` wraps `Box<dyn ChatBackendDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use chatrelay_types::chat::{ChatId, Message};
use chatrelay_types::error::BackendError;
use chatrelay_types::stream::StreamRequest;

use super::service::{ChatBackend, TokenStream};

/// Object-safe version of [`ChatBackend`] with boxed futures.
pub trait ChatBackendDyn: Send + Sync {
    fn name(&self) -> &str;

    fn stream_boxed(&self, request: StreamRequest) -> TokenStream;

    fn get_history_boxed<'a>(
        &'a self,
        chat_id: &'a ChatId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Message>, BackendError>> + Send + 'a>>;

    fn close_chat_boxed<'a>(
        &'a self,
        chat_id: &'a ChatId,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + 'a>>;
}

impl<T: ChatBackend> ChatBackendDyn for T {
    fn name(&self) -> &str {
        ChatBackend::name(self)
    }

    fn stream_boxed(&self, request: StreamRequest) -> TokenStream {
        self.stream(request)
    }

    fn get_history_boxed<'a>(
        &'a self,
        chat_id: &'a ChatId,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Message>, BackendError>> + Send + 'a>> {
        Box::pin(self.get_history(chat_id))
    }

    fn close_chat_boxed<'a>(
        &'a self,
        chat_id: &'a ChatId,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + 'a>> {
        Box::pin(self.close_chat(chat_id))
    }
}

/// Type-erased chat backend, shared by the session and the bridge.
///
/// Since `ChatBackend` uses RPITIT, it cannot be used as a trait object
/// directly; `BoxChatBackend` provides the same methods over dynamic dispatch.
pub struct BoxChatBackend {
    inner: Box<dyn ChatBackendDyn + Send + Sync>,
}

impl BoxChatBackend {
    pub fn new<T: ChatBackend + 'static>(backend: T) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn stream(&self, request: StreamRequest) -> TokenStream {
        self.inner.stream_boxed(request)
    }

    pub async fn get_history(&self, chat_id: &ChatId) -> Result<Vec<Message>, BackendError> {
        self.inner.get_history_boxed(chat_id).await
    }

    pub async fn close_chat(&self, chat_id: &ChatId) -> Result<(), BackendError> {
        self.inner.close_chat_boxed(chat_id).await
    }
}

impl std::fmt::Debug for BoxChatBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxChatBackend")
            .field("name", &self.name())
            .finish()
    }
}
