//! ChatBackend trait definition.
//!
//! This is the contract of the external AI chat collaborator. Uses RPITIT for
//! `get_history` and `close_chat`, and `Pin<Box<dyn Stream>>` for `stream`
//! (streams need to be object-safe for the `BoxChatBackend` wrapper).

use std::pin::Pin;

use futures_util::Stream;

use chatrelay_types::attachment::Attachment;
use chatrelay_types::chat::{ChatId, Message};
use chatrelay_types::error::BackendError;
use chatrelay_types::stream::StreamRequest;

/// A lazy, finite, single-use stream of reply tokens.
///
/// An `Err` item terminates the reply; producers must not yield after it.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, BackendError>> + Send + 'static>>;

/// Trait for the AI chat service the relay talks to.
///
/// Implementations live outside the core (e.g. `InMemoryChatBackend` in
/// chatrelay-infra).
pub trait ChatBackend: Send + Sync {
    /// Human-readable backend name, recorded on relay spans.
    fn name(&self) -> &str;

    /// Start answering a user message. Nothing happens until the returned
    /// stream is polled.
    fn stream(&self, request: StreamRequest) -> TokenStream;

    /// Current history of a chat. Unknown chats have an empty history.
    fn get_history(
        &self,
        chat_id: &ChatId,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, BackendError>> + Send;

    /// Release everything held for a chat. Closing an unknown or already
    /// closed chat succeeds.
    fn close_chat(
        &self,
        chat_id: &ChatId,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send;
}

impl<T: ChatBackend> ChatBackend for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn stream(&self, request: StreamRequest) -> TokenStream {
        (**self).stream(request)
    }

    fn get_history(
        &self,
        chat_id: &ChatId,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, BackendError>> + Send {
        (**self).get_history(chat_id)
    }

    fn close_chat(
        &self,
        chat_id: &ChatId,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send {
        (**self).close_chat(chat_id)
    }
}

/// Optional capability: backends that accept attachments ahead of the
/// message and hand back a key for each upload.
pub trait AttachmentEndpoint: Send + Sync {
    /// Store an attachment for a chat and return the key identifying it.
    fn upload_attachment(
        &self,
        chat_id: &ChatId,
        attachment: &Attachment,
    ) -> impl std::future::Future<Output = Result<String, BackendError>> + Send;

    /// Drop a previously uploaded attachment.
    fn remove_attachment(
        &self,
        chat_id: &ChatId,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), BackendError>> + Send;
}
