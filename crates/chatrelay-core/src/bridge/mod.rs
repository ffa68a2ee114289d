//! Stream bridge: from a user message to relayed reply tokens.
//!
//! `StreamBridge::send_message` drains the session's pending attachments,
//! asks the backend for a token stream and spawns a relay task. The relay
//! forwards each token through the UI dispatcher in arrival order and ends
//! with exactly one terminal signal: `Complete` when the stream runs out,
//! or `Error` on the first failed item, after which nothing else is relayed.
//!
//! Drained attachments are consumed whatever the outcome; a failed send does
//! not put them back.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chatrelay_types::chat::{ChatId, Message};
use chatrelay_types::error::{BackendError, SessionError};
use chatrelay_types::event::UiEvent;
use chatrelay_types::stream::{StreamOptions, StreamRequest};
use futures_util::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::backend::{BoxChatBackend, TokenStream};
use crate::session::ChatSession;
use crate::ui::UiHandle;

/// How one send ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Completed { tokens: usize },
    Failed { message: String },
}

/// Sends user messages and relays the backend's replies to the UI.
#[derive(Debug, Clone)]
pub struct StreamBridge {
    backend: Arc<BoxChatBackend>,
    options: Option<StreamOptions>,
}

impl StreamBridge {
    pub fn new(backend: Arc<BoxChatBackend>, options: Option<StreamOptions>) -> Self {
        Self { backend, options }
    }

    /// Send `text` with the session's pending attachments.
    ///
    /// Returns as soon as the stream has been requested; the relay keeps
    /// running on its own task and its handle yields the outcome.
    pub async fn send_message(
        &self,
        session: &ChatSession,
        text: impl Into<String>,
    ) -> Result<JoinHandle<SendOutcome>, SessionError> {
        let handle = session.handle();
        handle.ensure_active()?;

        let text = text.into();
        let attachments = handle.pending().drain_and_clear();
        let scope = handle.scope();
        let chat_id = scope.chat_id.clone();

        info!(
            chat_id = %chat_id,
            attachments = attachments.len(),
            "Sending message"
        );

        let message = Message::user(text.clone())
            .with_attachments(attachments.iter().map(|a| a.to_ref()).collect());
        handle.publish_pending().await;
        handle
            .publish(UiEvent::UserMessage {
                chat_id: chat_id.clone(),
                message,
            })
            .await;

        let stream = self.backend.stream(StreamRequest {
            chat_id: chat_id.clone(),
            user_message: text,
            attachments,
            options: self.options.clone(),
        });

        let span = info_span!(
            "chat.relay",
            chat.id = %chat_id,
            chat.backend = self.backend.name(),
        );
        let ui = handle.ui().clone();
        Ok(tokio::spawn(
            relay(stream, ui, chat_id, scope.liveness).instrument(span),
        ))
    }
}

/// Forward a token stream to the UI sink.
///
/// Tokens are posted one by one in arrival order. The first error ends the
/// relay with an `Error` signal; a clean end produces `Complete`. The stream
/// is fused so a misbehaving producer cannot yield after its end.
pub async fn relay(
    stream: TokenStream,
    ui: UiHandle,
    chat_id: ChatId,
    liveness: CancellationToken,
) -> SendOutcome {
    let mut stream = Guarded::new(stream);
    let mut tokens = 0usize;

    while let Some(item) = stream.next().await {
        match item {
            Ok(text) => {
                tokens += 1;
                ui.post(
                    UiEvent::Token {
                        chat_id: chat_id.clone(),
                        text,
                    },
                    &liveness,
                )
                .await;
            }
            Err(err) => {
                let message = err.to_string();
                warn!(chat_id = %chat_id, tokens, error = %message, "Reply stream failed");
                ui.post(
                    UiEvent::Error {
                        chat_id,
                        message: message.clone(),
                    },
                    &liveness,
                )
                .await;
                return SendOutcome::Failed { message };
            }
        }
    }

    debug!(chat_id = %chat_id, tokens, "Reply stream complete");
    ui.post(UiEvent::Complete { chat_id }, &liveness).await;
    SendOutcome::Completed { tokens }
}

/// Stops polling the inner stream after it ended or yielded an error.
struct Guarded {
    inner: Option<TokenStream>,
}

impl Guarded {
    fn new(inner: TokenStream) -> Self {
        Self { inner: Some(inner) }
    }
}

impl Stream for Guarded {
    type Item = Result<String, BackendError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(inner) = self.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(token))) => Poll::Ready(Some(Ok(token))),
            Poll::Ready(Some(Err(err))) => {
                self.inner = None;
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                self.inner = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
