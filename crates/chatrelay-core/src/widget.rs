//! Composition root of a chat view.
//!
//! `ChatWidget` wires one [`ChatSession`], its [`AttachmentReceiver`] and a
//! [`StreamBridge`] to a shared backend and a UI handle, and exposes the
//! user-facing operations: send, upload, remove an attachment, refresh,
//! switch chat and close.

use std::sync::Arc;

use chatrelay_types::chat::ChatId;
use chatrelay_types::config::RelayConfig;
use chatrelay_types::error::SessionError;
use chatrelay_types::stream::StreamOptions;
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::attachment::receiver::{AttachmentReceiver, UploadPolicy};
use crate::backend::BoxChatBackend;
use crate::bridge::{SendOutcome, StreamBridge};
use crate::session::ChatSession;
use crate::ui::{UiDispatcher, UiHandle, UiSink};

#[derive(Debug)]
pub struct ChatWidget {
    session: ChatSession,
    bridge: StreamBridge,
    receiver: AttachmentReceiver,
    accepted_files: Option<String>,
}

impl ChatWidget {
    /// Open the widget on `chat_id`, posting its signals through `ui`.
    pub async fn start(
        backend: Arc<BoxChatBackend>,
        chat_id: ChatId,
        ui: UiHandle,
        config: &RelayConfig,
    ) -> Result<Self, SessionError> {
        let session = ChatSession::create(chat_id, backend.clone(), ui).await?;
        let options = config.system_message.clone().map(|system_message| StreamOptions {
            system_message: Some(system_message),
        });
        let bridge = StreamBridge::new(backend, options);
        let receiver =
            AttachmentReceiver::new(session.handle().clone(), UploadPolicy::from_config(config));

        Ok(Self {
            session,
            bridge,
            receiver,
            accepted_files: config.accepted_files.clone(),
        })
    }

    /// Spawn a dispatcher for `sink` and open the widget on it.
    ///
    /// The join handle yields the sink back once the widget and every other
    /// handle to the dispatcher are dropped.
    pub async fn start_with_sink<S: UiSink>(
        backend: Arc<BoxChatBackend>,
        chat_id: ChatId,
        sink: S,
        config: &RelayConfig,
    ) -> Result<(Self, JoinHandle<S>), SessionError> {
        let (ui, task) = UiDispatcher::spawn(sink, config.ui_channel_capacity);
        let widget = Self::start(backend, chat_id, ui, config).await?;
        Ok((widget, task))
    }

    pub fn chat_id(&self) -> ChatId {
        self.session.chat_id()
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn receiver(&self) -> &AttachmentReceiver {
        &self.receiver
    }

    pub fn ui(&self) -> &UiHandle {
        self.session.handle().ui()
    }

    /// Accepted file types, as configured, for the upload control.
    pub fn accepted_files(&self) -> Option<&str> {
        self.accepted_files.as_deref()
    }

    /// Send a user message with whatever attachments are pending.
    pub async fn on_send(
        &self,
        text: impl Into<String>,
    ) -> Result<JoinHandle<SendOutcome>, SessionError> {
        self.bridge.send_message(&self.session, text).await
    }

    /// Upload one file from `reader` into the pending attachments.
    pub async fn upload<R>(
        &self,
        file_name: &str,
        content_type: &str,
        reader: R,
    ) -> Result<Option<Uuid>, SessionError>
    where
        R: AsyncRead + Unpin,
    {
        self.receiver.receive(file_name, content_type, reader).await
    }

    pub async fn on_remove_attachment(&self, file_name: &str) -> Result<usize, SessionError> {
        let removed = self.session.remove_attachment(file_name).await?;
        debug!(chat_id = %self.chat_id(), file_name, removed, "Attachment removed");
        Ok(removed)
    }

    /// Reload history, as on page (re)entry.
    pub async fn on_refresh(&mut self) -> Result<(), SessionError> {
        self.session.refresh_history().await
    }

    pub async fn set_chat_id(&mut self, chat_id: ChatId) -> Result<(), SessionError> {
        self.session.set_chat_id(chat_id).await
    }

    pub async fn close(&mut self) -> Result<(), SessionError> {
        self.session.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;
    use crate::test_support::{ScriptedBackend, start_ui};
    use crate::ui::Transcript;
    use chatrelay_types::chat::{Message, MessageRole};

    fn config() -> RelayConfig {
        RelayConfig {
            system_message: Some("be brief".to_string()),
            accepted_files: Some("image/*,.txt".to_string()),
            ..RelayConfig::default()
        }
    }

    #[tokio::test]
    async fn send_forwards_options_and_uploads() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_tokens(&["ok"]);
        let (ui, _recorder) = start_ui();
        let widget = ChatWidget::start(
            Arc::new(BoxChatBackend::new(backend.clone())),
            ChatId::from("c1"),
            ui,
            &config(),
        )
        .await
        .unwrap();

        widget
            .upload("a.png", "image/png", &b"png"[..])
            .await
            .unwrap()
            .unwrap();
        let outcome = widget.on_send("what is this").await.unwrap().await.unwrap();

        assert_eq!(outcome, SendOutcome::Completed { tokens: 1 });
        let request = &backend.requests()[0];
        assert_eq!(request.attachments.len(), 1);
        assert_eq!(
            request.options.as_ref().and_then(|o| o.system_message.as_deref()),
            Some("be brief")
        );
        assert_eq!(widget.accepted_files(), Some("image/*,.txt"));
    }

    #[tokio::test]
    async fn rejected_upload_never_reaches_send() {
        let backend = Arc::new(ScriptedBackend::new());
        let (ui, _recorder) = start_ui();
        let widget = ChatWidget::start(
            Arc::new(BoxChatBackend::new(backend.clone())),
            ChatId::from("c1"),
            ui,
            &config(),
        )
        .await
        .unwrap();

        let id = widget
            .upload("report.pdf", "application/pdf", &b"%PDF"[..])
            .await
            .unwrap();
        assert!(id.is_none());
        assert_eq!(widget.receiver().failed_uploads(), 1);

        widget.on_send("hi").await.unwrap().await.unwrap();
        assert!(backend.requests()[0].attachments.is_empty());
    }

    #[tokio::test]
    async fn transcript_follows_conversation() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.set_history("c1", vec![Message::user("earlier"), Message::assistant("reply")]);
        backend.push_tokens(&["", "Hel", "lo"]);

        let (widget, task) = ChatWidget::start_with_sink(
            Arc::new(BoxChatBackend::new(backend)),
            ChatId::from("c1"),
            Transcript::new(),
            &RelayConfig::default(),
        )
        .await
        .unwrap();

        widget.on_send("hi").await.unwrap().await.unwrap();
        drop(widget);
        let transcript = task.await.unwrap();

        let messages = transcript.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2], Message::user("hi"));
        assert_eq!(messages[3].role, MessageRole::Assistant);
        assert_eq!(messages[3].content, "Hello");
        assert!(!transcript.is_working());
    }

    #[tokio::test]
    async fn switch_and_close() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.set_history("c2", vec![Message::user("other chat")]);
        let (ui, _recorder) = start_ui();
        let mut widget = ChatWidget::start(
            Arc::new(BoxChatBackend::new(backend.clone())),
            ChatId::from("c1"),
            ui,
            &RelayConfig::default(),
        )
        .await
        .unwrap();

        widget
            .upload("a.txt", "text/plain", &b"x"[..])
            .await
            .unwrap();
        widget.set_chat_id(ChatId::from("c2")).await.unwrap();
        assert_eq!(widget.chat_id(), ChatId::from("c2"));
        assert!(widget.session().pending().is_empty());
        assert_eq!(widget.session().history(), &[Message::user("other chat")]);

        // Uploads after a switch land in the new chat's buffer.
        widget
            .upload("b.txt", "text/plain", &b"y"[..])
            .await
            .unwrap();
        assert_eq!(widget.on_remove_attachment("b.txt").await.unwrap(), 1);

        widget.close().await.unwrap();
        assert_eq!(widget.session().state(), SessionState::Closed);
        assert!(matches!(widget.on_send("x").await, Err(SessionError::Closed { .. })));
        assert!(matches!(widget.on_refresh().await, Err(SessionError::Closed { .. })));
        assert_eq!(
            backend.closed_chats(),
            vec![ChatId::from("c1"), ChatId::from("c2")]
        );
    }
}
