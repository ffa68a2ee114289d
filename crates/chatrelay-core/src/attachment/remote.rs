//! Attachment receiver that stores uploads at the backend.
//!
//! Each accepted upload is handed to an [`AttachmentEndpoint`], which returns
//! a key. The attachment then joins the pending buffer carrying that key, so
//! the backend can resolve it when the message is sent. Removal goes through
//! the endpoint first and then drops the local copy. An upload that finishes
//! after the session moved to another chat (or closed) is reported as failed,
//! since its key belongs to the chat it was stored under.

use std::sync::Arc;

use chatrelay_types::attachment::Attachment;
use chatrelay_types::error::{SessionError, UploadError};
use tracing::{info, warn};

use super::receiver::{FailureReporter, UploadPolicy};
use crate::backend::AttachmentEndpoint;
use crate::session::SessionHandle;

pub struct RemoteAttachmentReceiver<E> {
    session: SessionHandle,
    endpoint: Arc<E>,
    policy: UploadPolicy,
    failures: FailureReporter,
}

impl<E> Clone for RemoteAttachmentReceiver<E> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            endpoint: Arc::clone(&self.endpoint),
            policy: self.policy.clone(),
            failures: self.failures.clone(),
        }
    }
}

impl<E: AttachmentEndpoint> RemoteAttachmentReceiver<E> {
    pub fn new(session: SessionHandle, endpoint: Arc<E>, policy: UploadPolicy) -> Self {
        Self {
            session,
            endpoint,
            policy,
            failures: FailureReporter::default(),
        }
    }

    /// Upload a finished file to the backend and add it to the pending buffer.
    ///
    /// Returns the backend key, or `None` when the upload was rejected
    /// (locally or by the backend) and reported as a failure.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Option<String>, SessionError> {
        self.session.ensure_active()?;

        if let Err(err) = self.policy.check(file_name, content_type, bytes.len() as u64) {
            self.failures.report(&self.session, &err);
            return Ok(None);
        }

        let scope = self.session.scope();
        let chat_id = scope.chat_id;
        let attachment = Attachment::new(file_name, content_type, bytes);
        let key = match self.endpoint.upload_attachment(&chat_id, &attachment).await {
            Ok(key) => key,
            Err(err) => {
                self.failures.report(&self.session, &UploadError::Backend(err));
                return Ok(None);
            }
        };

        if scope.liveness.is_cancelled() {
            let err = UploadError::Transfer(format!(
                "chat '{chat_id}' was left while '{file_name}' was uploading"
            ));
            self.failures.report(&self.session, &err);
            return Ok(None);
        }

        info!(chat_id = %chat_id, file_name, key = %key, "Attachment stored at backend");
        self.session
            .pending()
            .add(attachment.with_remote_key(key.clone()));
        self.session.publish_pending().await;
        Ok(Some(key))
    }

    /// Remove a stored attachment by its backend key.
    ///
    /// The local copy is dropped even if the backend fails to delete its own;
    /// the failure is logged.
    pub async fn remove(&self, key: &str) -> Result<bool, SessionError> {
        self.session.ensure_active()?;

        let chat_id = self.session.chat_id();
        if let Err(err) = self.endpoint.remove_attachment(&chat_id, key).await {
            warn!(chat_id = %chat_id, key, error = %err, "Backend failed to remove attachment");
        }

        let removed = self.session.pending().remove_by_remote_key(key).is_some();
        if removed {
            self.session.publish_pending().await;
        }
        Ok(removed)
    }

    pub fn failed_uploads(&self) -> u64 {
        self.failures.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BoxChatBackend;
    use crate::session::ChatSession;
    use crate::test_support::{ScriptedBackend, start_ui};
    use chatrelay_types::chat::ChatId;

    async fn setup() -> (ChatSession, RemoteAttachmentReceiver<ScriptedBackend>, Arc<ScriptedBackend>) {
        let backend = Arc::new(ScriptedBackend::new());
        let (ui, _recorder) = start_ui();
        let session = ChatSession::create(
            ChatId::from("c1"),
            Arc::new(BoxChatBackend::new(backend.clone())),
            ui,
        )
        .await
        .unwrap();
        let receiver = RemoteAttachmentReceiver::new(
            session.handle().clone(),
            backend.clone(),
            UploadPolicy::default(),
        );
        (session, receiver, backend)
    }

    #[tokio::test]
    async fn upload_stores_remote_key() {
        let (session, receiver, backend) = setup().await;

        let key = receiver
            .upload("a.png", "image/png", vec![1, 2])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(key, "key-0-a.png");
        assert_eq!(backend.uploads(), vec![(ChatId::from("c1"), key.clone())]);
        let pending = session.pending().drain_and_clear();
        assert_eq!(pending[0].remote_key(), Some(key.as_str()));
        assert_eq!(pending[0].key(), key);
    }

    #[tokio::test]
    async fn backend_refusal_is_reported_not_buffered() {
        let (session, receiver, backend) = setup().await;
        backend.fail_uploads(true);

        let key = receiver.upload("a.png", "image/png", vec![1]).await.unwrap();

        assert!(key.is_none());
        assert_eq!(receiver.failed_uploads(), 1);
        assert!(session.pending().is_empty());
    }

    #[tokio::test]
    async fn upload_finishing_after_switch_is_not_buffered() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.hold_uploads(true);
        let (ui, _recorder) = start_ui();
        let mut session = ChatSession::create(
            ChatId::from("c1"),
            Arc::new(BoxChatBackend::new(backend.clone())),
            ui,
        )
        .await
        .unwrap();
        let receiver = RemoteAttachmentReceiver::new(
            session.handle().clone(),
            backend.clone(),
            UploadPolicy::default(),
        );

        let upload = tokio::spawn({
            let receiver = receiver.clone();
            async move { receiver.upload("a.png", "image/png", vec![1]).await }
        });
        backend.upload_started().await;
        session.set_chat_id(ChatId::from("c2")).await.unwrap();
        backend.release_uploads();

        assert!(upload.await.unwrap().unwrap().is_none());
        assert_eq!(receiver.failed_uploads(), 1);
        assert!(session.pending().is_empty());
    }

    #[tokio::test]
    async fn remove_by_key_calls_endpoint() {
        let (session, receiver, backend) = setup().await;
        let first = receiver
            .upload("a.png", "image/png", vec![1])
            .await
            .unwrap()
            .unwrap();
        receiver
            .upload("a.png", "image/png", vec![2])
            .await
            .unwrap()
            .unwrap();

        assert!(receiver.remove(&first).await.unwrap());
        assert_eq!(backend.removed_keys(), vec![first.clone()]);

        // Same-named upload with another key survives.
        let pending = session.pending().drain_and_clear();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].data(), &[2]);
    }

    #[tokio::test]
    async fn remove_unknown_key_is_noop() {
        let (_session, receiver, _backend) = setup().await;
        assert!(!receiver.remove("missing").await.unwrap());
    }
}
