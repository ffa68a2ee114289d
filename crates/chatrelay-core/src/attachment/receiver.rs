//! Streamed-bytes attachment receiver.
//!
//! Uploads arrive out-of-band from the chat message. Each upload gets a fresh
//! [`UploadSink`] from `begin_upload`; once the transfer finishes, the bytes
//! become an [`Attachment`] in the session's pending buffer.
//!
//! Failed uploads are reported outward (a `tracing` warning and the
//! `failed_uploads` counter) and otherwise dropped: they never reach the
//! pending buffer and never surface as a chat error. There is no progress
//! reporting and no cancellation; an upload completes or fails as a whole.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use chatrelay_types::attachment::Attachment;
use chatrelay_types::config::RelayConfig;
use chatrelay_types::error::{SessionError, UploadError};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};
use uuid::Uuid;

use super::accept::AcceptFilter;
use crate::session::SessionHandle;

/// In-memory accumulator for one upload.
#[derive(Debug)]
pub struct UploadSink {
    data: Vec<u8>,
    limit: u64,
    overflowed: bool,
}

impl UploadSink {
    fn new(limit: u64) -> Self {
        Self {
            data: Vec::new(),
            limit,
            overflowed: false,
        }
    }

    /// Append a chunk, failing once the upload would exceed the size limit.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        if self.data.len() as u64 + chunk.len() as u64 > self.limit {
            self.overflowed = true;
            return Err(UploadError::TooLarge { limit: self.limit });
        }
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether a write was refused for exceeding the limit.
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl AsyncWrite for UploadSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        match this.write_chunk(buf) {
            Ok(()) => Poll::Ready(Ok(buf.len())),
            Err(err) => Poll::Ready(Err(io::Error::other(err.to_string()))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Size and type restrictions applied to every finished upload.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub accept: Option<AcceptFilter>,
}

impl UploadPolicy {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            max_bytes: config.max_upload_bytes,
            accept: config.accepted_files.as_deref().map(AcceptFilter::parse),
        }
    }

    pub fn check(&self, file_name: &str, content_type: &str, size: u64) -> Result<(), UploadError> {
        if size > self.max_bytes {
            return Err(UploadError::TooLarge {
                limit: self.max_bytes,
            });
        }
        if let Some(filter) = &self.accept {
            if !filter.accepts(file_name, content_type) {
                return Err(UploadError::NotAccepted {
                    file_name: file_name.to_string(),
                    content_type: content_type.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::from_config(&RelayConfig::default())
    }
}

/// Counts failed uploads and logs each one.
#[derive(Debug, Clone, Default)]
pub(crate) struct FailureReporter {
    count: Arc<AtomicU64>,
}

impl FailureReporter {
    pub(crate) fn report(&self, session: &SessionHandle, error: &UploadError) {
        let total = self.count.fetch_add(1, Ordering::Relaxed) + 1;
        warn!(
            chat_id = %session.chat_id(),
            error = %error,
            failed_uploads = total,
            "Attachment upload failed"
        );
    }

    pub(crate) fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Receives uploads as raw bytes into the session's pending buffer.
#[derive(Debug, Clone)]
pub struct AttachmentReceiver {
    session: SessionHandle,
    policy: UploadPolicy,
    failures: FailureReporter,
}

impl AttachmentReceiver {
    pub fn new(session: SessionHandle, policy: UploadPolicy) -> Self {
        Self {
            session,
            policy,
            failures: FailureReporter::default(),
        }
    }

    /// Start a new upload with its own empty accumulator.
    pub fn begin_upload(&self) -> UploadSink {
        UploadSink::new(self.policy.max_bytes)
    }

    /// Turn a finished upload into a pending attachment.
    ///
    /// Returns the new attachment's id, or `None` if the upload was rejected
    /// by the policy (and reported as a failure).
    pub async fn on_upload_complete(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Option<Uuid>, SessionError> {
        self.session.ensure_active()?;

        if let Err(err) = self.policy.check(file_name, content_type, bytes.len() as u64) {
            self.on_upload_failed(&err);
            return Ok(None);
        }

        let attachment = Attachment::new(file_name, content_type, bytes);
        let id = attachment.id();
        info!(
            chat_id = %self.session.chat_id(),
            file_name,
            content_type,
            size = attachment.size(),
            "Attachment received"
        );
        self.session.pending().add(attachment);
        self.session.publish_pending().await;
        Ok(Some(id))
    }

    /// Report a failed upload. Nothing is added to the pending buffer.
    pub fn on_upload_failed(&self, error: &UploadError) {
        self.failures.report(&self.session, error);
    }

    /// Run one complete upload from an async reader.
    pub async fn receive<R>(
        &self,
        file_name: &str,
        content_type: &str,
        mut reader: R,
    ) -> Result<Option<Uuid>, SessionError>
    where
        R: AsyncRead + Unpin,
    {
        self.session.ensure_active()?;

        let mut sink = self.begin_upload();
        match tokio::io::copy(&mut reader, &mut sink).await {
            Ok(_) => {
                self.on_upload_complete(file_name, content_type, sink.into_bytes())
                    .await
            }
            Err(err) => {
                let err = if sink.overflowed() {
                    UploadError::TooLarge {
                        limit: self.policy.max_bytes,
                    }
                } else {
                    UploadError::Io(err)
                };
                self.on_upload_failed(&err);
                Ok(None)
            }
        }
    }

    /// Drop one pending attachment by id, for callers that must tell apart
    /// uploads sharing a file name.
    pub async fn remove_upload(&self, id: &Uuid) -> Result<bool, SessionError> {
        self.session.ensure_active()?;
        let removed = self.session.pending().remove_by_id(id).is_some();
        if removed {
            self.session.publish_pending().await;
        }
        Ok(removed)
    }

    pub fn failed_uploads(&self) -> u64 {
        self.failures.count()
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }
}
