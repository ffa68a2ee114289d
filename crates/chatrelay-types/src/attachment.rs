//! Uploaded attachment payloads.
//!
//! An [`Attachment`] is built once an upload has been fully received and is
//! never mutated afterwards. It is consumed exactly once, by the send that
//! drains it from the pending buffer.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::chat::{AttachmentKind, AttachmentRef};

/// A fully received file waiting to be sent with the next message.
#[derive(Clone)]
pub struct Attachment {
    id: Uuid,
    file_name: String,
    content_type: String,
    data: Vec<u8>,
    /// Key assigned by a backend upload endpoint, when one was used.
    remote_key: Option<String>,
    received_at: DateTime<Utc>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: Uuid::now_v7(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            data,
            remote_key: None,
            received_at: Utc::now(),
        }
    }

    /// Record the key a backend upload endpoint assigned to this file.
    pub fn with_remote_key(mut self, key: impl Into<String>) -> Self {
        self.remote_key = Some(key.into());
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn remote_key(&self) -> Option<&str> {
        self.remote_key.as_deref()
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn kind(&self) -> AttachmentKind {
        AttachmentKind::from_content_type(&self.content_type)
    }

    /// The key used to reference this attachment from history.
    ///
    /// The backend-assigned key when present, otherwise the local id.
    pub fn key(&self) -> String {
        match &self.remote_key {
            Some(key) => key.clone(),
            None => self.id.to_string(),
        }
    }

    /// Build the history reference for this attachment.
    pub fn to_ref(&self) -> AttachmentRef {
        AttachmentRef {
            kind: self.kind(),
            key: self.key(),
            file_name: self.file_name.clone(),
            url: None,
        }
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("id", &self.id)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.data.len())
            .field("remote_key", &self.remote_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_for_same_name() {
        let a = Attachment::new("a.png", "image/png", vec![1]);
        let b = Attachment::new("a.png", "image/png", vec![1]);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_to_ref_prefers_remote_key() {
        let local = Attachment::new("a.png", "image/png", vec![1, 2, 3]);
        assert_eq!(local.to_ref().key, local.id().to_string());
        assert_eq!(local.to_ref().kind, AttachmentKind::Image);

        let remote = Attachment::new("doc.pdf", "application/pdf", vec![]).with_remote_key("k-42");
        let r = remote.to_ref();
        assert_eq!(r.key, "k-42");
        assert_eq!(r.kind, AttachmentKind::Document);
        assert_eq!(r.file_name, "doc.pdf");
    }

    #[test]
    fn test_debug_hides_payload() {
        let a = Attachment::new("a.bin", "application/octet-stream", vec![0xAB; 64]);
        let debug = format!("{a:?}");
        assert!(debug.contains("size: 64"));
        assert!(!debug.contains("data"));
    }
}
