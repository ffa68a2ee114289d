//! Pending attachments of the next outgoing message.
//!
//! `AttachmentBuffer` is shared between the upload receiver (which appends)
//! and the stream bridge (which drains). Every operation takes the same
//! mutex, so an append can never interleave with a drain: each attachment is
//! either in the drained batch or still in the buffer, never both or neither.

use std::sync::{Arc, Mutex, MutexGuard};

use chatrelay_types::attachment::Attachment;
use uuid::Uuid;

/// Ordered, shared list of attachments awaiting the next send.
///
/// Cloning produces a handle to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct AttachmentBuffer {
    inner: Arc<Mutex<Vec<Attachment>>>,
}

impl AttachmentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Attachment>> {
        // A panic while holding the lock cannot leave the Vec half-updated,
        // so a poisoned buffer is still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an attachment after all previously added ones.
    pub fn add(&self, attachment: Attachment) {
        self.lock().push(attachment);
    }

    /// Remove every pending attachment with the given file name.
    ///
    /// Unknown names are not an error; the removal may have raced with a
    /// drain. Returns the number of entries removed.
    pub fn remove_by_key(&self, file_name: &str) -> usize {
        let mut pending = self.lock();
        let before = pending.len();
        pending.retain(|a| a.file_name() != file_name);
        before - pending.len()
    }

    /// Remove the attachment with the given id, if still pending.
    pub fn remove_by_id(&self, id: &Uuid) -> Option<Attachment> {
        let mut pending = self.lock();
        let index = pending.iter().position(|a| a.id() == *id)?;
        Some(pending.remove(index))
    }

    /// Remove the attachment carrying the given backend key, if still pending.
    pub fn remove_by_remote_key(&self, key: &str) -> Option<Attachment> {
        let mut pending = self.lock();
        let index = pending.iter().position(|a| a.remote_key() == Some(key))?;
        Some(pending.remove(index))
    }

    /// Take every pending attachment in insertion order, leaving the buffer empty.
    pub fn drain_and_clear(&self) -> Vec<Attachment> {
        std::mem::take(&mut *self.lock())
    }

    /// Discard every pending attachment.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of pending file names, in insertion order.
    pub fn file_names(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|a| a.file_name().to_string())
            .collect()
    }
}
