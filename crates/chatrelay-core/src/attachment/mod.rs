//! Attachment intake and buffering.
//!
//! - `AttachmentBuffer`: per-session pending attachments behind one mutex
//! - `AttachmentReceiver`: streamed-bytes uploads into the buffer
//! - `RemoteAttachmentReceiver`: uploads stored at the backend under a key
//! - `AcceptFilter`: accepted file types, Dropzone-style

pub mod accept;
pub mod buffer;
pub mod receiver;
pub mod remote;

pub use accept::AcceptFilter;
pub use buffer::AttachmentBuffer;
pub use receiver::{AttachmentReceiver, UploadPolicy, UploadSink};
pub use remote::RemoteAttachmentReceiver;
