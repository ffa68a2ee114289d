//! Upload sources feeding the attachment receivers.

pub mod file;

pub use file::{detect_mime, upload_path};
