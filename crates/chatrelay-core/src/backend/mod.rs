//! Backend collaborator abstractions.
//!
//! - `ChatBackend`: RPITIT trait implemented by concrete AI chat services
//! - `AttachmentEndpoint`: optional keyed-upload capability
//! - `BoxChatBackend`: object-safe wrapper for dynamic dispatch

pub mod box_backend;
pub mod service;

pub use box_backend::BoxChatBackend;
pub use service::{AttachmentEndpoint, ChatBackend, TokenStream};
