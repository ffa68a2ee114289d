//! Shared domain types for chatrelay.
//!
//! This crate contains the data model shared by the relay core, the
//! infrastructure adapters and the demo binary: chat identifiers, messages,
//! attachments, UI signals, configuration and error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod attachment;
pub mod chat;
pub mod config;
pub mod error;
pub mod event;
pub mod stream;
