//! Core relay logic for chatrelay.
//!
//! Wires a chat widget to a backend collaborator: attachments are received
//! out-of-band and buffered per session, messages open a token stream whose
//! tokens are relayed to a UI sink through a single serialized access point,
//! and history is replaced wholesale on session switch or refresh.

pub mod attachment;
pub mod backend;
pub mod bridge;
pub mod session;
pub mod ui;
pub mod widget;

#[cfg(test)]
mod test_support;
