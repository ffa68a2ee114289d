//! Backend collaborator implementations.

pub mod memory;

pub use memory::{EchoResponder, InMemoryChatBackend, Responder};
