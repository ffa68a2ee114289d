//! UI-facing side of the relay.
//!
//! - `UiSink`: contract implemented by the presentation layer
//! - `UiDispatcher` / `UiHandle`: the serialized access point owning the sink
//! - `Transcript`: a ready-made sink keeping the visible conversation

pub mod dispatcher;
pub mod sink;
pub mod transcript;

pub use dispatcher::{UiDispatcher, UiHandle};
pub use sink::UiSink;
pub use transcript::Transcript;
