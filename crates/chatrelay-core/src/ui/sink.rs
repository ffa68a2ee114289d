//! The UI sink contract.

use chatrelay_types::chat::Message;
use chatrelay_types::event::UiEvent;

/// Presentation-layer receiver of relay signals.
///
/// Every method is called from the dispatcher task only, one call at a time,
/// in the order signals were posted. Implementations therefore need no
/// locking of their own.
pub trait UiSink: Send + 'static {
    /// Append one token to the assistant reply being streamed.
    fn on_token(&mut self, text: &str);

    /// The reply failed. No further tokens follow for this send.
    fn on_error(&mut self, message: &str);

    /// The reply finished cleanly.
    fn on_complete(&mut self);

    /// Replace the visible history wholesale.
    fn on_history_replaced(&mut self, messages: &[Message]);

    /// The user's message was accepted for sending.
    fn on_user_message(&mut self, _message: &Message) {}

    /// The pending attachment list now holds exactly these files.
    fn on_attachments_changed(&mut self, _file_names: &[String]) {}

    /// Route a signal to the matching method.
    ///
    /// Sinks that want the raw signal (loggers, JSON writers) override this.
    fn handle(&mut self, event: UiEvent) {
        match event {
            UiEvent::UserMessage { message, .. } => self.on_user_message(&message),
            UiEvent::Token { text, .. } => self.on_token(&text),
            UiEvent::Error { message, .. } => self.on_error(&message),
            UiEvent::Complete { .. } => self.on_complete(),
            UiEvent::HistoryReplaced { messages, .. } => self.on_history_replaced(&messages),
            UiEvent::AttachmentsChanged { file_names, .. } => {
                self.on_attachments_changed(&file_names)
            }
        }
    }
}
