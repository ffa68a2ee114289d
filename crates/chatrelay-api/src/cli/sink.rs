//! Terminal sinks for relay signals.
//!
//! `TerminalSink` prints styled output: tokens are written raw as they
//! arrive, history and attachment changes as short listings.
//! `JsonLinesSink` writes every signal as one JSON object per line.

use std::io::Write;

use chatrelay_core::ui::UiSink;
use chatrelay_types::chat::{Message, MessageRole};
use chatrelay_types::event::UiEvent;
use console::style;

#[derive(Debug, Default)]
pub struct TerminalSink {
    /// A reply line is open on stdout.
    streaming: bool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn end_reply_line(&mut self) {
        if self.streaming {
            println!();
            self.streaming = false;
        }
    }
}

fn role_label(role: MessageRole) -> String {
    match role {
        MessageRole::User => format!("{}", style("you>").cyan().bold()),
        MessageRole::Assistant => format!("{}", style("bot>").green().bold()),
    }
}

impl UiSink for TerminalSink {
    fn on_token(&mut self, text: &str) {
        if !self.streaming {
            if text.is_empty() {
                return;
            }
            print!("  {} ", role_label(MessageRole::Assistant));
            self.streaming = true;
        }
        print!("{text}");
        let _ = std::io::stdout().flush();
    }

    fn on_error(&mut self, message: &str) {
        self.end_reply_line();
        eprintln!("  {} {}", style("!").red().bold(), style(message).red());
    }

    fn on_complete(&mut self) {
        self.end_reply_line();
    }

    fn on_history_replaced(&mut self, messages: &[Message]) {
        self.end_reply_line();
        if messages.is_empty() {
            println!("  {}", style("(no history)").dim());
            return;
        }
        println!("  {}", style(format!("History ({} messages)", messages.len())).dim());
        for message in messages {
            println!("  {} {}", role_label(message.role), message.content);
            for attachment in message.attachments.iter().flatten() {
                println!("       {}", style(format!("+ {}", attachment.file_name)).dim());
            }
        }
    }

    fn on_attachments_changed(&mut self, file_names: &[String]) {
        if file_names.is_empty() {
            println!("  {}", style("no pending attachments").dim());
        } else {
            println!(
                "  {} {}",
                style("pending:").yellow(),
                file_names.join(", ")
            );
        }
    }
}

/// Writes each signal as a JSON line on stdout.
#[derive(Debug, Default)]
pub struct JsonLinesSink;

impl UiSink for JsonLinesSink {
    fn on_token(&mut self, _text: &str) {}
    fn on_error(&mut self, _message: &str) {}
    fn on_complete(&mut self) {}
    fn on_history_replaced(&mut self, _messages: &[Message]) {}

    fn handle(&mut self, event: UiEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(err) => tracing::warn!(error = %err, "Failed to encode UI event"),
        }
    }
}
