//! Slash command parsing for the chat loop.

use std::path::PathBuf;

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    /// Upload a file from disk into the pending attachments.
    Attach(PathBuf),
    /// Drop pending attachments with this file name.
    Remove(String),
    /// Switch to another chat.
    Chat(String),
    /// Reload the history from the backend.
    Refresh,
    /// Close the session and exit.
    Quit,
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(' ') {
        Some((cmd, arg)) => (cmd.to_lowercase(), arg.trim()),
        None => (trimmed.to_lowercase(), ""),
    };

    let needs_arg = |usage: &str, make: fn(&str) -> ChatCommand| {
        if arg.is_empty() {
            ChatCommand::Unknown(format!("{usage} requires an argument"))
        } else {
            make(arg)
        }
    };

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/attach" | "/a" => needs_arg("/attach", |a| ChatCommand::Attach(PathBuf::from(a))),
        "/remove" | "/rm" => needs_arg("/remove", |a| ChatCommand::Remove(a.to_string())),
        "/chat" => needs_arg("/chat", |a| ChatCommand::Chat(a.to_string())),
        "/refresh" => ChatCommand::Refresh,
        "/quit" | "/exit" | "/q" => ChatCommand::Quit,
        other => ChatCommand::Unknown(other.to_string()),
    };
    Some(command)
}

pub fn print_help() {
    let rows = [
        ("/attach <path>", "Attach a file to the next message"),
        ("/remove <name>", "Drop a pending attachment"),
        ("/chat <id>", "Switch to another chat"),
        ("/refresh", "Reload the chat history"),
        ("/quit", "Close the chat and exit"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (cmd, help) in rows {
        println!("  {} {}", style(format!("{cmd:<16}")).cyan(), help);
    }
    println!();
    println!("  {}", style("Any other line is sent as a message.").dim());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_attach() {
        assert_eq!(
            parse("/attach ./cat photo.png"),
            Some(ChatCommand::Attach(PathBuf::from("./cat photo.png")))
        );
        assert_eq!(
            parse("/attach"),
            Some(ChatCommand::Unknown("/attach requires an argument".to_string()))
        );
    }

    #[test]
    fn test_parse_remove_and_chat() {
        assert_eq!(
            parse("/rm a.png"),
            Some(ChatCommand::Remove("a.png".to_string()))
        );
        assert_eq!(parse("/chat  c2 "), Some(ChatCommand::Chat("c2".to_string())));
    }

    #[test]
    fn test_parse_simple() {
        assert_eq!(parse("/refresh"), Some(ChatCommand::Refresh));
        assert_eq!(parse("/QUIT"), Some(ChatCommand::Quit));
        assert_eq!(parse("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn test_parse_not_command() {
        assert_eq!(parse("hello world"), None);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(parse("/foo"), Some(ChatCommand::Unknown("/foo".to_string())));
    }
}
