//! Interactive chat loop.
//!
//! Reads lines from stdin, handles slash commands and sends everything else
//! through the widget. Each reply is awaited before the next line is read,
//! so streamed output never interleaves with typing.

use std::sync::Arc;

use chatrelay_core::backend::BoxChatBackend;
use chatrelay_core::ui::UiSink;
use chatrelay_core::widget::ChatWidget;
use chatrelay_infra::upload::upload_path;
use chatrelay_types::chat::ChatId;
use chatrelay_types::config::RelayConfig;
use chatrelay_types::error::SessionError;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};

fn report(result: Result<(), SessionError>) {
    if let Err(err) = result {
        eprintln!("  {} {err}", style("!").yellow().bold());
    }
}

fn notice(message: &str) {
    eprintln!("  {}", style(message).dim());
}

/// Run the chat loop until `/quit` or end of input, then close the chat.
pub async fn run_chat_loop<S: UiSink>(
    backend: Arc<BoxChatBackend>,
    chat_id: ChatId,
    sink: S,
    config: &RelayConfig,
    show_banner: bool,
) -> anyhow::Result<()> {
    let backend_name = backend.name().to_string();
    let (mut widget, ui_task) = ChatWidget::start_with_sink(backend, chat_id, sink, config).await?;

    if show_banner {
        print_welcome_banner(
            widget.chat_id().as_str(),
            &backend_name,
            widget.accepted_files(),
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        widget.ui().flush().await;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match commands::parse(line) {
            Some(ChatCommand::Help) => commands::print_help(),
            Some(ChatCommand::Attach(path)) => match upload_path(widget.receiver(), &path).await {
                Ok(Some(_)) => {}
                Ok(None) => notice(&format!("could not attach {}", path.display())),
                Err(err) => report(Err(err)),
            },
            Some(ChatCommand::Remove(name)) => match widget.on_remove_attachment(&name).await {
                Ok(0) => notice(&format!("no pending attachment named {name}")),
                Ok(_) => {}
                Err(err) => report(Err(err)),
            },
            Some(ChatCommand::Chat(id)) => report(widget.set_chat_id(ChatId::from(id)).await),
            Some(ChatCommand::Refresh) => report(widget.on_refresh().await),
            Some(ChatCommand::Quit) => break,
            Some(ChatCommand::Unknown(cmd)) => {
                notice(&format!("Unknown command {cmd}. Type /help for commands."))
            }
            None => match widget.on_send(line).await {
                Ok(relay) => match relay.await {
                    Ok(outcome) => info!(?outcome, "Send finished"),
                    Err(err) => warn!(error = %err, "Relay task failed"),
                },
                Err(err) => report(Err(err)),
            },
        }
    }

    widget.close().await?;
    drop(widget);
    if let Err(err) = ui_task.await {
        warn!(error = %err, "UI task ended abnormally");
    }
    Ok(())
}
