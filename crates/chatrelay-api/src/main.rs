//! chatrelay terminal entry point.
//!
//! Binary name: `chatrelay`
//!
//! Parses CLI arguments, initializes tracing and configuration, then runs an
//! interactive chat against the in-memory backend.

mod cli;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use chatrelay_core::backend::BoxChatBackend;
use chatrelay_infra::backend::InMemoryChatBackend;
use chatrelay_infra::config::{CONFIG_FILE_NAME, load_relay_config, read_relay_config};
use chatrelay_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use chatrelay_types::chat::ChatId;
use cli::Cli;
use cli::loop_runner::run_chat_loop;
use cli::sink::{JsonLinesSink, TerminalSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&TracingOptions {
        enable_otel: cli.otel,
        json: cli.json,
        default_directive: cli.log_directive().to_string(),
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // An explicit config path must be valid; the default one is optional.
    let mut config = match &cli.config {
        Some(path) => read_relay_config(path).await?,
        None => load_relay_config(Path::new(CONFIG_FILE_NAME)).await,
    };
    if let Some(accept) = &cli.accept {
        config.accepted_files = Some(accept.clone());
    }

    let backend = InMemoryChatBackend::new()
        .with_token_delay(Duration::from_millis(config.token_delay_ms));
    let backend = Arc::new(BoxChatBackend::new(backend));
    let chat_id = ChatId::from(cli.chat_id.as_str());

    let result = if cli.json {
        run_chat_loop(backend, chat_id, JsonLinesSink, &config, false).await
    } else {
        run_chat_loop(backend, chat_id, TerminalSink::new(), &config, true).await
    };

    shutdown_tracing();
    result
}
