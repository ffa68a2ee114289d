//! CLI definition for the `chatrelay` binary.
//!
//! A single interactive command: open a chat widget on the in-memory backend
//! and relay lines typed on stdin. Slash commands are handled in
//! [`commands`]; the terminal rendering lives in [`sink`].

pub mod banner;
pub mod commands;
pub mod loop_runner;
pub mod sink;

use std::path::PathBuf;

use clap::Parser;

/// Chat with a streaming backend from the terminal.
#[derive(Parser, Debug)]
#[command(name = "chatrelay", version, about, long_about = None)]
pub struct Cli {
    /// Chat to open.
    #[arg(long, env = "CHATRELAY_CHAT_ID", default_value = "default")]
    pub chat_id: String,

    /// Config file. Without it, `chatrelay.toml` in the working directory is
    /// used when present.
    #[arg(long, env = "CHATRELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Accepted files, e.g. "image/*,.pdf". Overrides the config file.
    #[arg(long)]
    pub accept: Option<String>,

    /// Print every UI signal as a JSON line instead of styled text.
    #[arg(long)]
    pub json: bool,

    /// Suppress all log output except errors.
    #[arg(long)]
    pub quiet: bool,

    /// Detailed logs (-v for info, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long)]
    pub otel: bool,
}

impl Cli {
    /// Log filter directive for the chosen verbosity.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "warn",
            1 => "info,chatrelay_core=debug,chatrelay_infra=debug",
            _ => "trace",
        }
    }
}
