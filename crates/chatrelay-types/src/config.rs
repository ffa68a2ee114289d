//! Relay configuration types.
//!
//! `RelayConfig` represents the `chatrelay.toml` file that controls upload
//! limits, accepted file types and UI channel sizing. All fields have
//! defaults, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Default maximum size of a single upload (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Default capacity of the channel feeding the UI sink.
pub const DEFAULT_UI_CHANNEL_CAPACITY: usize = 256;

/// Top-level configuration for a chat widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Uploads larger than this are rejected as failed uploads.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    /// Comma-separated list of accepted files (e.g. `"image/*,.pdf"`).
    /// `None` accepts everything.
    #[serde(default)]
    pub accepted_files: Option<String>,

    /// Bounded capacity of the UI signal channel.
    #[serde(default = "default_ui_channel_capacity")]
    pub ui_channel_capacity: usize,

    /// System message forwarded with every stream request.
    #[serde(default)]
    pub system_message: Option<String>,

    /// Delay between tokens produced by the in-memory backend.
    #[serde(default)]
    pub token_delay_ms: u64,
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_ui_channel_capacity() -> usize {
    DEFAULT_UI_CHANNEL_CAPACITY
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            accepted_files: None,
            ui_channel_capacity: default_ui_channel_capacity(),
            system_message: None,
            token_delay_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_config_default_values() {
        let config = RelayConfig::default();
        assert_eq!(config.max_upload_bytes, 5_242_880);
        assert_eq!(config.ui_channel_capacity, 256);
        assert!(config.accepted_files.is_none());
        assert!(config.system_message.is_none());
    }

    #[test]
    fn test_relay_config_deserialize_empty() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn test_relay_config_deserialize_with_values() {
        let toml_str = r#"
max_upload_bytes = 1024
accepted_files = "image/*,.pdf"
ui_channel_capacity = 8
system_message = "Answer in French"
token_delay_ms = 15
"#;
        let config: RelayConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.accepted_files.as_deref(), Some("image/*,.pdf"));
        assert_eq!(config.ui_channel_capacity, 8);
        assert_eq!(config.system_message.as_deref(), Some("Answer in French"));
        assert_eq!(config.token_delay_ms, 15);
    }
}
