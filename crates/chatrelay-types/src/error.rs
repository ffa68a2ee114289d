use thiserror::Error;

use crate::chat::ChatId;

/// Errors from chat session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session was closed; it cannot be used again.
    #[error("chat session '{chat_id}' is closed")]
    Closed { chat_id: ChatId },

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Errors reported by the backend chat collaborator.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("{message}")]
    Provider { message: String },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("attachment '{0}' not found")]
    AttachmentNotFound(String),

    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}

impl BackendError {
    pub fn provider(message: impl Into<String>) -> Self {
        BackendError::Provider {
            message: message.into(),
        }
    }
}

/// Errors from receiving an attachment upload.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("file type '{content_type}' of '{file_name}' is not accepted")]
    NotAccepted {
        file_name: String,
        content_type: String,
    },

    #[error("upload transfer failed: {0}")]
    Transfer(String),

    #[error("upload rejected by backend: {0}")]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors from loading relay configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: String, message: String },
}
