//! Request types for the backend token stream.

use serde::{Deserialize, Serialize};

use crate::attachment::Attachment;
use crate::chat::ChatId;

/// Options forwarded with every stream call of a widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
}

/// Everything the backend needs to answer one user message.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub chat_id: ChatId,
    pub user_message: String,
    /// Attachments drained from the session's pending buffer, in upload order.
    pub attachments: Vec<Attachment>,
    pub options: Option<StreamOptions>,
}
