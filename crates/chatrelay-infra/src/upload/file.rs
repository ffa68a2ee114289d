//! Upload a file from disk through an attachment receiver.

use std::path::Path;

use chatrelay_core::attachment::AttachmentReceiver;
use chatrelay_types::error::{SessionError, UploadError};
use uuid::Uuid;

/// Guess a MIME type from the file extension.
pub fn detect_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("txt" | "log") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("html" | "htm") => "text/html",
        _ => "application/octet-stream",
    }
}

/// Stream the file at `path` into the receiver's session.
///
/// A file that cannot be opened, or is larger than the upload limit, is
/// reported as a failed upload and yields `Ok(None)`.
pub async fn upload_path(
    receiver: &AttachmentReceiver,
    path: &Path,
) -> Result<Option<Uuid>, SessionError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let content_type = detect_mime(path);

    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(err) => {
            receiver.on_upload_failed(&UploadError::Io(err));
            return Ok(None);
        }
    };

    if let Ok(meta) = file.metadata().await {
        let limit = receiver.policy().max_bytes;
        if meta.len() > limit {
            receiver.on_upload_failed(&UploadError::TooLarge { limit });
            return Ok(None);
        }
    }

    receiver.receive(&file_name, content_type, file).await
}
