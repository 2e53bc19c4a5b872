use tracing::debug;

use crate::errors::AppError;

/// Extracts the plain text of a PDF document.
///
/// Parsing is CPU-bound and the underlying library may panic on malformed
/// input, so it runs on the blocking pool; both failure modes surface as
/// `AppError::Io`.
pub async fn extract_pdf_text(bytes: Vec<u8>) -> Result<String, AppError> {
    let len = bytes.len();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::Io(format!("PDF extraction aborted: {e}")))?
        .map_err(|e| AppError::Io(format!("PDF extraction error: {e}")))?;

    debug!(bytes = len, chars = text.len(), "Extracted PDF text");
    Ok(text)
}
