//! Uploaded-file text extraction for CV import. PDFs go through `pdf-extract`;
//! anything else is treated as text (lossy UTF-8, matching the permissive
//! behavior users expect from drag-and-drop upload).

use crate::errors::AppError;

/// Extracts the text content of an uploaded CV file.
pub fn extract_upload_text(filename: &str, data: &[u8]) -> Result<String, AppError> {
    let content = if filename.to_lowercase().ends_with(".pdf") {
        pdf_extract::extract_text_from_mem(data)
            .map_err(|e| AppError::Validation(format!("PDF parsing failed: {e}")))?
    } else {
        String::from_utf8_lossy(data).into_owned()
    };

    if content.trim().is_empty() {
        return Err(AppError::Validation(
            "Could not extract text from file".to_string(),
        ));
    }

    Ok(content)
}
