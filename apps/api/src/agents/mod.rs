// The four generative operations. Each agent builds its prompt, runs the call
// through the retry layer, and (except layout, whose output is plain HTML)
// feeds the response text to the structured extractor.

pub mod analysis;
pub mod editor;
pub mod layout;
pub mod parser;
pub mod prompts;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::errors::AppError;
use crate::llm_client::LlmError;

/// Maps a terminal call failure onto the application error surface. Transient
/// failures never reach this point — the retry layer absorbs them.
pub(crate) fn llm_failure(operation: &str, e: LlmError) -> AppError {
    AppError::Llm(format!("{operation} failed: {e}"))
}

/// Splits an image payload that may arrive as a `data:` URI. Returns the mime
/// type (default `image/png`) and the bare base64 body, validated to decode.
pub(crate) fn split_image_payload(input: &str) -> Result<(String, String), AppError> {
    let (mime, body) = match input.split_once("base64,") {
        Some((header, body)) => {
            let mime = header
                .strip_prefix("data:")
                .and_then(|h| h.strip_suffix(';'))
                .filter(|m| !m.is_empty())
                .unwrap_or("image/png");
            (mime.to_string(), body)
        }
        None => ("image/png".to_string(), input),
    };

    if BASE64.decode(body).is_err() {
        return Err(AppError::Validation(
            "Image payload is not valid base64".to_string(),
        ));
    }

    Ok((mime, body.to_string()))
}
