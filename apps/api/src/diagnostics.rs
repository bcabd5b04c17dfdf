//! Diagnostic sink — append-only text destination for terminal agent failures.
//!
//! Two record kinds land here: retry exhaustion (the call never produced usable
//! text) and parse failure (the text could not be coerced into a JSON object).
//! Writes must never take the request down with them; a sink that cannot be
//! written is reported through tracing and otherwise ignored.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::error;

/// File-backed diagnostic sink shared across all request handlers.
#[derive(Clone)]
pub struct DiagnosticSink {
    path: Arc<PathBuf>,
}

impl DiagnosticSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records a terminal retry-exhaustion failure: the last error detail, the
    /// attempt count, and any response introspection (finish reason, safety
    /// ratings) captured from the final attempt.
    pub fn record_call_exhausted(
        &self,
        operation: &str,
        attempts: u32,
        detail: &str,
        introspection: Option<&str>,
    ) {
        let mut record = format!(
            "[{}] RETRY EXHAUSTED operation={operation} attempts={attempts}\nLast error: {detail}\n",
            Utc::now().to_rfc3339()
        );
        if let Some(info) = introspection {
            record.push_str("Response introspection: ");
            record.push_str(info);
            record.push('\n');
        }
        record.push('\n');
        self.append(&record);
    }

    /// Records a JSON-parse failure: the parse error, the cleaned text that was
    /// handed to the parser, and the original response text.
    pub fn record_parse_failure(&self, parse_error: &str, cleaned: &str, original: &str) {
        let record = format!(
            "[{}] PARSE FAILURE\nError: {parse_error}\n\nCleaned text:\n{cleaned}\n\nOriginal:\n{original}\n\n",
            Utc::now().to_rfc3339()
        );
        self.append(&record);
    }

    fn append(&self, record: &str) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_ref())
            .and_then(|mut f| f.write_all(record.as_bytes()));
        if let Err(e) = result {
            error!("Failed to write diagnostic record to {:?}: {e}", self.path);
        }
    }
}
