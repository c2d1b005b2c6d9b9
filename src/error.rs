//! Tool-level error taxonomy.
//!
//! Every failure a tool handler can hit is one of three tagged variants. The
//! envelope layer serializes each variant with its `Display` output, so the
//! wire message for a given failure is deterministic: the mapping happens in
//! the `From` conversions below, not ad hoc at each call site.

use thiserror::Error;

use crate::backend::BackendError;
use crate::gemini::GeminiError;

/// A recoverable tool failure, converted into an `{isError: true}` envelope.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments failed schema validation. No downstream call was made.
    #[error("Invalid arguments: missing or invalid fields: {}", .fields.join(", "))]
    Validation { fields: Vec<String> },

    /// The backend REST call failed or returned an error status.
    #[error("{message}")]
    Downstream { message: String },

    /// The completion service failed, or returned text that could not be
    /// parsed as JSON when JSON was required.
    #[error("{message}")]
    Completion {
        message: String,
        /// Raw model output, kept for diagnostics when parsing failed.
        raw: Option<String>,
    },
}

impl ToolError {
    pub fn validation(field: impl Into<String>) -> Self {
        Self::Validation {
            fields: vec![field.into()],
        }
    }
}

impl From<BackendError> for ToolError {
    fn from(err: BackendError) -> Self {
        // A structured error detail from the backend body beats the generic
        // transport message.
        let message = match err.detail() {
            Some(detail) => format!("Backend error: {detail}"),
            None => format!("Backend request failed: {err}"),
        };
        Self::Downstream { message }
    }
}

impl From<GeminiError> for ToolError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::InvalidJson { raw } => Self::Completion {
                message: format!("JSON parse error in model output. Raw output:\n{raw}"),
                raw: Some(raw),
            },
            other => Self::Completion {
                message: format!("Completion request failed: {other}"),
                raw: None,
            },
        }
    }
}
