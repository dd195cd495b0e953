//! Concept endpoint error types.

use thiserror::Error;

/// Errors from a concept-processing request.
#[derive(Debug, Error)]
pub enum ConceptError {
    /// Transport failure (connect, timeout, body read).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned {status}: {error}{}", suffix(.details))]
    Endpoint {
        /// HTTP status code.
        status: u16,
        /// Error summary from the response envelope, or the raw body.
        error: String,
        /// Optional detail message.
        details: Option<String>,
    },

    /// The endpoint answered successfully with an empty body.
    #[error("endpoint returned an empty breakdown")]
    EmptyResponse,
}

impl ConceptError {
    /// Short machine-readable code for `ERROR` events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "LLM_REQUEST_FAILED",
            Self::Endpoint { .. } => "LLM_ENDPOINT_ERROR",
            Self::EmptyResponse => "LLM_EMPTY_RESPONSE",
        }
    }
}

fn suffix(details: &Option<String>) -> String {
    details.as_deref().map(|d| format!(" ({d})")).unwrap_or_default()
}

/// Result type for concept requests.
pub type Result<T> = std::result::Result<T, ConceptError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
