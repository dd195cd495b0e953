//! Wire types of the concept-processing endpoint.
//!
//! Request: `POST {url}` with a JSON body. Success: `200` with the markdown
//! breakdown as `text/plain`. Failure: a JSON [`ErrorEnvelope`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Body of a concept request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptRequest {
    /// The concept to visualize.
    pub message: String,
    /// Model name, if configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Provider name, if configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Per-provider API keys.
    #[serde(default)]
    pub api_keys: BTreeMap<String, String>,
}

/// Error body returned by the endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Summary, e.g. `Failed to process request`.
    pub error: String,
    /// Underlying cause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
