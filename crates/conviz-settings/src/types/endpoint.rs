use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Concept-processing endpoint settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EndpointSettings {
    /// URL the concept request is POSTed to.
    pub url: String,
    /// Model name forwarded with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Provider name forwarded with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Per-provider API keys forwarded to the endpoint.
    pub api_keys: BTreeMap<String, String>,
    /// Whole-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:5173/api/chat".to_string(),
            model: None,
            provider: None,
            api_keys: BTreeMap::new(),
            request_timeout_ms: 120_000,
        }
    }
}
