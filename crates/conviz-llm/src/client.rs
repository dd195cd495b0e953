//! HTTP client for the concept-processing endpoint.

use std::time::Duration;

use async_trait::async_trait;
use conviz_settings::EndpointSettings;
use tracing::{debug, instrument, warn};

use crate::errors::{ConceptError, Result};
use crate::types::{ConceptRequest, ErrorEnvelope};

/// Turns a concept into a markdown breakdown.
#[async_trait]
pub trait ConceptProcessor: Send + Sync {
    /// Request a breakdown of `concept`.
    async fn process(&self, concept: &str) -> Result<String>;
}

/// [`ConceptProcessor`] that POSTs to the configured endpoint with `reqwest`.
#[derive(Clone, Debug)]
pub struct HttpConceptClient {
    client: reqwest::Client,
    url: String,
    model: Option<String>,
    provider: Option<String>,
    api_keys: std::collections::BTreeMap<String, String>,
}

impl HttpConceptClient {
    /// Build a client from endpoint settings.
    pub fn new(settings: &EndpointSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .user_agent(concat!("conviz/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: settings.url.clone(),
            model: settings.model.clone(),
            provider: settings.provider.clone(),
            api_keys: settings.api_keys.clone(),
        })
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn request_for(&self, concept: &str) -> ConceptRequest {
        ConceptRequest {
            message: concept.to_string(),
            model: self.model.clone(),
            provider: self.provider.clone(),
            api_keys: self.api_keys.clone(),
        }
    }
}

#[async_trait]
impl ConceptProcessor for HttpConceptClient {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn process(&self, concept: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.request_for(concept))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "concept endpoint returned an error");
            return Err(endpoint_error(status.as_u16(), &body));
        }
        if body.trim().is_empty() {
            return Err(ConceptError::EmptyResponse);
        }

        debug!(bytes = body.len(), "breakdown received");
        Ok(body)
    }
}

/// Decode an error body: a JSON [`ErrorEnvelope`] if possible, else raw text.
fn endpoint_error(status: u16, body: &str) -> ConceptError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ConceptError::Endpoint {
            status,
            error: envelope.error,
            details: envelope.details,
        },
        Err(_) => ConceptError::Endpoint {
            status,
            error: body.trim().to_string(),
            details: None,
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
