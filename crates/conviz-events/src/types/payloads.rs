//! Typed `data` payloads, one per event type.
//!
//! Field names are camelCase on the wire. Genuinely unconstrained values
//! (`options`, `context`, `value`) stay as opaque JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload of `CONCEPT_INPUT`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptInput {
    /// The concept text as typed by the user.
    pub concept: String,
    /// Free-form request options (model, provider, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

/// Pipeline stage reported by processing events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Concept intake / normalisation.
    Concept,
    /// Remote model call.
    Llm,
    /// Visualization rendering or persistence.
    Visualization,
}

/// Payload of `PROCESSING_START` and `PROCESSING_END`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Processing {
    /// Stage being reported.
    pub stage: Stage,
    /// Optional progress indicator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

/// Payload of `VISUALIZATION_READY`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationReady {
    /// Id of the persisted visualization.
    pub visualization_id: String,
    /// Content format, e.g. `markdown`.
    pub format: String,
}

/// Payload of `ERROR`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    /// Machine-readable error code, e.g. `EVENT_HANDLER_ERROR`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Structured context for debugging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

/// Payload of `STATE_UPDATE`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
    /// Key path of the changed state, outermost key first.
    pub path: Vec<String>,
    /// New value at `path`.
    pub value: Value,
}

/// Coarse system status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Idle and accepting input.
    Ready,
    /// Work in progress.
    Busy,
    /// Last operation failed.
    Error,
}

/// Payload of `SYSTEM_STATUS`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    /// Current status.
    pub status: Status,
    /// Optional explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
