//! The [`EventType`] enum - the closed set of application event tags.
//!
//! Every variant serializes to the SCREAMING_SNAKE_CASE tag used on the wire
//! (e.g. `"CONCEPT_INPUT"`), so bus events can be logged or forwarded as JSON
//! without a translation table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// All application event types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// User submitted a concept.
    ConceptInput,
    /// A processing stage began.
    ProcessingStart,
    /// A processing stage finished.
    ProcessingEnd,
    /// A visualization was persisted and can be displayed.
    VisualizationReady,
    /// Something failed.
    Error,
    /// Application state at a key path changed.
    StateUpdate,
    /// Overall system status changed.
    SystemStatus,
}

/// Every event type, in declaration order.
pub const ALL_EVENT_TYPES: [EventType; 7] = [
    EventType::ConceptInput,
    EventType::ProcessingStart,
    EventType::ProcessingEnd,
    EventType::VisualizationReady,
    EventType::Error,
    EventType::StateUpdate,
    EventType::SystemStatus,
];

impl EventType {
    /// Wire string for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConceptInput => "CONCEPT_INPUT",
            Self::ProcessingStart => "PROCESSING_START",
            Self::ProcessingEnd => "PROCESSING_END",
            Self::VisualizationReady => "VISUALIZATION_READY",
            Self::Error => "ERROR",
            Self::StateUpdate => "STATE_UPDATE",
            Self::SystemStatus => "SYSTEM_STATUS",
        }
    }

    /// Whether this is one of the two processing-stage types.
    pub fn is_processing_type(self) -> bool {
        matches!(self, Self::ProcessingStart | Self::ProcessingEnd)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // serde's rename rules are the source of truth for the wire strings
        serde_json::from_value(serde_json::Value::String(s.to_owned()))
            .map_err(|_| format!("unknown event type: {s}"))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
