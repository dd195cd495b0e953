//! [`AppEvent`] - the envelope published on the bus.
//!
//! Wire form:
//!
//! ```json
//! { "type": "CONCEPT_INPUT", "id": "0192...", "timestamp": 1760000000000,
//!   "data": { "concept": "entropy" } }
//! ```
//!
//! The `type` tag and the `data` shape are kept consistent by construction:
//! [`EventData`] carries the typed payload and the tag is derived from it.

use conviz_core::ids::EventId;
use conviz_core::time::now_ms;
use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::event_type::EventType;
use super::payloads::{
    ConceptInput, ErrorData, Processing, Stage, StateUpdate, Status, SystemStatus,
    VisualizationReady,
};

/// Typed payload of an [`AppEvent`].
#[derive(Clone, Debug, PartialEq)]
pub enum EventData {
    /// `CONCEPT_INPUT`
    ConceptInput(ConceptInput),
    /// `PROCESSING_START`
    ProcessingStart(Processing),
    /// `PROCESSING_END`
    ProcessingEnd(Processing),
    /// `VISUALIZATION_READY`
    VisualizationReady(VisualizationReady),
    /// `ERROR`
    Error(ErrorData),
    /// `STATE_UPDATE`
    StateUpdate(StateUpdate),
    /// `SYSTEM_STATUS`
    SystemStatus(SystemStatus),
}

impl EventData {
    /// The tag this payload is published under.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::ConceptInput(_) => EventType::ConceptInput,
            Self::ProcessingStart(_) => EventType::ProcessingStart,
            Self::ProcessingEnd(_) => EventType::ProcessingEnd,
            Self::VisualizationReady(_) => EventType::VisualizationReady,
            Self::Error(_) => EventType::Error,
            Self::StateUpdate(_) => EventType::StateUpdate,
            Self::SystemStatus(_) => EventType::SystemStatus,
        }
    }

    /// Decode a payload for a known tag.
    pub fn from_parts(event_type: EventType, data: Value) -> serde_json::Result<Self> {
        Ok(match event_type {
            EventType::ConceptInput => Self::ConceptInput(serde_json::from_value(data)?),
            EventType::ProcessingStart => Self::ProcessingStart(serde_json::from_value(data)?),
            EventType::ProcessingEnd => Self::ProcessingEnd(serde_json::from_value(data)?),
            EventType::VisualizationReady => {
                Self::VisualizationReady(serde_json::from_value(data)?)
            }
            EventType::Error => Self::Error(serde_json::from_value(data)?),
            EventType::StateUpdate => Self::StateUpdate(serde_json::from_value(data)?),
            EventType::SystemStatus => Self::SystemStatus(serde_json::from_value(data)?),
        })
    }
}

/// An application event: identity, capture time, and typed payload.
#[derive(Clone, Debug, PartialEq)]
pub struct AppEvent {
    /// Unique per event instance.
    pub id: EventId,
    /// Wall-clock milliseconds at construction.
    pub timestamp: i64,
    /// Typed payload; determines [`AppEvent::event_type`].
    pub data: EventData,
}

impl AppEvent {
    /// Build an event with a fresh id and the current time.
    pub fn new(data: EventData) -> Self {
        Self {
            id: EventId::new(),
            timestamp: now_ms(),
            data,
        }
    }

    /// Tag of this event.
    pub fn event_type(&self) -> EventType {
        self.data.event_type()
    }

    /// `CONCEPT_INPUT` with no options.
    pub fn concept_input(concept: impl Into<String>) -> Self {
        Self::new(EventData::ConceptInput(ConceptInput {
            concept: concept.into(),
            options: None,
        }))
    }

    /// `PROCESSING_START` for `stage`.
    pub fn processing_start(stage: Stage) -> Self {
        Self::new(EventData::ProcessingStart(Processing {
            stage,
            progress: None,
        }))
    }

    /// `PROCESSING_END` for `stage`.
    pub fn processing_end(stage: Stage) -> Self {
        Self::new(EventData::ProcessingEnd(Processing {
            stage,
            progress: None,
        }))
    }

    /// `VISUALIZATION_READY` for a persisted record.
    pub fn visualization_ready(
        visualization_id: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        Self::new(EventData::VisualizationReady(VisualizationReady {
            visualization_id: visualization_id.into(),
            format: format.into(),
        }))
    }

    /// `ERROR` with optional structured context.
    pub fn error(
        code: impl Into<String>,
        message: impl Into<String>,
        context: Option<Map<String, Value>>,
    ) -> Self {
        Self::new(EventData::Error(ErrorData {
            code: code.into(),
            message: message.into(),
            context,
        }))
    }

    /// `STATE_UPDATE` at `path`.
    pub fn state_update<I, S>(path: I, value: Value) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(EventData::StateUpdate(StateUpdate {
            path: path.into_iter().map(Into::into).collect(),
            value,
        }))
    }

    /// `SYSTEM_STATUS`.
    pub fn system_status(status: Status, message: Option<String>) -> Self {
        Self::new(EventData::SystemStatus(SystemStatus { status, message }))
    }
}

impl Serialize for AppEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("AppEvent", 4)?;
        s.serialize_field("type", &self.event_type())?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("timestamp", &self.timestamp)?;
        match &self.data {
            EventData::ConceptInput(d) => s.serialize_field("data", d)?,
            EventData::ProcessingStart(d) | EventData::ProcessingEnd(d) => {
                s.serialize_field("data", d)?;
            }
            EventData::VisualizationReady(d) => s.serialize_field("data", d)?,
            EventData::Error(d) => s.serialize_field("data", d)?,
            EventData::StateUpdate(d) => s.serialize_field("data", d)?,
            EventData::SystemStatus(d) => s.serialize_field("data", d)?,
        }
        s.end()
    }
}

#[derive(Deserialize)]
struct RawAppEvent {
    #[serde(rename = "type")]
    event_type: EventType,
    id: EventId,
    timestamp: i64,
    data: Value,
}

impl<'de> Deserialize<'de> for AppEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawAppEvent::deserialize(deserializer)?;
        let data = EventData::from_parts(raw.event_type, raw.data).map_err(|e| {
            D::Error::custom(format!("invalid data for {}: {e}", raw.event_type))
        })?;
        Ok(Self {
            id: raw.id,
            timestamp: raw.timestamp,
            data,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn constructors_set_matching_type() {
        assert_eq!(AppEvent::concept_input("x").event_type(), EventType::ConceptInput);
        assert_eq!(
            AppEvent::processing_start(Stage::Llm).event_type(),
            EventType::ProcessingStart
        );
        assert_eq!(
            AppEvent::processing_end(Stage::Llm).event_type(),
            EventType::ProcessingEnd
        );
        assert_eq!(
            AppEvent::visualization_ready("1", "markdown").event_type(),
            EventType::VisualizationReady
        );
        assert_eq!(AppEvent::error("E", "m", None).event_type(), EventType::Error);
        assert_eq!(
            AppEvent::state_update(["a"], Value::Null).event_type(),
            EventType::StateUpdate
        );
        assert_eq!(
            AppEvent::system_status(Status::Ready, None).event_type(),
            EventType::SystemStatus
        );
    }

    #[test]
    fn each_event_gets_a_unique_id() {
        let a = AppEvent::concept_input("x");
        let b = AppEvent::concept_input("x");
        assert_ne!(a.id, b.id);
        assert!(b.timestamp >= a.timestamp);
    }

    #[test]
    fn wire_format_concept_input() {
        let mut event = AppEvent::concept_input("entropy");
        event.id = EventId::from("evt-1");
        event.timestamp = 42;
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "CONCEPT_INPUT",
                "id": "evt-1",
                "timestamp": 42,
                "data": { "concept": "entropy" }
            })
        );
    }

    #[test]
    fn wire_format_uses_camel_case_data() {
        let event = AppEvent::visualization_ready("7", "markdown");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["data"]["visualizationId"], "7");
        assert_eq!(value["data"]["format"], "markdown");
    }

    #[test]
    fn processing_stage_is_lowercase() {
        let value = serde_json::to_value(AppEvent::processing_start(Stage::Visualization)).unwrap();
        assert_eq!(value["type"], "PROCESSING_START");
        assert_eq!(value["data"]["stage"], "visualization");
        assert!(value["data"].get("progress").is_none());
    }

    #[test]
    fn deserialize_error_event_with_context() {
        let value = json!({
            "type": "ERROR",
            "id": "evt-9",
            "timestamp": 1,
            "data": {
                "code": "EVENT_HANDLER_ERROR",
                "message": "boom",
                "context": { "originalEvent": { "type": "CONCEPT_INPUT" } }
            }
        });
        let event: AppEvent = serde_json::from_value(value).unwrap();
        match event.data {
            EventData::Error(ref e) => {
                assert_eq!(e.code, "EVENT_HANDLER_ERROR");
                assert_eq!(e.message, "boom");
                let ctx = e.context.as_ref().unwrap();
                assert_eq!(ctx["originalEvent"]["type"], "CONCEPT_INPUT");
            }
            ref other => panic!("expected error payload, got {other:?}"),
        }
    }

    #[test]
    fn deserialize_rejects_mismatched_data() {
        let value = json!({
            "type": "SYSTEM_STATUS",
            "id": "evt-2",
            "timestamp": 1,
            "data": { "concept": "not a status" }
        });
        let err = serde_json::from_value::<AppEvent>(value).unwrap_err();
        assert!(err.to_string().contains("SYSTEM_STATUS"), "got: {err}");
    }

    #[test]
    fn deserialize_rejects_unknown_type() {
        let value = json!({ "type": "NOPE", "id": "e", "timestamp": 1, "data": {} });
        assert!(serde_json::from_value::<AppEvent>(value).is_err());
    }

    #[test]
    fn state_update_keeps_opaque_value() {
        let event = AppEvent::state_update(["visualizations", "items"], json!([1, 2, 3]));
        let json = serde_json::to_string(&event).unwrap();
        let back: AppEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
