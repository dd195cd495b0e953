//! Typed application event definitions.

mod event;
mod event_type;
mod payloads;

pub use event::{AppEvent, EventData};
pub use event_type::{ALL_EVENT_TYPES, EventType};
pub use payloads::{
    ConceptInput, ErrorData, Processing, Stage, StateUpdate, Status, SystemStatus,
    VisualizationReady,
};
