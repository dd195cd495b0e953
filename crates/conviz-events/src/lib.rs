//! # conviz-events
//!
//! Typed application events and the in-process publish/subscribe bus.
//!
//! - **Events**: [`AppEvent`] envelope (`type`, `id`, `timestamp`, `data`) with a
//!   typed [`EventData`] payload per [`EventType`]
//! - **Bus**: [`EventBus`] with subscribe/unsubscribe, synchronous ordered
//!   delivery, and handler failure isolation

#![deny(unsafe_code)]

pub mod bus;
pub mod errors;
pub mod types;

pub use bus::{EventBus, HANDLER_ERROR_CODE, Handler, Subscription};
pub use errors::HandlerError;
pub use types::*;
