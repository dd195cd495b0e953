//! # conviz-core
//!
//! Foundation types and utilities shared by every conviz crate:
//!
//! - **Event ids**: [`ids::EventId`], a UUID v7 string newtype
//! - **Clock**: [`time::now_ms`] wall-clock milliseconds used for event and
//!   record timestamps
//! - **Logging**: `tracing` subscriber setup and in-memory log capture for tests

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;
pub mod time;
