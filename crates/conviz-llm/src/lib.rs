//! # conviz-llm
//!
//! Client side of the concept-processing endpoint.
//!
//! - [`ConceptProcessor`]: the seam the concept pipeline depends on
//! - [`HttpConceptClient`]: `reqwest` implementation configured from
//!   [`conviz_settings::EndpointSettings`]
//! - [`breakdown`]: title and category extraction from returned markdown

#![deny(unsafe_code)]

pub mod breakdown;
pub mod client;
pub mod errors;
pub mod types;

pub use breakdown::{UNCATEGORIZED, extract_category, extract_title};
pub use client::{ConceptProcessor, HttpConceptClient};
pub use errors::{ConceptError, Result};
pub use types::{ConceptRequest, ErrorEnvelope};
