//! Stateless repositories. Every method takes `&Connection` so callers
//! decide the transaction boundary.

pub mod id_sequence;
pub mod visualization;

pub use id_sequence::IdSequenceRepo;
pub use visualization::VisualizationRepo;
