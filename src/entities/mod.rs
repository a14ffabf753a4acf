//! Entities module - domain types, independent of the engine in `core`.

pub mod card;
pub mod mask;

pub use card::{LayerCard, SummaryState};
pub use mask::{Bounds, Mask};
