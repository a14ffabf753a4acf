//! Core engine modules - controller, registry, fetch boundary, workers.
//!
//! Everything here is UI-independent; the host wires a `MapSurface` and a
//! `LayerFetcher` in and drives the controller from its update loop.

pub mod controller;
pub mod events;
pub mod fetch;
pub mod registry;
pub mod surface;
pub mod workers;

// Re-exports for convenience
pub use controller::{Panel, SidebarController};
pub use events::{SidebarEvent, SidebarEventSender};
pub use fetch::{FetchCompletion, FetchError, FetchOutcome, LayerFetcher};
pub use registry::LayerRegistry;
pub use surface::{LayerHandle, MapSurface, Visibility};
pub use workers::FetchPool;
