//! LAYERDECK - map-sidebar layer synchronization engine
//!
//! Keeps a named collection of rendered map layers in sync with per-card
//! configuration changes (opacity, palette, value selection) and a spatial
//! mask drawn by the user or captured from the viewport. Fetches are
//! asynchronous; a per-card generation stamp guarantees that stale
//! completions are dropped and the last committed configuration wins.

pub mod config;
pub mod core;
pub mod entities;

// Re-export commonly used types from core
pub use config::SidebarConfig;
pub use core::controller::{Panel, SidebarController};
pub use core::events::{SidebarEvent, SidebarEventSender};
pub use core::fetch::{FetchError, LayerFetcher};
pub use core::registry::LayerRegistry;
pub use core::surface::{LayerHandle, MapSurface, Visibility};

// Re-export entities
pub use entities::{Bounds, LayerCard, Mask, SummaryState};
