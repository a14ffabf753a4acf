//! Fetch boundary - the asynchronous capability that turns a card
//! configuration into a rendered layer or a summary statistic.
//!
//! Implementations run on the fetch pool's worker threads; results travel
//! back to the controller as [`FetchCompletion`] messages and are applied
//! only by `SidebarController::pump()` on the controller's thread. Each
//! completion carries the generation the card had when the fetch was issued,
//! so stale results can be recognized and dropped at apply time.

use serde_json::Value;

use crate::entities::{LayerCard, Mask};

use super::surface::LayerHandle;

/// Fetch errors, isolated per card - never fatal to the controller
#[derive(Debug)]
pub enum FetchError {
    /// Layer fetch rejected or errored; the previous handle stays live
    Layer(String),
    /// Summary fetch rejected or errored; summary stays unset
    Summary(String),
    /// Capability unreachable (service down, no backend configured)
    Unavailable,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Layer(e) => write!(f, "Layer fetch error: {}", e),
            FetchError::Summary(e) => write!(f, "Summary fetch error: {}", e),
            FetchError::Unavailable => write!(f, "Fetch capability unavailable"),
        }
    }
}

impl std::error::Error for FetchError {}

/// External fetch capability. One result or failure per call; calls block
/// the worker thread they run on, never the controller.
pub trait LayerFetcher: Send + Sync {
    /// Resolve the card's full configuration (palette, values, mask if any)
    /// into a rendered layer handle.
    fn fetch_layer(&self, card: &LayerCard) -> Result<LayerHandle, FetchError>;

    /// Compute the summary statistic for `id` over `values` restricted to
    /// `mask`. Only called with a non-empty mask.
    fn fetch_summary(&self, id: &str, values: &Value, mask: &Mask) -> Result<Value, FetchError>;
}

/// Result payload of one finished fetch job
#[derive(Debug)]
pub enum FetchOutcome {
    Layer(Result<LayerHandle, FetchError>),
    Summary(Result<Value, FetchError>),
}

/// Completion message sent from a worker thread back to the controller.
#[derive(Debug)]
pub struct FetchCompletion {
    /// Owning card id
    pub card_id: String,
    /// Card generation at issue time; mismatch at apply time = stale, drop
    pub generation: u64,
    pub outcome: FetchOutcome,
}
