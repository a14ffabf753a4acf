//! LayerCard - one user-facing overlay configuration.
//!
//! # Capability flags
//!
//! The card carries explicit `mask_capable` / `summary_capable` flags instead
//! of inferring capabilities from which optional fields happen to be present.
//! The mask pipeline only ever touches cards with `mask_capable = true`.
//!
//! # Generation counter
//!
//! Every input change (mask set/clear, palette change, values change) bumps
//! `generation`. Fetch jobs are stamped with the generation at issue time and
//! a completion whose stamp no longer matches the card's current generation
//! is dropped instead of applied. This is what makes out-of-order async
//! completions safe: the last committed configuration wins visually, always.
//!
//! # Summary lifecycle
//!
//! `None -> Loading -> Ready` on a successful summary fetch, `Loading -> None`
//! on failure, any state `-> None` when the mask is cleared. `summary` is
//! `Some` only in `Ready`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::mask::Mask;

/// Per-card summary fetch state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryState {
    /// No summary: never fetched, failed, or mask was cleared
    #[default]
    None,
    /// At least one summary fetch outstanding
    Loading,
    /// `summary` holds the latest successful result
    Ready,
}

/// One overlay card: id, styling, fetch parameters, mask/summary state.
///
/// `id` is the join key across the registry, map panes and styling - stable
/// and unique within the active card set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayerCard {
    pub id: String,

    /// Pane opacity in [0, 1]
    pub opacity: f32,

    /// Pane visibility (visible/hidden)
    pub visible: bool,

    /// Palette selection forwarded to the fetch service
    pub palette: String,

    /// Opaque fetch parameters (selected value/band); changes invalidate the
    /// rendered layer
    pub values: Value,

    /// Whether this card participates in mask-driven fetch/summary
    pub mask_capable: bool,

    /// Active mask; `Some` only while a non-empty mask is applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Mask>,

    /// Whether this card produces a statistical summary
    pub summary_capable: bool,

    /// Latest successful summary result; cleared when the mask clears
    #[serde(skip)]
    pub summary: Option<Value>,

    #[serde(skip)]
    pub summary_state: SummaryState,

    /// Monotone stamp for staleness checks on fetch completions
    #[serde(skip)]
    generation: u64,
}

impl LayerCard {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            opacity: 1.0,
            visible: true,
            palette: String::new(),
            values: Value::Null,
            mask_capable: false,
            mask: None,
            summary_capable: false,
            summary: None,
            summary_state: SummaryState::None,
            generation: 0,
        }
    }

    /// Enable mask participation (builder style, for card set construction)
    pub fn with_mask_capability(mut self) -> Self {
        self.mask_capable = true;
        self
    }

    /// Enable summary production (implies nothing about mask capability)
    pub fn with_summary_capability(mut self) -> Self {
        self.summary_capable = true;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Current generation stamp
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Bump and return the new generation. Called on every input change.
    pub fn bump_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// True when a non-empty mask is applied
    pub fn has_mask(&self) -> bool {
        self.mask.as_ref().is_some_and(|m| !m.is_empty())
    }

    /// Install a non-empty mask. Summary stays as-is until its re-fetch lands.
    pub fn set_mask(&mut self, mask: Mask) {
        debug_assert!(!mask.is_empty(), "use clear_mask() for the empty payload");
        self.mask = Some(mask);
    }

    /// Clear the mask and reset the summary lifecycle to `None`.
    pub fn clear_mask(&mut self) {
        self.mask = None;
        self.summary = None;
        self.summary_state = SummaryState::None;
    }

    /// Record a successful summary fetch result
    pub fn set_summary(&mut self, summary: Value) {
        self.summary = Some(summary);
        self.summary_state = SummaryState::Ready;
    }

    /// Record a failed summary fetch: back to `None`, summary unset.
    ///
    /// The summary reflects the most recent completed fetch, so a failure
    /// discards any earlier result rather than keeping it around stale.
    pub fn fail_summary(&mut self) {
        self.summary = None;
        self.summary_state = SummaryState::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::mask::{Bounds, Mask};
    use serde_json::json;

    fn test_mask() -> Mask {
        Mask::from_bounds(Bounds { south: 0.0, west: 0.0, north: 1.0, east: 1.0 })
    }

    #[test]
    fn test_generation_monotone() {
        let mut card = LayerCard::new("ndvi");
        assert_eq!(card.generation(), 0);
        assert_eq!(card.bump_generation(), 1);
        assert_eq!(card.bump_generation(), 2);
        assert_eq!(card.generation(), 2);
    }

    #[test]
    fn test_clear_mask_resets_summary() {
        let mut card = LayerCard::new("ndvi").with_mask_capability().with_summary_capability();
        card.set_mask(test_mask());
        card.summary_state = SummaryState::Loading;
        card.set_summary(json!({"mean": 0.42}));
        assert_eq!(card.summary_state, SummaryState::Ready);
        assert!(card.has_mask());

        card.clear_mask();
        assert!(!card.has_mask());
        assert!(card.summary.is_none());
        assert_eq!(card.summary_state, SummaryState::None);
    }

    #[test]
    fn test_fail_summary_discards_previous_result() {
        let mut card = LayerCard::new("ndvi").with_summary_capability();
        card.summary_state = SummaryState::Loading;
        card.fail_summary();
        assert_eq!(card.summary_state, SummaryState::None);
        assert!(card.summary.is_none());

        // Summary tracks the most recent completion: failure after an
        // earlier success leaves it unset
        card.set_summary(json!(1));
        card.summary_state = SummaryState::Loading;
        card.fail_summary();
        assert_eq!(card.summary_state, SummaryState::None);
        assert!(card.summary.is_none());
    }

    #[test]
    fn test_opacity_clamped() {
        assert_eq!(LayerCard::new("a").with_opacity(1.5).opacity, 1.0);
        assert_eq!(LayerCard::new("a").with_opacity(-0.2).opacity, 0.0);
    }
}
