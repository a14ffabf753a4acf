//! Sidebar controller - card registry, mask pipeline and render sync.
//!
//! **Architecture**: the controller owns all mutable state (card list,
//! registry, panel flags) and is the sole writer. Fetches run on the
//! [`FetchPool`]; workers send [`FetchCompletion`] messages back over a
//! channel and `pump()` is the single place where they are applied. Call
//! `pump()` from the owning thread's update loop.
//!
//! **Staleness**: every input change bumps the affected card's generation,
//! every fetch job is stamped with the generation at issue time, and
//! `pump()` drops any completion whose stamp no longer matches. Completions
//! may arrive in any order; the last committed configuration always wins
//! visually. There is no cancellation - superseded fetches run to completion
//! and their results are discarded at apply time.
//!
//! **Failure isolation**: a failed layer fetch keeps the previous handle
//! (last-good-value); a failed summary fetch leaves the summary unset. No
//! retries - the next config or mask change is the only retry path. Nothing
//! is fatal to the controller.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, error, trace, warn};
use serde_json::Value;

use crate::config::SidebarConfig;
use crate::entities::{LayerCard, Mask, SummaryState};

use super::events::{SidebarEvent, SidebarEventSender};
use super::fetch::{FetchCompletion, FetchOutcome, LayerFetcher};
use super::registry::LayerRegistry;
use super::surface::{LayerHandle, MapSurface, Visibility};
use super::workers::FetchPool;

/// Which sidebar panel is expanded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Panel {
    /// The per-card summary panel (auto-expanded on summary arrival)
    Summary,
}

/// The layer synchronization engine.
pub struct SidebarController {
    cards: Vec<LayerCard>,
    registry: LayerRegistry,
    surface: Option<Box<dyn MapSurface>>,
    fetcher: Arc<dyn LayerFetcher>,
    pool: FetchPool,
    completions_tx: Sender<FetchCompletion>,
    completions_rx: Receiver<FetchCompletion>,
    events: SidebarEventSender,

    /// Active non-empty mask, if any
    mask: Option<Mask>,
    expanded: Option<Panel>,
    is_loading: bool,
    collapsed: bool,
}

impl SidebarController {
    pub fn new(fetcher: Arc<dyn LayerFetcher>, config: &SidebarConfig) -> Self {
        let (completions_tx, completions_rx) = unbounded();
        Self {
            cards: Vec::new(),
            registry: LayerRegistry::new(),
            surface: None,
            fetcher,
            pool: FetchPool::new(config.fetch_threads),
            completions_tx,
            completions_rx,
            events: SidebarEventSender::dummy(),
            mask: None,
            expanded: None,
            is_loading: false,
            collapsed: config.start_collapsed,
        }
    }

    /// Connect the upward notification channel (mask-changed, mask-presence)
    pub fn set_event_sender(&mut self, events: SidebarEventSender) {
        self.events = events;
    }

    // ========== Inbound change events ==========

    /// Replace the active card list.
    ///
    /// Registry entries whose id vanished are evicted and their handles
    /// removed from the surface; cards whose id persists keep their live
    /// handle. New cards get a pane and an initial layer fetch when a
    /// surface is attached.
    ///
    /// Incoming card objects carry no mask state, so an active mask is
    /// re-applied to every mask-capable card before any fetch is issued,
    /// and summary-capable ones get a fresh summary fetch over it.
    pub fn set_cards(&mut self, cards: Vec<LayerCard>) {
        debug!("card list replaced: {} cards", cards.len());
        let evicted = self.registry.retain_cards(cards.iter().map(|c| c.id.as_str()));
        if let Some(surface) = self.surface.as_deref_mut() {
            for handle in &evicted {
                surface.remove_layer(handle);
            }
        }
        self.cards = cards;

        if let Some(mask) = self.mask.clone() {
            for card in self.cards.iter_mut().filter(|c| c.mask_capable) {
                card.set_mask(mask.clone());
            }
        }

        if self.surface.is_some() {
            for idx in 0..self.cards.len() {
                if self.registry.contains(&self.cards[idx].id) {
                    continue;
                }
                self.cards[idx].bump_generation();
                let snapshot = self.cards[idx].clone();
                if let Some(surface) = self.surface.as_deref_mut() {
                    if !surface.has_pane(&snapshot.id) {
                        surface.create_pane(&snapshot.id);
                    }
                }
                self.schedule_layer_fetch(&snapshot);
            }
        }

        if self.mask.is_some() {
            for idx in 0..self.cards.len() {
                if self.cards[idx].mask_capable && self.cards[idx].summary_capable {
                    self.schedule_summary_fetch(idx);
                }
            }
        }
        self.is_loading = self.any_loading();
    }

    /// Assign (or replace) the map surface.
    ///
    /// Creates one pane per card id and issues an initial layer fetch for
    /// every card. Replacing the surface re-stamps every card so completions
    /// issued against the old surface are dropped.
    pub fn attach_surface(&mut self, mut surface: Box<dyn MapSurface>) {
        debug!("map surface attached ({} cards)", self.cards.len());
        for card in &self.cards {
            if !surface.has_pane(&card.id) {
                surface.create_pane(&card.id);
            }
        }
        self.surface = Some(surface);

        for idx in 0..self.cards.len() {
            self.cards[idx].bump_generation();
            let snapshot = self.cards[idx].clone();
            self.schedule_layer_fetch(&snapshot);
        }
    }

    // ========== Mask pipeline ==========

    /// Capture the current viewport as the active mask.
    ///
    /// Sweeps leftover drawing overlays off the surface first, then emits
    /// the mask-changed and mask-presence notifications and fans the mask
    /// out to every mask-capable card.
    pub fn capture_viewport_as_mask(&mut self) -> Result<()> {
        let surface = self.surface.as_deref_mut().context("no map surface attached")?;
        surface.remove_draw_artifacts();
        let mask = Mask::from_bounds(surface.bounds());

        self.events.emit(SidebarEvent::MaskChanged { geojson: mask.to_geojson_string() });
        self.events.emit(SidebarEvent::MaskPresence { present: true });

        self.set_mask(mask);
        Ok(())
    }

    /// Activate the surface's interactive polygon drawing tool
    pub fn start_draw(&mut self) -> Result<()> {
        let surface = self.surface.as_deref_mut().context("no map surface attached")?;
        surface.start_polygon_draw();
        Ok(())
    }

    /// Apply a mask to every mask-capable card.
    ///
    /// Non-empty: bump generation, set the mask, issue a layer re-fetch and
    /// (if summary-capable) a summary fetch - both issued immediately, in
    /// card-list order, without waiting on each other.
    ///
    /// Empty: clear every mask-capable card's mask and summary, collapse the
    /// summary panel, and issue layer re-fetches only.
    ///
    /// No-op when the card list is empty.
    pub fn set_mask(&mut self, mask: Mask) {
        if self.cards.is_empty() {
            debug!("mask change ignored: card list is empty");
            return;
        }

        if mask.is_empty() {
            debug!("clearing mask");
            self.mask = None;
            if self.expanded == Some(Panel::Summary) {
                self.expanded = None;
            }
            for idx in 0..self.cards.len() {
                if !self.cards[idx].mask_capable {
                    continue;
                }
                let card = &mut self.cards[idx];
                card.bump_generation();
                card.clear_mask();
                let snapshot = self.cards[idx].clone();
                self.schedule_layer_fetch(&snapshot);
            }
        } else {
            debug!("applying mask ({} ring points)", mask.ring().len());
            self.mask = Some(mask.clone());
            for idx in 0..self.cards.len() {
                if !self.cards[idx].mask_capable {
                    continue;
                }
                {
                    let card = &mut self.cards[idx];
                    card.bump_generation();
                    card.set_mask(mask.clone());
                }
                let snapshot = self.cards[idx].clone();
                self.schedule_layer_fetch(&snapshot);
                if self.cards[idx].summary_capable {
                    self.schedule_summary_fetch(idx);
                }
            }
        }
        self.is_loading = self.any_loading();
    }

    // ========== Per-card configuration changes ==========

    /// Change a card's opacity and restyle its pane. No re-fetch.
    pub fn set_opacity(&mut self, id: &str, opacity: f32) -> Result<()> {
        let card = self.card_mut(id)?;
        card.opacity = opacity.clamp(0.0, 1.0);
        self.style_layer(id);
        Ok(())
    }

    /// Change a card's visibility and restyle its pane. No re-fetch.
    pub fn set_visible(&mut self, id: &str, show: bool) -> Result<()> {
        let card = self.card_mut(id)?;
        card.visible = show;
        self.style_layer(id);
        Ok(())
    }

    /// Change a card's palette: invalidates the rendered layer, re-fetch.
    pub fn set_palette(&mut self, id: &str, palette: impl Into<String>) -> Result<()> {
        let card = self.card_mut(id)?;
        card.palette = palette.into();
        card.bump_generation();
        let snapshot = card.clone();
        self.schedule_layer_fetch(&snapshot);
        Ok(())
    }

    /// Change a card's value selection: re-fetch the layer, and when a
    /// non-empty mask is set on a summary-capable card, re-fetch the summary
    /// as well.
    pub fn set_values(&mut self, id: &str, values: Value) -> Result<()> {
        let idx = self
            .cards
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| anyhow!("card '{}' not found", id))?;
        {
            let card = &mut self.cards[idx];
            card.values = values;
            card.bump_generation();
        }
        let snapshot = self.cards[idx].clone();
        self.schedule_layer_fetch(&snapshot);
        if snapshot.summary_capable && snapshot.has_mask() {
            self.schedule_summary_fetch(idx);
        }
        self.is_loading = self.any_loading();
        Ok(())
    }

    // ========== Render sync ==========

    /// Apply the card's opacity and visibility to its pane.
    ///
    /// Idempotent; must be re-applied after every successful layer install
    /// since a new handle replaces the pane content but not its style.
    /// An unknown id is a logic error: asserts in debug builds, logged no-op
    /// in release.
    pub fn style_layer(&mut self, id: &str) {
        let Some(card) = self.cards.iter().find(|c| c.id == id).cloned() else {
            debug_assert!(false, "style_layer: unknown card id '{}'", id);
            warn!("style_layer: unknown card id '{}'", id);
            return;
        };
        if let Some(surface) = self.surface.as_deref_mut() {
            Self::style_pane(surface, &card);
        }
    }

    /// Drain and apply pending fetch completions. Returns how many were
    /// applied (stale or failed completions don't count).
    ///
    /// Call from the owning thread's update loop; this is the only place
    /// fetch results touch controller state.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            if self.apply_completion(completion) {
                applied += 1;
            }
        }
        applied
    }

    // ========== Accessors ==========

    pub fn cards(&self) -> &[LayerCard] {
        &self.cards
    }

    pub fn card(&self, id: &str) -> Option<&LayerCard> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    /// Live handles in card-list order
    pub fn snapshot(&self) -> Vec<LayerHandle> {
        self.registry.snapshot(self.cards.iter().map(|c| c.id.as_str()))
    }

    /// Active non-empty mask
    pub fn mask(&self) -> Option<&Mask> {
        self.mask.as_ref()
    }

    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }

    pub fn expanded(&self) -> Option<Panel> {
        self.expanded
    }

    /// True while any summary fetch is outstanding
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }

    /// Single-card sidebar (affects how the host lays the panel out)
    pub fn is_single(&self) -> bool {
        self.cards.len() == 1
    }

    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    // ========== Internals ==========

    fn card_mut(&mut self, id: &str) -> Result<&mut LayerCard> {
        self.cards
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| anyhow!("card '{}' not found", id))
    }

    fn any_loading(&self) -> bool {
        self.cards.iter().any(|c| c.summary_state == SummaryState::Loading)
    }

    fn style_pane(surface: &mut dyn MapSurface, card: &LayerCard) {
        surface.set_pane_style(&card.id, "opacity", &card.opacity.to_string());
        surface.set_pane_style(
            &card.id,
            "visibility",
            Visibility::from_show(card.visible).as_str(),
        );
    }

    /// Queue a layer fetch for the card's current configuration.
    ///
    /// The snapshot carries the generation stamp; whatever the card looks
    /// like when the result comes back decides whether it still applies.
    fn schedule_layer_fetch(&self, card: &LayerCard) {
        trace!("issuing layer fetch for '{}' (gen {})", card.id, card.generation());
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.completions_tx.clone();
        let job_card = card.clone();
        self.pool.execute(move || {
            let outcome = FetchOutcome::Layer(fetcher.fetch_layer(&job_card));
            let _ = tx.send(FetchCompletion {
                card_id: job_card.id.clone(),
                generation: job_card.generation(),
                outcome,
            });
        });
    }

    /// Queue a summary fetch. Only valid with a non-empty mask; marks the
    /// card `Loading` and raises the shared loading indicator.
    fn schedule_summary_fetch(&mut self, idx: usize) {
        let card = &mut self.cards[idx];
        let Some(mask) = card.mask.clone().filter(|m| !m.is_empty()) else {
            debug_assert!(false, "summary fetch without a mask on '{}'", card.id);
            return;
        };
        card.summary_state = SummaryState::Loading;
        self.is_loading = true;

        trace!("issuing summary fetch for '{}' (gen {})", card.id, card.generation());
        let card_id = card.id.clone();
        let values = card.values.clone();
        let generation = card.generation();
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.completions_tx.clone();
        self.pool.execute(move || {
            let outcome = FetchOutcome::Summary(fetcher.fetch_summary(&card_id, &values, &mask));
            let _ = tx.send(FetchCompletion { card_id, generation, outcome });
        });
    }

    /// Apply one completion. Returns true if it changed state, false if it
    /// was dropped (unknown card, stale generation) or carried a failure.
    fn apply_completion(&mut self, completion: FetchCompletion) -> bool {
        let FetchCompletion { card_id, generation, outcome } = completion;

        let Some(card) = self.cards.iter_mut().find(|c| c.id == card_id) else {
            trace!("dropping completion for unknown card '{}'", card_id);
            return false;
        };
        if generation != card.generation() {
            trace!(
                "dropping stale completion for '{}' (stamped gen {}, current {})",
                card_id,
                generation,
                card.generation()
            );
            return false;
        }

        let applied = match outcome {
            FetchOutcome::Layer(Ok(handle)) => {
                trace!("installing layer for '{}' (gen {})", card_id, generation);
                if let Some(old) = self.registry.upsert(&card_id, handle.clone()) {
                    if let Some(surface) = self.surface.as_deref_mut() {
                        surface.remove_layer(&old);
                    }
                }
                if let Some(surface) = self.surface.as_deref_mut() {
                    surface.add_layer(&handle);
                    Self::style_pane(surface, card);
                }
                true
            }
            FetchOutcome::Layer(Err(e)) => {
                // Last-good-value: previous handle stays in the registry
                error!("layer fetch failed for '{}': {}", card_id, e);
                false
            }
            FetchOutcome::Summary(Ok(summary)) => {
                card.set_summary(summary);
                self.expanded = Some(Panel::Summary);
                true
            }
            FetchOutcome::Summary(Err(e)) => {
                error!("summary fetch failed for '{}': {}", card_id, e);
                card.fail_summary();
                false
            }
        };

        self.is_loading = self.any_loading();
        applied
    }
}
