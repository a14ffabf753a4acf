//! Layer registry - id-keyed store of the live rendered handles.
//!
//! One entry per card id, always the most recently applied fetch result.
//! Lookups are by id (no positional indexing); `snapshot()` orders handles
//! by the current card list, never by fetch-completion order.
//!
//! The registry itself is passive - the controller decides what gets
//! installed (generation checks happen there). The registry's own guarantees
//! are: at most one handle per id, idempotent replacement, and eviction of
//! entries whose card left the active set.

use indexmap::IndexMap;
use log::trace;

use super::surface::LayerHandle;

/// Keyed store: card id -> live rendered handle.
#[derive(Debug, Default)]
pub struct LayerRegistry {
    handles: IndexMap<String, LayerHandle>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self { handles: IndexMap::new() }
    }

    /// Install or replace the handle for `id`.
    ///
    /// Returns the superseded handle, if any, so the caller can remove it
    /// from the map surface. Re-installing the same handle is a no-op.
    pub fn upsert(&mut self, id: &str, handle: LayerHandle) -> Option<LayerHandle> {
        if let Some(existing) = self.handles.get(id) {
            if existing.same_as(&handle) {
                trace!("registry: idempotent upsert for '{}'", id);
                return None;
            }
        }
        self.handles.insert(id.to_string(), handle)
    }

    /// Evict the entry for `id`, returning its handle
    pub fn remove(&mut self, id: &str) -> Option<LayerHandle> {
        self.handles.shift_remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&LayerHandle> {
        self.handles.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.handles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Drop every entry whose id is not in `active_ids`.
    ///
    /// Returns the evicted handles so the caller can remove them from the
    /// surface. Called on card-list replacement.
    pub fn retain_cards<'a>(
        &mut self,
        active_ids: impl IntoIterator<Item = &'a str>,
    ) -> Vec<LayerHandle> {
        let keep: std::collections::HashSet<&str> = active_ids.into_iter().collect();
        let mut evicted = Vec::new();
        self.handles.retain(|id, handle| {
            if keep.contains(id.as_str()) {
                true
            } else {
                trace!("registry: evicting '{}' (card left active set)", id);
                evicted.push(handle.clone());
                false
            }
        });
        evicted
    }

    /// Handles ordered by the given card-id order, skipping ids with no
    /// handle yet. Never longer than the active card list.
    pub fn snapshot<'a>(&self, order: impl IntoIterator<Item = &'a str>) -> Vec<LayerHandle> {
        order
            .into_iter()
            .filter_map(|id| self.handles.get(id).cloned())
            .collect()
    }
}
