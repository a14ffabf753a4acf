//! Map surface boundary - the trait the controller drives the map through.
//!
//! The rendering surface (pan/zoom, tiles, drawing tools) is an external
//! collaborator. The controller only needs the operations below: pane
//! management, layer install/remove, viewport bounds, drawing-tool control
//! and a style setter. Implementations live with whatever map binding the
//! host application uses; tests use an in-memory fake.

use std::any::Any;
use std::sync::Arc;

use crate::entities::Bounds;

/// Opaque rendered-layer object returned by the fetch capability.
///
/// The controller never interprets the payload beyond install/style/remove.
/// Cloning is cheap (shared Arc); identity is pointer identity, which is what
/// makes registry replacement idempotent.
#[derive(Clone)]
pub struct LayerHandle {
    inner: Arc<dyn Any + Send + Sync>,
}

impl LayerHandle {
    /// Wrap an arbitrary payload produced by the fetch capability
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self { inner: Arc::new(payload) }
    }

    /// Downcast to the concrete payload type (surface implementations only)
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Same underlying rendered object?
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for LayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerHandle")
            .field("ptr", &Arc::as_ptr(&self.inner))
            .finish()
    }
}

/// Pane visibility, mapped to the surface's visible/hidden style value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    pub fn from_show(show: bool) -> Self {
        if show { Visibility::Visible } else { Visibility::Hidden }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::Hidden => "hidden",
        }
    }
}

/// External map surface capability.
///
/// The controller is the sole caller; all methods are invoked from the
/// controller's thread only, so implementations need no internal locking
/// for controller-driven state.
pub trait MapSurface {
    /// Current visible viewport bounds
    fn bounds(&self) -> Bounds;

    /// Install a rendered layer
    fn add_layer(&mut self, handle: &LayerHandle);

    /// Remove a previously installed layer
    fn remove_layer(&mut self, handle: &LayerHandle);

    /// Sweep leftover interactive drawing overlays off the map.
    ///
    /// Called before viewport capture so drawing artifacts never persist as
    /// layers.
    fn remove_draw_artifacts(&mut self);

    /// Create the named per-card pane. Must be a no-op if it already exists.
    fn create_pane(&mut self, name: &str);

    /// Whether the named pane exists
    fn has_pane(&self, name: &str) -> bool;

    /// Set a style property ("opacity", "visibility") on the named pane
    fn set_pane_style(&mut self, name: &str, property: &str, value: &str);

    /// Activate the interactive polygon drawing tool
    fn start_polygon_draw(&mut self);
}
