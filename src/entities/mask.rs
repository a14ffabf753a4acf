//! Mask polygon - the spatial constraint applied to mask-capable cards.
//!
//! A mask is a single closed ring of (lon, lat) pairs. It is either produced
//! by the map's drawing tool or captured from the current viewport bounds.
//! The wire format is a GeoJSON Feature with a Polygon geometry, which is
//! what the fetch capability consumes verbatim.
//!
//! An empty mask is a first-class value: applying it means "clear the mask",
//! which resets summaries on every mask-capable card.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Geographic bounding box of the visible viewport.
///
/// Degrees; `south <= north` and `west <= east` are the caller's
/// responsibility (the map surface reports them that way).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

/// Single-ring polygon mask in (lon, lat) pairs, closed.
///
/// Invariant: `ring` is either empty (the "clear" payload) or a closed ring -
/// at least 4 points with the first repeated as the last. Constructors
/// enforce closure; the ring is never mutated after construction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    ring: Vec<[f64; 2]>,
}

impl Mask {
    /// The empty mask ("no spatial constraint, clear summaries").
    pub fn empty() -> Self {
        Self { ring: Vec::new() }
    }

    /// Build a mask from a drawn ring of (lon, lat) points.
    ///
    /// Closes the ring if the drawing tool left it open. Fewer than 3
    /// distinct points cannot form a polygon and yield the empty mask.
    pub fn from_ring(mut ring: Vec<[f64; 2]>) -> Self {
        if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
            if first != last {
                ring.push(first);
            }
        }
        // A closed ring has >= 4 points (triangle + closing point)
        if ring.len() < 4 {
            return Self::empty();
        }
        Self { ring }
    }

    /// Capture viewport bounds as a mask.
    ///
    /// Ring runs counter-clockwise from the south-west corner and is closed:
    /// SW, SE, NE, NW, SW. Points are (lon, lat).
    pub fn from_bounds(bounds: Bounds) -> Self {
        let Bounds { south, west, north, east } = bounds;
        Self {
            ring: vec![
                [west, south],
                [east, south],
                [east, north],
                [west, north],
                [west, south],
            ],
        }
    }

    /// True for the "clear mask" payload.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// The coordinate ring, closed, (lon, lat) pairs. Empty for the clear payload.
    pub fn ring(&self) -> &[[f64; 2]] {
        &self.ring
    }

    /// GeoJSON Feature with a Polygon geometry (single ring).
    pub fn to_geojson(&self) -> serde_json::Value {
        json!({
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [self.ring],
            },
        })
    }

    /// Serialized GeoJSON string, as emitted in the mask-changed notification.
    pub fn to_geojson_string(&self) -> String {
        self.to_geojson().to_string()
    }
}
