//! Geographic inclusion test on a track's latest position.

use crate::feature::{FeatureCollection, GeoPoint};

/// Closed latitude/longitude box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Inclusive on all four edges.
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.lat_min
            && point.lat <= self.lat_max
            && point.lon >= self.lon_min
            && point.lon <= self.lon_max
    }
}

/// Bounds filter with an optional "always pass" override.
#[derive(Debug, Clone, Copy)]
pub struct BoundsFilter {
    bbox: BoundingBox,
    enforce: bool,
}

impl BoundsFilter {
    pub fn new(bbox: BoundingBox, enforce: bool) -> Self {
        Self { bbox, enforce }
    }

    /// Filter that admits every position.
    pub fn pass_all(bbox: BoundingBox) -> Self {
        Self::new(bbox, false)
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// False when the "always pass" override is active.
    pub fn enforces(&self) -> bool {
        self.enforce
    }

    /// Whether a storm whose latest position is `point` should be published.
    pub fn admits(&self, point: GeoPoint) -> bool {
        let inside = self.bbox.contains(point);
        if !inside && !self.enforce {
            log::debug!(
                "Point ({}, {}) outside bounds, admitted by override",
                point.lat,
                point.lon
            );
        }
        inside || !self.enforce
    }
}

/// Latest position of a track: the last feature carrying a point geometry.
///
/// Earlier positions play no part in the bounds decision.
pub fn latest_point(track: &FeatureCollection) -> Option<GeoPoint> {
    track.features.iter().rev().find_map(|f| f.point())
}
