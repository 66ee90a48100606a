//! Wind radius derived from wind-field advisories.

use std::collections::HashMap;

use crate::error::ItemError;
use crate::feature::{FeatureCollection, RadiiValue};

/// Kilometres per nautical mile, as used by the published dataset.
pub const KM_PER_NAUTICAL_MILE: f64 = 1.852001;

/// Feature property holding the raw radius in nautical miles.
pub const RADII_PROPERTY: &str = "RADII";

/// Compute the radius in kilometres for one wind-field collection.
///
/// Every feature must carry a numeric `RADII`; the last feature wins.
pub fn radius_km(collection: &FeatureCollection) -> Result<f64, ItemError> {
    let missing = |reason: String| ItemError::MissingProperty {
        property: RADII_PROPERTY.to_string(),
        reason,
    };

    if collection.features.is_empty() {
        return Err(missing("wind field has no features".to_string()));
    }

    let mut radius = 0.0;
    for (index, feature) in collection.features.iter().enumerate() {
        let raw = feature
            .property(RADII_PROPERTY)
            .ok_or_else(|| missing(format!("absent on feature {}", index)))?;
        let value = RadiiValue::from_json(raw)
            .ok_or_else(|| missing(format!("not numeric on feature {}: {}", index, raw)))?;
        radius = value.nautical_miles() * KM_PER_NAUTICAL_MILE;
    }
    Ok(radius)
}

/// Radius per storm code for the current run.
#[derive(Debug, Clone, Default)]
pub struct WindRadiusMap {
    radii: HashMap<String, f64>,
}

impl WindRadiusMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a radius; a later advisory for the same code overwrites.
    pub fn insert(&mut self, code: impl Into<String>, radius_km: f64) {
        self.radii.insert(code.into(), radius_km);
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.radii.get(code).copied()
    }

    /// Radius for annotation; codes without a wind field read as zero.
    pub fn radius_or_zero(&self, code: &str) -> f64 {
        self.get(code).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.radii.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }
}
