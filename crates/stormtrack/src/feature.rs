//! GeoJSON feature collections produced by the format converter.
//!
//! Collections are treated as opaque except for the few members the
//! pipeline reads or writes. Unknown members are kept so an annotated
//! artifact serializes back with everything it arrived with.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_type")]
    pub kind: String,

    #[serde(default)]
    pub features: Vec<Feature>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn collection_type() -> String {
    "FeatureCollection".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,

    #[serde(default)]
    pub geometry: Option<Value>,

    #[serde(default)]
    pub properties: Option<Map<String, Value>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn feature_type() -> String {
    "Feature".to_string()
}

/// A position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl Feature {
    /// Read a `Point` geometry. GeoJSON orders coordinates `[lon, lat]`.
    pub fn point(&self) -> Option<GeoPoint> {
        let geometry = self.geometry.as_ref()?.as_object()?;
        if geometry.get("type")?.as_str()? != "Point" {
            return None;
        }
        let coords = geometry.get("coordinates")?.as_array()?;
        let lon = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;
        Some(GeoPoint { lat, lon })
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.as_ref()?.get(name)
    }

    pub fn set_property(&mut self, name: &str, value: Value) {
        self.properties
            .get_or_insert_with(Map::new)
            .insert(name.to_string(), value);
    }
}

impl FeatureCollection {
    /// Set a property on the final feature. Returns false when the
    /// collection is empty.
    pub fn annotate_last(&mut self, name: &str, value: Value) -> bool {
        match self.features.last_mut() {
            Some(feature) => {
                feature.set_property(name, value);
                true
            }
            None => false,
        }
    }
}

/// Numeric property as the converter encoded it.
///
/// Shapefile attributes come through either as floating-point or integer
/// JSON numbers; the encoding is captured once when the property is read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadiiValue {
    Float(f64),
    Integer(i64),
}

impl RadiiValue {
    /// Classify a JSON value. Non-numeric values yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let Value::Number(number) = value else {
            return None;
        };
        if number.is_f64() {
            number.as_f64().map(RadiiValue::Float)
        } else {
            number.as_i64().map(RadiiValue::Integer)
        }
    }

    /// Raw value in nautical miles.
    ///
    /// The floating-point reading wins; the integer reading is used only
    /// when the floating-point reading is zero.
    pub fn nautical_miles(self) -> f64 {
        let float_read = match self {
            RadiiValue::Float(value) => value,
            RadiiValue::Integer(_) => 0.0,
        };
        if float_read != 0.0 {
            return float_read;
        }
        match self {
            RadiiValue::Integer(value) => value as f64,
            RadiiValue::Float(_) => 0.0,
        }
    }
}
