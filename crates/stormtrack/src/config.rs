//! Pipeline configuration loaded from YAML.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::bounds::BoundingBox;

/// Root configuration for a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Where artifacts and the metadata snapshot are published
    #[serde(default)]
    pub publish: PublishConfig,

    /// Geographic inclusion filter
    #[serde(default)]
    pub bounds: BoundsConfig,

    /// Days a storm stays in the snapshot after its last update
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    /// Type tag assigned to newly created storms
    #[serde(default = "default_storm_kind")]
    pub storm_kind: String,
}

fn default_retention_days() -> i64 {
    365
}

fn default_storm_kind() -> String {
    "H".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            publish: PublishConfig::default(),
            bounds: BoundsConfig::default(),
            retention_days: default_retention_days(),
            storm_kind: default_storm_kind(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// An empty document yields the defaults.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retention_days <= 0 {
            return Err(ConfigError::Parse(format!(
                "retention_days must be positive, got {}",
                self.retention_days
            )));
        }
        if chrono::Duration::try_days(self.retention_days).is_none() {
            return Err(ConfigError::Parse(format!(
                "retention_days out of range: {}",
                self.retention_days
            )));
        }
        self.bounds.bounding_box()?;
        Ok(())
    }
}

/// Publication layout: base URL, key folder and visibility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Public URL prefix of the bucket
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Folder inside the bucket that holds this deployment's data
    #[serde(default = "default_folder")]
    pub folder: String,

    /// Publish blobs world-readable
    #[serde(default = "default_public")]
    pub public: bool,
}

fn default_base_url() -> String {
    "https://s3.amazonaws.com/simulation.njcoast.us".to_string()
}

fn default_folder() -> String {
    "/".to_string()
}

fn default_public() -> bool {
    true
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            folder: default_folder(),
            public: default_public(),
        }
    }
}

impl PublishConfig {
    fn folder_segments(&self) -> Vec<&str> {
        self.folder.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Key prefix for one storm update: `<folder>/storm/<code>/<unix-ts>`
    pub fn storm_prefix(&self, code: &str, unix_ts: i64) -> String {
        let ts = unix_ts.to_string();
        let mut segments = self.folder_segments();
        segments.extend(["storm", code, ts.as_str()]);
        segments.join("/")
    }

    /// Public base path recorded on the storm (`s3_base_path`).
    pub fn artifact_path(&self, code: &str, unix_ts: i64) -> String {
        format!(
            "{}/{}/",
            self.base_url.trim_end_matches('/'),
            self.storm_prefix(code, unix_ts)
        )
    }

    /// Object key of the annotated track artifact.
    pub fn artifact_key(&self, code: &str, unix_ts: i64) -> String {
        format!("{}/input.geojson", self.storm_prefix(code, unix_ts))
    }

    /// Object key of the metadata snapshot.
    pub fn metadata_key(&self) -> String {
        let mut segments = self.folder_segments();
        segments.push("metadata.json");
        segments.join("/")
    }
}

/// Bounds filter settings.
///
/// Ranges are written as `"min,max"` strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundsConfig {
    #[serde(default = "default_lat")]
    pub lat: String,

    #[serde(default = "default_lon")]
    pub lon: String,

    /// When false every storm passes regardless of position
    #[serde(default = "default_enforce")]
    pub enforce: bool,
}

fn default_lat() -> String {
    "0.0,90.0".to_string()
}

fn default_lon() -> String {
    "-180.0,180.0".to_string()
}

fn default_enforce() -> bool {
    true
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            lat: default_lat(),
            lon: default_lon(),
            enforce: default_enforce(),
        }
    }
}

impl BoundsConfig {
    /// Parse the configured ranges into a box.
    pub fn bounding_box(&self) -> Result<BoundingBox, ConfigError> {
        let (lat_min, lat_max) = parse_range("lat", &self.lat)?;
        let (lon_min, lon_max) = parse_range("lon", &self.lon)?;
        Ok(BoundingBox {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        })
    }
}

fn parse_range(axis: &str, value: &str) -> Result<(f64, f64), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBounds {
        axis: axis.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let (min, max) = value.split_once(',').ok_or_else(|| invalid("expected 'min,max'"))?;
    let min: f64 = min.trim().parse().map_err(|_| invalid("min is not a number"))?;
    let max: f64 = max.trim().parse().map_err(|_| invalid("max is not a number"))?;
    if min > max {
        return Err(invalid("min is greater than max"));
    }
    Ok((min, max))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid {axis} bounds '{value}': {reason}")]
    InvalidBounds {
        axis: String,
        value: String,
        reason: String,
    },
}
