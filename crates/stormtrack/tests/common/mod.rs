//! Fixtures for workspace-level pipeline scenarios

#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use stormtrack::local::{CONVERTED_DIR, FEED_FILE, PUBLISH_DIR, SNAPSHOT_FILE};
use stormtrack::FeedItem;

/// Temporary directory laid out like a production workspace.
pub struct TestWorkspace {
    dir: TempDir,
    feed: Vec<FeedItem>,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp workspace");
        fs::create_dir_all(dir.path().join(CONVERTED_DIR)).expect("create converted dir");
        let workspace = Self {
            dir,
            feed: Vec::new(),
        };
        workspace.write_feed();
        workspace
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn with_snapshot(self, snapshot: Value) -> Self {
        fs::write(
            self.path().join(SNAPSHOT_FILE),
            serde_json::to_vec_pretty(&snapshot).unwrap(),
        )
        .unwrap();
        self
    }

    /// Add a feed item and the converter output for its archive.
    pub fn with_item(mut self, item: FeedItem, converted: Option<Value>) -> Self {
        if let Some(collection) = converted {
            let stem = item.file_stem().expect("link has a file name");
            fs::write(
                self.path()
                    .join(CONVERTED_DIR)
                    .join(format!("{}.geojson", stem)),
                serde_json::to_vec(&collection).unwrap(),
            )
            .unwrap();
        }
        self.feed.push(item);
        self.write_feed();
        self
    }

    fn write_feed(&self) {
        fs::write(
            self.path().join(FEED_FILE),
            serde_json::to_vec_pretty(&self.feed).unwrap(),
        )
        .unwrap();
    }

    pub fn published_path(&self, key: &str) -> PathBuf {
        self.path().join(PUBLISH_DIR).join(key)
    }

    pub fn read_published(&self, key: &str) -> Value {
        let bytes = fs::read(self.published_path(key)).expect("published blob exists");
        serde_json::from_slice(&bytes).unwrap()
    }

    pub fn has_published(&self) -> bool {
        self.path().join(PUBLISH_DIR).exists()
    }

    /// Make the last published metadata the input of the next run.
    pub fn promote_published_metadata(&self) {
        fs::copy(
            self.published_path("metadata.json"),
            self.path().join(SNAPSHOT_FILE),
        )
        .unwrap();
    }
}

pub fn track_item(name: &str, code: &str, published: &str) -> FeedItem {
    FeedItem::new(
        format!(
            "Preliminary Best Track Points [kmz] - Tropical Storm {} (AT1/{})",
            name, code
        ),
        format!(
            "https://www.nhc.noaa.gov/gis/best_track/{}_best_track.kmz",
            code.to_lowercase()
        ),
        published,
    )
}

pub fn wind_item(name: &str, code: &str, published: &str) -> FeedItem {
    FeedItem::new(
        format!(
            "Advisory #002 Wind Field [shp] - Tropical Storm {} (AT1/{})",
            name, code
        ),
        format!(
            "https://www.nhc.noaa.gov/gis/forecast/archive/{}_fcst_002.zip",
            code.to_lowercase()
        ),
        published,
    )
}

/// Track points as (lat, lon), oldest first.
pub fn track(points: &[(f64, f64)]) -> Value {
    let features: Vec<_> = points
        .iter()
        .enumerate()
        .map(|(i, (lat, lon))| {
            json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [lon, lat]},
                "properties": {"name": format!("point {}", i), "STORMTYPE": "TS"}
            })
        })
        .collect();
    json!({"type": "FeatureCollection", "name": "track", "features": features})
}

pub fn wind(radii: Value) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": null, "properties": {"RADII": 64}},
            {"type": "Feature", "geometry": null, "properties": {"RADII": radii}}
        ]
    })
}

pub fn storm_record(name: &str, code: &str, last_updated: &str) -> Value {
    json!({
        "name": name,
        "type": "H",
        "code": code,
        "last_updated": last_updated,
        "s3_base_path": format!("https://s3.amazonaws.com/simulation.njcoast.us/storm/{}/0/", code)
    })
}
