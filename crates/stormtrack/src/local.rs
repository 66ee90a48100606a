//! Directory-backed collaborators.
//!
//! Layout under the workspace root:
//! - `feed.json`: array of feed items
//! - `metadata.json`: previously published snapshot
//! - `converted/<stem>.geojson`: converter output per downloaded archive
//! - `publish/<key>`: published blobs

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{ItemError, RunError};
use crate::feature::FeatureCollection;
use crate::feed::FeedItem;
use crate::storm::Snapshot;
use crate::traits::{ArtifactPublisher, ArtifactSource, FeedSource, SnapshotStore};

pub const FEED_FILE: &str = "feed.json";
pub const SNAPSHOT_FILE: &str = "metadata.json";
pub const CONVERTED_DIR: &str = "converted";
pub const PUBLISH_DIR: &str = "publish";

#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    root: PathBuf,
}

impl LocalWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the converter leaves the GeoJSON for an item's archive.
    pub fn converted_path(&self, item: &FeedItem) -> Result<PathBuf, ItemError> {
        let stem = item
            .file_stem()
            .ok_or_else(|| ItemError::Artifact(format!("link has no file name: '{}'", item.link)))?;
        Ok(self
            .root
            .join(CONVERTED_DIR)
            .join(format!("{}.geojson", stem)))
    }

    /// Local path of a published key.
    pub fn published_path(&self, key: &str) -> Result<PathBuf, RunError> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !safe {
            return Err(RunError::Publish(format!("invalid key '{}'", key)));
        }
        Ok(self.root.join(PUBLISH_DIR).join(relative))
    }

    fn read_collection(&self, item: &FeedItem) -> Result<FeatureCollection, ItemError> {
        let path = self.converted_path(item)?;
        let contents = fs::read(&path).map_err(|e| {
            ItemError::Artifact(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_slice(&contents).map_err(|e| {
            ItemError::Artifact(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

impl FeedSource for LocalWorkspace {
    fn items(&mut self) -> Result<Vec<FeedItem>, RunError> {
        let path = self.root.join(FEED_FILE);
        let contents = fs::read(&path)
            .map_err(|e| RunError::Feed(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_slice(&contents)
            .map_err(|e| RunError::Feed(format!("Failed to parse {}: {}", path.display(), e)))
    }
}

impl SnapshotStore for LocalWorkspace {
    fn load_snapshot(&self) -> Result<Snapshot, RunError> {
        let path = self.root.join(SNAPSHOT_FILE);
        let contents = fs::read(&path)
            .map_err(|e| RunError::Snapshot(format!("Failed to read {}: {}", path.display(), e)))?;
        Snapshot::from_json(&contents)
    }
}

impl ArtifactSource for LocalWorkspace {
    fn wind_field(&mut self, item: &FeedItem) -> Result<FeatureCollection, ItemError> {
        self.read_collection(item)
    }

    fn track_points(&mut self, item: &FeedItem) -> Result<FeatureCollection, ItemError> {
        self.read_collection(item)
    }
}

impl ArtifactPublisher for LocalWorkspace {
    fn publish(
        &mut self,
        key: &str,
        body: &[u8],
        content_type: &str,
        public: bool,
    ) -> Result<(), RunError> {
        let path = self.published_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RunError::Publish(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        fs::write(&path, body)
            .map_err(|e| RunError::Publish(format!("Failed to write {}: {}", path.display(), e)))?;
        log::debug!(
            "Wrote {} ({} bytes, {}, public={})",
            path.display(),
            body.len(),
            content_type,
            public
        );
        Ok(())
    }
}
