//! Collaborators the pipeline consumes.
//!
//! Transport, format conversion and storage live behind these traits; the
//! pipeline itself performs no I/O.

use crate::error::{ItemError, RunError};
use crate::feature::FeatureCollection;
use crate::feed::FeedItem;
use crate::storm::Snapshot;

/// Content type of every published blob.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Ordered advisory items from the storm feed.
pub trait FeedSource {
    fn items(&mut self) -> Result<Vec<FeedItem>, RunError>;
}

/// The previously published metadata snapshot.
///
/// Failing to load it aborts the run.
pub trait SnapshotStore {
    fn load_snapshot(&self) -> Result<Snapshot, RunError>;
}

/// Converted GeoJSON for an advisory's downloaded archive.
pub trait ArtifactSource {
    /// Forecast radii layer of a wind-field advisory.
    fn wind_field(&mut self, item: &FeedItem) -> Result<FeatureCollection, ItemError>;

    /// Track points of a best-track advisory, oldest first.
    fn track_points(&mut self, item: &FeedItem) -> Result<FeatureCollection, ItemError>;
}

/// Destination for annotated artifacts and the metadata snapshot.
pub trait ArtifactPublisher {
    fn publish(
        &mut self,
        key: &str,
        body: &[u8],
        content_type: &str,
        public: bool,
    ) -> Result<(), RunError>;
}
