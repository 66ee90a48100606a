//! Stormtrack
//!
//! Reconciles tropical-storm advisories from a public RSS feed into a
//! persistent metadata snapshot of active storms.
//!
//! # Overview
//!
//! A run:
//! - Reads wind-field advisories and records a radius (km) per storm code
//! - Creates or updates storms from best-track advisories newer than the
//!   snapshot, keeping only those whose latest position is inside the
//!   configured bounding box
//! - Annotates each accepted track with its storm's wind radius
//! - Carries forward storms without an update for up to a year
//! - Publishes the annotated tracks and the new snapshot
//!
//! # Example Config
//!
//! ```yaml
//! publish:
//!   folder: "njcoast"
//!   public: true
//!
//! bounds:
//!   lat: "20.0,50.0"
//!   lon: "-100.0,-50.0"
//!
//! retention_days: 365
//! ```

pub mod bounds;
pub mod config;
pub mod error;
pub mod feature;
pub mod feed;
pub mod local;
pub mod pipeline;
pub mod reconcile;
pub mod retention;
pub mod storm;
pub mod title;
pub mod traits;
pub mod wind;

pub use bounds::{BoundingBox, BoundsFilter};
pub use config::{BoundsConfig, ConfigError, PipelineConfig, PublishConfig};
pub use error::{ItemError, RunError};
pub use feature::{Feature, FeatureCollection, GeoPoint, RadiiValue};
pub use feed::FeedItem;
pub use local::LocalWorkspace;
pub use pipeline::{
    publish, ItemOutcome, ItemReport, Pipeline, RunOutput, RunReport, StormArtifact,
};
pub use reconcile::{Reconciliation, StormReconciler, TrackAdvisory};
pub use retention::{RetentionDecision, RetentionMerger};
pub use storm::{LegacyStorm, Snapshot, SnapshotEntry, Storm, StormList, StormRegistry};
pub use title::{parse_title, AdvisoryKind, ParsedTitle};
pub use traits::{ArtifactPublisher, ArtifactSource, FeedSource, SnapshotStore};
pub use wind::WindRadiusMap;
