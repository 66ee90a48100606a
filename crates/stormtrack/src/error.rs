//! Error types for the storm pipeline.

use thiserror::Error;

/// Failures confined to a single feed item.
///
/// The pipeline records these against the offending item and moves on to
/// the next one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ItemError {
    /// Title lacks the `NAME (BASIN/CODE)` structure
    #[error("Malformed title: {0}")]
    MalformedTitle(String),

    /// Published timestamp could not be parsed
    #[error("Malformed timestamp '{value}': {reason}")]
    MalformedTimestamp { value: String, reason: String },

    /// Expected feature property is absent or not numeric
    #[error("Missing property '{property}': {reason}")]
    MissingProperty { property: String, reason: String },

    /// Track artifact has no point geometry to evaluate
    #[error("Missing geometry: {0}")]
    MissingGeometry(String),

    /// Converted artifact could not be obtained for the item
    #[error("Artifact error: {0}")]
    Artifact(String),
}

/// Failures that abort the whole run before anything is published.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Feed error: {0}")]
    Feed(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

pub type Result<T> = std::result::Result<T, RunError>;
