//! Storm records, the metadata snapshot schema and the registry built from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::RunError;

/// One tracked weather system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storm {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub code: String,
    pub last_updated: DateTime<Utc>,
    #[serde(rename = "s3_base_path", default)]
    pub artifact_path: String,
}

/// Snapshot record written before storms were keyed by code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyStorm {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub last_updated: DateTime<Utc>,
    #[serde(rename = "s3_base_path", default)]
    pub artifact_path: String,
}

impl LegacyStorm {
    /// Lift into a coded record once a matching advisory supplies the code.
    pub fn with_code(&self, code: &str) -> Storm {
        Storm {
            name: self.name.clone(),
            kind: self.kind.clone(),
            code: code.to_string(),
            last_updated: self.last_updated,
            artifact_path: self.artifact_path.clone(),
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// A snapshot record in either schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotEntry {
    Current(Storm),
    Legacy(LegacyStorm),
}

/// Persisted metadata document: `{ "active_storms": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub active_storms: Vec<SnapshotEntry>,
}

impl Snapshot {
    pub fn from_json(bytes: &[u8]) -> Result<Self, RunError> {
        serde_json::from_slice(bytes)
            .map_err(|e| RunError::Snapshot(format!("Failed to decode snapshot: {}", e)))
    }

    pub fn to_json(&self) -> Result<Vec<u8>, RunError> {
        let mut body = serde_json::to_vec(self)?;
        body.push(b'\n');
        Ok(body)
    }

    /// Coded storms first, then legacy records awaiting backfill.
    pub fn from_parts(storms: &StormList, legacy: &[LegacyStorm]) -> Self {
        let active_storms = storms
            .iter()
            .cloned()
            .map(SnapshotEntry::Current)
            .chain(legacy.iter().cloned().map(SnapshotEntry::Legacy))
            .collect();
        Self { active_storms }
    }
}

/// Ordered storms with unique codes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StormList {
    #[serde(rename = "active_storms", default, deserialize_with = "null_as_empty")]
    storms: Vec<Storm>,
}

/// Runs that ended with no storms wrote `"active_storms": null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl StormList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, code: &str) -> Option<&Storm> {
        self.storms.iter().find(|s| s.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.find(code).is_some()
    }

    /// Insert, or replace the entry with the same code in place.
    ///
    /// Returns the replaced record, if any.
    pub fn upsert(&mut self, storm: Storm) -> Option<Storm> {
        match self.storms.iter_mut().find(|s| s.code == storm.code) {
            Some(existing) => Some(std::mem::replace(existing, storm)),
            None => {
                self.storms.push(storm);
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Storm> {
        self.storms.iter()
    }

    pub fn len(&self) -> usize {
        self.storms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storms.is_empty()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.storms.iter().map(|s| s.code.as_str()).collect()
    }
}

impl FromIterator<Storm> for StormList {
    fn from_iter<I: IntoIterator<Item = Storm>>(iter: I) -> Self {
        let mut list = StormList::new();
        for storm in iter {
            list.upsert(storm);
        }
        list
    }
}

/// Previously published storms, resolved into code-keyed form.
#[derive(Debug, Clone, Default)]
pub struct StormRegistry {
    storms: StormList,
    legacy: Vec<LegacyStorm>,
}

impl StormRegistry {
    /// Resolve both schemas once.
    ///
    /// Duplicate codes collapse to the most recent record. Records without
    /// a code are set aside for backfill; no code is invented for them.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut registry = StormRegistry::default();

        for entry in snapshot.active_storms {
            let storm = match entry {
                SnapshotEntry::Current(storm) if !storm.code.trim().is_empty() => storm,
                SnapshotEntry::Current(storm) => {
                    registry.push_legacy(LegacyStorm {
                        name: storm.name,
                        kind: storm.kind,
                        last_updated: storm.last_updated,
                        artifact_path: storm.artifact_path,
                    });
                    continue;
                }
                SnapshotEntry::Legacy(legacy) => {
                    registry.push_legacy(legacy);
                    continue;
                }
            };

            let keep_existing = registry
                .storms
                .find(&storm.code)
                .map(|existing| existing.last_updated >= storm.last_updated);
            if keep_existing.is_some() {
                log::warn!(
                    "Duplicate snapshot entry for {}, keeping the most recent record",
                    storm.code
                );
            }
            if keep_existing != Some(true) {
                registry.storms.upsert(storm);
            }
        }

        registry
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, RunError> {
        Snapshot::from_json(bytes).map(Self::from_snapshot)
    }

    fn push_legacy(&mut self, legacy: LegacyStorm) {
        log::warn!(
            "Snapshot entry '{}' has no storm code and needs a manual backfill",
            legacy.name
        );
        self.legacy.push(legacy);
    }

    pub fn find(&self, code: &str) -> Option<&Storm> {
        self.storms.find(code)
    }

    /// Legacy record whose name matches, ignoring case.
    pub fn find_legacy(&self, name: &str) -> Option<&LegacyStorm> {
        self.legacy.iter().find(|l| l.matches_name(name))
    }

    pub fn storms(&self) -> &StormList {
        &self.storms
    }

    pub fn legacy(&self) -> &[LegacyStorm] {
        &self.legacy
    }
}
