//! Create-or-update decision for track-point advisories.

use chrono::{DateTime, Utc};

use crate::config::PublishConfig;
use crate::storm::{Storm, StormList};

/// The parts of a track-point advisory that drive reconciliation.
#[derive(Debug, Clone, Copy)]
pub struct TrackAdvisory<'a> {
    pub code: &'a str,
    pub name: &'a str,
    pub published: DateTime<Utc>,
}

/// Outcome of reconciling one advisory against the known record.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// Advisory is not newer than the known record
    Stale { last_updated: DateTime<Utc> },
    /// No record existed for the code
    Created(Storm),
    /// Known record advanced to the advisory's timestamp
    Updated { storm: Storm, previous: Storm },
}

impl Reconciliation {
    pub fn storm(&self) -> Option<&Storm> {
        match self {
            Reconciliation::Stale { .. } => None,
            Reconciliation::Created(storm) | Reconciliation::Updated { storm, .. } => Some(storm),
        }
    }

    pub fn into_storm(self) -> Option<Storm> {
        match self {
            Reconciliation::Stale { .. } => None,
            Reconciliation::Created(storm) | Reconciliation::Updated { storm, .. } => Some(storm),
        }
    }

    /// Whether the advisory produced a record worth keeping.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Reconciliation::Stale { .. })
    }
}

/// Pure reconciliation: builds records, never touches any list.
#[derive(Debug, Clone)]
pub struct StormReconciler {
    publish: PublishConfig,
    kind: String,
}

impl StormReconciler {
    pub fn new(publish: PublishConfig, kind: impl Into<String>) -> Self {
        Self {
            publish,
            kind: kind.into(),
        }
    }

    /// Reconcile against the record found by code in `previous`.
    pub fn reconcile_in(
        &self,
        previous: &StormList,
        advisory: &TrackAdvisory<'_>,
    ) -> Reconciliation {
        self.reconcile(previous.find(advisory.code), advisory)
    }

    /// Reconcile against an already looked-up record.
    pub fn reconcile(
        &self,
        existing: Option<&Storm>,
        advisory: &TrackAdvisory<'_>,
    ) -> Reconciliation {
        let artifact_path = self
            .publish
            .artifact_path(advisory.code, advisory.published.timestamp());

        match existing {
            Some(known) if advisory.published <= known.last_updated => Reconciliation::Stale {
                last_updated: known.last_updated,
            },
            Some(known) => {
                let mut storm = known.clone();
                storm.last_updated = advisory.published;
                storm.artifact_path = artifact_path;
                Reconciliation::Updated {
                    storm,
                    previous: known.clone(),
                }
            }
            None => Reconciliation::Created(Storm {
                name: advisory.name.to_string(),
                kind: self.kind.clone(),
                code: advisory.code.to_string(),
                last_updated: advisory.published,
                artifact_path,
            }),
        }
    }
}
