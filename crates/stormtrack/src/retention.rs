//! Carry forward storms that received no update this run.

use chrono::{DateTime, Duration, Utc};

use crate::storm::{LegacyStorm, StormList};

/// Whether a previously known storm survived the retention check.
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionDecision {
    /// Storm code, or the name for legacy records
    pub storm: String,
    pub last_updated: DateTime<Utc>,
    pub retained: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct RetentionMerger {
    window: Duration,
}

impl RetentionMerger {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Windows beyond chrono's range saturate to the maximum.
    pub fn from_days(days: i64) -> Self {
        Self::new(Duration::try_days(days).unwrap_or(Duration::MAX))
    }

    /// Retained while `now` is strictly before `last_updated + window`.
    pub fn is_retained(&self, last_updated: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        last_updated
            .checked_add_signed(self.window)
            .is_none_or(|expiry| now < expiry)
    }

    /// Append previous storms missing from `active`, in previous-list order.
    pub fn merge(
        &self,
        previous: &StormList,
        mut active: StormList,
        now: DateTime<Utc>,
    ) -> (StormList, Vec<RetentionDecision>) {
        let mut decisions = Vec::new();

        for storm in previous.iter() {
            if active.contains(&storm.code) {
                continue;
            }
            let retained = self.is_retained(storm.last_updated, now);
            if retained {
                log::info!("Retaining {} (last updated {})", storm.code, storm.last_updated);
                active.upsert(storm.clone());
            } else {
                log::info!("Pruning {} (last updated {})", storm.code, storm.last_updated);
            }
            decisions.push(RetentionDecision {
                storm: storm.code.clone(),
                last_updated: storm.last_updated,
                retained,
            });
        }

        (active, decisions)
    }

    /// Same rule for records without a code; `consumed` names were
    /// superseded by a coded storm this run and are dropped.
    pub fn merge_legacy(
        &self,
        legacy: &[LegacyStorm],
        consumed: &[String],
        now: DateTime<Utc>,
    ) -> (Vec<LegacyStorm>, Vec<RetentionDecision>) {
        let mut kept = Vec::new();
        let mut decisions = Vec::new();

        for record in legacy {
            if consumed.iter().any(|name| record.matches_name(name)) {
                continue;
            }
            let retained = self.is_retained(record.last_updated, now);
            if retained {
                log::warn!(
                    "Retaining legacy record '{}' without a storm code; backfill required",
                    record.name
                );
                kept.push(record.clone());
            } else {
                log::info!("Pruning legacy record '{}'", record.name);
            }
            decisions.push(RetentionDecision {
                storm: record.name.clone(),
                last_updated: record.last_updated,
                retained,
            });
        }

        (kept, decisions)
    }
}
