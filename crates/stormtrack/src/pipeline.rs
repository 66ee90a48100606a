//! One reconciliation pass over a feed.
//!
//! 1. Classify every item and parse its title.
//! 2. Fold wind-field items, in feed order, into a [`WindRadiusMap`].
//! 3. Fold track-point items, in feed order, into the active storm set:
//!    reconcile, fetch the converted track, bounds-check the latest
//!    position, annotate the final feature with the wind radius.
//! 4. Carry forward un-refreshed storms still inside the retention window.
//!
//! Item failures are recorded in the [`RunReport`] and never stop the run.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::bounds::{self, BoundsFilter};
use crate::config::{ConfigError, PipelineConfig, PublishConfig};
use crate::error::{ItemError, RunError};
use crate::feature::FeatureCollection;
use crate::feed::FeedItem;
use crate::reconcile::{Reconciliation, StormReconciler, TrackAdvisory};
use crate::retention::{RetentionDecision, RetentionMerger};
use crate::storm::{LegacyStorm, Snapshot, Storm, StormList, StormRegistry};
use crate::title::{self, AdvisoryKind, ParsedTitle};
use crate::traits::{
    ArtifactPublisher, ArtifactSource, FeedSource, SnapshotStore, JSON_CONTENT_TYPE,
};
use crate::wind::{self, WindRadiusMap};

/// Property written onto the final track feature.
pub const RADIUS_PROPERTY: &str = "radius";

/// What happened to a single feed item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Neither a wind-field nor a track-point advisory
    Ignored,
    RadiusRecorded { code: String, radius_km: f64 },
    Accepted { code: String, created: bool },
    Stale { code: String },
    OutOfBounds { code: String },
    Skipped(ItemError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemReport {
    /// Position in the feed
    pub index: usize,
    pub title: String,
    pub outcome: ItemOutcome,
}

/// Per-item outcomes and retention decisions for one run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub items: Vec<ItemReport>,
    pub retention: Vec<RetentionDecision>,
}

impl RunReport {
    fn record(&mut self, index: usize, item: &FeedItem, outcome: ItemOutcome) {
        match &outcome {
            ItemOutcome::Skipped(err) => log::warn!("Skipping '{}': {}", item.title, err),
            ItemOutcome::Ignored => log::debug!("Ignoring '{}'", item.title),
            other => log::debug!("'{}': {:?}", item.title, other),
        }
        self.items.push(ItemReport {
            index,
            title: item.title.clone(),
            outcome,
        });
    }

    /// Items dropped because of a structural failure.
    pub fn skipped(&self) -> Vec<&ItemReport> {
        self.items
            .iter()
            .filter(|r| matches!(r.outcome, ItemOutcome::Skipped(_)))
            .collect()
    }

    /// Codes accepted into the active set, in feed order.
    pub fn accepted(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|r| match &r.outcome {
                ItemOutcome::Accepted { code, .. } => Some(code.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn stale(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|r| match &r.outcome {
                ItemOutcome::Stale { code } => Some(code.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.skipped().is_empty()
    }
}

/// Annotated track ready for publication.
#[derive(Debug, Clone, PartialEq)]
pub struct StormArtifact {
    pub code: String,
    pub key: String,
    pub collection: FeatureCollection,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub storms: StormList,
    /// Records without a code that are still inside the retention window
    pub retained_legacy: Vec<LegacyStorm>,
    pub artifacts: Vec<StormArtifact>,
    pub report: RunReport,
}

impl RunOutput {
    /// The metadata document to persist for the next run.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_parts(&self.storms, &self.retained_legacy)
    }
}

/// Classification of one feed item.
enum Classified {
    Ignored,
    Malformed(ItemError),
    Advisory {
        kind: AdvisoryKind,
        title: ParsedTitle,
    },
}

fn classify(item: &FeedItem) -> Classified {
    match AdvisoryKind::classify(&item.title) {
        None => Classified::Ignored,
        Some(kind) => match title::parse_title(&item.title, kind) {
            Ok(title) => Classified::Advisory { kind, title },
            Err(err) => Classified::Malformed(err),
        },
    }
}

/// Accumulator for the track-point fold.
#[derive(Default)]
struct TrackState {
    active: StormList,
    artifacts: Vec<StormArtifact>,
    consumed_legacy: Vec<String>,
}

pub struct Pipeline {
    reconciler: StormReconciler,
    bounds: BoundsFilter,
    retention: RetentionMerger,
    publish: PublishConfig,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let bbox = config.bounds.bounding_box()?;
        Ok(Self {
            reconciler: StormReconciler::new(config.publish.clone(), config.storm_kind.clone()),
            bounds: BoundsFilter::new(bbox, config.bounds.enforce),
            retention: RetentionMerger::from_days(config.retention_days),
            publish: config.publish.clone(),
        })
    }

    pub fn publish_config(&self) -> &PublishConfig {
        &self.publish
    }

    /// Run one pass. Never fails: item problems land in the report.
    pub fn run<S: ArtifactSource>(
        &self,
        registry: &StormRegistry,
        items: &[FeedItem],
        source: &mut S,
        now: DateTime<Utc>,
    ) -> RunOutput {
        let mut report = RunReport::default();

        let classified: Vec<Classified> = items.iter().map(classify).collect();

        let radii = self.collect_radii(items, &classified, source, &mut report);

        let state = items.iter().zip(&classified).enumerate().fold(
            TrackState::default(),
            |state, (index, (item, classified))| match classified {
                Classified::Ignored => {
                    report.record(index, item, ItemOutcome::Ignored);
                    state
                }
                Classified::Malformed(err) => {
                    report.record(index, item, ItemOutcome::Skipped(err.clone()));
                    state
                }
                Classified::Advisory {
                    kind: AdvisoryKind::TrackPoints,
                    title,
                } => {
                    let (state, outcome) =
                        self.track_step(state, registry, item, title, &radii, source);
                    report.record(index, item, outcome);
                    state
                }
                Classified::Advisory { .. } => state,
            },
        );

        let (storms, mut retention) = self.retention.merge(registry.storms(), state.active, now);
        let (retained_legacy, legacy_retention) =
            self.retention.merge_legacy(registry.legacy(), &state.consumed_legacy, now);
        retention.extend(legacy_retention);

        report.items.sort_by_key(|r| r.index);
        report.retention = retention;

        log::info!(
            "Run complete: {} accepted, {} stale, {} skipped, {} storms in snapshot",
            report.accepted().len(),
            report.stale().len(),
            report.skipped().len(),
            storms.len() + retained_legacy.len()
        );

        RunOutput {
            storms,
            retained_legacy,
            artifacts: state.artifacts,
            report,
        }
    }

    /// Wind radius per code, later advisories overwriting earlier ones.
    fn collect_radii<S: ArtifactSource>(
        &self,
        items: &[FeedItem],
        classified: &[Classified],
        source: &mut S,
        report: &mut RunReport,
    ) -> WindRadiusMap {
        items
            .iter()
            .zip(classified)
            .enumerate()
            .fold(WindRadiusMap::new(), |mut radii, (index, (item, classified))| {
                if let Classified::Advisory {
                    kind: AdvisoryKind::WindField,
                    title,
                } = classified
                {
                    let outcome = match source
                        .wind_field(item)
                        .and_then(|fc| wind::radius_km(&fc))
                    {
                        Ok(radius_km) => {
                            log::info!("Wind radius for {}: {:.3} km", title.code, radius_km);
                            radii.insert(title.code.clone(), radius_km);
                            ItemOutcome::RadiusRecorded {
                                code: title.code.clone(),
                                radius_km,
                            }
                        }
                        Err(err) => ItemOutcome::Skipped(err),
                    };
                    report.record(index, item, outcome);
                }
                radii
            })
    }

    fn track_step<S: ArtifactSource>(
        &self,
        mut state: TrackState,
        registry: &StormRegistry,
        item: &FeedItem,
        title: &ParsedTitle,
        radii: &WindRadiusMap,
        source: &mut S,
    ) -> (TrackState, ItemOutcome) {
        let published = match item.published_at() {
            Ok(ts) => ts,
            Err(err) => return (state, ItemOutcome::Skipped(err)),
        };

        // Latest known record: accepted earlier this run, else the previous
        // snapshot, else a legacy record with the same name.
        let mut legacy_match = None;
        let known: Option<Storm> = state
            .active
            .find(&title.code)
            .or_else(|| registry.find(&title.code))
            .cloned()
            .or_else(|| {
                let legacy = registry
                    .find_legacy(&title.name)
                    .filter(|l| !state.consumed_legacy.iter().any(|n| l.matches_name(n)))?;
                legacy_match = Some(legacy.name.clone());
                Some(legacy.with_code(&title.code))
            });

        let advisory = TrackAdvisory {
            code: &title.code,
            name: &title.name,
            published,
        };
        let reconciliation = self.reconciler.reconcile(known.as_ref(), &advisory);
        let created = matches!(reconciliation, Reconciliation::Created(_));
        let storm = match reconciliation.into_storm() {
            Some(storm) => storm,
            None => {
                log::info!("Storm {} has no update newer than {}", title.code, published);
                return (
                    state,
                    ItemOutcome::Stale {
                        code: title.code.clone(),
                    },
                );
            }
        };

        let mut collection = match source.track_points(item) {
            Ok(fc) => fc,
            Err(err) => return (state, ItemOutcome::Skipped(err)),
        };

        if collection.features.is_empty() {
            let err = ItemError::MissingGeometry(format!("track for {} is empty", title.code));
            return (state, ItemOutcome::Skipped(err));
        }

        match bounds::latest_point(&collection) {
            Some(latest) if !self.bounds.admits(latest) => {
                log::info!(
                    "Storm {}({}) currently out of bounds at ({}, {})",
                    title.name,
                    title.code,
                    latest.lat,
                    latest.lon
                );
                return (
                    state,
                    ItemOutcome::OutOfBounds {
                        code: title.code.clone(),
                    },
                );
            }
            Some(_) => {}
            None if self.bounds.enforces() => {
                let err =
                    ItemError::MissingGeometry(format!("track for {} has no point", title.code));
                return (state, ItemOutcome::Skipped(err));
            }
            None => log::debug!("Track for {} has no point, admitted by override", title.code),
        }

        collection.annotate_last(RADIUS_PROPERTY, json!(radii.radius_or_zero(&title.code)));
        log::info!("Storm {}({}) currently in bounds", title.name, title.code);

        if let Some(name) = legacy_match {
            log::info!("Backfilled legacy record '{}' with code {}", name, title.code);
            state.consumed_legacy.push(name);
        }

        let artifact = StormArtifact {
            code: storm.code.clone(),
            key: self
                .publish
                .artifact_key(&storm.code, storm.last_updated.timestamp()),
            collection,
        };
        match state.artifacts.iter_mut().find(|a| a.code == artifact.code) {
            Some(existing) => *existing = artifact,
            None => state.artifacts.push(artifact),
        }
        state.active.upsert(storm);

        (
            state,
            ItemOutcome::Accepted {
                code: title.code.clone(),
                created,
            },
        )
    }

    /// Load inputs from the collaborators, run, and publish unless `dry_run`.
    pub fn execute<C>(
        &self,
        collaborators: &mut C,
        now: DateTime<Utc>,
        dry_run: bool,
    ) -> Result<RunOutput, RunError>
    where
        C: FeedSource + SnapshotStore + ArtifactSource + ArtifactPublisher,
    {
        let registry = StormRegistry::from_snapshot(collaborators.load_snapshot()?);
        log::info!(
            "Loaded snapshot with {} storms ({} without code)",
            registry.storms().len(),
            registry.legacy().len()
        );

        let items = collaborators.items()?;
        log::info!("Processing {} feed items", items.len());

        let output = self.run(&registry, &items, collaborators, now);

        if dry_run {
            log::info!("Dry run, nothing published");
        } else {
            publish(&output, collaborators, &self.publish)?;
        }
        Ok(output)
    }
}

/// Publish artifacts, then the metadata snapshot.
///
/// Every body is serialized before the first publish call, and the
/// snapshot goes last, so a failure never leaves new metadata pointing
/// at missing artifacts.
pub fn publish<P: ArtifactPublisher>(
    output: &RunOutput,
    publisher: &mut P,
    config: &PublishConfig,
) -> Result<(), RunError> {
    let metadata = output.snapshot().to_json()?;
    let artifacts = output
        .artifacts
        .iter()
        .map(|a| Ok((a.key.as_str(), serde_json::to_vec(&a.collection)?)))
        .collect::<Result<Vec<_>, RunError>>()?;

    for (key, body) in &artifacts {
        publisher.publish(key, body, JSON_CONTENT_TYPE, config.public)?;
        log::info!("Published artifact {}", key);
    }

    let metadata_key = config.metadata_key();
    publisher.publish(&metadata_key, &metadata, JSON_CONTENT_TYPE, config.public)?;
    log::info!("Published metadata {}", metadata_key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storm::SnapshotEntry;
    use chrono::TimeZone;
    use std::collections::HashMap;

    /// Collections keyed by link.
    #[derive(Default)]
    struct MemorySource {
        collections: HashMap<String, FeatureCollection>,
        requests: Vec<String>,
    }

    impl MemorySource {
        fn with(mut self, link: &str, collection: serde_json::Value) -> Self {
            self.collections
                .insert(link.to_string(), serde_json::from_value(collection).unwrap());
            self
        }

        fn fetch(&mut self, item: &FeedItem) -> Result<FeatureCollection, ItemError> {
            self.requests.push(item.link.clone());
            self.collections
                .get(&item.link)
                .cloned()
                .ok_or_else(|| ItemError::Artifact(format!("no conversion for {}", item.link)))
        }
    }

    impl ArtifactSource for MemorySource {
        fn wind_field(&mut self, item: &FeedItem) -> Result<FeatureCollection, ItemError> {
            self.fetch(item)
        }

        fn track_points(&mut self, item: &FeedItem) -> Result<FeatureCollection, ItemError> {
            self.fetch(item)
        }
    }

    fn track(points: &[(f64, f64)]) -> serde_json::Value {
        let features: Vec<_> = points
            .iter()
            .map(|(lat, lon)| {
                json!({
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [lon, lat]},
                    "properties": {}
                })
            })
            .collect();
        json!({"type": "FeatureCollection", "features": features})
    }

    fn wind(radii: serde_json::Value) -> serde_json::Value {
        json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "geometry": null, "properties": {"RADII": radii}}]
        })
    }

    fn track_item(name: &str, code: &str, published: &str) -> FeedItem {
        FeedItem::new(
            format!("Preliminary Best Track Points [kmz] - Tropical Storm {} (AT1/{})", name, code),
            format!("https://example.com/{}_best_track.kmz", code.to_lowercase()),
            published,
        )
    }

    fn wind_item(name: &str, code: &str) -> FeedItem {
        FeedItem::new(
            format!("Advisory #001 Wind Field [shp] - Tropical Storm {} (AT1/{})", name, code),
            format!("https://example.com/{}_fcst_001.zip", code.to_lowercase()),
            "Mon, 01 Jun 2020 00:00:00 GMT",
        )
    }

    fn previous(code: &str, last_updated: DateTime<Utc>) -> StormRegistry {
        StormRegistry::from_snapshot(Snapshot {
            active_storms: vec![SnapshotEntry::Current(Storm {
                name: "arthur".to_string(),
                kind: "H".to_string(),
                code: code.to_string(),
                last_updated,
                artifact_path: "old/".to_string(),
            })],
        })
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 3, 0, 0, 0).unwrap()
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(&PipelineConfig::default()).unwrap()
    }

    #[test]
    fn test_update_with_radius() {
        let registry = previous("al012020", Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap());
        let items = vec![
            track_item("Arthur", "AL012020", "Tue, 02 Jun 2020 00:00:00 GMT"),
            wind_item("Arthur", "AL012020"),
        ];
        let mut source = MemorySource::default()
            .with(&items[0].link, track(&[(30.0, -75.0), (32.0, -74.0)]))
            .with(&items[1].link, wind(json!(30)));

        let output = pipeline().run(&registry, &items, &mut source, now());

        assert_eq!(output.storms.codes(), vec!["al012020"]);
        let storm = output.storms.find("al012020").unwrap();
        assert_eq!(
            storm.last_updated,
            Utc.with_ymd_and_hms(2020, 6, 2, 0, 0, 0).unwrap()
        );

        assert_eq!(output.artifacts.len(), 1);
        let radius = output.artifacts[0].collection.features[1]
            .property(RADIUS_PROPERTY)
            .and_then(|v| v.as_f64())
            .unwrap();
        assert!((radius - 55.56003).abs() < 1e-6);
        assert!(output.artifacts[0].collection.features[0]
            .property(RADIUS_PROPERTY)
            .is_none());
        // Wind items are processed before any track item
        assert_eq!(source.requests[0], items[1].link);
    }

    #[test]
    fn test_missing_radius_annotates_zero() {
        let registry = StormRegistry::default();
        let items = vec![track_item("Bertha", "AL022020", "Tue, 02 Jun 2020 00:00:00 GMT")];
        let mut source = MemorySource::default().with(&items[0].link, track(&[(30.0, -75.0)]));

        let output = pipeline().run(&registry, &items, &mut source, now());
        assert_eq!(
            output.artifacts[0].collection.features[0].property(RADIUS_PROPERTY),
            Some(&json!(0.0))
        );
        assert_eq!(
            output.report.items[0].outcome,
            ItemOutcome::Accepted {
                code: "al022020".to_string(),
                created: true
            }
        );
    }

    #[test]
    fn test_stale_advisory_skips_download() {
        let t0 = Utc.with_ymd_and_hms(2020, 6, 2, 0, 0, 0).unwrap();
        let registry = previous("al012020", t0);
        let items = vec![track_item("Arthur", "AL012020", "Tue, 02 Jun 2020 00:00:00 GMT")];
        let mut source = MemorySource::default();

        let output = pipeline().run(&registry, &items, &mut source, now());
        assert!(source.requests.is_empty());
        assert!(output.artifacts.is_empty());
        assert_eq!(output.report.stale(), vec!["al012020"]);
        // Retained unchanged
        assert_eq!(output.storms.find("al012020").unwrap().last_updated, t0);
        assert_eq!(output.storms.find("al012020").unwrap().artifact_path, "old/");
    }

    #[test]
    fn test_failures_do_not_abort_run() {
        let registry = StormRegistry::default();
        let items = vec![
            FeedItem::new(
                "Preliminary Best Track Points [kmz] - Tropical Storm Broken",
                "https://example.com/broken.kmz",
                "Tue, 02 Jun 2020 00:00:00 GMT",
            ),
            track_item("Cristobal", "AL032020", "not a date"),
            track_item("Dolly", "AL042020", "Tue, 02 Jun 2020 00:00:00 GMT"),
            wind_item("Dolly", "AL042020"),
            track_item("Edouard", "AL052020", "Tue, 02 Jun 2020 00:00:00 GMT"),
            FeedItem::new("Some Other Product", "", ""),
        ];
        let mut source = MemorySource::default()
            .with(&items[3].link, json!({"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": null, "properties": {}}
            ]}))
            .with(&items[4].link, track(&[(25.0, -70.0)]));

        let output = pipeline().run(&registry, &items, &mut source, now());

        assert_eq!(output.storms.codes(), vec!["al052020"]);
        assert_eq!(output.report.accepted(), vec!["al052020"]);

        let skipped = output.report.skipped();
        assert_eq!(skipped.len(), 4);
        assert!(matches!(
            skipped[0].outcome,
            ItemOutcome::Skipped(ItemError::MalformedTitle(_))
        ));
        assert!(matches!(
            skipped[1].outcome,
            ItemOutcome::Skipped(ItemError::MalformedTimestamp { .. })
        ));
        assert!(matches!(
            skipped[2].outcome,
            ItemOutcome::Skipped(ItemError::Artifact(_))
        ));
        assert!(matches!(
            skipped[3].outcome,
            ItemOutcome::Skipped(ItemError::MissingProperty { .. })
        ));
        assert!(output.report.has_failures());
        assert_eq!(output.report.items.last().unwrap().outcome, ItemOutcome::Ignored);
        // Report follows feed order
        let indices: Vec<_> = output.report.items.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_out_of_bounds_not_added() {
        let registry = StormRegistry::default();
        let items = vec![track_item("Fay", "AL062020", "Tue, 02 Jun 2020 00:00:00 GMT")];
        // Started north of the equator, latest position south of it
        let mut source =
            MemorySource::default().with(&items[0].link, track(&[(5.0, -40.0), (-5.0, 0.0)]));

        let output = pipeline().run(&registry, &items, &mut source, now());
        assert!(output.storms.is_empty());
        assert!(output.artifacts.is_empty());
        assert_eq!(
            output.report.items[0].outcome,
            ItemOutcome::OutOfBounds {
                code: "al062020".to_string()
            }
        );
    }

    #[test]
    fn test_bounds_override_admits() {
        let mut config = PipelineConfig::default();
        config.bounds.enforce = false;
        let pipeline = Pipeline::new(&config).unwrap();

        let items = vec![track_item("Fay", "AL062020", "Tue, 02 Jun 2020 00:00:00 GMT")];
        let mut source = MemorySource::default().with(&items[0].link, track(&[(-5.0, 0.0)]));

        let output = pipeline.run(&StormRegistry::default(), &items, &mut source, now());
        assert_eq!(output.storms.codes(), vec!["al062020"]);
    }

    #[test]
    fn test_bounds_override_admits_track_without_points() {
        let mut config = PipelineConfig::default();
        config.bounds.enforce = false;
        let permissive = Pipeline::new(&config).unwrap();

        let items = vec![track_item("Fay", "AL062020", "Tue, 02 Jun 2020 00:00:00 GMT")];
        let line = json!({"type": "FeatureCollection", "features": [{
            "type": "Feature",
            "geometry": {"type": "LineString", "coordinates": [[-40.0, 5.0], [0.0, -5.0]]},
            "properties": {}
        }]});
        let mut source = MemorySource::default().with(&items[0].link, line.clone());

        let output = permissive.run(&StormRegistry::default(), &items, &mut source, now());
        assert_eq!(
            output.report.items[0].outcome,
            ItemOutcome::Accepted {
                code: "al062020".to_string(),
                created: true
            }
        );
        assert_eq!(
            output.artifacts[0].collection.features[0].property(RADIUS_PROPERTY),
            Some(&json!(0.0))
        );

        // Enforcing filter still needs a position
        let mut source = MemorySource::default().with(&items[0].link, line);
        let output = pipeline().run(&StormRegistry::default(), &items, &mut source, now());
        assert!(matches!(
            output.report.items[0].outcome,
            ItemOutcome::Skipped(ItemError::MissingGeometry(_))
        ));
    }

    #[test]
    fn test_empty_track_skipped_even_with_override() {
        let mut config = PipelineConfig::default();
        config.bounds.enforce = false;
        let pipeline = Pipeline::new(&config).unwrap();

        let items = vec![track_item("Fay", "AL062020", "Tue, 02 Jun 2020 00:00:00 GMT")];
        let mut source = MemorySource::default()
            .with(&items[0].link, json!({"type": "FeatureCollection", "features": []}));

        let output = pipeline.run(&StormRegistry::default(), &items, &mut source, now());
        assert!(output.storms.is_empty());
        assert!(matches!(
            output.report.items[0].outcome,
            ItemOutcome::Skipped(ItemError::MissingGeometry(_))
        ));
    }

    #[test]
    fn test_repeated_code_in_one_run_stays_unique() {
        let registry = StormRegistry::default();
        let mut newer = track_item("Gonzalo", "AL072020", "Tue, 02 Jun 2020 06:00:00 GMT");
        newer.link = "https://example.com/al072020_b.kmz".to_string();
        let items = vec![
            track_item("Gonzalo", "AL072020", "Tue, 02 Jun 2020 00:00:00 GMT"),
            newer,
            track_item("Gonzalo", "AL072020", "Mon, 01 Jun 2020 18:00:00 GMT"),
        ];
        let mut source = MemorySource::default()
            .with(&items[0].link, track(&[(20.0, -50.0)]))
            .with(&items[1].link, track(&[(21.0, -51.0)]));

        let output = pipeline().run(&registry, &items, &mut source, now());
        assert_eq!(output.storms.len(), 1);
        assert_eq!(
            output.storms.find("al072020").unwrap().last_updated,
            Utc.with_ymd_and_hms(2020, 6, 2, 6, 0, 0).unwrap()
        );
        assert_eq!(output.artifacts.len(), 1);
        assert!(output.artifacts[0].key.ends_with(&format!(
            "/{}/input.geojson",
            Utc.with_ymd_and_hms(2020, 6, 2, 6, 0, 0).unwrap().timestamp()
        )));
        assert_eq!(output.report.stale(), vec!["al072020"]);
    }

    #[test]
    fn test_legacy_record_backfilled_by_name() {
        let legacy_updated = Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap();
        let registry = StormRegistry::from_snapshot(Snapshot {
            active_storms: vec![
                SnapshotEntry::Legacy(LegacyStorm {
                    name: "hanna".to_string(),
                    kind: "H".to_string(),
                    last_updated: legacy_updated,
                    artifact_path: "legacy/".to_string(),
                }),
                SnapshotEntry::Legacy(LegacyStorm {
                    name: "isaias".to_string(),
                    kind: "H".to_string(),
                    last_updated: legacy_updated,
                    artifact_path: "legacy/".to_string(),
                }),
            ],
        });
        let items = vec![track_item("Hanna", "AL082020", "Tue, 02 Jun 2020 00:00:00 GMT")];
        let mut source = MemorySource::default().with(&items[0].link, track(&[(27.0, -95.0)]));

        let output = pipeline().run(&registry, &items, &mut source, now());
        let hanna = output.storms.find("al082020").unwrap();
        assert_eq!(hanna.name, "hanna");
        assert_eq!(
            output.report.items[0].outcome,
            ItemOutcome::Accepted {
                code: "al082020".to_string(),
                created: false
            }
        );
        assert_eq!(output.retained_legacy.len(), 1);
        assert_eq!(output.retained_legacy[0].name, "isaias");
    }

    #[test]
    fn test_publish_order_and_keys() {
        #[derive(Default)]
        struct Recorder {
            published: Vec<(String, String, bool)>,
        }
        impl ArtifactPublisher for Recorder {
            fn publish(
                &mut self,
                key: &str,
                _body: &[u8],
                content_type: &str,
                public: bool,
            ) -> Result<(), RunError> {
                self.published
                    .push((key.to_string(), content_type.to_string(), public));
                Ok(())
            }
        }

        let items = vec![track_item("Josephine", "AL112020", "Tue, 02 Jun 2020 00:00:00 GMT")];
        let mut source = MemorySource::default().with(&items[0].link, track(&[(15.0, -50.0)]));
        let pipeline = pipeline();
        let output = pipeline.run(&StormRegistry::default(), &items, &mut source, now());

        let mut recorder = Recorder::default();
        publish(&output, &mut recorder, pipeline.publish_config()).unwrap();

        let ts = Utc.with_ymd_and_hms(2020, 6, 2, 0, 0, 0).unwrap().timestamp();
        assert_eq!(
            recorder.published,
            vec![
                (
                    format!("storm/al112020/{}/input.geojson", ts),
                    JSON_CONTENT_TYPE.to_string(),
                    true
                ),
                ("metadata.json".to_string(), JSON_CONTENT_TYPE.to_string(), true),
            ]
        );
    }

    #[test]
    fn test_failed_artifact_publish_withholds_metadata() {
        struct Failing {
            calls: usize,
        }
        impl ArtifactPublisher for Failing {
            fn publish(&mut self, key: &str, _: &[u8], _: &str, _: bool) -> Result<(), RunError> {
                self.calls += 1;
                Err(RunError::Publish(format!("denied: {}", key)))
            }
        }

        let items = vec![track_item("Kyle", "AL122020", "Tue, 02 Jun 2020 00:00:00 GMT")];
        let mut source = MemorySource::default().with(&items[0].link, track(&[(38.0, -70.0)]));
        let pipeline = pipeline();
        let output = pipeline.run(&StormRegistry::default(), &items, &mut source, now());

        let mut failing = Failing { calls: 0 };
        assert!(publish(&output, &mut failing, pipeline.publish_config()).is_err());
        assert_eq!(failing.calls, 1);
    }
}
