//! Stormtrack CLI
//!
//! Usage:
//!   stormtrack -w /var/lib/stormtrack
//!   stormtrack -w /var/lib/stormtrack -c configs/stormtrack.yaml
//!   stormtrack -w /var/lib/stormtrack --dry-run

use anyhow::Context;
use argh::FromArgs;
use chrono::Utc;
use std::path::PathBuf;

use stormtrack::{ItemOutcome, LocalWorkspace, Pipeline, PipelineConfig};

/// Reconcile storm advisories into the published metadata snapshot.
#[derive(FromArgs)]
struct Args {
    /// path to pipeline configuration file (defaults apply when omitted)
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// workspace directory holding feed.json, metadata.json and converted/
    #[argh(option, short = 'w', default = "PathBuf::from(\".\")")]
    workdir: PathBuf,

    /// run and report without publishing anything
    #[argh(switch)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading config from: {}", path.display());
            PipelineConfig::from_file(path)?
        }
        None => PipelineConfig::default(),
    };
    log::info!(
        "Bounds lat {} lon {} (enforce: {}), retention {} days",
        config.bounds.lat,
        config.bounds.lon,
        config.bounds.enforce,
        config.retention_days
    );

    let pipeline = Pipeline::new(&config)?;
    let mut workspace = LocalWorkspace::new(&args.workdir);

    let output = pipeline
        .execute(&mut workspace, Utc::now(), args.dry_run)
        .with_context(|| format!("Run in {} failed", args.workdir.display()))?;

    for report in &output.report.items {
        match &report.outcome {
            ItemOutcome::Ignored => {}
            ItemOutcome::Skipped(err) => println!("  [skipped] {}: {}", report.title, err),
            outcome => println!("  {:?}", outcome),
        }
    }
    println!(
        "{} storms in snapshot, {} artifacts{}",
        output.storms.len() + output.retained_legacy.len(),
        output.artifacts.len(),
        if args.dry_run { " (dry run)" } else { "" }
    );

    if output.report.has_failures() {
        log::warn!("{} feed items were skipped", output.report.skipped().len());
    }

    Ok(())
}
