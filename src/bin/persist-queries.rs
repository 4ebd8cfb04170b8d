//! Release-time persisted query reconciliation.
//!
//! Snapshots the current build's persisted query map under the release
//! version, deletes map files for versions outside the support window, and
//! publishes the merged map consumed by the GraphQL endpoint. Single-shot:
//! any I/O failure aborts the release step with a nonzero exit.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use webcard_backend::config::Config;
use webcard_backend::queries::{self, ReleaseChannel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let channel = ReleaseChannel::load(&config.release_file)?;
    let current = channel.current_version()?;
    tracing::info!("Snapshotting persisted queries for {}", current);

    let snapshot = queries::snapshot_current_map(
        &config.persisted_queries_dir,
        &current,
        &config.current_query_map,
    )?;
    tracing::info!("Wrote snapshot {:?}", snapshot);

    let last_supported = config.last_supported_app_version.unwrap_or(current);
    tracing::info!("Reconciling against last supported version {}", last_supported);

    let report = queries::reconcile(&config.persisted_queries_dir, &last_supported)?;
    for version in &report.deleted {
        tracing::info!("Deleted unsupported query map {}", version);
    }
    for path in &report.skipped {
        tracing::warn!("Skipped file with unparsable version: {:?}", path);
    }

    queries::publish(&report.merged, &config.query_map_path)?;
    tracing::info!(
        "Published merged map with {} queries from {} versions to {:?}",
        report.merged.len(),
        report.kept.len(),
        config.query_map_path
    );

    Ok(())
}
