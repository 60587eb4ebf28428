//! Watch command - incremental rebuilds on file changes

use std::{path::Path, sync::Arc};

use color_eyre::eyre::{Result, WrapErr};
use yarnsite_generator::MirrorSite;
use yarnsite_watch::{DispatchStats, NotifyBackend, RebuildDispatcher, WatchPlan};

use super::load_project;

/// Run the watch command.
///
/// Reads the site once, then rebuilds incrementally on source changes and
/// fully on theme changes until Ctrl+C.
pub async fn run(config_path: &Path) -> Result<()> {
    tracing::info!(?config_path, "Starting watch mode");

    let (_config, paths) = load_project(config_path)?;
    let plan = WatchPlan::from_paths(&paths);
    let site = Arc::new(MirrorSite::new(paths));

    let dispatcher = RebuildDispatcher::start(site, &plan, &NotifyBackend::new())
        .await
        .wrap_err("Failed to start watching")?;

    println!();
    println!("  Watching {}", plan.source.path.display());
    println!("  Theme    {}", plan.theme.path.display());
    println!("  Press Ctrl+C to stop");
    println!();

    tokio::signal::ctrl_c()
        .await
        .wrap_err("Failed to listen for Ctrl+C")?;

    let stats = dispatcher.stop().await;
    print_watch_stats(&stats);

    Ok(())
}

/// Print dispatch statistics in a user-friendly format.
fn print_watch_stats(stats: &DispatchStats) {
    println!();
    println!("  Watch Statistics:");
    println!("  ─────────────────────────────────");
    println!("  Events:       {:>6}", stats.dispatched);
    println!("  Failures:     {:>6}", stats.failed);
    println!("  ─────────────────────────────────");
    println!();
}
