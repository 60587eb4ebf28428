//! Build command - generates the site once

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use yarnsite_core::Site;
use yarnsite_generator::MirrorSite;

use super::load_project;

/// Run the build command.
///
/// Reads every source file, loads the active theme and writes the whole site
/// to the destination directory.
pub async fn run(config_path: &Path) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, "Starting build");

    let (_config, paths) = load_project(config_path)?;
    let site = MirrorSite::new(paths);

    site.read_files().await.wrap_err("Failed to read source files")?;
    site.read_theme().await.wrap_err("Failed to load theme")?;
    site.build().await.wrap_err("Build failed")?;

    let duration = start.elapsed();
    let stats = site.last_build().await.unwrap_or_default();

    // Print build statistics
    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Files:        {}", stats.files);
    println!("  Theme assets: {}", stats.theme_assets);
    println!();
    println!("  Duration:     {:.2}s", duration.as_secs_f64());
    println!("  Output:       {}", site.paths().destination.display());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(())
}
