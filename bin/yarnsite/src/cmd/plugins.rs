//! Plugins command - list plugin packages declared by the manifest

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use yarnsite_core::{ManifestDependencies, PackageResolver};

use super::load_project;

/// Run the plugins command.
///
/// Prints every dependency whose name matches the configured plugin prefix,
/// one per line in sorted order.
pub fn run(config_path: &Path) -> Result<()> {
    let (config, paths) = load_project(config_path)?;

    let deps = ManifestDependencies::load(&paths.manifest).wrap_err("Failed to read manifest")?;
    let resolver = PackageResolver::new(config.plugins.prefix);
    let plugins = resolver.resolve(&deps);

    tracing::info!(
        prefix = resolver.prefix(),
        count = plugins.len(),
        "Resolved plugin packages"
    );

    for name in &plugins {
        println!("{name}");
    }

    Ok(())
}
