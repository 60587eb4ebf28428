//! Command implementations.

pub mod build;
pub mod bundle;
pub mod plugins;
pub mod watch;

use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use yarnsite_core::{Config, ResolvedPaths};

/// Load the configuration and resolve its paths against the directory that
/// contains it.
pub fn load_project(config_path: &Path) -> Result<(Config, ResolvedPaths)> {
    let config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;

    let root = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let paths = config
        .resolve(root)
        .wrap_err("Failed to resolve project paths")?;

    tracing::debug!(?config, "Loaded configuration");
    Ok((config, paths))
}
