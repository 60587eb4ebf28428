//! yarnsite CLI Library
//!
//! Command implementations for the yarnsite static site generator. The binary
//! entry point lives in `main.rs`.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, watch, plugins, bundle)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use yarnsite::cmd;
//!
//! # async fn run() -> color_eyre::eyre::Result<()> {
//! cmd::build::run(Path::new("config.toml")).await?;
//! # Ok(())
//! # }
//! ```

pub mod cmd;

// Re-export core types for convenience
pub use yarnsite_core::{Config, PackageResolver, ResolvedPaths};
pub use yarnsite_generator::{BuildStats, MirrorSite};
pub use yarnsite_watch::{NotifyBackend, RebuildDispatcher, WatchPlan};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
