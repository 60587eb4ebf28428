//! Error types for watch sessions and dispatch.

use std::path::PathBuf;

use thiserror::Error;
use yarnsite_core::CoreError;

/// Result type for watch operations.
pub type Result<T> = std::result::Result<T, WatchError>;

/// Watch errors.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The initial full read failed; no session was opened.
    #[error("initial read failed: {0}")]
    Startup(#[source] CoreError),

    /// A watch root does not exist or is not a directory.
    #[error("watch root not found: {0}")]
    RootNotFound(PathBuf),

    /// Underlying filesystem watcher error.
    #[error("watcher error: {0}")]
    Notify(#[from] notify::Error),
}
