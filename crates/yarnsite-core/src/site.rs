//! The site collaborator driven by the rebuild dispatcher.

use std::{future::Future, path::Path};

use crate::error::Result;

/// A long-lived site instance exposing incremental and full rebuild actions.
///
/// Every action resolves once its work has settled. Implementations must be
/// safe to call concurrently; the caller applies no locking of its own.
pub trait Site: Send + Sync + 'static {
    /// Read every source file (initial full read).
    fn read_files(&self) -> impl Future<Output = Result<()>> + Send;

    /// A source file was created. A directory that appears is reported one
    /// file at a time.
    fn file_added(&self, path: &Path) -> impl Future<Output = Result<()>> + Send;

    /// A source file was modified.
    fn file_changed(&self, path: &Path) -> impl Future<Output = Result<()>> + Send;

    /// A source file was deleted. The path may also name a directory that
    /// went away along with everything beneath it.
    fn file_removed(&self, path: &Path) -> impl Future<Output = Result<()>> + Send;

    /// Reload the active theme.
    fn read_theme(&self) -> impl Future<Output = Result<()>> + Send;

    /// Regenerate the whole site.
    fn build(&self) -> impl Future<Output = Result<()>> + Send;
}
