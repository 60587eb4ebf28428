//! Directory scanning.
//!
//! Hidden entries (names starting with `.`) are skipped, as are any excluded
//! directories nested inside the scanned root.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};
use yarnsite_core::Result;

/// Files under `root`, relative to it, in sorted order. A missing root yields
/// an empty list.
pub fn scan_files(root: &Path, exclude: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        debug!(root = %root.display(), "scan root does not exist, skipping");
        return Ok(Vec::new());
    }

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || (!is_hidden(e) && !is_excluded(e, exclude)));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }

    debug!(root = %root.display(), count = files.len(), "scanned files");
    Ok(files)
}

/// Whether any component of a relative path is hidden.
pub fn has_hidden_component(relative: &Path) -> bool {
    relative
        .components()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_excluded(entry: &DirEntry, exclude: &[PathBuf]) -> bool {
    exclude.iter().any(|x| entry.path() == x.as_path())
}
