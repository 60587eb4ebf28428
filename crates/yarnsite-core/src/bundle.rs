//! Mirroring plans for the project file set.
//!
//! A [`BundlePlan`] maps forward-slash keys (relative output paths) to the
//! files they are copied from. Plugin packages resolved from the manifest are
//! mirrored next to the project's own files so a bundle is self-contained.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Component, Path, PathBuf},
};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::{config::ResolvedPaths, error::Result};

/// One file in a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    /// Forward-slash relative key, e.g. `node_modules/yarn-feed/index.js`.
    pub key: String,

    /// File the entry is copied from.
    pub source: PathBuf,
}

/// Ordered set of files to mirror, keyed by relative output path.
#[derive(Debug, Clone, Default)]
pub struct BundlePlan {
    entries: BTreeMap<String, PathBuf>,
    missing: BTreeSet<String>,
}

impl BundlePlan {
    /// Create an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan the project's own files plus every installed plugin package.
    ///
    /// Plugins without an installed directory are recorded in
    /// [`missing`](Self::missing) and skipped.
    pub fn for_project(paths: &ResolvedPaths, plugins: &BTreeSet<String>) -> Result<Self> {
        let mut plan = Self::new();

        if paths.manifest.is_file() {
            plan.add_file("package.json", &paths.manifest);
        }

        if paths.source.is_dir() {
            let nested = [
                paths.destination.clone(),
                paths.plugins.clone(),
                paths.themes.clone(),
            ];
            plan.add_tree("source", &paths.source, &nested)?;
        }

        if paths.theme_dir.is_dir() {
            let theme = paths
                .theme_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            plan.add_tree(&format!("themes/{theme}"), &paths.theme_dir, &[])?;
        }

        for plugin in plugins {
            let dir = paths.modules_dir.join(plugin);
            if dir.is_dir() {
                plan.add_tree(&format!("node_modules/{plugin}"), &dir, &[])?;
            } else {
                warn!(plugin = %plugin, dir = %dir.display(), "plugin package is not installed");
                plan.missing.insert(plugin.clone());
            }
        }

        info!(files = plan.len(), missing = plan.missing.len(), "bundle planned");
        Ok(plan)
    }

    /// Add a single file under `key`.
    pub fn add_file(&mut self, key: impl Into<String>, source: impl Into<PathBuf>) {
        self.entries.insert(key.into(), source.into());
    }

    /// Add every file under `dir` with keys prefixed by `key_prefix`.
    /// Directories listed in `exclude` are skipped entirely.
    ///
    /// `dir` itself may be a symlink (as installed packages often are).
    /// Symlinked files below it are copied by content; symlinked directories
    /// are not descended into, so link cycles cannot stall the walk.
    pub fn add_tree(&mut self, key_prefix: &str, dir: &Path, exclude: &[PathBuf]) -> Result<usize> {
        let mut added = 0;

        let walker = WalkDir::new(dir)
            .follow_links(false)
            .follow_root_links(true)
            .into_iter()
            .filter_entry(|e| !exclude.iter().any(|x| e.path() == x.as_path()));

        for entry in walker {
            let entry = entry?;
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(dir) else {
                continue;
            };

            self.entries
                .insert(bundle_key(key_prefix, relative), entry.path().to_path_buf());
            added += 1;
        }

        debug!(prefix = key_prefix, dir = %dir.display(), added, "added tree to bundle");
        Ok(added)
    }

    /// Entries in key order.
    pub fn entries(&self) -> impl Iterator<Item = BundleEntry> + '_ {
        self.entries.iter().map(|(key, source)| BundleEntry {
            key: key.clone(),
            source: source.clone(),
        })
    }

    /// Plugin packages that were resolved but not installed.
    #[must_use]
    pub fn missing(&self) -> &BTreeSet<String> {
        &self.missing
    }

    /// Number of planned files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the plan has no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every entry to `dest/<key>`.
    pub fn mirror_to(&self, dest: &Path) -> Result<usize> {
        for (key, source) in &self.entries {
            let target = dest.join(key);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(source, &target)?;
        }

        info!(files = self.entries.len(), dest = %dest.display(), "bundle mirrored");
        Ok(self.entries.len())
    }
}

/// Forward-slash key for `relative` under `prefix`.
fn bundle_key(prefix: &str, relative: &Path) -> String {
    let parts = relative.components().filter_map(|c| match c {
        Component::Normal(part) => Some(part.to_string_lossy()),
        _ => None,
    });

    let mut key = prefix.trim_end_matches('/').to_string();
    for part in parts {
        if !key.is_empty() {
            key.push('/');
        }
        key.push_str(&part);
    }
    key
}
