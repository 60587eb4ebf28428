//! Filesystem site.
//!
//! [`MirrorSite`] keeps the destination directory in step with the source
//! tree: each source file is copied to the same relative path under the
//! destination, and the active theme's `source/` assets are laid down
//! underneath on every full build. Theme layouts under `layout/` are tracked
//! so a reload can be observed, but no templating is applied.

use std::{
    collections::BTreeSet,
    io,
    path::{Path, PathBuf},
    time::Instant,
};

use tokio::{fs, sync::RwLock};
use tracing::{debug, info};
use yarnsite_core::{CoreError, ResolvedPaths, Result, Site};

use crate::scan::{has_hidden_component, scan_files};

/// Statistics from the most recent full build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Source files written.
    pub files: usize,

    /// Theme assets written.
    pub theme_assets: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

#[derive(Debug, Default)]
struct SiteState {
    sources: BTreeSet<PathBuf>,
    layouts: Vec<PathBuf>,
    theme_assets: Vec<PathBuf>,
    last_build: Option<BuildStats>,
}

/// Site that mirrors sources and theme assets into the destination.
#[derive(Debug)]
pub struct MirrorSite {
    paths: ResolvedPaths,
    state: RwLock<SiteState>,
}

impl MirrorSite {
    /// Create a site over resolved project paths.
    #[must_use]
    pub fn new(paths: ResolvedPaths) -> Self {
        Self {
            paths,
            state: RwLock::new(SiteState::default()),
        }
    }

    /// The project layout.
    #[must_use]
    pub fn paths(&self) -> &ResolvedPaths {
        &self.paths
    }

    /// Known source files, relative to the source directory.
    pub async fn source_files(&self) -> Vec<PathBuf> {
        self.state.read().await.sources.iter().cloned().collect()
    }

    /// Layouts found by the last theme reload, relative to `layout/`.
    pub async fn layouts(&self) -> Vec<PathBuf> {
        self.state.read().await.layouts.clone()
    }

    /// Statistics from the most recent build, if any.
    pub async fn last_build(&self) -> Option<BuildStats> {
        self.state.read().await.last_build.clone()
    }

    /// Directories that may sit inside the source tree but are not content.
    fn nested_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.paths.plugins.clone(),
            self.paths.themes.clone(),
            self.paths.destination.clone(),
        ]
    }

    /// Source-relative path of an event path, or `None` for hidden files and
    /// the source root itself.
    fn relative<'a>(&self, action: &'static str, path: &'a Path) -> Result<Option<&'a Path>> {
        let relative = path.strip_prefix(&self.paths.source).map_err(|_| {
            CoreError::site(
                action,
                format!("{} is outside the source directory", path.display()),
            )
        })?;

        if relative.as_os_str().is_empty() {
            debug!(path = %path.display(), "skipping event for the source root");
            return Ok(None);
        }

        if has_hidden_component(relative) {
            debug!(path = %path.display(), "skipping hidden file");
            return Ok(None);
        }

        Ok(Some(relative))
    }

    async fn scan(&self, action: &'static str, root: PathBuf, exclude: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
        tokio::task::spawn_blocking(move || scan_files(&root, &exclude))
            .await
            .map_err(|e| CoreError::site_with_source(action, "scan task failed", e))?
    }

    async fn copy_source(&self, action: &'static str, relative: &Path) -> Result<()> {
        let from = self.paths.source.join(relative);
        let to = self.paths.destination.join(relative);
        copy_file(&from, &to)
            .await
            .map_err(|e| CoreError::site_with_source(action, format!("cannot copy {}", from.display()), e))
    }
}

impl Site for MirrorSite {
    async fn read_files(&self) -> Result<()> {
        let files = self
            .scan("read_files", self.paths.source.clone(), self.nested_dirs())
            .await?;

        for relative in &files {
            self.copy_source("read_files", relative).await?;
        }

        info!(files = files.len(), "Read source files");
        self.state.write().await.sources = files.into_iter().collect();
        Ok(())
    }

    async fn file_added(&self, path: &Path) -> Result<()> {
        let Some(relative) = self.relative("file_added", path)? else {
            return Ok(());
        };

        self.copy_source("file_added", relative).await?;
        self.state.write().await.sources.insert(relative.to_path_buf());
        Ok(())
    }

    async fn file_changed(&self, path: &Path) -> Result<()> {
        let Some(relative) = self.relative("file_changed", path)? else {
            return Ok(());
        };

        self.copy_source("file_changed", relative).await?;
        self.state.write().await.sources.insert(relative.to_path_buf());
        Ok(())
    }

    async fn file_removed(&self, path: &Path) -> Result<()> {
        let Some(relative) = self.relative("file_removed", path)? else {
            return Ok(());
        };

        let target = self.paths.destination.join(relative);
        remove_output(&target).await.map_err(|e| {
            CoreError::site_with_source(
                "file_removed",
                format!("cannot remove {}", target.display()),
                e,
            )
        })?;

        // A removed directory takes every source beneath it along.
        self.state
            .write()
            .await
            .sources
            .retain(|known| !known.starts_with(relative));
        Ok(())
    }

    async fn read_theme(&self) -> Result<()> {
        let theme_dir = &self.paths.theme_dir;
        if !theme_dir.is_dir() {
            return Err(CoreError::site(
                "read_theme",
                format!("theme directory not found: {}", theme_dir.display()),
            ));
        }

        let layouts = self
            .scan("read_theme", theme_dir.join("layout"), Vec::new())
            .await?;
        let theme_assets = self
            .scan("read_theme", theme_dir.join("source"), Vec::new())
            .await?;

        info!(
            theme = %theme_dir.display(),
            layouts = layouts.len(),
            assets = theme_assets.len(),
            "Loaded theme"
        );

        let mut state = self.state.write().await;
        state.layouts = layouts;
        state.theme_assets = theme_assets;
        Ok(())
    }

    async fn build(&self) -> Result<()> {
        let start = Instant::now();

        let (sources, theme_assets) = {
            let state = self.state.read().await;
            (
                state.sources.iter().cloned().collect::<Vec<_>>(),
                state.theme_assets.clone(),
            )
        };

        fs::create_dir_all(&self.paths.destination).await?;

        let asset_root = self.paths.theme_dir.join("source");
        for relative in &theme_assets {
            let from = asset_root.join(relative);
            copy_file(&from, &self.paths.destination.join(relative))
                .await
                .map_err(|e| {
                    CoreError::site_with_source("build", format!("cannot copy {}", from.display()), e)
                })?;
        }

        // Sources win over theme assets at the same path.
        for relative in &sources {
            self.copy_source("build", relative).await?;
        }

        let stats = BuildStats {
            files: sources.len(),
            theme_assets: theme_assets.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(?stats, "Build completed");

        self.state.write().await.last_build = Some(stats);
        Ok(())
    }
}

/// Remove a mirrored file or directory tree. Missing targets are fine.
async fn remove_output(target: &Path) -> io::Result<()> {
    let result = match fs::symlink_metadata(target).await {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(target).await,
        Ok(_) => fs::remove_file(target).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            debug!(path = %target.display(), "removed output");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

async fn copy_file(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::copy(from, to).await?;
    Ok(())
}
