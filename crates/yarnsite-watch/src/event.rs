//! File events and the roots they are watched under.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use notify::{
    EventKind,
    event::{CreateKind, ModifyKind, RenameMode},
};
use tracing::debug;
use walkdir::WalkDir;

use crate::ignore::IgnoreSet;

/// Which tree a watch session covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchRole {
    /// Site content; handled with path-scoped actions.
    Source,
    /// Active theme; any change triggers a theme reload and full rebuild.
    Theme,
}

impl fmt::Display for WatchRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Theme => f.write_str("theme"),
        }
    }
}

/// An absolute directory watched in one role, with the roots beneath it that
/// must never surface events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRoot {
    pub path: PathBuf,
    pub role: WatchRole,
    pub ignored: IgnoreSet,
}

impl WatchRoot {
    /// Source tree root ignoring the given nested directories.
    pub fn source(path: impl Into<PathBuf>, ignored: IgnoreSet) -> Self {
        Self {
            path: path.into(),
            role: WatchRole::Source,
            ignored,
        }
    }

    /// Theme tree root; nothing under it is ignored.
    pub fn theme(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            role: WatchRole::Theme,
            ignored: IgnoreSet::empty(),
        }
    }

    /// Whether events for `path` must be suppressed.
    #[must_use]
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.ignored.is_ignored(path)
    }
}

/// Kind of change reported for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventKind {
    Added,
    Changed,
    Removed,
}

impl fmt::Display for FileEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => f.write_str("added"),
            Self::Changed => f.write_str("changed"),
            Self::Removed => f.write_str("removed"),
        }
    }
}

/// A single change under a watch root. Consumed by exactly one dispatch.
#[derive(Debug, Clone)]
pub struct FileEvent {
    pub kind: FileEventKind,
    pub path: PathBuf,
    pub root: Arc<WatchRoot>,
}

impl FileEvent {
    /// Create a new file event.
    pub fn new(kind: FileEventKind, path: impl Into<PathBuf>, root: Arc<WatchRoot>) -> Self {
        Self {
            kind,
            path: path.into(),
            root,
        }
    }

    /// Role of the session that emitted this event.
    #[must_use]
    pub fn role(&self) -> WatchRole {
        self.root.role
    }

    /// Translate a raw `notify` event into file events, in path order.
    ///
    /// Access and unclassified events produce nothing. Ignore rules are not
    /// applied here.
    ///
    /// Site actions on the source tree are per file, so for source roots a
    /// directory that appears (created or renamed in) becomes one `Added`
    /// event per file beneath it, and changes to directory metadata are
    /// dropped. A directory that goes away is reported as a single `Removed`
    /// for the directory path.
    #[must_use]
    pub fn from_notify(event: &notify::Event, root: &Arc<WatchRoot>) -> Vec<Self> {
        let source = root.role == WatchRole::Source;
        let all = |kind: FileEventKind| {
            event
                .paths
                .iter()
                .map(move |p| (kind, p))
                .collect::<Vec<_>>()
        };

        let kinds: Vec<(FileEventKind, &PathBuf)> = match event.kind {
            EventKind::Create(_) => all(FileEventKind::Added),
            EventKind::Remove(_) => all(FileEventKind::Removed),
            EventKind::Modify(ModifyKind::Name(mode)) => rename_kinds(mode, &event.paths),
            EventKind::Modify(_) => all(FileEventKind::Changed),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
        };

        if !source {
            return kinds
                .into_iter()
                .map(|(kind, p)| Self::new(kind, p.clone(), Arc::clone(root)))
                .collect();
        }

        let folder_created = matches!(event.kind, EventKind::Create(CreateKind::Folder));
        let mut events = Vec::new();
        for (kind, path) in kinds {
            if path.is_dir() {
                match kind {
                    FileEventKind::Added => events.extend(
                        files_under(path)
                            .into_iter()
                            .map(|file| Self::new(FileEventKind::Added, file, Arc::clone(root))),
                    ),
                    FileEventKind::Changed => {}
                    FileEventKind::Removed => {
                        events.push(Self::new(kind, path.clone(), Arc::clone(root)));
                    }
                }
            } else if !(folder_created && kind == FileEventKind::Added) {
                events.push(Self::new(kind, path.clone(), Arc::clone(root)));
            }
        }
        events
    }
}

/// Files beneath `dir`, in path order.
fn files_under(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(dir = %dir.display(), "skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn rename_kinds(mode: RenameMode, paths: &[PathBuf]) -> Vec<(FileEventKind, &PathBuf)> {
    match (mode, paths) {
        (RenameMode::From, _) => paths.iter().map(|p| (FileEventKind::Removed, p)).collect(),
        (RenameMode::To, _) => paths.iter().map(|p| (FileEventKind::Added, p)).collect(),
        (RenameMode::Both, [from, to]) => {
            vec![(FileEventKind::Removed, from), (FileEventKind::Added, to)]
        }
        // Platforms that cannot pair renames report each side on its own.
        _ => paths
            .iter()
            .map(|p| {
                if p.exists() {
                    (FileEventKind::Added, p)
                } else {
                    (FileEventKind::Removed, p)
                }
            })
            .collect(),
    }
}
