//! Watch sessions.
//!
//! A session is a live subscription rooted at one directory. Events are
//! delivered in emission order over a channel. Paths under the root's ignored
//! directories are never returned from [`WatchSession::next_event`], whatever
//! produced them.

use std::sync::Arc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace};
use walkdir::WalkDir;

use crate::{
    error::{Result, WatchError},
    event::{FileEvent, WatchRoot},
};

/// Default number of buffered events per session.
const DEFAULT_CAPACITY: usize = 1024;

/// An open watch session. Dropping it stops the underlying watcher.
pub struct WatchSession {
    root: Arc<WatchRoot>,
    events: mpsc::Receiver<FileEvent>,
    _watcher: Option<RecommendedWatcher>,
}

impl WatchSession {
    /// A session fed by an arbitrary channel, for embedders that produce
    /// their own events.
    pub fn from_channel(root: Arc<WatchRoot>, events: mpsc::Receiver<FileEvent>) -> Self {
        Self {
            root,
            events,
            _watcher: None,
        }
    }

    /// The root this session watches.
    #[must_use]
    pub fn root(&self) -> &Arc<WatchRoot> {
        &self.root
    }

    /// Wait for the next event that is not under an ignored root. `None`
    /// once the producer side has closed.
    pub async fn next_event(&mut self) -> Option<FileEvent> {
        loop {
            let event = self.events.recv().await?;
            if self.root.is_ignored(&event.path) {
                trace!(path = %event.path.display(), "ignored path");
                continue;
            }
            return Some(event);
        }
    }
}

impl std::fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("root", &self.root)
            .field("native", &self._watcher.is_some())
            .finish()
    }
}

/// Opens watch sessions. A session is returned only once it is ready, that is
/// once changes under its root are being recorded.
pub trait WatchBackend: Send + Sync {
    fn open(&self, root: &WatchRoot) -> Result<WatchSession>;
}

/// Backend using the platform's recommended `notify` watcher.
#[derive(Debug, Clone)]
pub struct NotifyBackend {
    capacity: usize,
}

impl NotifyBackend {
    /// Create a backend with the default event buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Set the per-session event buffer size.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }
}

impl Default for NotifyBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchBackend for NotifyBackend {
    fn open(&self, root: &WatchRoot) -> Result<WatchSession> {
        if !root.path.is_dir() {
            return Err(WatchError::RootNotFound(root.path.clone()));
        }

        let root = Arc::new(root.clone());
        let (tx, rx) = mpsc::channel(self.capacity);

        let callback_root = Arc::clone(&root);
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    for file_event in FileEvent::from_notify(&event, &callback_root) {
                        if callback_root.is_ignored(&file_event.path) {
                            trace!(path = %file_event.path.display(), "ignored path");
                            continue;
                        }

                        if tx.blocking_send(file_event).is_err() {
                            // Session closed.
                            return;
                        }
                    }
                }
                Err(e) => {
                    error!("Watch error: {e}");
                }
            },
        )?;

        watcher.watch(&root.path, RecursiveMode::Recursive)?;
        debug!(role = %root.role, root = %root.path.display(), "registered watch");

        let files = count_files(&root);
        info!(
            role = %root.role,
            root = %root.path.display(),
            files,
            "Watch session ready"
        );

        Ok(WatchSession {
            root,
            events: rx,
            _watcher: Some(watcher),
        })
    }
}

/// Number of files already under the root, outside ignored directories.
/// Only used for the readiness log line; unreadable entries are skipped.
fn count_files(root: &WatchRoot) -> usize {
    WalkDir::new(&root.path)
        .into_iter()
        .filter_entry(|e| !root.is_ignored(e.path()))
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .count()
}
