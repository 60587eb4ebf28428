//! Dispatcher scenarios driven through channel-fed sessions.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::sync::mpsc;
use yarnsite_core::{CoreError, Site};
use yarnsite_watch::{
    FileEvent, FileEventKind, IgnoreSet, RebuildDispatcher, WatchBackend, WatchError, WatchPlan,
    WatchRole, WatchRoot, WatchSession,
};

/// Site that records every action it receives.
#[derive(Default)]
struct RecordingSite {
    calls: Mutex<Vec<String>>,
    fail_read_files: bool,
    fail_changed: HashSet<PathBuf>,
    theme_delay: Duration,
}

impl RecordingSite {
    fn log(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls made after the initial read.
    fn actions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c != "read_files")
            .collect()
    }
}

impl Site for RecordingSite {
    async fn read_files(&self) -> yarnsite_core::Result<()> {
        self.log("read_files");
        if self.fail_read_files {
            return Err(CoreError::site("read_files", "source directory unreadable"));
        }
        Ok(())
    }

    async fn file_added(&self, path: &Path) -> yarnsite_core::Result<()> {
        self.log(format!("file_added {}", path.display()));
        Ok(())
    }

    async fn file_changed(&self, path: &Path) -> yarnsite_core::Result<()> {
        self.log(format!("file_changed {}", path.display()));
        if self.fail_changed.contains(path) {
            return Err(CoreError::site("file_changed", "render failed"));
        }
        Ok(())
    }

    async fn file_removed(&self, path: &Path) -> yarnsite_core::Result<()> {
        self.log(format!("file_removed {}", path.display()));
        Ok(())
    }

    async fn read_theme(&self) -> yarnsite_core::Result<()> {
        self.log("read_theme:start");
        tokio::time::sleep(self.theme_delay).await;
        self.log("read_theme:end");
        Ok(())
    }

    async fn build(&self) -> yarnsite_core::Result<()> {
        self.log("build:start");
        Ok(())
    }
}

/// Backend whose sessions are fed by the test. Every emitted event is
/// delivered, ignored or not.
#[derive(Default)]
struct ChannelBackend {
    opened: AtomicUsize,
    sessions: Mutex<HashMap<WatchRole, (Arc<WatchRoot>, mpsc::Sender<FileEvent>)>>,
}

impl WatchBackend for ChannelBackend {
    fn open(&self, root: &WatchRoot) -> yarnsite_watch::Result<WatchSession> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let root = Arc::new(root.clone());
        let (tx, rx) = mpsc::channel(64);
        self.sessions
            .lock()
            .unwrap()
            .insert(root.role, (Arc::clone(&root), tx));
        Ok(WatchSession::from_channel(root, rx))
    }
}

impl ChannelBackend {
    fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    async fn emit(&self, role: WatchRole, kind: FileEventKind, path: &str) {
        let (root, tx) = self.sessions.lock().unwrap()[&role].clone();
        tx.send(FileEvent::new(kind, path, root)).await.unwrap();
    }

    /// Close every session from the producer side.
    fn close(&self) {
        self.sessions.lock().unwrap().clear();
    }
}

fn plan() -> WatchPlan {
    WatchPlan {
        source: WatchRoot::source(
            "/src",
            IgnoreSet::new(["/src/_plugins", "/src/theme", "/src/public"]),
        ),
        theme: WatchRoot::theme("/themes/default"),
    }
}

#[tokio::test]
async fn test_added_event_calls_file_added_only() {
    let site = Arc::new(RecordingSite::default());
    let backend = ChannelBackend::default();
    let dispatcher = RebuildDispatcher::start(Arc::clone(&site), &plan(), &backend)
        .await
        .unwrap();

    backend
        .emit(WatchRole::Source, FileEventKind::Added, "/src/a.md")
        .await;
    backend.close();
    let stats = dispatcher.wait().await;

    assert_eq!(site.actions(), vec!["file_added /src/a.md"]);
    assert_eq!(stats.dispatched, 1);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn test_source_kinds_map_to_actions() {
    let site = Arc::new(RecordingSite::default());
    let backend = ChannelBackend::default();
    let dispatcher = RebuildDispatcher::start(Arc::clone(&site), &plan(), &backend)
        .await
        .unwrap();

    backend
        .emit(WatchRole::Source, FileEventKind::Changed, "/src/b.md")
        .await;
    backend
        .emit(WatchRole::Source, FileEventKind::Removed, "/src/c.md")
        .await;
    backend.close();
    dispatcher.wait().await;

    assert_eq!(
        site.actions(),
        vec!["file_changed /src/b.md", "file_removed /src/c.md"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_remove_then_add_keeps_emission_order() {
    let site = Arc::new(RecordingSite::default());
    let backend = ChannelBackend::default();
    let dispatcher = RebuildDispatcher::start(Arc::clone(&site), &plan(), &backend)
        .await
        .unwrap();

    backend
        .emit(WatchRole::Source, FileEventKind::Removed, "/src/a.md")
        .await;
    backend
        .emit(WatchRole::Source, FileEventKind::Added, "/src/a.md")
        .await;
    backend.close();
    dispatcher.wait().await;

    assert_eq!(
        site.actions(),
        vec!["file_removed /src/a.md", "file_added /src/a.md"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_burst_of_events_starts_in_emission_order() {
    let site = Arc::new(RecordingSite::default());
    let backend = ChannelBackend::default();
    let dispatcher = RebuildDispatcher::start(Arc::clone(&site), &plan(), &backend)
        .await
        .unwrap();

    let kinds = [
        FileEventKind::Added,
        FileEventKind::Changed,
        FileEventKind::Removed,
    ];
    let mut expected = Vec::new();
    for i in 0..30 {
        let kind = kinds[i % kinds.len()];
        let path = format!("/src/post-{i}.md");
        let action = match kind {
            FileEventKind::Added => "file_added",
            FileEventKind::Changed => "file_changed",
            FileEventKind::Removed => "file_removed",
        };
        expected.push(format!("{action} {path}"));
        backend.emit(WatchRole::Source, kind, &path).await;
    }
    backend.close();
    let stats = dispatcher.wait().await;

    assert_eq!(stats.dispatched, 30);
    assert_eq!(site.actions(), expected);
}

#[tokio::test]
async fn test_theme_event_reloads_theme_before_build() {
    let site = Arc::new(RecordingSite {
        theme_delay: Duration::from_millis(30),
        ..Default::default()
    });
    let backend = ChannelBackend::default();
    let dispatcher = RebuildDispatcher::start(Arc::clone(&site), &plan(), &backend)
        .await
        .unwrap();

    backend
        .emit(
            WatchRole::Theme,
            FileEventKind::Changed,
            "/themes/default/layout/post.html",
        )
        .await;
    backend.close();
    dispatcher.wait().await;

    assert_eq!(
        site.actions(),
        vec!["read_theme:start", "read_theme:end", "build:start"]
    );
}

#[tokio::test]
async fn test_every_theme_event_kind_triggers_rebuild() {
    let site = Arc::new(RecordingSite::default());
    let backend = ChannelBackend::default();
    let dispatcher = RebuildDispatcher::start(Arc::clone(&site), &plan(), &backend)
        .await
        .unwrap();

    for kind in [
        FileEventKind::Added,
        FileEventKind::Changed,
        FileEventKind::Removed,
    ] {
        backend
            .emit(WatchRole::Theme, kind, "/themes/default/source/style.css")
            .await;
    }
    backend.close();
    let stats = dispatcher.wait().await;

    let calls = site.actions();
    assert_eq!(stats.dispatched, 3);
    assert_eq!(calls.iter().filter(|c| *c == "build:start").count(), 3);
    assert!(!calls.iter().any(|c| c.starts_with("file_")));
}

#[tokio::test]
async fn test_failed_initial_read_opens_no_session() {
    let site = Arc::new(RecordingSite {
        fail_read_files: true,
        ..Default::default()
    });
    let backend = ChannelBackend::default();

    let result = RebuildDispatcher::start(Arc::clone(&site), &plan(), &backend).await;

    assert!(matches!(result, Err(WatchError::Startup(_))));
    assert_eq!(backend.opened(), 0);
    assert_eq!(site.calls(), vec!["read_files"]);
}

#[tokio::test]
async fn test_action_failure_keeps_watching() {
    let site = Arc::new(RecordingSite {
        fail_changed: [PathBuf::from("/src/broken.md")].into_iter().collect(),
        ..Default::default()
    });
    let backend = ChannelBackend::default();
    let dispatcher = RebuildDispatcher::start(Arc::clone(&site), &plan(), &backend)
        .await
        .unwrap();

    backend
        .emit(WatchRole::Source, FileEventKind::Changed, "/src/broken.md")
        .await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    backend
        .emit(WatchRole::Source, FileEventKind::Added, "/src/fresh.md")
        .await;
    backend.close();
    let stats = dispatcher.wait().await;

    assert_eq!(stats.dispatched, 2);
    assert_eq!(stats.failed, 1);
    assert!(site.actions().contains(&"file_added /src/fresh.md".to_string()));
}

#[tokio::test]
async fn test_same_path_dispatched_again_after_failure() {
    let site = Arc::new(RecordingSite {
        fail_changed: [PathBuf::from("/src/broken.md")].into_iter().collect(),
        ..Default::default()
    });
    let backend = ChannelBackend::default();
    let dispatcher = RebuildDispatcher::start(Arc::clone(&site), &plan(), &backend)
        .await
        .unwrap();

    for _ in 0..2 {
        backend
            .emit(WatchRole::Source, FileEventKind::Changed, "/src/broken.md")
            .await;
    }
    backend.close();
    let stats = dispatcher.wait().await;

    assert_eq!(stats.failed, 2);
    assert_eq!(site.actions().len(), 2);
}

#[tokio::test]
async fn test_ignored_roots_never_dispatch() {
    let site = Arc::new(RecordingSite::default());
    let backend = ChannelBackend::default();
    let dispatcher = RebuildDispatcher::start(Arc::clone(&site), &plan(), &backend)
        .await
        .unwrap();

    backend
        .emit(WatchRole::Source, FileEventKind::Added, "/src/public/index.html")
        .await;
    backend
        .emit(WatchRole::Source, FileEventKind::Changed, "/src/theme/layout.html")
        .await;
    backend
        .emit(WatchRole::Source, FileEventKind::Changed, "/src/theme-extra/notes.md")
        .await;
    backend
        .emit(WatchRole::Source, FileEventKind::Removed, "/src/_plugins")
        .await;
    backend.close();
    let stats = dispatcher.wait().await;

    assert_eq!(stats.dispatched, 1);
    assert_eq!(site.actions(), vec!["file_changed /src/theme-extra/notes.md"]);
}

#[tokio::test]
async fn test_stop_returns_stats_and_closes_sessions() {
    let site = Arc::new(RecordingSite::default());
    let backend = ChannelBackend::default();
    let dispatcher = RebuildDispatcher::start(Arc::clone(&site), &plan(), &backend)
        .await
        .unwrap();
    assert_eq!(backend.opened(), 2);

    backend
        .emit(WatchRole::Source, FileEventKind::Added, "/src/a.md")
        .await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let stats = dispatcher.stop().await;
    assert_eq!(stats.dispatched, 1);

    let (_, tx) = backend.sessions.lock().unwrap()[&WatchRole::Source].clone();
    assert!(tx.is_closed());
}
