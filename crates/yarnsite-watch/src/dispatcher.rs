//! Event-to-action dispatch.
//!
//! The dispatcher performs one full read of the site, then opens a source
//! session and a theme session and runs one loop per session. Source events
//! map to path-scoped site actions; any theme event reloads the theme and then
//! rebuilds the whole site.
//!
//! Events of one session are dispatched in emission order: each action is
//! polled once by the session loop, so its site call has started before the
//! next event is taken. An action that does not finish on that first poll
//! continues as its own task, so actions for successive events may overlap.
//! An action failure is logged and counted; the sessions keep running.

use std::{future::Future, sync::Arc, task::Poll};

use tokio::{
    sync::oneshot,
    task::{JoinError, JoinHandle, JoinSet},
};
use tracing::{debug, error, info};
use yarnsite_core::{ResolvedPaths, Site};

use crate::{
    error::{Result, WatchError},
    event::{FileEvent, FileEventKind, WatchRole, WatchRoot},
    ignore::IgnoreSet,
    session::{WatchBackend, WatchSession},
};

/// The two roots watched by a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPlan {
    pub source: WatchRoot,
    pub theme: WatchRoot,
}

impl WatchPlan {
    /// Source root ignoring the plugin, theme and destination directories,
    /// plus the active theme root.
    #[must_use]
    pub fn from_paths(paths: &ResolvedPaths) -> Self {
        let ignored = IgnoreSet::new([&paths.plugins, &paths.themes, &paths.destination]);

        Self {
            source: WatchRoot::source(&paths.source, ignored),
            theme: WatchRoot::theme(&paths.theme_dir),
        }
    }
}

/// Counters collected by the session loops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events handed to a site action.
    pub dispatched: u64,

    /// Actions that returned an error or panicked.
    pub failed: u64,
}

impl DispatchStats {
    fn merge(&mut self, other: Self) {
        self.dispatched += other.dispatched;
        self.failed += other.failed;
    }
}

struct SessionHandle {
    role: WatchRole,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<DispatchStats>,
}

/// Owns the site and both session loops.
pub struct RebuildDispatcher<S: Site> {
    site: Arc<S>,
    sessions: Vec<SessionHandle>,
}

impl<S: Site> RebuildDispatcher<S> {
    /// Read the site, then open both sessions and start dispatching.
    ///
    /// If the initial read fails no session is opened.
    pub async fn start<B>(site: Arc<S>, plan: &WatchPlan, backend: &B) -> Result<Self>
    where
        B: WatchBackend + ?Sized,
    {
        info!("Reading source files...");
        site.read_files().await.map_err(WatchError::Startup)?;
        info!("Initial read done");

        let source = backend.open(&plan.source)?;
        let theme = backend.open(&plan.theme)?;

        let sessions = [source, theme]
            .into_iter()
            .map(|session| spawn_session(Arc::clone(&site), session))
            .collect();

        info!(
            source = %plan.source.path.display(),
            theme = %plan.theme.path.display(),
            "Watching for changes"
        );

        Ok(Self { site, sessions })
    }

    /// The site being driven.
    #[must_use]
    pub fn site(&self) -> &Arc<S> {
        &self.site
    }

    /// Close both sessions, let in-flight actions finish and return the
    /// collected counters. Events still queued are discarded.
    pub async fn stop(self) -> DispatchStats {
        let mut tasks = Vec::with_capacity(self.sessions.len());
        for handle in self.sessions {
            debug!(role = %handle.role, "stopping session");
            // The loop may already have ended on its own.
            let _ = handle.shutdown.send(());
            tasks.push((handle.role, handle.task));
        }

        let mut stats = DispatchStats::default();
        for (role, task) in tasks {
            stats.merge(join_session(role, task).await);
        }

        info!(
            dispatched = stats.dispatched,
            failed = stats.failed,
            "Stopped watching"
        );
        stats
    }

    /// Wait until every session has been closed by its producer and all
    /// queued events have been dispatched.
    pub async fn wait(self) -> DispatchStats {
        let mut stats = DispatchStats::default();
        for handle in self.sessions {
            let SessionHandle {
                role,
                shutdown,
                task,
            } = handle;
            stats.merge(join_session(role, task).await);
            drop(shutdown);
        }
        stats
    }
}

fn spawn_session<S: Site>(site: Arc<S>, session: WatchSession) -> SessionHandle {
    let role = session.root().role;
    let (shutdown, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(run_session(site, session, shutdown_rx));

    SessionHandle {
        role,
        shutdown,
        task,
    }
}

async fn join_session(role: WatchRole, task: JoinHandle<DispatchStats>) -> DispatchStats {
    match task.await {
        Ok(stats) => stats,
        Err(e) => {
            error!(%role, "Session loop failed: {e}");
            DispatchStats::default()
        }
    }
}

async fn run_session<S: Site>(
    site: Arc<S>,
    mut session: WatchSession,
    mut shutdown: oneshot::Receiver<()>,
) -> DispatchStats {
    let role = session.root().role;
    let mut stats = DispatchStats::default();
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                record(&mut stats, role, joined);
            }
            _ = &mut shutdown => break,
            event = session.next_event() => {
                let Some(event) = event else {
                    debug!(%role, "session closed by producer");
                    break;
                };
                stats.dispatched += 1;

                let mut action = Box::pin(dispatch(Arc::clone(&site), event));
                let first =
                    std::future::poll_fn(|cx| Poll::Ready(action.as_mut().poll(cx))).await;
                match first {
                    Poll::Ready(result) => record(&mut stats, role, Ok(result)),
                    Poll::Pending => {
                        in_flight.spawn(action);
                    }
                }
            }
        }
    }

    drop(session);

    while let Some(joined) = in_flight.join_next().await {
        record(&mut stats, role, joined);
    }

    debug!(%role, ?stats, "session loop finished");
    stats
}

/// Run the site action(s) for one event to completion.
async fn dispatch<S: Site>(site: Arc<S>, event: FileEvent) -> yarnsite_core::Result<()> {
    let path = event.path.as_path();

    match event.role() {
        WatchRole::Source => {
            info!("File {} at: {}", event.kind, path.display());
            match event.kind {
                FileEventKind::Added => site.file_added(path).await?,
                FileEventKind::Changed => site.file_changed(path).await?,
                FileEventKind::Removed => site.file_removed(path).await?,
            }
        }
        WatchRole::Theme => {
            info!("Theme file {} at: {}", event.kind, path.display());
            info!("Rebuilding...");
            // The rebuild renders with the reloaded templates.
            site.read_theme().await?;
            site.build().await?;
        }
    }

    info!("done!");
    Ok(())
}

fn record(
    stats: &mut DispatchStats,
    role: WatchRole,
    joined: std::result::Result<yarnsite_core::Result<()>, JoinError>,
) {
    match joined {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            stats.failed += 1;
            error!(%role, error = %e, "Rebuild action failed");
        }
        Err(e) => {
            stats.failed += 1;
            error!(%role, "Rebuild action aborted: {e}");
        }
    }
}
