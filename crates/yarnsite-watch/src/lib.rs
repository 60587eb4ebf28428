//! yarnsite Watch Library
//!
//! Turns filesystem mutations under the source and theme trees into
//! incremental rebuild actions against a long-lived [`Site`].
//!
//! # Modules
//!
//! - [`ignore`] - Path containment rule for ignored roots
//! - [`event`] - File events and watch roots
//! - [`session`] - Watch sessions backed by `notify`
//! - [`dispatcher`] - Event-to-action dispatch
//!
//! [`Site`]: yarnsite_core::Site

pub mod dispatcher;
pub mod error;
pub mod event;
pub mod ignore;
pub mod session;

pub use dispatcher::{DispatchStats, RebuildDispatcher, WatchPlan};
pub use error::{Result, WatchError};
pub use event::{FileEvent, FileEventKind, WatchRole, WatchRoot};
pub use ignore::IgnoreSet;
pub use session::{NotifyBackend, WatchBackend, WatchSession};
