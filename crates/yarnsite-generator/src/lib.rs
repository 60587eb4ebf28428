//! yarnsite Generator Library
//!
//! Filesystem implementation of the [`Site`](yarnsite_core::Site) contract.
//!
//! # Modules
//!
//! - [`scan`] - Source and theme tree scanning
//! - [`site`] - [`MirrorSite`], which mirrors the source tree and theme assets
//!   into the destination directory

pub mod scan;
pub mod site;

pub use scan::scan_files;
pub use site::{BuildStats, MirrorSite};
