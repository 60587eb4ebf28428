//! yarnsite Core Library
//!
//! Configuration, error handling, the [`Site`] collaborator contract and
//! convention-based plugin discovery for the yarnsite static site generator.

pub mod bundle;
pub mod config;
pub mod error;
pub mod manifest;
pub mod plugins;
pub mod site;

pub use bundle::{BundleEntry, BundlePlan};
pub use config::{Config, ResolvedPaths};
pub use error::{CoreError, Result};
pub use manifest::ManifestDependencies;
pub use plugins::{PackageResolver, resolve_plugins};
pub use site::Site;
