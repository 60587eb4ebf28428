//! Project manifest dependency declarations.
//!
//! Only dependency names matter here; version requirements are discarded.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use serde::Deserialize;

use crate::error::{CoreError, Result};

/// Dependency names declared by a project manifest (`package.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDependencies {
    /// Names under `dependencies`.
    pub runtime: BTreeSet<String>,

    /// Names under `devDependencies`.
    pub development: BTreeSet<String>,
}

/// Raw manifest shape. Either list may be absent.
#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    dependencies: Option<BTreeMap<String, serde_json::Value>>,

    #[serde(default, rename = "devDependencies")]
    dev_dependencies: Option<BTreeMap<String, serde_json::Value>>,
}

impl ManifestDependencies {
    /// Build from explicit name lists.
    pub fn new<R, D>(runtime: R, development: D) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            runtime: runtime.into_iter().map(Into::into).collect(),
            development: development.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse the dependency sections of a JSON manifest.
    pub fn from_json(content: &str) -> Result<Self> {
        let raw: RawManifest = serde_json::from_str(content)?;

        Ok(Self {
            runtime: raw.dependencies.unwrap_or_default().into_keys().collect(),
            development: raw
                .dev_dependencies
                .unwrap_or_default()
                .into_keys()
                .collect(),
        })
    }

    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::manifest(path, format!("cannot read manifest: {e}")))?;

        Self::from_json(&content).map_err(|e| CoreError::manifest(path, e.to_string()))
    }

    /// Every declared name across both lists, each once.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.runtime
            .union(&self.development)
            .map(String::as_str)
    }
}
