//! Convention-based plugin package discovery.
//!
//! A dependency is a plugin when its name starts with the configured prefix
//! and has a non-empty remainder. Resolution is pure: the same manifest always
//! yields the same set.

use std::collections::BTreeSet;

use crate::manifest::ManifestDependencies;

/// Selects plugin packages from manifest dependencies by name prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageResolver {
    prefix: String,
}

impl PackageResolver {
    /// Create a resolver for the given name prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The configured prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether `name` qualifies as a plugin package. Case-sensitive; a bare
    /// prefix does not qualify.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        name.strip_prefix(self.prefix.as_str())
            .is_some_and(|suffix| !suffix.is_empty())
    }

    /// Plugin package names declared in either dependency list.
    #[must_use]
    pub fn resolve(&self, deps: &ManifestDependencies) -> BTreeSet<String> {
        let plugins: BTreeSet<String> = deps
            .names()
            .filter(|name| self.matches(name))
            .map(str::to_owned)
            .collect();

        tracing::debug!(prefix = %self.prefix, count = plugins.len(), "Resolved plugin packages");
        plugins
    }
}

/// Resolve plugin packages with a one-off prefix.
#[must_use]
pub fn resolve_plugins(deps: &ManifestDependencies, prefix: &str) -> BTreeSet<String> {
    PackageResolver::new(prefix).resolve(deps)
}
