//! Ignored-root containment rule.
//!
//! A path is ignored when it equals, or lies beneath, one of the configured
//! roots. Containment is checked per path component, so `/src/theme-x` is not
//! inside `/src/theme`.

use std::path::{Component, Path, PathBuf};

/// Fixed set of absolute directories whose contents never trigger actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    roots: Vec<PathBuf>,
}

impl IgnoreSet {
    /// Create an ignore set from a list of directories.
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(|p| normalize(&p.into())).collect(),
        }
    }

    /// An ignore set that ignores nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The ignored roots.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Whether the set has no roots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Whether `path` equals or is nested under any ignored root.
    #[must_use]
    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.roots.is_empty() {
            return false;
        }

        let path = normalize(path);
        self.roots.iter().any(|root| path.starts_with(root))
    }
}

/// Lexically drop `.` segments and resolve `..` against preceding segments.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
