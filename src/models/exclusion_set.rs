use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Component, Path};

/// Directory names skipped by default: build output, tests, VCS and IDE
/// metadata, generated sources.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &["build", "test", ".git", ".idea", ".gradle", "generated"];

/// Immutable set of directory names whose whole subtree is skipped.
///
/// Matching is exact and case-sensitive against single path components, so
/// `build` excludes `proj/build/Foo.kt` but not `proj/builder/Foo.kt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionSet {
    names: BTreeSet<String>,
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_DIRS.iter().copied())
    }
}

impl ExclusionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(Into::into)
                .filter(|name: &String| !name.is_empty())
                .collect(),
        }
    }

    /// Parse a comma-separated list such as `build,test,.git`.
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(',').map(str::trim))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Check every directory component of `path` against the set.
    ///
    /// For a directory the last component is itself a directory name and is
    /// checked too; for a file only its ancestors are.
    pub fn excludes(&self, path: &Path, is_dir: bool) -> bool {
        let dirs = if is_dir { Some(path) } else { path.parent() };
        let Some(dirs) = dirs else {
            return false;
        };

        dirs.components().any(|component| match component {
            Component::Normal(name) => name.to_str().is_some_and(|name| self.contains(name)),
            _ => false,
        })
    }
}
