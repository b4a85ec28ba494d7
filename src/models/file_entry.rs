use serde::Serialize;
use std::path::{Path, PathBuf};

/// A matched source file found under a scan root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    path: PathBuf,
    root: PathBuf,
}

impl FileEntry {
    pub fn new(path: PathBuf, root: PathBuf) -> Self {
        Self { path, root }
    }

    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The scan root this entry was found under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path relative to the scan root. Falls back to the bare file name for
    /// an entry that does not live under its root.
    pub fn relative_path(&self) -> &Path {
        self.path
            .strip_prefix(&self.root)
            .unwrap_or_else(|_| Path::new(self.file_name()))
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}
