use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::RelocateError;

/// Case-sensitive suffix match on the full file name, so `.kt` matches
/// `Foo.kt` but not `Foo.KT` or `Foo.kts`.
pub fn matches_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(extension))
}

/// Check that `path` is an existing directory and return its canonical form.
pub fn validate_source_dir(path: &Path) -> Result<PathBuf, RelocateError> {
    if !path.exists() {
        return Err(RelocateError::SourceMissing(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(RelocateError::SourceNotDirectory(path.to_path_buf()));
    }
    Ok(fs::canonicalize(path).unwrap_or_else(|_| absolutize(path)))
}

/// Absolute, lexically normalized form of `path` (`.` and `..` folded) without
/// touching the filesystem.
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Like [`absolutize`], but resolves symlinks in the longest prefix of `path`
/// that exists, so a destination reached through a link compares equal to
/// its canonical target.
pub fn resolve_path(path: &Path) -> PathBuf {
    let absolute = absolutize(path);
    let mut existing = absolute.as_path();
    let mut rest = Vec::new();

    loop {
        if let Ok(resolved) = fs::canonicalize(existing) {
            return rest.iter().rev().fold(resolved, |acc, part| acc.join(part));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return absolute,
        }
    }
}

/// `parent/name<suffix>` next to `source`, or `None` for a filesystem root.
pub fn flatten_destination_for(source: &Path, suffix: &str) -> Option<PathBuf> {
    let parent = source.parent()?;
    let name = source.file_name()?.to_str()?;
    Some(parent.join(format!("{name}{suffix}")))
}

/// True when one path contains the other.
pub fn is_overlap(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

/// Create `dir` and its parents, keeping existing content.
pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Remove whatever is at `dir` and create it again empty.
pub fn recreate_directory(dir: &Path) -> io::Result<()> {
    match fs::symlink_metadata(dir) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(dir)?,
        Ok(_) => fs::remove_file(dir)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(dir)
}

/// Copy `source` to `destination`, creating parent directories and replacing
/// an existing destination file.
pub fn copy_file_overwrite<P: AsRef<Path>, Q: AsRef<Path>>(source: P, destination: Q) -> Result<u64> {
    let src_path = source.as_ref();
    let dest_path = destination.as_ref();

    if !src_path.is_file() {
        anyhow::bail!("Source file does not exist: {:?}", src_path);
    }

    if is_same_file(src_path, dest_path) {
        anyhow::bail!("Source and destination are the same file: {:?}", src_path);
    }

    if let Some(parent) = dest_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    fs::copy(src_path, dest_path)
        .with_context(|| format!("Failed to copy file from {:?} to {:?}", src_path, dest_path))
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
