use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::models::FileEntry;

/// Display form of [`PackageName::Missing`].
pub const NO_PACKAGE: &str = "No package";

/// Package declaration found in a source file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PackageName {
    Declared(String),
    Missing,
}

impl PackageName {
    pub fn as_str(&self) -> &str {
        match self {
            PackageName::Declared(name) => name,
            PackageName::Missing => NO_PACKAGE,
        }
    }

    /// Flattened filename prefix: `com.example` becomes `com_example_`.
    pub fn prefix(&self) -> String {
        match self {
            PackageName::Declared(name) => format!("{}_", name.replace('.', "_")),
            PackageName::Missing => String::new(),
        }
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PackageName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

fn package_regex() -> &'static Regex {
    static PACKAGE_RE: OnceLock<Regex> = OnceLock::new();
    PACKAGE_RE.get_or_init(|| Regex::new(r"package\s+([\w.]+)").expect("package regex is valid"))
}

/// Find the first `package <dotted.identifier>` anywhere in `text`.
///
/// Comments and string literals are not special: a match inside them counts.
pub fn parse_package_name(text: &str) -> PackageName {
    package_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| PackageName::Declared(m.as_str().to_string()))
        .unwrap_or(PackageName::Missing)
}

/// Read `entry` and extract its package declaration.
pub fn extract_package(entry: &FileEntry) -> Result<PackageName> {
    let bytes = std::fs::read(entry.path())
        .with_context(|| format!("Failed to read file: {:?}", entry.path()))?;
    Ok(parse_package_name(&String::from_utf8_lossy(&bytes)))
}

/// Per-file facts gathered for the discovery report.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub package: PackageName,
    pub total_lines: usize,
    pub size_bytes: u64,
    pub modified_at: DateTime<Utc>,
}

/// Content-derived fields of a source file.
#[derive(Debug)]
pub struct FileProcessingResult {
    pub package: PackageName,
    pub total_lines: usize,
}

pub fn create_source_file_from_entry(entry: &FileEntry) -> Result<SourceFile> {
    let path = entry.path();
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for: {:?}", path))?;

    let processing_result = process_file_one_pass(path)?;

    Ok(SourceFile {
        path: path.to_path_buf(),
        relative_path: entry.relative_path().to_path_buf(),
        package: processing_result.package,
        total_lines: processing_result.total_lines,
        size_bytes: metadata.len(),
        modified_at: metadata_to_datetime(metadata.modified().ok()),
    })
}

/// Read the file once for its package declaration and line count.
pub fn process_file_one_pass<P: AsRef<Path>>(file_path: P) -> Result<FileProcessingResult> {
    let bytes = std::fs::read(file_path.as_ref())
        .with_context(|| format!("Failed to open file: {:?}", file_path.as_ref()))?;

    let text = String::from_utf8_lossy(&bytes);

    Ok(FileProcessingResult {
        package: parse_package_name(&text),
        total_lines: count_lines(&bytes),
    })
}

/// Newline count, plus one for a trailing line without a newline.
fn count_lines(bytes: &[u8]) -> usize {
    let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
    match bytes.last() {
        Some(&last) if last != b'\n' => newlines + 1,
        _ => newlines,
    }
}

fn metadata_to_datetime(system_time: Option<std::time::SystemTime>) -> DateTime<Utc> {
    system_time.map(DateTime::<Utc>::from).unwrap_or_else(Utc::now)
}
