use crate::error::Result;
use crate::models::{create_source_file_from_entry, ExclusionSet, FileEntry, SourceFile};
use crate::utils::{matches_extension, validate_source_dir};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, error, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Configuration for scanning and relocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Suffix a file name must end with, e.g. `.kt`.
    pub extension: String,
    pub exclusions: ExclusionSet,
    /// Appended to the source directory name to form the flatten destination.
    pub flatten_suffix: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extension: ".kt".to_string(),
            exclusions: ExclusionSet::default(),
            flatten_suffix: "-files".to_string(),
        }
    }
}

/// Walk `root` and collect every file ending with the configured extension
/// outside excluded directories.
///
/// Siblings are visited in file-name order, so the result is stable across
/// runs. Excluded directories are pruned rather than filtered. Unreadable
/// entries are logged and skipped.
pub fn scan<P: AsRef<Path>>(root: P, config: &ScanConfig) -> Result<Vec<FileEntry>> {
    let root = validate_source_dir(root.as_ref())?;

    info!(
        "Scanning {} for *{} files",
        root.display(),
        config.extension
    );

    if config.exclusions.excludes(&root, true) {
        warn!(
            "Scan root {} lies inside an excluded directory, nothing to scan",
            root.display()
        );
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_excluded_dir(entry, &config.exclusions));

    for item in walker {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable path during scan: {}", e);
                continue;
            }
        };

        if entry.file_type().is_dir() || !entry.path().is_file() {
            continue;
        }

        if matches_extension(entry.path(), &config.extension) {
            debug!("Matched {}", entry.path().display());
            entries.push(FileEntry::new(entry.into_path(), root.clone()));
        }
    }

    info!("Discovered {} files under {}", entries.len(), root.display());

    Ok(entries)
}

fn is_excluded_dir(entry: &DirEntry, exclusions: &ExclusionSet) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| exclusions.contains(name))
}

/// Process every entry and aggregate package and line statistics.
pub fn summarize(entries: &[FileEntry]) -> DiscoveryReport {
    let results: Vec<_> = entries.iter().map(create_source_file_from_entry).collect();

    let mut report = DiscoveryReport {
        files_discovered: entries.len(),
        ..DiscoveryReport::empty()
    };

    for result in results {
        match result {
            Ok(source_file) => report.record(&source_file),
            Err(e) => {
                error!("Failed to process file: {:#}", e);
                report.processing_errors += 1;
            }
        }
    }

    report
}

/// Report structure for the scan phase
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryReport {
    pub files_discovered: usize,
    pub files_processed: usize,
    pub processing_errors: usize,
    pub total_lines: usize,
    pub total_bytes: u64,
    /// File count per package, `No package` included.
    pub packages: BTreeMap<String, usize>,
}

impl DiscoveryReport {
    pub fn empty() -> Self {
        Self::default()
    }

    fn record(&mut self, source_file: &SourceFile) {
        self.files_processed += 1;
        self.total_lines += source_file.total_lines;
        self.total_bytes += source_file.size_bytes;
        *self
            .packages
            .entry(source_file.package.to_string())
            .or_insert(0) += 1;
    }

    pub fn success_rate(&self) -> f64 {
        if self.files_discovered == 0 {
            0.0
        } else {
            self.files_processed as f64 / self.files_discovered as f64
        }
    }
}
