use crate::error::{RelocateError, Result};
use crate::models::{extract_package, FileEntry};
use crate::services::file_discovery::{scan, ScanConfig};
use crate::utils::{
    absolutize, copy_file_overwrite, ensure_directory, flatten_destination_for, is_overlap,
    recreate_directory, resolve_path, validate_source_dir,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// How destination paths are derived from scanned entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DestinationLayout {
    /// Keep the path relative to the scan root.
    Mirror,
    /// Put every file directly in the destination, prefixed by its package
    /// and suffixed `_1`, `_2`, ... on name collisions.
    Flatten,
}

/// What happens to an already existing destination directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DestinationPolicy {
    /// Keep existing content and overwrite same-named files.
    OverwriteInPlace,
    /// Delete the destination recursively and start from an empty directory.
    WipeAndRecreate,
}

#[derive(Debug, Clone)]
pub struct RelocationPlan {
    /// Scan root the entries come from. Never written to or wiped.
    pub source: PathBuf,
    pub destination: PathBuf,
    pub layout: DestinationLayout,
    pub policy: DestinationPolicy,
}

impl RelocationPlan {
    pub fn mirror<P: Into<PathBuf>, Q: Into<PathBuf>>(source: P, destination: Q) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            layout: DestinationLayout::Mirror,
            policy: DestinationPolicy::OverwriteInPlace,
        }
    }

    pub fn flatten<P: Into<PathBuf>, Q: Into<PathBuf>>(source: P, destination: Q) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            layout: DestinationLayout::Flatten,
            policy: DestinationPolicy::WipeAndRecreate,
        }
    }

    /// Mirror into `destination` when one is given, otherwise flatten into a
    /// sibling of `source` named with the configured suffix.
    pub fn for_source(
        source: &Path,
        destination: Option<&Path>,
        config: &ScanConfig,
    ) -> Result<Self> {
        let source = validate_source_dir(source)?;

        let plan = match destination {
            Some(destination) => Self::mirror(source, destination),
            None => {
                let destination = flatten_destination_for(&source, &config.flatten_suffix)
                    .ok_or_else(|| RelocateError::NoFlattenParent(source.clone()))?;
                Self::flatten(source, destination)
            }
        };

        plan.check_destination(&resolve_path(&plan.destination))?;
        Ok(plan)
    }

    /// Reject destinations whose setup or copies would touch the source tree.
    ///
    /// A wipe must not overlap the source in either direction. A mirror must
    /// not be the source or one of its ancestors, since targets there can be
    /// source files themselves.
    fn check_destination(&self, destination: &Path) -> Result<()> {
        let source = resolve_path(&self.source);

        match self.policy {
            DestinationPolicy::WipeAndRecreate if is_overlap(&source, destination) => {
                Err(RelocateError::UnsafeWipe {
                    destination: destination.to_path_buf(),
                    source_dir: source,
                })
            }
            DestinationPolicy::OverwriteInPlace if source.starts_with(destination) => {
                Err(RelocateError::DestinationContainsSource {
                    destination: destination.to_path_buf(),
                    source_dir: source,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Assigns destination paths for one relocation run.
///
/// In flatten mode every assigned name is reserved immediately, whether or
/// not the copy that follows succeeds, so the result depends only on the
/// order entries are presented in.
#[derive(Debug)]
pub struct DestinationPlanner {
    layout: DestinationLayout,
    root: PathBuf,
    used_names: HashSet<String>,
}

impl DestinationPlanner {
    pub fn new(layout: DestinationLayout, root: PathBuf) -> Self {
        Self {
            layout,
            root,
            used_names: HashSet::new(),
        }
    }

    pub fn assign(&mut self, entry: &FileEntry) -> anyhow::Result<PathBuf> {
        match self.layout {
            DestinationLayout::Mirror => Ok(self.root.join(entry.relative_path())),
            DestinationLayout::Flatten => {
                let package = extract_package(entry)?;
                let name = self.claim_flat_name(&package.prefix(), entry.file_name());
                Ok(self.root.join(name))
            }
        }
    }

    fn claim_flat_name(&mut self, prefix: &str, file_name: &str) -> String {
        let candidate = format!("{prefix}{file_name}");
        if self.used_names.insert(candidate.clone()) {
            return candidate;
        }

        let (stem, extension) = split_extension(file_name);
        let mut counter = 1;
        loop {
            let candidate = format!("{prefix}{stem}_{counter}{extension}");
            if self.used_names.insert(candidate.clone()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Split at the last dot, keeping it with the extension. A leading dot
/// starts the stem, not an extension.
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}

/// Result of relocating one entry
#[derive(Debug, Clone)]
pub enum CopyOutcome {
    Copied {
        source: PathBuf,
        destination: PathBuf,
    },
    Failed {
        source: PathBuf,
        destination: Option<PathBuf>,
        error: String,
    },
}

impl CopyOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CopyOutcome::Copied { .. })
    }
}

/// Copy `entries` according to `plan`.
///
/// Only destination setup can fail the whole call. Each file that cannot be
/// read or copied is logged, recorded in the report and skipped.
pub fn relocate(entries: &[FileEntry], plan: &RelocationPlan) -> Result<RelocationReport> {
    let started_at = Utc::now();
    let destination = absolutize(&plan.destination);

    info!(
        "Relocating {} files to {} ({:?}, {:?})",
        entries.len(),
        destination.display(),
        plan.layout,
        plan.policy
    );

    let resolved = resolve_path(&destination);
    plan.check_destination(&resolved)?;
    if resolved.starts_with(resolve_path(&plan.source)) {
        warn!(
            "Destination {} is inside source {}; later scans will see the copies",
            destination.display(),
            plan.source.display()
        );
    }
    prepare_destination(&destination, plan.policy)?;

    let mut planner = DestinationPlanner::new(plan.layout, destination.clone());
    let outcomes: Vec<CopyOutcome> = entries
        .iter()
        .map(|entry| relocate_entry(entry, &mut planner))
        .collect();

    let report = create_relocation_report(destination, outcomes, started_at);

    info!(
        "Relocation completed. Copied: {}, Errors: {}",
        report.copied,
        report.errors.len()
    );

    Ok(report)
}

fn prepare_destination(destination: &Path, policy: DestinationPolicy) -> Result<()> {
    let result = match policy {
        DestinationPolicy::OverwriteInPlace => ensure_directory(destination),
        DestinationPolicy::WipeAndRecreate => {
            if destination.exists() {
                info!("Removing existing destination {}", destination.display());
            }
            recreate_directory(destination)
        }
    };

    result.map_err(|source| RelocateError::DestinationInit {
        path: destination.to_path_buf(),
        source,
    })
}

fn relocate_entry(entry: &FileEntry, planner: &mut DestinationPlanner) -> CopyOutcome {
    let source = entry.path().to_path_buf();

    let destination = match planner.assign(entry) {
        Ok(destination) => destination,
        Err(e) => {
            return CopyOutcome::Failed {
                source,
                destination: None,
                error: format!("{:#}", e),
            }
        }
    };

    match copy_file_overwrite(&source, &destination) {
        Ok(_) => CopyOutcome::Copied {
            source,
            destination,
        },
        Err(e) => CopyOutcome::Failed {
            source,
            destination: Some(destination),
            error: format!("{:#}", e),
        },
    }
}

/// Mirror the matched files of `source` under `destination`, keeping relative
/// paths. Existing destination content is kept and same-named files are
/// overwritten.
pub fn copy_mirrored<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    destination: Q,
    config: &ScanConfig,
) -> Result<RelocationReport> {
    let plan = RelocationPlan::for_source(source.as_ref(), Some(destination.as_ref()), config)?;
    let entries = scan(source, config)?;
    relocate(&entries, &plan)
}

/// Flatten the matched files of `source` into `<source><flatten_suffix>` next
/// to it. The destination is wiped first.
pub fn copy_flattened<P: AsRef<Path>>(source: P, config: &ScanConfig) -> Result<RelocationReport> {
    let plan = RelocationPlan::for_source(source.as_ref(), None, config)?;
    let entries = scan(source, config)?;
    relocate(&entries, &plan)
}

/// Build the report and log each failure
fn create_relocation_report(
    destination_root: PathBuf,
    outcomes: Vec<CopyOutcome>,
    started_at: DateTime<Utc>,
) -> RelocationReport {
    let (copied, failed): (Vec<_>, Vec<_>) =
        outcomes.into_iter().partition(CopyOutcome::is_success);

    let copied_files: Vec<CopiedFile> = copied
        .into_iter()
        .filter_map(|outcome| match outcome {
            CopyOutcome::Copied {
                source,
                destination,
            } => Some(CopiedFile {
                source,
                destination,
            }),
            CopyOutcome::Failed { .. } => None,
        })
        .collect();

    let errors: Vec<CopyError> = failed
        .into_iter()
        .filter_map(|outcome| match outcome {
            CopyOutcome::Failed {
                source,
                destination,
                error,
            } => {
                error!("Failed to relocate {}: {}", source.display(), error);
                Some(CopyError {
                    source,
                    destination,
                    error,
                })
            }
            CopyOutcome::Copied { .. } => None,
        })
        .collect();

    RelocationReport {
        destination: destination_root,
        copied: copied_files.len(),
        copied_files,
        errors,
        started_at,
        finished_at: Utc::now(),
    }
}

/// Report structure for one relocation run
#[derive(Debug, Clone, Serialize)]
pub struct RelocationReport {
    pub destination: PathBuf,
    pub copied: usize,
    pub copied_files: Vec<CopiedFile>,
    pub errors: Vec<CopyError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RelocationReport {
    pub fn total_processed(&self) -> usize {
        self.copied + self.errors.len()
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.total_processed();
        if total == 0 {
            0.0
        } else {
            self.copied as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CopiedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct CopyError {
    pub source: PathBuf,
    /// Unset when the failure happened before a destination was assigned.
    pub destination: Option<PathBuf>,
    pub error: String,
}
