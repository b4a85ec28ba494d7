use std::path::PathBuf;
use thiserror::Error;

/// Errors that fail a whole scan or relocation before any file is copied.
#[derive(Error, Debug)]
pub enum RelocateError {
    #[error("Source directory does not exist: {0}")]
    SourceMissing(PathBuf),

    #[error("Source is not a directory: {0}")]
    SourceNotDirectory(PathBuf),

    #[error("Cannot derive a flatten destination next to {0}")]
    NoFlattenParent(PathBuf),

    #[error("Refusing to wipe {destination}: it overlaps the source tree {source_dir}")]
    UnsafeWipe {
        destination: PathBuf,
        source_dir: PathBuf,
    },

    #[error("Mirror destination {destination} contains the source tree {source_dir}")]
    DestinationContainsSource {
        destination: PathBuf,
        source_dir: PathBuf,
    },

    #[error("Failed to initialize destination {path}: {source}")]
    DestinationInit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RelocateError {
    /// True for errors caused by the caller's input paths.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            RelocateError::SourceMissing(_)
                | RelocateError::SourceNotDirectory(_)
                | RelocateError::NoFlattenParent(_)
                | RelocateError::UnsafeWipe { .. }
                | RelocateError::DestinationContainsSource { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RelocateError>;
