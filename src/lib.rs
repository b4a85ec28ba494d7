pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use std::env;

// Re-export commonly used types
pub use error::RelocateError;
pub use models::{ExclusionSet, FileEntry, PackageName, SourceFile, NO_PACKAGE};
pub use services::{
    copy_flattened, copy_mirrored, relocate, scan, summarize, CopyOutcome, DestinationLayout,
    DestinationPolicy, DiscoveryReport, RelocationPlan, RelocationReport, ScanConfig,
};

pub const ENV_EXTENSION: &str = "SOURCE_RELOCATOR_EXTENSION";
pub const ENV_EXCLUDE: &str = "SOURCE_RELOCATOR_EXCLUDE";
pub const ENV_FLATTEN_SUFFIX: &str = "SOURCE_RELOCATOR_FLATTEN_SUFFIX";

// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub scan: ScanConfig,
    pub log_level: String,
    pub scan_only: bool,
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            log_level: "info".to_string(),
            scan_only: false,
            json: false,
        }
    }
}

impl AppConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    /// Apply `SOURCE_RELOCATOR_*` values returned by `lookup`. Empty values
    /// are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(extension) = value(ENV_EXTENSION) {
            self.scan.extension = extension.trim().to_string();
        }
        if let Some(exclude) = value(ENV_EXCLUDE) {
            self.scan.exclusions = ExclusionSet::from_list(&exclude);
        }
        if let Some(suffix) = value(ENV_FLATTEN_SUFFIX) {
            self.scan.flatten_suffix = suffix.trim().to_string();
        }
        self
    }
}
