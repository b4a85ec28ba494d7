pub mod file_copy;
pub mod file_discovery;

pub use file_copy::{
    copy_flattened, copy_mirrored, relocate, CopiedFile, CopyError, CopyOutcome,
    DestinationLayout, DestinationPlanner, DestinationPolicy, RelocationPlan, RelocationReport,
};
pub use file_discovery::{scan, summarize, DiscoveryReport, ScanConfig};
