pub mod exclusion_set;
pub mod file_entry;
pub mod source_file;

pub use exclusion_set::{ExclusionSet, DEFAULT_EXCLUDED_DIRS};
pub use file_entry::FileEntry;
pub use source_file::{
    create_source_file_from_entry, extract_package, parse_package_name, PackageName, SourceFile,
    NO_PACKAGE,
};
