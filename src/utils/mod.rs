pub mod file_operations;

pub use file_operations::{
    absolutize, copy_file_overwrite, ensure_directory, flatten_destination_for, is_overlap,
    matches_extension, recreate_directory, resolve_path, validate_source_dir,
};
