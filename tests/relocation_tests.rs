use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use walkdir::WalkDir;

use source_relocator::{
    copy_flattened, copy_mirrored, relocate, scan, summarize, ExclusionSet, RelocateError,
    RelocationPlan, ScanConfig, NO_PACKAGE,
};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Sorted relative paths of every regular file under `root`.
fn list_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

fn snapshot(root: &Path) -> Vec<(PathBuf, String)> {
    list_files(root)
        .into_iter()
        .map(|rel| {
            let content = fs::read_to_string(root.join(&rel)).unwrap();
            (rel, content)
        })
        .collect()
}

/// Layout:
///   proj/
///     src/main/a/X.kt         (package a)
///     src/main/b/X.kt         (no package)
///     src/main/c/Util.kt      (package com.example.util)
///     src/main/c/README.md
///     src/test/XTest.kt       excluded
///     build/tmp/Gen.kt        excluded
///     .idea/Cfg.kt            excluded
///     lib/generated/deep/G.kt excluded
fn create_project(root: &Path) -> PathBuf {
    let proj = root.join("proj");
    write(&proj, "src/main/a/X.kt", "package a\n\nclass X\n");
    write(&proj, "src/main/b/X.kt", "class X\n");
    write(
        &proj,
        "src/main/c/Util.kt",
        "package com.example.util\n\nobject Util {\n}\n",
    );
    write(&proj, "src/main/c/README.md", "# readme\n");
    write(&proj, "src/test/XTest.kt", "package a\n");
    write(&proj, "build/tmp/Gen.kt", "package gen\n");
    write(&proj, ".idea/Cfg.kt", "");
    write(&proj, "lib/generated/deep/G.kt", "");
    proj
}

#[test]
fn test_scan_excludes_tooling_dirs_at_any_depth() {
    let dir = tempdir().unwrap();
    let proj = create_project(dir.path());

    let entries = scan(&proj, &ScanConfig::default()).unwrap();
    let relative: Vec<PathBuf> = entries
        .iter()
        .map(|e| e.relative_path().to_path_buf())
        .collect();

    assert_eq!(
        relative,
        vec![
            PathBuf::from("src/main/a/X.kt"),
            PathBuf::from("src/main/b/X.kt"),
            PathBuf::from("src/main/c/Util.kt"),
        ]
    );
    assert!(entries.iter().all(|e| e.path().is_absolute()));
}

#[test]
fn test_flatten_end_to_end() {
    let dir = tempdir().unwrap();
    let proj = dir.path().join("proj");
    write(&proj, "src/a/X.kt", "package a\nclass X\n");
    write(&proj, "src/b/X.kt", "class X\n");

    let report = copy_flattened(&proj, &ScanConfig::default()).unwrap();

    let dest = dir.path().join("proj-files");
    assert_eq!(report.copied, 2);
    assert!(report.errors.is_empty());
    assert_eq!(
        list_files(&dest),
        vec![PathBuf::from("X.kt"), PathBuf::from("a_X.kt")]
    );
    assert_eq!(
        fs::read_to_string(dest.join("a_X.kt")).unwrap(),
        "package a\nclass X\n"
    );
}

#[test]
fn test_flatten_collisions_without_package() {
    let dir = tempdir().unwrap();
    let proj = dir.path().join("proj");
    write(&proj, "a/Foo.kt", "class A");
    write(&proj, "b/Foo.kt", "class B");
    write(&proj, "c/Foo.kt", "class C");

    let report = copy_flattened(&proj, &ScanConfig::default()).unwrap();

    let dest = dir.path().join("proj-files");
    assert_eq!(report.copied, 3);
    assert_eq!(fs::read_to_string(dest.join("Foo.kt")).unwrap(), "class A");
    assert_eq!(fs::read_to_string(dest.join("Foo_1.kt")).unwrap(), "class B");
    assert_eq!(fs::read_to_string(dest.join("Foo_2.kt")).unwrap(), "class C");

    let mut names: Vec<_> = report
        .copied_files
        .iter()
        .map(|f| f.destination.clone())
        .collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 3);
}

#[test]
fn test_flatten_wipes_previous_destination() {
    let dir = tempdir().unwrap();
    let proj = create_project(dir.path());
    let dest = dir.path().join("proj-files");
    write(&dest, "stale.txt", "old");
    write(&dest, "nested/Old.kt", "old");
    write(&dest, "X.kt", "old content");

    let report = copy_flattened(&proj, &ScanConfig::default()).unwrap();

    assert_eq!(report.copied, 3);
    assert_eq!(
        list_files(&dest),
        vec![
            PathBuf::from("X.kt"),
            PathBuf::from("a_X.kt"),
            PathBuf::from("com_example_util_Util.kt"),
        ]
    );
    assert_eq!(fs::read_to_string(dest.join("X.kt")).unwrap(), "class X\n");
}

#[test]
fn test_flatten_uses_custom_suffix() {
    let dir = tempdir().unwrap();
    let proj = dir.path().join("proj");
    write(&proj, "A.kt", "");

    let config = ScanConfig {
        flatten_suffix: "_flat".to_string(),
        ..ScanConfig::default()
    };
    copy_flattened(&proj, &config).unwrap();

    assert!(dir.path().join("proj_flat/A.kt").is_file());
}

#[test]
fn test_mirror_preserves_structure_and_keeps_existing_content() {
    let dir = tempdir().unwrap();
    let proj = create_project(dir.path());
    let out = dir.path().join("out");
    write(&out, "keep.txt", "untouched");
    write(&out, "src/main/b/X.kt", "stale");

    let report = copy_mirrored(&proj, &out, &ScanConfig::default()).unwrap();

    assert_eq!(report.copied, 3);
    assert_eq!(
        list_files(&out),
        vec![
            PathBuf::from("keep.txt"),
            PathBuf::from("src/main/a/X.kt"),
            PathBuf::from("src/main/b/X.kt"),
            PathBuf::from("src/main/c/Util.kt"),
        ]
    );
    assert_eq!(fs::read_to_string(out.join("keep.txt")).unwrap(), "untouched");
    assert_eq!(
        fs::read_to_string(out.join("src/main/b/X.kt")).unwrap(),
        "class X\n"
    );
}

#[test]
fn test_mirror_is_idempotent() {
    let dir = tempdir().unwrap();
    let proj = create_project(dir.path());
    let out = dir.path().join("nested/../out");

    let first = copy_mirrored(&proj, &out, &ScanConfig::default()).unwrap();
    let after_first = snapshot(&dir.path().join("out"));
    let second = copy_mirrored(&proj, &out, &ScanConfig::default()).unwrap();
    let after_second = snapshot(&dir.path().join("out"));

    assert_eq!(first.copied, second.copied);
    assert_eq!(after_first, after_second);
    assert_eq!(first.destination, dir.path().join("out"));
}

#[test]
fn test_missing_file_is_isolated() {
    let dir = tempdir().unwrap();
    let proj = create_project(dir.path());
    let config = ScanConfig::default();

    let plan = RelocationPlan::for_source(&proj, None, &config).unwrap();
    let entries = scan(&proj, &config).unwrap();
    fs::remove_file(proj.join("src/main/c/Util.kt")).unwrap();

    let report = relocate(&entries, &plan).unwrap();

    assert_eq!(report.copied, entries.len() - 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].source.ends_with("src/main/c/Util.kt"));
    assert_eq!(list_files(&dir.path().join("proj-files")).len(), 2);
}

#[test]
fn test_invalid_source_fails_before_touching_destination() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");
    let out = dir.path().join("out");

    let err = copy_mirrored(&missing, &out, &ScanConfig::default()).unwrap_err();
    assert!(matches!(err, RelocateError::SourceMissing(_)));
    assert!(!out.exists());

    let file = dir.path().join("file.kt");
    fs::write(&file, "").unwrap();
    let err = copy_flattened(&file, &ScanConfig::default()).unwrap_err();
    assert!(matches!(err, RelocateError::SourceNotDirectory(_)));
    assert!(err.is_invalid_input());
    assert!(!dir.path().join("file.kt-files").exists());
}

#[test]
fn test_mirror_onto_source_leaves_source_untouched() {
    let dir = tempdir().unwrap();
    let proj = create_project(dir.path());
    let before = snapshot(&proj);

    let err = copy_mirrored(&proj, &proj, &ScanConfig::default()).unwrap_err();
    assert!(matches!(err, RelocateError::DestinationContainsSource { .. }));
    assert!(err.is_invalid_input());

    let err = copy_mirrored(&proj, proj.join("src/.."), &ScanConfig::default()).unwrap_err();
    assert!(matches!(err, RelocateError::DestinationContainsSource { .. }));

    let err = copy_mirrored(&proj, dir.path(), &ScanConfig::default()).unwrap_err();
    assert!(matches!(err, RelocateError::DestinationContainsSource { .. }));

    assert_eq!(snapshot(&proj), before);
}

#[test]
fn test_mirror_into_source_subdirectory_keeps_originals() {
    let dir = tempdir().unwrap();
    let proj = create_project(dir.path());
    let before = snapshot(&proj);
    let out = proj.join("mirror");

    let report = copy_mirrored(&proj, &out, &ScanConfig::default()).unwrap();

    assert_eq!(report.copied, 3);
    for (rel, content) in &before {
        assert_eq!(&fs::read_to_string(proj.join(rel)).unwrap(), content);
    }
    assert_eq!(
        fs::read_to_string(out.join("src/main/a/X.kt")).unwrap(),
        "package a\n\nclass X\n"
    );
}

#[test]
fn test_flatten_plan_over_source_never_wipes_it() {
    let dir = tempdir().unwrap();
    let proj = create_project(dir.path());
    write(&proj, "notes.txt", "keep me\n");
    let before = snapshot(&proj);

    let err = relocate(&[], &RelocationPlan::flatten(&proj, &proj)).unwrap_err();
    assert!(matches!(err, RelocateError::UnsafeWipe { .. }));

    let err = relocate(&[], &RelocationPlan::flatten(&proj, proj.join("src"))).unwrap_err();
    assert!(matches!(err, RelocateError::UnsafeWipe { .. }));

    assert_eq!(snapshot(&proj), before);
}

#[test]
fn test_custom_extension_and_exclusions() {
    let dir = tempdir().unwrap();
    let proj = create_project(dir.path());
    write(&proj, "vendor/Lib.kt", "");
    let config = ScanConfig {
        extension: ".md".to_string(),
        exclusions: ExclusionSet::new(["vendor"]),
        ..ScanConfig::default()
    };

    let entries = scan(&proj, &config).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].relative_path(), Path::new("src/main/c/README.md"));
}

#[test]
fn test_summary_counts_packages_and_lines() {
    let dir = tempdir().unwrap();
    let proj = create_project(dir.path());

    let entries = scan(&proj, &ScanConfig::default()).unwrap();
    let report = summarize(&entries);

    assert_eq!(report.files_discovered, 3);
    assert_eq!(report.packages["a"], 1);
    assert_eq!(report.packages["com.example.util"], 1);
    assert_eq!(report.packages[NO_PACKAGE], 1);
    assert_eq!(report.total_lines, 3 + 1 + 4);
}
