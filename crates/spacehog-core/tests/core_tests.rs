use spacehog_core::{
    AccessError, AccessErrorKind, FileEntry, ScanOptions, ScanProgress, StorageClass, format_size,
};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

#[test]
fn test_access_error_from_io() {
    let denied: AccessError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
    assert_eq!(denied.kind, AccessErrorKind::PermissionDenied);

    let missing: AccessError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
    assert_eq!(missing.kind, AccessErrorKind::NotFound);

    let other: AccessError = io::Error::other("disk on fire").into();
    assert_eq!(other.kind, AccessErrorKind::Io);
    assert!(other.to_string().contains("disk on fire"));
}

#[test]
fn test_options_defaults() {
    let options = ScanOptions::default();
    assert_eq!(options.max_files, 10);
    assert_eq!(options.max_dirs, 10);
    assert_eq!(options.display_files_limit(), 10);
    assert_eq!(options.cache_ttl, Duration::from_secs(600));
    assert!(options.should_skip(".Trash"));
    assert!(options.remote_storage_base.is_none());
}

#[test]
fn test_display_limits_override() {
    let options = ScanOptions::builder()
        .max_files(100usize)
        .display_max_files(20usize)
        .build()
        .unwrap();
    assert_eq!(options.display_files_limit(), 20);
    assert_eq!(options.display_dirs_limit(), 10);
}

#[test]
fn test_storage_class_heuristic() {
    let options = ScanOptions::builder()
        .remote_storage_base(PathBuf::from("/cloud"))
        .build()
        .unwrap();

    assert_eq!(options.storage_class_for(Path::new("/cloud/a.txt")), StorageClass::Remote);
    assert_eq!(options.storage_class_for(Path::new("/cloud")), StorageClass::Local);
    assert_eq!(options.storage_class_for(Path::new("/cloudy/a.txt")), StorageClass::Local);
    assert_eq!(
        options.storage_class_for(Path::new("/home/Library/Mobile Documents/x")),
        StorageClass::Remote
    );
}

#[test]
fn test_options_serde_fills_defaults() {
    let options: ScanOptions = serde_json::from_str(r#"{"max_files": 3}"#).unwrap();
    assert_eq!(options.max_files, 3);
    assert_eq!(options.max_dirs, 10);
    assert!(options.should_skip("System Volume Information"));
}

#[test]
fn test_progress_serializes_storage_type() {
    let progress = ScanProgress {
        fraction: 0.5,
        top_files: vec![FileEntry::new(
            "/r/a",
            10,
            SystemTime::UNIX_EPOCH,
            StorageClass::Remote,
        )],
        top_dirs: Vec::new(),
        files_scanned: 1,
        total_bytes: 10,
    };
    let value = serde_json::to_value(&progress).unwrap();
    assert_eq!(value["top_files"][0]["storage_class"], "remote");

    let back: ScanProgress = serde_json::from_value(value).unwrap();
    assert_eq!(back, progress);
}

#[test]
fn test_format_size_units() {
    assert!(format_size(0).ends_with('B'));
    assert!(format_size(10 * 1024 * 1024 * 1024).contains("GiB"));
}
