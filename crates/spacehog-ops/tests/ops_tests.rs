use std::fs;
use std::path::Path;
use std::sync::Arc;

use spacehog_core::{ScanOptions, StorageClass};
use spacehog_ops::{
    AlwaysConfirm, DeleteMode, DeleteStatus, ScanSession, read_export,
};
use spacehog_scan::{MockFileSystem, ScanCoordinator, ScanEvent};
use tempfile::TempDir;

fn write_file(path: &Path, size: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, vec![b'x'; size]).unwrap();
}

/// `parent` holds 5000 bytes, 1000 of them in `parent/sub`.
fn hide_fixture() -> TempDir {
    let temp = TempDir::new().unwrap();
    write_file(&temp.path().join("parent/sub/a"), 600);
    write_file(&temp.path().join("parent/sub/b"), 400);
    write_file(&temp.path().join("parent/c"), 4000);
    write_file(&temp.path().join("other/d"), 10);
    temp
}

fn scanned_session(root: &Path) -> (ScanCoordinator, ScanSession) {
    let coordinator = ScanCoordinator::new(ScanOptions::new(20, 20));
    let mut session = ScanSession::for_coordinator(&coordinator, root);
    session.apply_outcome(coordinator.scan(root).unwrap());
    (coordinator, session)
}

#[test]
fn test_hide_then_rescan_restores() {
    let temp = hide_fixture();
    let (coordinator, mut session) = scanned_session(temp.path());
    let root = session.root().to_path_buf();
    let parent = root.join("parent");
    let sub = parent.join("sub");

    assert_eq!(session.dir_size(&parent), Some(5000));
    assert_eq!(session.hide(&sub).unwrap(), 1000);
    assert_eq!(session.dir_size(&parent), Some(4000));
    assert_eq!(session.dir_size(&root), Some(4010));

    assert!(session.visible_dirs().iter().all(|d| !d.path.starts_with(&sub)));
    assert!(session.visible_files().iter().all(|f| !f.path.starts_with(&sub)));
    // Nothing left the disk.
    assert!(sub.join("a").exists());

    session.rescan(&coordinator).unwrap();
    assert!(session.hidden().is_empty());
    assert_eq!(session.dir_size(&parent), Some(5000));
    assert!(session.visible_dirs().iter().any(|d| d.path == sub));
}

#[test]
fn test_hide_falls_back_to_cache() {
    let temp = hide_fixture();
    let coordinator = ScanCoordinator::new(ScanOptions::new(20, 1));
    let mut session = ScanSession::for_coordinator(&coordinator, temp.path());
    session.apply_outcome(coordinator.scan(temp.path()).unwrap());

    let sub = session.root().join("parent/sub");
    assert!(session.dir_size(&sub).is_none());
    assert_eq!(session.hide(&sub).unwrap(), 1000);
    assert!(coordinator.cached_size(&sub).is_none());
}

#[test]
fn test_delete_directory_from_disk_and_lists() {
    let temp = hide_fixture();
    let (coordinator, mut session) = scanned_session(temp.path());
    let sub = session.root().join("parent/sub");

    let status = session.delete(&sub, &AlwaysConfirm, DeleteMode::Permanent);
    assert_eq!(status, DeleteStatus::Deleted { bytes_freed: 1000 });
    assert!(!sub.exists());
    assert!(session.dir_size(&sub).is_none());
    assert!(session.visible_files().iter().all(|f| !f.path.starts_with(&sub)));
    assert!(coordinator.cached_size(&sub).is_none());

    // Stale until the next rescan.
    assert_eq!(session.dir_size(&session.root().join("parent")), Some(5000));
    session.rescan(&coordinator).unwrap();
    assert_eq!(session.dir_size(&session.root().join("parent")), Some(4000));
}

#[test]
fn test_delete_many_reports_each_item() {
    let temp = hide_fixture();
    let (_coordinator, mut session) = scanned_session(temp.path());
    let root = session.root().to_path_buf();
    let keep_dirs = |_: &Path, is_dir: bool| !is_dir;

    let c = root.join("parent/c");
    let other = root.join("other");
    let missing = root.join("missing");
    let statuses = session.delete_many(
        [c.as_path(), other.as_path(), missing.as_path()],
        &keep_dirs,
        DeleteMode::Permanent,
    );

    assert_eq!(statuses[0].1, DeleteStatus::Deleted { bytes_freed: 4000 });
    assert_eq!(statuses[1].1, DeleteStatus::Declined);
    assert!(matches!(statuses[2].1, DeleteStatus::Failed(_)));
    assert!(!c.exists());
    assert!(other.exists());
}

#[test]
fn test_delete_and_hide_while_scan_streams() {
    let huge = Path::new("/r/a/huge");
    let keep = Path::new("/r/a/keep");
    let mut fs = MockFileSystem::new()
        .with_file(huge, 1_000_000)
        .with_file("/r/a/keep/k", 2000)
        .with_file("/r/c/z", 300);
    for i in 0..2000 {
        fs = fs.with_file(format!("/r/b/f{i:04}"), 10);
    }
    let fs = Arc::new(fs);
    let coordinator = ScanCoordinator::with_fs(ScanOptions::default(), fs.clone());
    let mut session = ScanSession::for_coordinator(&coordinator, "/r");
    let mut cursor = coordinator.cursor("/r").unwrap();

    // Pull until a snapshot shows the big file.
    loop {
        assert!(!cursor.is_finished());
        let Some(event) = cursor.pull() else {
            continue;
        };
        let listed = matches!(
            &event,
            ScanEvent::Progress(p) if p.top_files.iter().any(|f| f.path == huge)
        );
        session.apply_event(event);
        if listed {
            break;
        }
    }

    let status = session.delete(huge, &AlwaysConfirm, DeleteMode::Permanent);
    assert_eq!(status, DeleteStatus::Deleted { bytes_freed: 1_000_000 });
    assert!(!fs.exists(huge));
    assert_eq!(session.hide(keep).unwrap(), 2000);

    for event in cursor {
        session.apply_event(event);
    }
    assert!(!session.is_interrupted());

    let files = session.visible_files();
    assert_eq!(files[0].path, Path::new("/r/c/z"));
    assert!(files.iter().all(|f| f.path != huge && !f.is_within(keep)));
    assert!(session.visible_dirs().iter().all(|d| !d.is_within(keep)));
    assert_eq!(session.hidden()[keep], 2000);
    // The deleted bytes stay on the ancestors until a rescan.
    assert_eq!(session.dir_size(Path::new("/r/a")), Some(1_000_000));

    session.rescan(&coordinator).unwrap();
    assert!(session.deleted().is_empty());
    assert_eq!(session.dir_size(Path::new("/r/a")), Some(2000));
}

#[test]
fn test_export_round_trip() {
    let temp = TempDir::new().unwrap();
    write_file(&temp.path().join("data/Mobile Documents/doc.pages"), 300);
    write_file(&temp.path().join("data/local.bin"), 700);
    let (_coordinator, session) = scanned_session(&temp.path().join("data"));

    let output = temp.path().join("out.json");
    let written = session.export(&output).unwrap();
    let parsed = read_export(&output).unwrap();
    assert_eq!(parsed, written);

    let remote = parsed
        .largest_files
        .iter()
        .find(|f| f.path.ends_with("doc.pages"))
        .unwrap();
    assert_eq!(remote.size_bytes, 300);
    assert_eq!(remote.storage_type, StorageClass::Remote);

    let expected: Vec<(u64, StorageClass)> = session
        .visible_files()
        .iter()
        .map(|f| (f.size, f.storage_class))
        .collect();
    let reparsed: Vec<(u64, StorageClass)> = parsed
        .largest_files
        .iter()
        .map(|f| (f.size_bytes, f.storage_type))
        .collect();
    assert_eq!(reparsed, expected);
    assert_eq!(parsed.scan_info.total_size_bytes, 1000);
    assert_eq!(parsed.scan_info.files_scanned, 2);
}
