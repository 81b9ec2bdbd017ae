use std::path::PathBuf;

use chrono::Utc;
use tempfile::TempDir;

use binup::cache::{ArtifactCache, ReleaseCache};
use binup::db::{PackageDb, PackageRecord};
use binup::github::{Release, ReleaseAsset};
use binup::lock::{DbLock, LockError};

fn record(repo: &str, version: &str, files: Vec<PathBuf>) -> PackageRecord {
    let now = Utc::now();
    PackageRecord {
        repo: repo.to_string(),
        version: version.to_string(),
        files,
        installed_at: now,
        updated_at: now,
    }
}

#[test]
fn test_record_read_delete_end_to_end() {
    let dir = TempDir::new().unwrap();
    let db = PackageDb::open(dir.path().join("packages.json"));
    let lock = DbLock::acquire(&dir.path().join("packages.lock")).unwrap();

    let fzf = record(
        "junegunn/fzf",
        "0.57.0",
        vec![dir.path().join("bin").join("fzf")],
    );
    db.write(&lock, "fzf", fzf.clone()).unwrap();
    assert_eq!(db.read("fzf").unwrap().unwrap(), fzf);

    assert!(db.delete(&lock, "fzf").unwrap());
    assert!(db.read("fzf").unwrap().is_none());
}

#[test]
fn test_lock_serializes_two_processes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("packages.lock");

    // first "process" holds the lock; the second must see Busy
    let first = DbLock::acquire(&path).unwrap();
    match DbLock::acquire(&path) {
        Err(LockError::Busy(pid)) => assert_eq!(pid, std::process::id()),
        other => panic!("expected Busy, got {:?}", other),
    }
    drop(first);

    // once the holder is gone a third acquirer succeeds
    let _third = DbLock::acquire(&path).unwrap();
}

#[cfg(unix)]
#[test]
fn test_stale_lock_reclaimed_after_holder_dies() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("packages.lock");

    let mut child = std::process::Command::new("true").spawn().unwrap();
    let dead_pid = child.id();
    child.wait().unwrap();
    std::fs::write(&path, dead_pid.to_string()).unwrap();

    let _reclaimed = DbLock::acquire(&path).unwrap();
}

#[test]
fn test_interrupted_write_leaves_store_byte_identical() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("packages.json");
    let db = PackageDb::open(&db_path);
    let lock = DbLock::acquire(&dir.path().join("packages.lock")).unwrap();

    db.write(&lock, "fzf", record("junegunn/fzf", "0.57.0", vec![]))
        .unwrap();
    let before = std::fs::read(&db_path).unwrap();

    // a crash between temp-file creation and rename: the orphan stays, the
    // store is untouched and readers never see a half-written document
    std::fs::write(dir.path().join(".tmp-interrupted"), b"{\"packages\":{\"fz").unwrap();
    assert_eq!(std::fs::read(&db_path).unwrap(), before);
    assert_eq!(db.read("fzf").unwrap().unwrap().version, "0.57.0");
}

#[test]
fn test_release_and_artifact_caches_work_together() {
    let dir = TempDir::new().unwrap();
    let releases = ReleaseCache::new(dir.path().join("releases.json"), 3600, false);
    let artifacts = ArtifactCache::open(dir.path().join("artifacts"), 3600, false).unwrap();

    let release = Release {
        tag_name: "v0.57.0".to_string(),
        assets: vec![ReleaseAsset {
            name: "fzf-linux_amd64.tar.gz".to_string(),
            browser_download_url: "https://x/fzf-linux_amd64.tar.gz".to_string(),
        }],
    };
    releases.put("junegunn/fzf", &release).unwrap();

    let source = dir.path().join("downloaded.tar.gz");
    std::fs::write(&source, b"archive").unwrap();
    artifacts
        .put(
            "junegunn/fzf",
            "fzf-linux_amd64.tar.gz",
            "https://x/fzf-linux_amd64.tar.gz",
            &source,
        )
        .unwrap();

    let cached_release = releases.get("junegunn/fzf").unwrap();
    let asset = &cached_release.assets[0];
    let hit = artifacts
        .get("junegunn/fzf", &asset.name, &asset.browser_download_url)
        .unwrap();
    assert_eq!(std::fs::read(hit).unwrap(), b"archive");
}
