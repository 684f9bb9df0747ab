use super::*;
use autobot_browser::Cookie;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use tempfile::TempDir;

/// Write a `.tar.gz` containing `files` (path, contents).
fn make_archive(path: &Path, files: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

fn store(dir: &TempDir) -> ProfileStore {
    ProfileStore::new(
        dir.path().join("wati_profile"),
        dir.path().join("wati_profile.tar.gz"),
        "storage.json",
    )
}

fn state() -> StorageState {
    StorageState {
        cookies: vec![Cookie {
            name: "_wati_session".to_string(),
            value: "abc".to_string(),
            domain: "live.wati.io".to_string(),
            path: "/".to_string(),
            expires: -1.0,
            http_only: true,
            secure: true,
            same_site: Some("Lax".to_string()),
        }],
        origins: vec![],
    }
}

#[test]
fn test_restore_without_archive() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    assert_eq!(store.restore_from_archive(), RestoreOutcome::NoArchive);
    assert!(!store.profile_dir().exists());
}

#[test]
fn test_restore_flattens_single_top_level_dir() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    make_archive(
        &dir.path().join("wati_profile.tar.gz"),
        &[
            ("wati_profile/storage.json", "{}"),
            ("wati_profile/Default/Cookies", "sqlite"),
        ],
    );

    let outcome = store.restore_from_archive();
    assert_eq!(outcome, RestoreOutcome::Restored { entries: 2 });
    assert!(store.profile_dir().join("storage.json").is_file());
    assert!(store.profile_dir().join("Default/Cookies").is_file());
    assert!(!store.profile_dir().join("wati_profile").exists());
}

#[test]
fn test_restore_flat_archive() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    make_archive(
        &dir.path().join("wati_profile.tar.gz"),
        &[("storage.json", "{}"), ("Local State", "{}")],
    );

    assert_eq!(
        store.restore_from_archive(),
        RestoreOutcome::Restored { entries: 2 }
    );
    assert!(store.profile_dir().join("Local State").is_file());
}

#[test]
fn test_restore_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    make_archive(
        &dir.path().join("wati_profile.tar.gz"),
        &[("wati_profile/storage.json", "{\"cookies\":[]}")],
    );

    assert!(matches!(
        store.restore_from_archive(),
        RestoreOutcome::Restored { .. }
    ));

    // State written after the first restore must survive the second call.
    std::fs::write(store.profile_dir().join("fresh.txt"), "keep").unwrap();
    assert_eq!(store.restore_from_archive(), RestoreOutcome::AlreadyPresent);
    assert_eq!(
        std::fs::read_to_string(store.profile_dir().join("fresh.txt")).unwrap(),
        "keep"
    );
}

#[test]
fn test_restore_replaces_empty_profile_dir() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    std::fs::create_dir_all(store.profile_dir()).unwrap();
    make_archive(
        &dir.path().join("wati_profile.tar.gz"),
        &[("storage.json", "{}")],
    );

    assert_eq!(
        store.restore_from_archive(),
        RestoreOutcome::Restored { entries: 1 }
    );
}

#[test]
fn test_corrupt_archive_leaves_no_partial_state() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    std::fs::write(dir.path().join("wati_profile.tar.gz"), b"not a gzip stream").unwrap();

    let outcome = store.restore_from_archive();
    assert!(matches!(outcome, RestoreOutcome::Failed(_)));
    assert!(!store.has_valid_profile());
    assert!(!dir.path().join(".wati_profile.staging").exists());
}

#[tokio::test]
async fn test_persist_then_load() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);

    store.persist(&state()).await.unwrap();
    assert!(store.storage_path().is_file());
    assert!(!store.profile_dir().join("storage.json.tmp").exists());

    let loaded = store.load().await.unwrap().unwrap();
    assert_eq!(loaded, state());
}

#[tokio::test]
async fn test_load_missing_artifact() {
    let dir = TempDir::new().unwrap();
    assert!(store(&dir).load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_load_corrupt_artifact_is_absent() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    std::fs::create_dir_all(store.profile_dir()).unwrap();
    std::fs::write(store.storage_path(), "{ truncated").unwrap();

    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_invalidate_removes_artifact() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store.persist(&state()).await.unwrap();

    store.invalidate().await.unwrap();
    assert!(!store.storage_path().exists());

    // Second call finds nothing and still succeeds.
    store.invalidate().await.unwrap();
}

#[test]
fn test_store_uses_configured_artifact_path() {
    let dir = TempDir::new().unwrap();
    let mut config = BotConfig::default();
    config.profile.dir = Some(dir.path().join("wati_profile"));

    let store = ProfileStore::from_config(&config);
    assert_eq!(store.storage_path(), config.storage_state_path());
}
