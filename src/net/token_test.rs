use super::*;

// =============================================================
// MemoryTokenStore
// =============================================================

#[test]
fn memory_store_starts_empty() {
    assert_eq!(MemoryTokenStore::new().get_token(), None);
}

#[test]
fn memory_store_set_and_clear() {
    let store = MemoryTokenStore::new();
    store.set_token(Some("t-1".to_owned()));
    assert_eq!(store.get_token().as_deref(), Some("t-1"));

    store.set_token(None);
    assert_eq!(store.get_token(), None);
}

#[test]
fn memory_store_with_token_is_seeded() {
    let store = MemoryTokenStore::with_token("seed");
    assert_eq!(store.get_token().as_deref(), Some("seed"));
}

// =============================================================
// FileTokenStore
// =============================================================

#[test]
fn file_store_missing_file_reads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path().join("token"));
    assert_eq!(store.get_token(), None);
}

#[test]
fn file_store_round_trips_and_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session").join("token");
    let store = FileTokenStore::new(&path);

    store.set_token(Some("abc123".to_owned()));
    assert!(path.exists());
    assert_eq!(store.get_token().as_deref(), Some("abc123"));

    let reopened = FileTokenStore::new(&path);
    assert_eq!(reopened.get_token().as_deref(), Some("abc123"));
}

#[test]
fn file_store_clear_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path().join("token"));
    store.set_token(Some("abc123".to_owned()));

    store.set_token(None);
    assert!(!store.path().exists());
    assert_eq!(store.get_token(), None);
}

#[test]
fn file_store_clear_without_file_is_quiet() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path().join("token"));
    store.set_token(None);
    store.set_token(None);
    assert_eq!(store.get_token(), None);
}

#[test]
fn file_store_whitespace_only_reads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token");
    std::fs::write(&path, "  \n").unwrap();
    assert_eq!(FileTokenStore::new(&path).get_token(), None);
}

#[test]
fn file_store_trims_trailing_newline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token");
    std::fs::write(&path, "abc123\n").unwrap();
    assert_eq!(FileTokenStore::new(&path).get_token().as_deref(), Some("abc123"));
}

#[test]
fn file_store_directory_path_degrades_to_absent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTokenStore::new(dir.path());
    assert_eq!(store.get_token(), None);
    // Writing over a directory fails; the failure is logged, not raised.
    store.set_token(Some("abc123".to_owned()));
    assert_eq!(store.get_token(), None);
}
