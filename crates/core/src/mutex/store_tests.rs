use super::*;
use crate::clock::FakeClock;
use chrono::TimeZone;

fn clock() -> FakeClock {
    FakeClock::at(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
}

const TTL: Duration = Duration::from_secs(60);

// ==================== MemoryStore ====================

#[test]
fn memory_add_is_add_if_absent() {
    let store = MemoryStore::new(clock());

    assert!(store.add("key", TTL).unwrap());
    assert!(!store.add("key", TTL).unwrap());
}

#[test]
fn memory_round_trip() {
    let store = MemoryStore::new(clock());

    assert!(!store.has("key").unwrap());
    store.add("key", TTL).unwrap();
    assert!(store.has("key").unwrap());
    store.forget("key").unwrap();
    assert!(!store.has("key").unwrap());
}

#[test]
fn memory_forget_unknown_key_is_ok() {
    let store = MemoryStore::new(clock());
    assert!(store.forget("never-created").is_ok());
}

#[test]
fn memory_flag_expires() {
    let clock = clock();
    let store = MemoryStore::new(clock.clone());

    store.add("key", TTL).unwrap();
    clock.advance(Duration::from_secs(61));

    assert!(!store.has("key").unwrap());
    // Expired flag can be re-added
    assert!(store.add("key", TTL).unwrap());
}

#[test]
fn memory_locks_are_namespaced_separately() {
    let store = MemoryStore::new(clock());

    store.add("name", TTL).unwrap();
    // The flag does not shadow the lock of the same name
    assert!(store.try_lock("name", TTL).unwrap());
    assert!(!store.try_lock("name", TTL).unwrap());

    store.release("name").unwrap();
    assert!(store.try_lock("name", TTL).unwrap());
}

#[test]
fn memory_release_unheld_lock_is_ok() {
    let store = MemoryStore::new(clock());
    assert!(store.release("never-held").is_ok());
}

// ==================== FileMarkerStore ====================

#[test]
fn file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileMarkerStore::new(dir.path(), clock());

    assert!(!store.has("key").unwrap());
    assert!(store.add("key", TTL).unwrap());
    assert!(store.has("key").unwrap());
    assert!(!store.add("key", TTL).unwrap());
    store.forget("key").unwrap();
    assert!(!store.has("key").unwrap());
}

#[test]
fn file_forget_unknown_key_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileMarkerStore::new(dir.path(), clock());
    assert!(store.forget("never-created").is_ok());
}

#[test]
fn file_marker_expires_and_is_reclaimed() {
    let dir = tempfile::tempdir().unwrap();
    let clock = clock();
    let store = FileMarkerStore::new(dir.path(), clock.clone());

    store.add("key", TTL).unwrap();
    clock.advance(Duration::from_secs(61));

    assert!(!store.has("key").unwrap());
    assert!(store.add("key", TTL).unwrap());
    assert!(store.has("key").unwrap());
}

#[test]
fn file_marker_survives_across_store_instances() {
    let dir = tempfile::tempdir().unwrap();
    let clock = clock();

    let store = FileMarkerStore::new(dir.path(), clock.clone());
    store.add("key", TTL).unwrap();

    // A fresh instance over the same directory sees the marker
    let other = FileMarkerStore::new(dir.path(), clock);
    assert!(other.has("key").unwrap());
}

#[test]
fn file_corrupt_marker_reads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileMarkerStore::new(dir.path(), clock());

    std::fs::create_dir_all(dir.path()).unwrap();
    std::fs::write(dir.path().join("key"), "not a timestamp").unwrap();

    assert!(!store.has("key").unwrap());
    // And can be reclaimed
    assert!(store.add("key", TTL).unwrap());
}

#[test]
fn file_lock_tier_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileMarkerStore::new(dir.path(), clock());

    assert!(store.try_lock("job", TTL).unwrap());
    assert!(!store.try_lock("job", TTL).unwrap());
    store.release("job").unwrap();
    assert!(store.try_lock("job", TTL).unwrap());
}
