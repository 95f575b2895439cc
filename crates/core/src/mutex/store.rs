// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backing stores for mutex flags
//!
//! A CacheStore is a named, TTL-bounded boolean flag store. Stores that
//! can additionally take named atomic locks advertise the
//! AtomicLockStore tier; the capability is part of the type, never
//! discovered at runtime.

use crate::clock::Clock;
use crate::error::MutexStoreError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A named, expiring boolean flag store.
///
/// `add` is add-if-absent; whether it is atomic across processes
/// depends on the implementation. `forget` is idempotent: releasing a
/// flag that does not exist is not an error.
pub trait CacheStore: Send + Sync {
    /// Set the flag if absent; returns whether this caller set it
    fn add(&self, key: &str, ttl: Duration) -> Result<bool, MutexStoreError>;

    /// Whether the flag is currently set (and unexpired)
    fn has(&self, key: &str) -> Result<bool, MutexStoreError>;

    /// Clear the flag; safe to call when no flag exists
    fn forget(&self, key: &str) -> Result<(), MutexStoreError>;
}

/// Capability tier for stores that can take named atomic locks.
///
/// A lock here is a TTL-bounded claim, not a held handle: acquiring
/// records the claim and returns immediately.
pub trait AtomicLockStore: CacheStore {
    /// Try to take the named lock; returns whether this caller got it
    fn try_lock(&self, name: &str, ttl: Duration) -> Result<bool, MutexStoreError>;

    /// Release the named lock; safe to call when not held
    fn release(&self, name: &str) -> Result<(), MutexStoreError>;
}

fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now + ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::zero())
}

const LOCK_PREFIX: &str = "lock-";

// ============================================================================
// MemoryStore
// ============================================================================

/// In-process store for tests and single-process deployments
#[derive(Clone)]
pub struct MemoryStore<C: Clock> {
    clock: C,
    entries: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
}

impl<C: Clock> MemoryStore<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<C: Clock> CacheStore for MemoryStore<C> {
    fn add(&self, key: &str, ttl: Duration) -> Result<bool, MutexStoreError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(expiry) if *expiry > now => Ok(false),
            _ => {
                entries.insert(key.to_string(), expiry_after(now, ttl));
                Ok(true)
            }
        }
    }

    fn has(&self, key: &str) -> Result<bool, MutexStoreError> {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).is_some_and(|expiry| *expiry > now))
    }

    fn forget(&self, key: &str) -> Result<(), MutexStoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

impl<C: Clock> AtomicLockStore for MemoryStore<C> {
    fn try_lock(&self, name: &str, ttl: Duration) -> Result<bool, MutexStoreError> {
        self.add(&format!("{}{}", LOCK_PREFIX, name), ttl)
    }

    fn release(&self, name: &str) -> Result<(), MutexStoreError> {
        self.forget(&format!("{}{}", LOCK_PREFIX, name))
    }
}

// ============================================================================
// FileMarkerStore
// ============================================================================

/// Marker files in a state directory, one per flag, holding the expiry
/// as an RFC 3339 timestamp.
///
/// `add` uses create-new semantics, which is atomic on POSIX
/// filesystems, so this store advertises the atomic-lock tier.
#[derive(Clone)]
pub struct FileMarkerStore<C: Clock> {
    dir: PathBuf,
    clock: C,
}

impl<C: Clock> FileMarkerStore<C> {
    pub fn new(dir: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            dir: dir.into(),
            clock,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn marker_path(&self, key: &str) -> PathBuf {
        // Keys are hex digests plus fixed prefixes, safe as file names
        self.dir.join(key)
    }

    /// Read a marker's expiry; None when absent or unreadable
    fn read_expiry(&self, path: &Path) -> Option<DateTime<Utc>> {
        let contents = std::fs::read_to_string(path).ok()?;
        DateTime::parse_from_rfc3339(contents.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn write_marker_if_absent(
        &self,
        path: &Path,
        expiry: DateTime<Utc>,
    ) -> Result<bool, MutexStoreError> {
        use std::io::Write;

        std::fs::create_dir_all(&self.dir)?;
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        match options.open(path) {
            Ok(mut file) => {
                file.write_all(expiry.to_rfc3339().as_bytes())?;
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

impl<C: Clock> CacheStore for FileMarkerStore<C> {
    fn add(&self, key: &str, ttl: Duration) -> Result<bool, MutexStoreError> {
        let now = self.clock.now();
        let path = self.marker_path(key);

        if self.write_marker_if_absent(&path, expiry_after(now, ttl))? {
            return Ok(true);
        }

        // Marker exists; reclaim it if it has expired
        match self.read_expiry(&path) {
            Some(expiry) if expiry > now => Ok(false),
            _ => {
                self.forget(key)?;
                self.write_marker_if_absent(&path, expiry_after(now, ttl))
            }
        }
    }

    fn has(&self, key: &str) -> Result<bool, MutexStoreError> {
        let path = self.marker_path(key);
        if !path.exists() {
            return Ok(false);
        }
        match self.read_expiry(&path) {
            Some(expiry) => Ok(expiry > self.clock.now()),
            None => Ok(false),
        }
    }

    fn forget(&self, key: &str) -> Result<(), MutexStoreError> {
        match std::fs::remove_file(self.marker_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl<C: Clock> AtomicLockStore for FileMarkerStore<C> {
    fn try_lock(&self, name: &str, ttl: Duration) -> Result<bool, MutexStoreError> {
        self.add(&format!("{}{}", LOCK_PREFIX, name), ttl)
    }

    fn release(&self, name: &str) -> Result<(), MutexStoreError> {
        self.forget(&format!("{}{}", LOCK_PREFIX, name))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
