// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-minute scheduling mutex for single-server execution
//!
//! Deduplicates a due tick across cooperating nodes: the key is the
//! event's mutex name plus the minute stamp, so each due minute is a
//! fresh claim. This is best effort, bounded by the backing store's
//! lock guarantees; it is not a consensus protocol.

use super::store::{AtomicLockStore, CacheStore};
use crate::error::MutexStoreError;
use crate::event::Event;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// How long a minute claim lives
pub const SCHEDULING_MUTEX_TTL: Duration = Duration::from_secs(60 * 60);

/// Claim of one due tick of one event across a cluster
pub trait SchedulingMutex: Send + Sync {
    /// Claim the event's tick at the given instant; returns whether
    /// this caller won the claim
    fn create(&self, event: &Event, time: DateTime<Utc>) -> Result<bool, MutexStoreError>;

    /// Whether the tick has already been claimed
    fn exists(&self, event: &Event, time: DateTime<Utc>) -> Result<bool, MutexStoreError>;
}

fn scheduling_key(event: &Event, time: DateTime<Utc>) -> String {
    format!("{}{}", event.mutex_name(), time.format("%H%M"))
}

/// Plain-tier claim over any CacheStore.
///
/// Degraded mode: without an atomic lock the claim has the same race
/// window as any add-if-absent pair across nodes.
pub struct CacheSchedulingMutex<S> {
    store: S,
}

impl<S: CacheStore> CacheSchedulingMutex<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: CacheStore> SchedulingMutex for CacheSchedulingMutex<S> {
    fn create(&self, event: &Event, time: DateTime<Utc>) -> Result<bool, MutexStoreError> {
        self.store
            .add(&scheduling_key(event, time), SCHEDULING_MUTEX_TTL)
    }

    fn exists(&self, event: &Event, time: DateTime<Utc>) -> Result<bool, MutexStoreError> {
        self.store.has(&scheduling_key(event, time))
    }
}

/// Lock-tier claim over an AtomicLockStore; the intended backing for
/// single-server execution
pub struct LockSchedulingMutex<S> {
    store: S,
}

impl<S: AtomicLockStore> LockSchedulingMutex<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: AtomicLockStore> SchedulingMutex for LockSchedulingMutex<S> {
    fn create(&self, event: &Event, time: DateTime<Utc>) -> Result<bool, MutexStoreError> {
        self.store
            .try_lock(&scheduling_key(event, time), SCHEDULING_MUTEX_TTL)
    }

    fn exists(&self, event: &Event, time: DateTime<Utc>) -> Result<bool, MutexStoreError> {
        let key = scheduling_key(event, time);
        if self.store.try_lock(&key, SCHEDULING_MUTEX_TTL)? {
            self.store.release(&key)?;
            return Ok(false);
        }
        Ok(true)
    }
}

#[cfg(test)]
#[path = "scheduling_tests.rs"]
mod tests;
