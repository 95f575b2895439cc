// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-event overlap mutex strategies
//!
//! An event mutex is a TTL-bounded flag keyed by the event's mutex
//! name. Its existence, not an exclusive hold, signals "in progress":
//! create records the flag and returns, forget clears it, and forget
//! is called unconditionally on every exit path.

use super::store::{AtomicLockStore, CacheStore};
use crate::error::MutexStoreError;
use crate::event::Event;

/// At-most-one-in-flight flag per named event
pub trait EventMutex: Send + Sync {
    /// Record the mutex; returns whether this caller created it
    fn create(&self, event: &Event) -> Result<bool, MutexStoreError>;

    /// Whether the mutex is currently held
    fn exists(&self, event: &Event) -> Result<bool, MutexStoreError>;

    /// Clear the mutex; idempotent
    fn forget(&self, event: &Event) -> Result<(), MutexStoreError>;
}

/// Plain-tier strategy over any CacheStore.
///
/// The exists/create pair is not linearizable: two callers can both
/// observe "not exists" and race into create. Acceptable for this
/// tier; use LockEventMutex when the store can take atomic locks.
pub struct CacheEventMutex<S> {
    store: S,
}

impl<S: CacheStore> CacheEventMutex<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: CacheStore> EventMutex for CacheEventMutex<S> {
    fn create(&self, event: &Event) -> Result<bool, MutexStoreError> {
        self.store.add(&event.mutex_name(), event.mutex_ttl())
    }

    fn exists(&self, event: &Event) -> Result<bool, MutexStoreError> {
        self.store.has(&event.mutex_name())
    }

    fn forget(&self, event: &Event) -> Result<(), MutexStoreError> {
        self.store.forget(&event.mutex_name())
    }
}

/// Lock-tier strategy over an AtomicLockStore.
///
/// `exists` probe-acquires the lock without blocking: a successful
/// probe means the event was not running, so the probe is released and
/// the boolean inverted.
pub struct LockEventMutex<S> {
    store: S,
}

impl<S: AtomicLockStore> LockEventMutex<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: AtomicLockStore> EventMutex for LockEventMutex<S> {
    fn create(&self, event: &Event) -> Result<bool, MutexStoreError> {
        self.store.try_lock(&event.mutex_name(), event.mutex_ttl())
    }

    fn exists(&self, event: &Event) -> Result<bool, MutexStoreError> {
        if self.store.try_lock(&event.mutex_name(), event.mutex_ttl())? {
            self.store.release(&event.mutex_name())?;
            return Ok(false);
        }
        Ok(true)
    }

    fn forget(&self, event: &Event) -> Result<(), MutexStoreError> {
        self.store.release(&event.mutex_name())
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
