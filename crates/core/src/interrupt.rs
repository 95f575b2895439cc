// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative interrupt signal
//!
//! Any external actor can request that the current dispatch cycle stop
//! launching new work. The flag lives for exactly the remainder of the
//! minute it was set in; already-started processes are never touched.

use crate::error::MutexStoreError;
use crate::mutex::CacheStore;
use chrono::{DateTime, Timelike, Utc};
use std::time::Duration;

const INTERRUPT_KEY: &str = "schedule-interrupt";

/// Flag store consulted at the top of each tick and between sub-minute
/// repeats
pub trait InterruptStore: Send + Sync {
    /// Request an interrupt, effective through the end of the current
    /// minute
    fn request(&self, now: DateTime<Utc>) -> Result<(), MutexStoreError>;

    /// Whether an interrupt is currently requested
    fn is_requested(&self) -> Result<bool, MutexStoreError>;
}

/// Interrupt flag over any CacheStore
pub struct CacheInterruptStore<S> {
    store: S,
}

impl<S: CacheStore> CacheInterruptStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: CacheStore> InterruptStore for CacheInterruptStore<S> {
    fn request(&self, now: DateTime<Utc>) -> Result<(), MutexStoreError> {
        let remaining = 60 - u64::from(now.second().min(59));
        self.store
            .add(INTERRUPT_KEY, Duration::from_secs(remaining))?;
        Ok(())
    }

    fn is_requested(&self) -> Result<bool, MutexStoreError> {
        self.store.has(INTERRUPT_KEY)
    }
}
