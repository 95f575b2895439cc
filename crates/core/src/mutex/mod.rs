// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mutual-exclusion stores for overlap prevention and single-server runs
//!
//! This module provides:
//! - **CacheStore / AtomicLockStore**: capability tiers of the backing
//!   key-value store, advertised explicitly at construction time
//! - **MemoryStore / FileMarkerStore**: shipped store implementations
//! - **EventMutex**: the at-most-one-in-flight flag per named event
//! - **SchedulingMutex**: the per-minute duplicate-cluster claim used
//!   by single-server execution

mod event;
mod scheduling;
mod store;

pub use event::{CacheEventMutex, EventMutex, LockEventMutex};
pub use scheduling::{
    CacheSchedulingMutex, LockSchedulingMutex, SchedulingMutex, SCHEDULING_MUTEX_TTL,
};
pub use store::{AtomicLockStore, CacheStore, FileMarkerStore, MemoryStore};
