// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! chime-core: minute-resolution task scheduling engine
//!
//! This crate provides:
//! - A registry (Schedule) of recurring events matched by cron
//!   expressions, with sub-minute repetition
//! - A fluent frequency builder over positional cron field splicing
//! - TTL-bounded mutexes for overlap prevention and single-server runs
//! - A pure command builder and a tick-driven dispatch runner
//! - A TOML manifest loader for declarative task definitions

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clock;
pub mod context;
pub mod error;

pub mod command;
pub mod expression;
pub mod frequency;
pub mod interrupt;
pub mod manifest;
pub mod mutex;
pub mod process;

// Core types (order matters for dependencies)
pub mod event;
pub mod schedule;
pub mod runner;

// Re-exports
pub use clock::{Clock, FakeClock, FakeSleeper, Sleeper, SystemClock, SystemSleeper};
pub use command::CommandBuilder;
pub use context::RunContext;
pub use error::{ConfigError, DispatchError, MutexStoreError};
pub use event::{Event, JobResult, OutputSpec, RunOutcome, RunTarget, ScheduledJob};
pub use expression::CronExpression;
pub use frequency::{splice_into_position, week_day, Field};
pub use interrupt::{CacheInterruptStore, InterruptStore};
pub use manifest::{load_manifest, parse_manifest, ManifestError};
pub use mutex::{
    AtomicLockStore, CacheEventMutex, CacheSchedulingMutex, CacheStore, EventMutex,
    FileMarkerStore, LockEventMutex, LockSchedulingMutex, MemoryStore, SchedulingMutex,
};
pub use process::{FakeProcessRunner, ProcessRunner, ShellProcessRunner};
pub use runner::{ScheduleRunner, SkipReason, TickSummary};
pub use schedule::{PendingAttributes, Schedule};
