// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the scheduling core
//!
//! Three tiers: configuration errors surface at schedule-definition time,
//! mutex store errors abort a single event's dispatch (fail safe), and
//! dispatch errors are reported per event without stopping the tick.

use thiserror::Error;

/// Errors raised while building an event's configuration.
///
/// These are fatal to the registration call and are never deferred to
/// run time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Sub-minute repeat interval must divide a minute evenly
    #[error("repeat interval of {seconds}s does not evenly divide a minute")]
    InvalidRepeatInterval { seconds: u32 },

    /// Overlap prevention and single-server execution seed the mutex
    /// key from the description, so one must exist first
    #[error("a description is required to enable {feature}")]
    DescriptionRequired { feature: &'static str },

    /// Email was requested while output still goes to the null sink
    #[error("output must be captured somewhere before it can be emailed")]
    OutputNotCaptured,

    /// Cron expression could not be parsed
    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// Malformed time of day (expected HH:MM)
    #[error("invalid time of day '{value}': expected HH:MM")]
    InvalidTime { value: String },
}

/// The backing mutex store could not be reached or misbehaved.
///
/// When overlap prevention was requested, a store failure aborts the
/// event's run for this tick; the mutex is assumed NOT acquired.
#[derive(Debug, Error)]
#[error("mutex store error: {message}")]
pub struct MutexStoreError {
    pub message: String,
}

impl MutexStoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for MutexStoreError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Errors raised while dispatching a single event.
///
/// Caught at the per-event boundary inside the runner; sibling events
/// in the same tick are unaffected.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A foreground process exited non-zero
    #[error("command '{command}' exited with code {exit_code}")]
    UnexpectedExitCode { command: String, exit_code: i32 },

    #[error(transparent)]
    MutexStore(#[from] MutexStoreError),

    /// The OS process could not be started or waited on
    #[error("process error: {message}")]
    Process { message: String },

    /// A callback or job target returned an error
    #[error("callback failed: {message}")]
    Callback { message: String },
}
