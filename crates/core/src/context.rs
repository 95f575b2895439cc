// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run context passed into due-checks and dispatch
//!
//! Carries the current instant, the application environment, and the
//! maintenance-mode flag as an explicit value instead of ambient state,
//! so a dispatch cycle is reentrant and testable.

use chrono::{DateTime, Utc};

/// Snapshot of the runtime environment for one dispatch cycle
#[derive(Clone, Debug)]
pub struct RunContext {
    /// The instant this cycle is evaluated against
    pub now: DateTime<Utc>,
    /// Current application environment name (e.g. "production")
    pub environment: String,
    /// Whether the application is in maintenance mode
    pub maintenance_mode: bool,
}

impl RunContext {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            now: Utc::now(),
            environment: environment.into(),
            maintenance_mode: false,
        }
    }

    /// Pin the context to a specific instant
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn in_maintenance_mode(mut self, flag: bool) -> Self {
        self.maintenance_mode = flag;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn builder_sets_fields() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let ctx = RunContext::new("staging").at(now).in_maintenance_mode(true);

        assert_eq!(ctx.environment, "staging");
        assert_eq!(ctx.now, now);
        assert!(ctx.maintenance_mode);
    }
}
