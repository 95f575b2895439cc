// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron expression evaluation boundary
//!
//! Wraps the ecosystem `cron` crate behind the syntax this scheduler
//! accepts: standard 5-field expressions (minute resolution) and
//! extended 6-field expressions with a leading seconds field. Numeric
//! day-of-week tokens use 0-7 where both 0 and 7 mean Sunday; the
//! `cron` crate numbers days 1-7 with 1 = Sunday, so tokens are
//! remapped during normalization.

use crate::error::ConfigError;
use chrono::{DateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::fmt;
use std::str::FromStr;

/// A parsed, timezone-aware cron expression
#[derive(Clone, Debug)]
pub struct CronExpression {
    /// The expression as written by the caller
    text: String,
    /// Whether the caller wrote a leading seconds field
    has_seconds: bool,
    schedule: Schedule,
}

impl CronExpression {
    /// Parse a 5- or 6-field cron expression.
    pub fn parse(expression: &str) -> Result<Self, ConfigError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();

        let (has_seconds, mut normalized) = match fields.len() {
            5 => {
                let mut f: Vec<String> = vec!["0".to_string()];
                f.extend(fields.iter().map(|s| s.to_string()));
                (false, f)
            }
            6 => (true, fields.iter().map(|s| s.to_string()).collect()),
            n => {
                return Err(ConfigError::InvalidExpression {
                    expression: expression.to_string(),
                    reason: format!("expected 5 or 6 fields, found {}", n),
                })
            }
        };

        // Field 5 of the normalized form is day-of-week
        normalized[5] = remap_day_of_week(&normalized[5]);

        let schedule = Schedule::from_str(&normalized.join(" ")).map_err(|e| {
            ConfigError::InvalidExpression {
                expression: expression.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            text: expression.to_string(),
            has_seconds,
            schedule,
        })
    }

    /// The expression text as originally written
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_seconds(&self) -> bool {
        self.has_seconds
    }

    /// Whether the expression matches the given instant, evaluated in
    /// the given timezone.
    ///
    /// 5-field expressions match at minute resolution; 6-field
    /// expressions match at second resolution.
    pub fn is_due(&self, instant: DateTime<Utc>, tz: Tz) -> bool {
        let local = instant.with_timezone(&tz);
        let truncated = if self.has_seconds {
            truncate_to_second(local)
        } else {
            truncate_to_minute(local)
        };
        self.schedule.includes(truncated)
    }

    /// The next instant strictly after `after` at which the expression
    /// fires, or None if the schedule is exhausted.
    pub fn next_after(&self, after: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&after.with_timezone(&tz))
            .next()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// The last instant strictly before `before` at which the
    /// expression fired.
    pub fn previous_before(&self, before: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&before.with_timezone(&tz))
            .next_back()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl FromStr for CronExpression {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for CronExpression {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for CronExpression {}

fn truncate_to_minute<Z: TimeZone>(dt: DateTime<Z>) -> DateTime<Z> {
    dt.clone()
        .with_nanosecond(0)
        .and_then(|d| d.with_second(0))
        .unwrap_or(dt)
}

fn truncate_to_second<Z: TimeZone>(dt: DateTime<Z>) -> DateTime<Z> {
    dt.clone().with_nanosecond(0).unwrap_or(dt)
}

/// Remap numeric day-of-week tokens from the 0-7 external numbering
/// (0 and 7 are both Sunday) to the 1-7 ordinals the `cron` crate uses.
///
/// Named days, `*`, and `?` pass through untouched. Lists, ranges, and
/// step suffixes are handled per component.
fn remap_day_of_week(field: &str) -> String {
    field
        .split(',')
        .map(remap_dow_component)
        .collect::<Vec<_>>()
        .join(",")
}

fn remap_dow_component(component: &str) -> String {
    let (base, step) = match component.split_once('/') {
        Some((b, s)) => (b, Some(s)),
        None => (component, None),
    };

    let mapped_base = match base.split_once('-') {
        Some((lo, hi)) => format!("{}-{}", remap_dow_value(lo), remap_dow_value(hi)),
        None => remap_dow_value(base),
    };

    match step {
        Some(s) => format!("{}/{}", mapped_base, s),
        None => mapped_base,
    }
}

fn remap_dow_value(value: &str) -> String {
    match value.parse::<u8>() {
        Ok(n) if n <= 7 => ((n % 7) + 1).to_string(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
#[path = "expression_tests.rs"]
mod tests;
