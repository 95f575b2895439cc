// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule manifest: declarative task definitions in TOML
//!
//! The daemon loads `[task.<name>]` tables into a Schedule of Exec
//! events. Closure and job targets are code-level registrations and
//! cannot be expressed here.
//!
//! ```toml
//! [task.backup]
//! cron = "0 2 * * *"
//! run = "pg_dump app | gzip > /backups/app.sql.gz"
//! timezone = "UTC"
//! without_overlapping = true
//! expires_after = "30m"
//! output = "/var/log/backup.log"
//! append_output = true
//! ```

use crate::error::ConfigError;
use crate::schedule::Schedule;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading a schedule manifest
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("task '{task}' needs either 'cron' or 'every'")]
    MissingSchedule { task: String },

    #[error("task '{task}' sets both 'cron' and 'every'")]
    ConflictingSchedule { task: String },

    #[error("task '{task}' interval {interval:?} does not map onto a cron schedule")]
    UnsupportedInterval { task: String, interval: Duration },

    #[error("task '{task}' has an invalid timezone '{value}'")]
    InvalidTimezone { task: String, value: String },

    #[error("task '{task}': {source}")]
    Config {
        task: String,
        #[source]
        source: ConfigError,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    #[serde(default)]
    task: BTreeMap<String, RawTask>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTask {
    run: String,
    cron: Option<String>,
    #[serde(default, with = "humantime_serde::option")]
    every: Option<Duration>,
    timezone: Option<String>,
    #[serde(default)]
    environments: Vec<String>,
    user: Option<String>,
    output: Option<PathBuf>,
    #[serde(default)]
    append_output: bool,
    #[serde(default)]
    email: Vec<String>,
    #[serde(default)]
    without_overlapping: bool,
    #[serde(default, with = "humantime_serde::option")]
    expires_after: Option<Duration>,
    #[serde(default)]
    on_one_server: bool,
    #[serde(default)]
    run_in_background: bool,
    #[serde(default)]
    even_in_maintenance: bool,
    repeat_seconds: Option<u32>,
}

/// Load a schedule from a manifest file
pub fn load_manifest(path: &Path) -> Result<Schedule, ManifestError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_manifest(&contents)
}

/// Parse manifest text into a schedule.
///
/// Tasks register in name order, which is therefore the dispatch order
/// within a tick.
pub fn parse_manifest(contents: &str) -> Result<Schedule, ManifestError> {
    let raw: RawManifest = toml::from_str(contents)?;
    let mut schedule = Schedule::new();

    for (name, task) in &raw.task {
        load_task(&mut schedule, name, task)?;
    }

    Ok(schedule)
}

fn config_err(task: &str) -> impl Fn(ConfigError) -> ManifestError + '_ {
    move |source| ManifestError::Config {
        task: task.to_string(),
        source,
    }
}

fn load_task(schedule: &mut Schedule, name: &str, raw: &RawTask) -> Result<(), ManifestError> {
    let event = schedule.exec(&raw.run);
    event.name(name);

    match (&raw.cron, raw.every) {
        (Some(_), Some(_)) => {
            return Err(ManifestError::ConflictingSchedule {
                task: name.to_string(),
            })
        }
        (Some(expression), None) => {
            event.cron(expression).map_err(config_err(name))?;
        }
        (None, Some(interval)) => {
            apply_interval(name, interval).and_then(|frequency| match frequency {
                Frequency::Seconds(n) => event.repeat_every(n).map(|_| ()).map_err(config_err(name)),
                Frequency::MinuteStep(n) => {
                    event.cron(&format!("*/{} * * * *", n)).map(|_| ()).map_err(config_err(name))
                }
                Frequency::HourStep(n) => {
                    event.cron(&format!("0 */{} * * *", n)).map(|_| ()).map_err(config_err(name))
                }
                Frequency::Daily => {
                    event.daily();
                    Ok(())
                }
            })?;
        }
        (None, None) => {
            return Err(ManifestError::MissingSchedule {
                task: name.to_string(),
            })
        }
    }

    if let Some(value) = &raw.timezone {
        let tz = value
            .parse()
            .map_err(|_| ManifestError::InvalidTimezone {
                task: name.to_string(),
                value: value.clone(),
            })?;
        event.timezone(tz);
    }

    if !raw.environments.is_empty() {
        event.environments(raw.environments.clone());
    }
    if let Some(user) = &raw.user {
        event.as_user(user.clone());
    }
    if let Some(output) = &raw.output {
        if raw.append_output {
            event.append_output_to(output.clone());
        } else {
            event.send_output_to(output.clone());
        }
    }
    if !raw.email.is_empty() {
        event
            .email_output_to(raw.email.clone())
            .map_err(config_err(name))?;
    }
    if let Some(seconds) = raw.repeat_seconds {
        event.repeat_every(seconds).map_err(config_err(name))?;
    }
    if raw.without_overlapping || raw.expires_after.is_some() {
        match raw.expires_after {
            Some(ttl) => event.without_overlapping_for(ttl).map_err(config_err(name))?,
            None => event.without_overlapping().map_err(config_err(name))?,
        };
    }
    if raw.on_one_server {
        event.on_one_server().map_err(config_err(name))?;
    }
    if raw.run_in_background {
        event.run_in_background();
    }
    if raw.even_in_maintenance {
        event.even_in_maintenance_mode();
    }

    Ok(())
}

enum Frequency {
    Seconds(u32),
    MinuteStep(u32),
    HourStep(u32),
    Daily,
}

/// Map a plain interval onto a cron-expressible frequency
fn apply_interval(task: &str, interval: Duration) -> Result<Frequency, ManifestError> {
    let unsupported = || ManifestError::UnsupportedInterval {
        task: task.to_string(),
        interval,
    };

    let seconds = interval.as_secs();
    if seconds == 0 || interval.subsec_nanos() != 0 {
        return Err(unsupported());
    }

    if seconds < 60 {
        let seconds = u32::try_from(seconds).map_err(|_| unsupported())?;
        if 60 % seconds != 0 {
            return Err(unsupported());
        }
        return Ok(Frequency::Seconds(seconds));
    }

    if seconds == 24 * 60 * 60 {
        return Ok(Frequency::Daily);
    }

    if seconds % 3600 == 0 {
        let hours = u32::try_from(seconds / 3600).map_err(|_| unsupported())?;
        if hours < 24 && 24 % hours == 0 {
            return Ok(Frequency::HourStep(hours));
        }
        return Err(unsupported());
    }

    if seconds % 60 == 0 {
        let minutes = u32::try_from(seconds / 60).map_err(|_| unsupported())?;
        if minutes < 60 && 60 % minutes == 0 {
            return Ok(Frequency::MinuteStep(minutes));
        }
    }

    Err(unsupported())
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
