// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration
//!
//! Loaded from a TOML file when given, otherwise defaults. The state
//! directory holds the file marker store (mutexes, interrupt flag) and
//! the maintenance marker.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Daemon settings
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Application environment name events are gated against
    pub environment: String,
    /// Directory for mutex markers and the interrupt flag
    pub state_dir: PathBuf,
    /// Path to the schedule manifest
    pub schedule: PathBuf,
    /// Maintenance marker; defaults to `<state_dir>/down`
    pub maintenance_file: Option<PathBuf>,
    /// Log to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "production".to_string(),
            state_dir: PathBuf::from(".chime"),
            schedule: PathBuf::from("schedule.toml"),
            maintenance_file: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Load from a file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// The maintenance marker path
    pub fn maintenance_file(&self) -> PathBuf {
        self.maintenance_file
            .clone()
            .unwrap_or_else(|| self.state_dir.join("down"))
    }

    /// Maintenance mode is the marker file's presence
    pub fn in_maintenance_mode(&self) -> bool {
        self.maintenance_file().exists()
    }
}
