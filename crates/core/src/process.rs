// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process execution boundary
//!
//! The runner never spawns processes directly; it goes through this
//! trait so dispatch is testable without a shell. Output redirection
//! lives inside the rendered command string, so foreground runs only
//! report the exit code.

use crate::error::DispatchError;
use std::process::{Command, Stdio};
use std::sync::Mutex;

/// Spawns the rendered commands
pub trait ProcessRunner: Send + Sync {
    /// Run a command and block until it exits; returns the exit code
    fn run_foreground(&self, command: &str) -> Result<i32, DispatchError>;

    /// Start a command without waiting for completion.
    ///
    /// Background command strings end in `&`, so the shell wrapper
    /// itself returns immediately.
    fn spawn_background(&self, command: &str) -> Result<(), DispatchError>;
}

/// Real runner going through the platform shell
#[derive(Clone, Debug, Default)]
pub struct ShellProcessRunner;

impl ShellProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn shell_command(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

impl ProcessRunner for ShellProcessRunner {
    fn run_foreground(&self, command: &str) -> Result<i32, DispatchError> {
        let status = Self::shell_command(command)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| DispatchError::Process {
                message: e.to_string(),
            })?;
        // A signal-terminated process has no code; report it as -1
        Ok(status.code().unwrap_or(-1))
    }

    fn spawn_background(&self, command: &str) -> Result<(), DispatchError> {
        // The wrapper exits as soon as the compound is backgrounded;
        // waiting on it reaps the intermediate shell
        Self::shell_command(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| DispatchError::Process {
                message: e.to_string(),
            })?;
        Ok(())
    }
}

/// Recording fake for runner tests
#[derive(Default)]
pub struct FakeProcessRunner {
    foreground: Mutex<Vec<String>>,
    background: Mutex<Vec<String>>,
    exit_codes: Mutex<Vec<(String, i32)>>,
    spawn_failures: Mutex<Vec<String>>,
}

impl FakeProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands run in the foreground, in order
    pub fn foreground_commands(&self) -> Vec<String> {
        self.foreground
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Commands spawned in the background, in order
    pub fn background_commands(&self) -> Vec<String> {
        self.background
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Script a foreground exit code for commands containing the needle
    pub fn set_exit_code(&self, needle: impl Into<String>, exit_code: i32) {
        self.exit_codes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((needle.into(), exit_code));
    }

    /// Script a spawn failure for commands containing the needle
    pub fn fail_matching(&self, needle: impl Into<String>) {
        self.spawn_failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(needle.into());
    }

    fn scripted_failure(&self, command: &str) -> Option<DispatchError> {
        let failures = self.spawn_failures.lock().unwrap_or_else(|e| e.into_inner());
        failures
            .iter()
            .find(|needle| command.contains(needle.as_str()))
            .map(|_| DispatchError::Process {
                message: "scripted spawn failure".to_string(),
            })
    }

    fn scripted_exit_code(&self, command: &str) -> i32 {
        let codes = self.exit_codes.lock().unwrap_or_else(|e| e.into_inner());
        codes
            .iter()
            .find(|(needle, _)| command.contains(needle.as_str()))
            .map(|(_, code)| *code)
            .unwrap_or(0)
    }
}

impl ProcessRunner for FakeProcessRunner {
    fn run_foreground(&self, command: &str) -> Result<i32, DispatchError> {
        if let Some(err) = self.scripted_failure(command) {
            return Err(err);
        }
        self.foreground
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(command.to_string());
        Ok(self.scripted_exit_code(command))
    }

    fn spawn_background(&self, command: &str) -> Result<(), DispatchError> {
        if let Some(err) = self.scripted_failure(command) {
            return Err(err);
        }
        self.background
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(command.to_string());
        Ok(())
    }
}
