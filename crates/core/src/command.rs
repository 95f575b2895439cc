// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command builder: renders an event into the exact OS invocation
//!
//! Pure and stateless: the same event configuration always yields the
//! same string for a given platform flag. Background commands chain a
//! finish sub-invocation carrying the event's mutex identifier, which
//! is how a detached run reports its exit code back (process re-entry,
//! not an in-memory callback).

use crate::event::Event;
use std::path::Path;

/// Default finish sub-command prefix; the daemon overrides this with
/// its own binary path
const DEFAULT_FINISH_COMMAND: &str = "chimed finish";

/// Renders events into shell invocations
#[derive(Clone, Debug)]
pub struct CommandBuilder {
    windows: bool,
    finish_command: String,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self {
            windows: cfg!(windows),
            finish_command: DEFAULT_FINISH_COMMAND.to_string(),
        }
    }

    /// Force the platform flag (used in tests; defaults to the compile
    /// target)
    pub fn for_windows(mut self, windows: bool) -> Self {
        self.windows = windows;
        self
    }

    /// Set the command prefix used for the background finish chain
    pub fn with_finish_command(mut self, finish_command: impl Into<String>) -> Self {
        self.finish_command = finish_command.into();
        self
    }

    /// Render the full invocation for an event
    pub fn build_command(&self, event: &Event) -> String {
        if event.is_background() {
            self.build_background_command(event)
        } else {
            self.build_foreground_command(event)
        }
    }

    /// `<command> >(>) <output> 2>&1`, wrapped for user impersonation
    /// when requested
    pub fn build_foreground_command(&self, event: &Event) -> String {
        let redirect = self.redirect(event);
        let output = escape_path(event.output_path(), self.windows);
        let command = event.command().unwrap_or_default();

        self.ensure_correct_user(event, &format!("{} {} {} 2>&1", command, redirect, output))
    }

    /// Wrap the command, chain the finish sub-command carrying the
    /// mutex identifier, silence the wrapper, and background it
    pub fn build_background_command(&self, event: &Event) -> String {
        let redirect = self.redirect(event);
        let output = escape_path(event.output_path(), self.windows);
        let command = event.command().unwrap_or_default();
        let mutex = event.mutex_name();

        let (separator, exit_code, sink) = if self.windows {
            ("&", "%errorlevel%", "NUL")
        } else {
            (";", "$?", "/dev/null")
        };

        let wrapped = format!(
            "({} {} {} 2>&1 {} {} \"{}\" \"{}\") > {} 2>&1 &",
            command, redirect, output, separator, self.finish_command, mutex, exit_code, sink,
        );

        self.ensure_correct_user(event, &wrapped)
    }

    fn redirect(&self, event: &Event) -> &'static str {
        if event.output().append {
            ">>"
        } else {
            ">"
        }
    }

    /// Wrap with sudo when a user is set (no-op on Windows).
    ///
    /// The inner command is assumed not to contain unescaped single
    /// quotes beyond what escape_single_quotes handles.
    fn ensure_correct_user(&self, event: &Event, command: &str) -> String {
        match event.user() {
            Some(user) if !self.windows => {
                format!("sudo -u {} -- sh -c '{}'", user, escape_single_quotes(command))
            }
            _ => command.to_string(),
        }
    }
}

/// Quote a path only when it contains bytes outside the shell-safe set
fn escape_path(path: &Path, windows: bool) -> String {
    let text = path.display().to_string();
    let safe = text
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'/' | b'\\' | b':'));
    if safe {
        text
    } else if windows {
        format!("\"{}\"", text)
    } else {
        format!("'{}'", escape_single_quotes(&text))
    }
}

fn escape_single_quotes(text: &str) -> String {
    text.replace('\'', "'\\''")
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
