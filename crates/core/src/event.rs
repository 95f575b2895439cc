// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event: the fundamental schedulable unit
//!
//! An Event wraps one run target (a shell command, a closure, or a job
//! object), its cron expression and timezone, gating predicates, and
//! the execution-mode flags the runner and command builder consume.
//! The target is a tagged union; there is no event subclassing.

use crate::context::RunContext;
use crate::error::{ConfigError, DispatchError};
use crate::expression::CronExpression;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sha1::{Digest, Sha1};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Result of a closure or job run target
pub type JobResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A schedulable unit of work delegated to a named type
pub trait ScheduledJob: Send + Sync {
    /// Human-readable name; seeds the event description
    fn name(&self) -> &str;

    fn run(&self, ctx: &RunContext) -> JobResult;
}

/// A when/skip gating predicate evaluated at due-check time
pub type Predicate = Arc<dyn Fn(&RunContext) -> bool + Send + Sync>;

/// Callback invoked before a run starts
pub type BeforeCallback = Arc<dyn Fn(&RunContext) + Send + Sync>;

/// Callback invoked after a run finishes, with the captured outcome
pub type AfterCallback = Arc<dyn Fn(&RunContext, &RunOutcome) + Send + Sync>;

type CallbackFn = Arc<dyn Fn(&RunContext) -> JobResult + Send + Sync>;

/// What an event executes when dispatched.
///
/// Exactly one target kind per event; the runner pattern-matches on
/// the tag.
#[derive(Clone)]
pub enum RunTarget {
    /// A shell command rendered through the command builder
    Exec { command: String },
    /// An in-process closure
    Callback { callback: CallbackFn },
    /// A delegated job object
    Job { job: Arc<dyn ScheduledJob> },
}

impl fmt::Debug for RunTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunTarget::Exec { command } => f.debug_struct("Exec").field("command", command).finish(),
            RunTarget::Callback { .. } => f.debug_struct("Callback").finish_non_exhaustive(),
            RunTarget::Job { job } => f.debug_struct("Job").field("name", &job.name()).finish(),
        }
    }
}

/// Captured result of one dispatch, handed to after-callbacks
#[derive(Clone, Debug, Default)]
pub struct RunOutcome {
    pub exit_code: i32,
    /// Output read back from the event's output file (empty for the
    /// null sink)
    pub output: String,
}

impl RunOutcome {
    pub fn with_exit_code(exit_code: i32) -> Self {
        Self {
            exit_code,
            output: String::new(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Where process output is redirected
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputSpec {
    pub path: PathBuf,
    pub append: bool,
}

impl OutputSpec {
    /// The platform null sink
    pub fn null_sink() -> Self {
        let path = if cfg!(windows) { "NUL" } else { "/dev/null" };
        Self {
            path: PathBuf::from(path),
            append: false,
        }
    }

    pub fn is_null_sink(&self) -> bool {
        self.path == Self::null_sink().path
    }
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self::null_sink()
    }
}

/// Prefix for every mutex key derived from an event
const MUTEX_PREFIX: &str = "schedule-";

/// Default overlap-mutex lifetime (24 hours)
pub const DEFAULT_MUTEX_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// The fundamental schedulable unit
#[derive(Clone)]
pub struct Event {
    pub(crate) target: RunTarget,
    pub(crate) description: Option<String>,
    pub(crate) expression: String,
    pub(crate) timezone: Option<Tz>,
    pub(crate) repeat_seconds: Option<u32>,
    pub(crate) user: Option<String>,
    pub(crate) environments: Vec<String>,
    pub(crate) even_in_maintenance_mode: bool,
    pub(crate) run_in_background: bool,
    pub(crate) output: OutputSpec,
    pub(crate) email_addresses: Vec<String>,
    pub(crate) when_filters: Vec<Predicate>,
    pub(crate) skip_filters: Vec<Predicate>,
    pub(crate) without_overlapping: bool,
    pub(crate) mutex_ttl: Duration,
    pub(crate) on_one_server: bool,
    pub(crate) before_callbacks: Vec<BeforeCallback>,
    pub(crate) after_callbacks: Vec<AfterCallback>,
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("target", &self.target)
            .field("description", &self.description)
            .field("expression", &self.expression)
            .field("timezone", &self.timezone)
            .field("repeat_seconds", &self.repeat_seconds)
            .field("environments", &self.environments)
            .field("run_in_background", &self.run_in_background)
            .field("without_overlapping", &self.without_overlapping)
            .field("on_one_server", &self.on_one_server)
            .finish_non_exhaustive()
    }
}

impl Event {
    fn with_target(target: RunTarget) -> Self {
        Self {
            target,
            description: None,
            expression: "* * * * *".to_string(),
            timezone: None,
            repeat_seconds: None,
            user: None,
            environments: Vec::new(),
            even_in_maintenance_mode: false,
            run_in_background: false,
            output: OutputSpec::default(),
            email_addresses: Vec::new(),
            when_filters: Vec::new(),
            skip_filters: Vec::new(),
            without_overlapping: false,
            mutex_ttl: DEFAULT_MUTEX_TTL,
            on_one_server: false,
            before_callbacks: Vec::new(),
            after_callbacks: Vec::new(),
        }
    }

    /// Create an event running a shell command
    pub(crate) fn exec(command: impl Into<String>) -> Self {
        Self::with_target(RunTarget::Exec {
            command: command.into(),
        })
    }

    /// Create an event running an in-process closure
    pub(crate) fn call<F>(callback: F) -> Self
    where
        F: Fn(&RunContext) -> JobResult + Send + Sync + 'static,
    {
        Self::with_target(RunTarget::Callback {
            callback: Arc::new(callback),
        })
    }

    /// Create an event delegating to a job object; the job name seeds
    /// the description
    pub(crate) fn job(job: Arc<dyn ScheduledJob>) -> Self {
        let description = job.name().to_string();
        let mut event = Self::with_target(RunTarget::Job { job });
        event.description = Some(description);
        event
    }

    // === Configuration ===

    /// Set the human-readable description (seeds the mutex key)
    pub fn name(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Restrict the event to the listed environments; an empty list
    /// means all environments
    pub fn environments<I, S>(&mut self, environments: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.environments = environments.into_iter().map(Into::into).collect();
        self
    }

    /// Run the command as another OS user (non-Windows only)
    pub fn as_user(&mut self, user: impl Into<String>) -> &mut Self {
        self.user = Some(user.into());
        self
    }

    /// Keep running even while the application is in maintenance mode
    pub fn even_in_maintenance_mode(&mut self) -> &mut Self {
        self.even_in_maintenance_mode = true;
        self
    }

    /// Detach the spawned process instead of blocking on it
    pub fn run_in_background(&mut self) -> &mut Self {
        self.run_in_background = true;
        self
    }

    /// Redirect process output to the given path, truncating first
    pub fn send_output_to(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.output = OutputSpec {
            path: path.into(),
            append: false,
        };
        self
    }

    /// Redirect process output to the given path, appending
    pub fn append_output_to(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.output = OutputSpec {
            path: path.into(),
            append: true,
        };
        self
    }

    /// Email captured output to the given addresses.
    ///
    /// Output must already be redirected somewhere real; emailing the
    /// null sink is rejected at configuration time.
    pub fn email_output_to<I, S>(&mut self, addresses: I) -> Result<&mut Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.output.is_null_sink() {
            return Err(ConfigError::OutputNotCaptured);
        }
        self.email_addresses
            .extend(addresses.into_iter().map(Into::into));
        Ok(self)
    }

    /// Only run when the predicate returns true
    pub fn when<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&RunContext) -> bool + Send + Sync + 'static,
    {
        self.when_filters.push(Arc::new(filter));
        self
    }

    /// Skip the run when the predicate returns true
    pub fn skip<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&RunContext) -> bool + Send + Sync + 'static,
    {
        self.skip_filters.push(Arc::new(filter));
        self
    }

    /// Prevent a new dispatch while a previous run's mutex is held.
    ///
    /// The mutex key is seeded from the description, which must
    /// therefore be set first. The mutex expires after 24 hours.
    pub fn without_overlapping(&mut self) -> Result<&mut Self, ConfigError> {
        self.without_overlapping_for(DEFAULT_MUTEX_TTL)
    }

    /// Prevent overlap with a custom mutex lifetime
    pub fn without_overlapping_for(&mut self, ttl: Duration) -> Result<&mut Self, ConfigError> {
        if self.description.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::DescriptionRequired {
                feature: "overlap prevention",
            });
        }
        self.without_overlapping = true;
        self.mutex_ttl = ttl;
        Ok(self)
    }

    /// Run on exactly one node among cooperating nodes for a given due
    /// tick (best effort, bounded by the backing lock store)
    pub fn on_one_server(&mut self) -> Result<&mut Self, ConfigError> {
        if self.description.as_deref().unwrap_or("").is_empty() {
            return Err(ConfigError::DescriptionRequired {
                feature: "single-server execution",
            });
        }
        self.on_one_server = true;
        Ok(self)
    }

    // === Lifecycle callbacks ===

    /// Register a callback invoked before the run starts
    pub fn before<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&RunContext) + Send + Sync + 'static,
    {
        self.before_callbacks.push(Arc::new(callback));
        self
    }

    /// Register a callback invoked after every run, with the outcome
    pub fn after<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&RunContext, &RunOutcome) + Send + Sync + 'static,
    {
        self.after_callbacks.push(Arc::new(callback));
        self
    }

    /// Register a callback invoked only when the run exited zero
    pub fn on_success<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&RunContext, &RunOutcome) + Send + Sync + 'static,
    {
        self.after(move |ctx, outcome| {
            if outcome.succeeded() {
                callback(ctx, outcome);
            }
        })
    }

    /// Register a callback invoked only when the run exited non-zero
    pub fn on_failure<F>(&mut self, callback: F) -> &mut Self
    where
        F: Fn(&RunContext, &RunOutcome) + Send + Sync + 'static,
    {
        self.after(move |ctx, outcome| {
            if !outcome.succeeded() {
                callback(ctx, outcome);
            }
        })
    }

    // === Due-check state machine ===

    /// Whether the event should dispatch at the context's instant.
    ///
    /// Evaluates, in order: the maintenance-mode gate, the cron match
    /// in the event's timezone, the when/skip filters, and the
    /// environment allow-list.
    pub fn is_due(&self, ctx: &RunContext) -> bool {
        if ctx.maintenance_mode && !self.even_in_maintenance_mode {
            return false;
        }
        if !self.expression_matches(ctx.now) {
            return false;
        }
        if !self.filters_pass(ctx) {
            return false;
        }
        self.runs_in_environment(&ctx.environment)
    }

    /// Whether the cron expression matches the instant in the event's
    /// timezone
    pub fn expression_matches(&self, now: DateTime<Utc>) -> bool {
        match CronExpression::parse(&self.expression) {
            Ok(expr) => expr.is_due(now, self.tz()),
            Err(e) => {
                tracing::warn!(expression = %self.expression, error = %e, "unparseable expression");
                false
            }
        }
    }

    /// All when filters pass and no skip filter trips
    pub fn filters_pass(&self, ctx: &RunContext) -> bool {
        self.when_filters.iter().all(|f| f(ctx)) && !self.skip_filters.iter().any(|f| f(ctx))
    }

    /// Whether the event runs in the given environment
    pub fn runs_in_environment(&self, environment: &str) -> bool {
        self.environments.is_empty() || self.environments.iter().any(|e| e == environment)
    }

    // === Introspection ===

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The shell command for Exec targets
    pub fn command(&self) -> Option<&str> {
        match &self.target {
            RunTarget::Exec { command } => Some(command),
            _ => None,
        }
    }

    pub fn target(&self) -> &RunTarget {
        &self.target
    }

    /// Resolved timezone (UTC when unset)
    pub fn tz(&self) -> Tz {
        self.timezone.unwrap_or(Tz::UTC)
    }

    pub(crate) fn tz_is_unset(&self) -> bool {
        self.timezone.is_none()
    }

    pub(crate) fn environments_are_unset(&self) -> bool {
        self.environments.is_empty()
    }

    pub fn repeat_seconds(&self) -> Option<u32> {
        self.repeat_seconds
    }

    pub fn is_background(&self) -> bool {
        self.run_in_background
    }

    pub fn prevents_overlapping(&self) -> bool {
        self.without_overlapping
    }

    pub fn runs_on_one_server(&self) -> bool {
        self.on_one_server
    }

    pub fn mutex_ttl(&self) -> Duration {
        self.mutex_ttl
    }

    pub fn output(&self) -> &OutputSpec {
        &self.output
    }

    pub fn output_path(&self) -> &Path {
        &self.output.path
    }

    pub fn email_addresses(&self) -> &[String] {
        &self.email_addresses
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Label used in logs and tick summaries
    pub fn display_name(&self) -> String {
        if let Some(description) = self.description.as_deref() {
            if !description.is_empty() {
                return description.to_string();
            }
        }
        match &self.target {
            RunTarget::Exec { command } => command.clone(),
            RunTarget::Callback { .. } => "Closure".to_string(),
            RunTarget::Job { job } => job.name().to_string(),
        }
    }

    /// Deterministic mutex identifier.
    ///
    /// Hashes the description alone when present, so two events sharing
    /// a description share a mutex; description-less events fall back to
    /// expression + command so background completion always has an
    /// identifier.
    pub fn mutex_name(&self) -> String {
        let seed = match self.description.as_deref() {
            Some(description) if !description.is_empty() => description.to_string(),
            _ => format!("{}{}", self.expression, self.command().unwrap_or("")),
        };
        let digest = Sha1::digest(seed.as_bytes());
        format!("{}{}", MUTEX_PREFIX, hex::encode(digest))
    }

    // === Dispatch helpers (consumed by the runner) ===

    /// Run a closure or job target in-process.
    ///
    /// Exec targets go through the command builder instead.
    pub(crate) fn run_inline(&self, ctx: &RunContext) -> Result<(), DispatchError> {
        let result = match &self.target {
            RunTarget::Callback { callback } => callback(ctx),
            RunTarget::Job { job } => job.run(ctx),
            RunTarget::Exec { .. } => return Ok(()),
        };
        result.map_err(|e| DispatchError::Callback {
            message: e.to_string(),
        })
    }

    pub(crate) fn run_before_callbacks(&self, ctx: &RunContext) {
        for callback in &self.before_callbacks {
            callback(ctx);
        }
    }

    pub(crate) fn run_after_callbacks(&self, ctx: &RunContext, outcome: &RunOutcome) {
        for callback in &self.after_callbacks {
            callback(ctx, outcome);
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
