// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner: the tick-driven dispatch loop
//!
//! Invoked once per minute tick. Asks the registry for due events,
//! gates each one through the mutex protocol, renders and spawns the
//! OS command (or invokes the inline target), and keeps looping within
//! the minute for sub-minute repeat events. Each event's dispatch is
//! isolated: a failure is recorded and the loop continues.

use crate::clock::{Clock, Sleeper};
use crate::command::CommandBuilder;
use crate::context::RunContext;
use crate::error::DispatchError;
use crate::event::{Event, RunOutcome, RunTarget};
use crate::interrupt::InterruptStore;
use crate::mutex::{EventMutex, SchedulingMutex};
use crate::process::ProcessRunner;
use crate::schedule::Schedule;
use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use std::fmt;

/// Why an event was not run this tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The overlap mutex from a previous run is still held
    MutexHeld,
    /// Another server already claimed this due tick
    ClaimedByAnotherServer,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MutexHeld => write!(f, "previous run still in progress"),
            SkipReason::ClaimedByAnotherServer => write!(f, "claimed by another server"),
        }
    }
}

/// Outcome of one tick of the dispatch loop
#[derive(Debug, Default)]
pub struct TickSummary {
    /// Dispatch attempts that started a run
    pub ran: usize,
    /// Events skipped with their reasons (not errors)
    pub skipped: Vec<(String, SkipReason)>,
    /// Per-event dispatch failures
    pub failures: Vec<(String, DispatchError)>,
    /// Whether the interrupt signal stopped the cycle
    pub interrupted: bool,
}

impl TickSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    fn nothing_happened(&self) -> bool {
        self.ran == 0 && self.skipped.is_empty() && self.failures.is_empty()
    }
}

impl fmt::Display for TickSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.interrupted && self.nothing_happened() {
            return write!(f, "Execution interrupted; no new tasks started.");
        }
        if self.nothing_happened() {
            return write!(f, "No scheduled commands are ready to run.");
        }
        write!(f, "Ran {} task(s)", self.ran)?;
        if !self.skipped.is_empty() {
            write!(f, ", skipped {}", self.skipped.len())?;
        }
        for (name, error) in &self.failures {
            write!(f, "\n  failed: {}: {}", name, error)?;
        }
        Ok(())
    }
}

enum Dispatched {
    Ran,
    Skipped(SkipReason),
}

/// Releases an event's overlap mutex on every exit path
struct MutexGuard<'a> {
    mutex: &'a dyn EventMutex,
    event: &'a Event,
    armed: bool,
}

impl<'a> MutexGuard<'a> {
    fn new(mutex: &'a dyn EventMutex, event: &'a Event) -> Self {
        Self {
            mutex,
            event,
            armed: true,
        }
    }

    /// Keep the mutex held past this scope (background runs release it
    /// in finish)
    fn disarm(&mut self) {
        self.armed = false;
    }

    /// Release now, ahead of after-callbacks
    fn release(&mut self) {
        if self.armed {
            self.armed = false;
            if let Err(e) = self.mutex.forget(self.event) {
                tracing::warn!(task = %self.event.display_name(), error = %e, "mutex release failed");
            }
        }
    }
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// The tick-driven dispatcher
pub struct ScheduleRunner<'a, C: Clock> {
    clock: C,
    sleeper: &'a dyn Sleeper,
    processes: &'a dyn ProcessRunner,
    event_mutex: &'a dyn EventMutex,
    scheduling_mutex: &'a dyn SchedulingMutex,
    interrupts: &'a dyn InterruptStore,
    builder: CommandBuilder,
}

impl<'a, C: Clock> ScheduleRunner<'a, C> {
    pub fn new(
        clock: C,
        sleeper: &'a dyn Sleeper,
        processes: &'a dyn ProcessRunner,
        event_mutex: &'a dyn EventMutex,
        scheduling_mutex: &'a dyn SchedulingMutex,
        interrupts: &'a dyn InterruptStore,
    ) -> Self {
        Self {
            clock,
            sleeper,
            processes,
            event_mutex,
            scheduling_mutex,
            interrupts,
            builder: CommandBuilder::new(),
        }
    }

    pub fn with_command_builder(mut self, builder: CommandBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Run one tick: dispatch every due event, then service sub-minute
    /// repeats until the minute ends.
    pub fn run(&self, schedule: &Schedule, ctx: &RunContext) -> TickSummary {
        let mut summary = TickSummary::default();

        if self.interrupt_requested() {
            summary.interrupted = true;
            tracing::info!("interrupt requested; not starting new work");
            return summary;
        }

        let due = schedule.due_events(ctx);
        if due.is_empty() {
            tracing::info!("no scheduled commands are ready to run");
            return summary;
        }

        for event in &due {
            self.dispatch(event, ctx, &mut summary);
        }

        if due.iter().any(|e| e.repeat_seconds().is_some()) {
            self.run_repeats(schedule, ctx, &mut summary);
        }

        summary
    }

    /// Service sub-minute repeat events for the remainder of the
    /// current minute.
    ///
    /// A repeat event fires at every second offset its interval
    /// divides; offset zero was covered by the initial dispatch.
    fn run_repeats(&self, schedule: &Schedule, ctx: &RunContext, summary: &mut TickSummary) {
        let minute_start = start_of_minute(ctx.now);
        let minute_end = minute_start + ChronoDuration::seconds(60);

        let intervals: Vec<u32> = schedule
            .events()
            .iter()
            .filter_map(|e| e.repeat_seconds())
            .collect();

        for offset in 1..60u32 {
            if !intervals.iter().any(|n| offset % n == 0) {
                continue;
            }

            let target = minute_start + ChronoDuration::seconds(i64::from(offset));
            let now = self.clock.now();
            if now >= minute_end {
                break;
            }
            if target <= now {
                // Missed this offset while dispatching; move on
                continue;
            }

            let wait = (target - now).to_std().unwrap_or_default();
            self.sleeper.sleep(wait);

            if self.interrupt_requested() {
                summary.interrupted = true;
                tracing::info!("interrupt requested; stopping repeat loop");
                break;
            }

            let tick_ctx = ctx.clone().at(target);
            for event in schedule.events() {
                let Some(interval) = event.repeat_seconds() else {
                    continue;
                };
                if offset % interval == 0 && event.is_due(&tick_ctx) {
                    self.dispatch(event, &tick_ctx, summary);
                }
            }
        }
    }

    fn interrupt_requested(&self) -> bool {
        match self.interrupts.is_requested() {
            Ok(flag) => flag,
            Err(e) => {
                tracing::warn!(error = %e, "interrupt store unavailable; assuming not interrupted");
                false
            }
        }
    }

    /// Dispatch one event, recording the result; never propagates
    fn dispatch(&self, event: &Event, ctx: &RunContext, summary: &mut TickSummary) {
        match self.dispatch_event(event, ctx) {
            Ok(Dispatched::Ran) => {
                summary.ran += 1;
            }
            Ok(Dispatched::Skipped(reason)) => {
                tracing::info!(task = %event.display_name(), %reason, "skipped");
                summary.skipped.push((event.display_name(), reason));
            }
            Err(error) => {
                tracing::error!(task = %event.display_name(), %error, "dispatch failed");
                summary.failures.push((event.display_name(), error));
            }
        }
    }

    fn dispatch_event(&self, event: &Event, ctx: &RunContext) -> Result<Dispatched, DispatchError> {
        // Overlap gate: a held mutex is a skip, not a failure
        if event.prevents_overlapping() && self.event_mutex.exists(event)? {
            return Ok(Dispatched::Skipped(SkipReason::MutexHeld));
        }

        // Single-server gate: claim this due tick across the cluster
        if event.runs_on_one_server() && !self.scheduling_mutex.create(event, ctx.now)? {
            return Ok(Dispatched::Skipped(SkipReason::ClaimedByAnotherServer));
        }

        // Losing the create race counts as held
        let mut guard = if event.prevents_overlapping() {
            if !self.event_mutex.create(event)? {
                return Ok(Dispatched::Skipped(SkipReason::MutexHeld));
            }
            Some(MutexGuard::new(self.event_mutex, event))
        } else {
            None
        };

        event.run_before_callbacks(ctx);
        tracing::info!(task = %event.display_name(), "running scheduled task");

        match event.target() {
            RunTarget::Exec { command } => {
                let rendered = self.builder.build_command(event);
                if event.is_background() {
                    self.processes.spawn_background(&rendered)?;
                    // The finish sub-invocation releases the mutex and
                    // fires after-callbacks once the process exits
                    if let Some(guard) = guard.as_mut() {
                        guard.disarm();
                    }
                    Ok(Dispatched::Ran)
                } else {
                    let exit_code = self.processes.run_foreground(&rendered)?;
                    if let Some(guard) = guard.as_mut() {
                        guard.release();
                    }
                    let outcome = RunOutcome {
                        exit_code,
                        output: read_output(event),
                    };
                    event.run_after_callbacks(ctx, &outcome);
                    if exit_code != 0 {
                        return Err(DispatchError::UnexpectedExitCode {
                            command: command.clone(),
                            exit_code,
                        });
                    }
                    Ok(Dispatched::Ran)
                }
            }
            RunTarget::Callback { .. } | RunTarget::Job { .. } => {
                let result = event.run_inline(ctx);
                if let Some(guard) = guard.as_mut() {
                    guard.release();
                }
                let outcome = RunOutcome::with_exit_code(match &result {
                    Ok(()) => 0,
                    Err(_) => 1,
                });
                event.run_after_callbacks(ctx, &outcome);
                result?;
                Ok(Dispatched::Ran)
            }
        }
    }

    /// Handle a background run's completion re-entry.
    ///
    /// Locates the event by its mutex identifier, releases the mutex,
    /// and fires the after-callbacks with the reported exit code.
    /// Returns whether a matching event was found.
    pub fn finish(
        &self,
        schedule: &Schedule,
        ctx: &RunContext,
        mutex_name: &str,
        exit_code: i32,
    ) -> bool {
        let Some(event) = schedule.find_by_mutex_name(mutex_name) else {
            tracing::warn!(mutex_name, "finish for unknown mutex identifier");
            return false;
        };

        if event.prevents_overlapping() {
            if let Err(e) = self.event_mutex.forget(event) {
                tracing::warn!(task = %event.display_name(), error = %e, "mutex release failed");
            }
        }

        let outcome = RunOutcome {
            exit_code,
            output: read_output(event),
        };
        event.run_after_callbacks(ctx, &outcome);
        tracing::info!(task = %event.display_name(), exit_code, "scheduled task finished");
        true
    }

    /// Request that the current cycle stop launching new work
    pub fn interrupt(&self, now: DateTime<Utc>) -> Result<(), crate::error::MutexStoreError> {
        self.interrupts.request(now)
    }
}

/// Read captured output back for callbacks; empty for the null sink
fn read_output(event: &Event) -> String {
    if event.output().is_null_sink() {
        return String::new();
    }
    std::fs::read_to_string(event.output_path()).unwrap_or_default()
}

fn start_of_minute(now: DateTime<Utc>) -> DateTime<Utc> {
    now.with_nanosecond(0)
        .and_then(|d| d.with_second(0))
        .unwrap_or(now)
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
