// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule: the registry of all registered events
//!
//! Events are held in insertion order; that order is the dispatch
//! order within a tick and the lookup order for mutex identifiers.
//! Group-level attributes are accumulated in an explicit
//! PendingAttributes value and merged onto events at registration
//! time, never through process-wide state.

use crate::context::RunContext;
use crate::error::ConfigError;
use crate::event::{Event, JobResult, ScheduledJob};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;

/// The registry of scheduled events
#[derive(Debug, Default)]
pub struct Schedule {
    events: Vec<Event>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, event: Event) -> &mut Event {
        let index = self.events.len();
        self.events.push(event);
        &mut self.events[index]
    }

    /// Register a shell command
    pub fn exec(&mut self, command: impl Into<String>) -> &mut Event {
        self.push(Event::exec(command))
    }

    /// Register an in-process closure
    pub fn call<F>(&mut self, callback: F) -> &mut Event
    where
        F: Fn(&RunContext) -> JobResult + Send + Sync + 'static,
    {
        self.push(Event::call(callback))
    }

    /// Register a job object; its name seeds the event description
    pub fn job(&mut self, job: impl ScheduledJob + 'static) -> &mut Event {
        self.push(Event::job(Arc::new(job)))
    }

    /// Register events with shared group attributes.
    ///
    /// The attributes merge onto every event registered inside the
    /// closure; values set explicitly on an event win.
    pub fn group<F>(&mut self, attributes: PendingAttributes, register: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Schedule),
    {
        let start = self.events.len();
        register(self);
        for event in &mut self.events[start..] {
            attributes.merge_onto(event)?;
        }
        Ok(())
    }

    /// All registered events, in insertion order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events whose due-check passes at the context's instant, in
    /// insertion order
    pub fn due_events(&self, ctx: &RunContext) -> Vec<&Event> {
        self.events.iter().filter(|e| e.is_due(ctx)).collect()
    }

    /// First event whose mutex identifier matches, in insertion order
    pub fn find_by_mutex_name(&self, mutex_name: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.mutex_name() == mutex_name)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Group-level attribute accumulator.
///
/// Holds the shareable subset of an event's configuration (no run
/// target, no frequencies); owned by the registration call stack and
/// discarded after the merge.
#[derive(Clone, Debug, Default)]
pub struct PendingAttributes {
    timezone: Option<Tz>,
    user: Option<String>,
    environments: Vec<String>,
    even_in_maintenance_mode: bool,
    run_in_background: bool,
    without_overlapping: bool,
    mutex_ttl: Option<Duration>,
    on_one_server: bool,
}

impl PendingAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timezone(mut self, tz: Tz) -> Self {
        self.timezone = Some(tz);
        self
    }

    pub fn as_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn environments<I, S>(mut self, environments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.environments = environments.into_iter().map(Into::into).collect();
        self
    }

    pub fn even_in_maintenance_mode(mut self) -> Self {
        self.even_in_maintenance_mode = true;
        self
    }

    pub fn run_in_background(mut self) -> Self {
        self.run_in_background = true;
        self
    }

    pub fn without_overlapping(mut self) -> Self {
        self.without_overlapping = true;
        self
    }

    pub fn without_overlapping_for(mut self, ttl: Duration) -> Self {
        self.without_overlapping = true;
        self.mutex_ttl = Some(ttl);
        self
    }

    pub fn on_one_server(mut self) -> Self {
        self.on_one_server = true;
        self
    }

    /// Merge onto one event; explicit event-level values win.
    ///
    /// Overlap and single-server flags still require the event to carry
    /// a description, so the merge fails fast exactly as the event-level
    /// calls would.
    fn merge_onto(&self, event: &mut Event) -> Result<(), ConfigError> {
        if event.tz_is_unset() {
            if let Some(tz) = self.timezone {
                event.timezone(tz);
            }
        }
        if event.user().is_none() {
            if let Some(user) = &self.user {
                event.as_user(user.clone());
            }
        }
        if event.environments_are_unset() && !self.environments.is_empty() {
            event.environments(self.environments.clone());
        }
        if self.even_in_maintenance_mode {
            event.even_in_maintenance_mode();
        }
        if self.run_in_background {
            event.run_in_background();
        }
        if self.without_overlapping && !event.prevents_overlapping() {
            match self.mutex_ttl {
                Some(ttl) => event.without_overlapping_for(ttl)?,
                None => event.without_overlapping()?,
            };
        }
        if self.on_one_server && !event.runs_on_one_server() {
            event.on_one_server()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
