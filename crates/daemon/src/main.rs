// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! chimed - chime scheduler daemon
//!
//! Entry points: `run` (one tick), `work` (a tick at every minute
//! boundary), `finish` (background completion re-entry), and
//! `interrupt` (cooperative stop signal).

use anyhow::{Context as _, Result};
use chime_core::{
    load_manifest, CacheInterruptStore, CommandBuilder, FileMarkerStore, LockEventMutex,
    LockSchedulingMutex, RunContext, Schedule, ScheduleRunner, ShellProcessRunner, SystemClock,
    SystemSleeper,
};
use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use chime_daemon::Config;

#[derive(Parser)]
#[command(name = "chimed", version, about = "chime - cron-style task scheduler")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one dispatch tick
    Run(RunArgs),
    /// Run a tick at every minute boundary until stopped
    Work,
    /// Report a background run's completion
    Finish(FinishArgs),
    /// Ask the current cycle to stop launching new work
    Interrupt,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Evaluate the tick at this RFC 3339 instant instead of now
    #[arg(long)]
    at: Option<DateTime<Utc>>,
}

#[derive(clap::Args)]
struct FinishArgs {
    /// Mutex identifier carried by the background wrapper
    mutex_id: String,
    /// Exit code of the finished process
    #[arg(default_value_t = 0)]
    exit_code: i32,
}

/// Wires the file marker store into the runner's collaborators
struct App {
    config: Config,
    sleeper: SystemSleeper,
    processes: ShellProcessRunner,
    event_mutex: LockEventMutex<FileMarkerStore<SystemClock>>,
    scheduling_mutex: LockSchedulingMutex<FileMarkerStore<SystemClock>>,
    interrupts: CacheInterruptStore<FileMarkerStore<SystemClock>>,
}

impl App {
    fn new(config: Config) -> Self {
        let store = FileMarkerStore::new(config.state_dir.clone(), SystemClock);
        Self {
            sleeper: SystemSleeper,
            processes: ShellProcessRunner::new(),
            event_mutex: LockEventMutex::new(store.clone()),
            scheduling_mutex: LockSchedulingMutex::new(store.clone()),
            interrupts: CacheInterruptStore::new(store),
            config,
        }
    }

    fn runner(&self) -> ScheduleRunner<'_, SystemClock> {
        ScheduleRunner::new(
            SystemClock,
            &self.sleeper,
            &self.processes,
            &self.event_mutex,
            &self.scheduling_mutex,
            &self.interrupts,
        )
        .with_command_builder(CommandBuilder::new().with_finish_command(finish_command()))
    }

    fn schedule(&self) -> Result<Schedule> {
        load_manifest(&self.config.schedule)
            .with_context(|| format!("loading schedule {}", self.config.schedule.display()))
    }

    fn context(&self, at: Option<DateTime<Utc>>) -> RunContext {
        RunContext::new(&self.config.environment)
            .at(at.unwrap_or_else(Utc::now))
            .in_maintenance_mode(self.config.in_maintenance_mode())
    }
}

/// Background wrappers re-invoke this binary to report completion
fn finish_command() -> String {
    std::env::current_exe()
        .map(|path| format!("{} finish", path.display()))
        .unwrap_or_else(|_| "chimed finish".to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let _log_guard = setup_logging(&config)?;
    let app = App::new(config);

    match cli.command {
        Commands::Run(args) => {
            let schedule = app.schedule()?;
            let summary = app.runner().run(&schedule, &app.context(args.at));
            println!("{}", summary);
        }

        Commands::Work => work(&app)?,

        Commands::Finish(args) => {
            let schedule = app.schedule()?;
            let found =
                app.runner()
                    .finish(&schedule, &app.context(None), &args.mutex_id, args.exit_code);
            if found {
                println!("Finished: {} (exit {})", args.mutex_id, args.exit_code);
            } else {
                println!("No task matches mutex identifier {}", args.mutex_id);
            }
        }

        Commands::Interrupt => {
            app.runner()
                .interrupt(Utc::now())
                .context("setting the interrupt flag")?;
            println!("Interrupt requested; the current cycle will stop launching new work.");
        }
    }

    Ok(())
}

/// Tick at every minute boundary until SIGINT/SIGTERM
fn work(app: &App) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nShutting down...");
        r.store(false, Ordering::SeqCst);
    })?;

    info!(schedule = %app.config.schedule.display(), "watching schedule");
    println!("Running scheduled tasks every minute. Press Ctrl-C to stop.");

    let mut next_tick = next_minute(Utc::now());
    while running.load(Ordering::SeqCst) {
        let now = Utc::now();
        if now < next_tick {
            std::thread::sleep(Duration::from_millis(250));
            continue;
        }
        next_tick = next_minute(now);

        // The manifest is re-read each tick so edits apply without a
        // restart
        match app.schedule() {
            Ok(schedule) => {
                let summary = app.runner().run(&schedule, &app.context(Some(now)));
                info!(%summary, "tick complete");
            }
            Err(e) => warn!(error = %e, "skipping tick"),
        }
    }

    Ok(())
}

fn next_minute(now: DateTime<Utc>) -> DateTime<Utc> {
    let start = now
        .with_nanosecond(0)
        .and_then(|d| d.with_second(0))
        .unwrap_or(now);
    start + ChronoDuration::seconds(60)
}

fn setup_logging(config: &Config) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match &config.log_file {
        Some(path) => {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            std::fs::create_dir_all(dir)?;
            let file_name = path
                .file_name()
                .context("log_file has no file name")?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
            Ok(None)
        }
    }
}
