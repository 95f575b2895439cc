use super::*;
use chrono::{TimeZone, Utc};

fn ctx_at(h: u32, mi: u32, s: u32) -> RunContext {
    RunContext::new("production").at(Utc.with_ymd_and_hms(2024, 1, 15, h, mi, s).unwrap())
}

#[test]
fn due_events_matches_daily_midnight_scenario() {
    let mut schedule = Schedule::new();
    schedule.exec("report").cron("0 0 * * * *").unwrap();

    let due = schedule.due_events(&ctx_at(0, 0, 0));
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].command(), Some("report"));

    let due = schedule.due_events(&ctx_at(0, 1, 0));
    assert!(due.is_empty());
}

#[test]
fn due_events_preserves_insertion_order() {
    let mut schedule = Schedule::new();
    schedule.exec("third").name("c");
    schedule.exec("first").name("a");
    schedule.exec("second").name("b");

    let due = schedule.due_events(&ctx_at(12, 30, 0));
    let names: Vec<_> = due.iter().map(|e| e.display_name()).collect();
    assert_eq!(names, vec!["c", "a", "b"]);
}

#[test]
fn environment_allow_list_gates_dueness() {
    let mut schedule = Schedule::new();
    schedule.exec("deploy-cleanup").environments(["production"]);

    let staging = RunContext::new("staging").at(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
    assert!(schedule.due_events(&staging).is_empty());

    let production = ctx_at(0, 0, 0);
    assert_eq!(schedule.due_events(&production).len(), 1);
}

#[test]
fn when_filter_gates_dueness() {
    let mut schedule = Schedule::new();
    schedule.exec("guarded").when(|_| false);

    assert!(schedule.due_events(&ctx_at(0, 0, 0)).is_empty());
}

#[test]
fn skip_filter_gates_dueness() {
    let mut schedule = Schedule::new();
    schedule.exec("skipped").skip(|_| true);

    assert!(schedule.due_events(&ctx_at(0, 0, 0)).is_empty());
}

#[test]
fn maintenance_mode_gates_dueness_unless_opted_in() {
    let mut schedule = Schedule::new();
    schedule.exec("normal");
    schedule.exec("essential").even_in_maintenance_mode();

    let down = RunContext::new("production")
        .at(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
        .in_maintenance_mode(true);

    let due = schedule.due_events(&down);
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].command(), Some("essential"));

    // Same instant, maintenance over: both run
    let up = ctx_at(0, 0, 0);
    assert_eq!(schedule.due_events(&up).len(), 2);
}

#[test]
fn call_and_job_targets_register() {
    struct Prune;

    impl ScheduledJob for Prune {
        fn name(&self) -> &str {
            "prune-sessions"
        }

        fn run(&self, _ctx: &RunContext) -> JobResult {
            Ok(())
        }
    }

    let mut schedule = Schedule::new();
    schedule.call(|_| Ok(())).name("heartbeat");
    schedule.job(Prune);

    assert_eq!(schedule.len(), 2);
    assert_eq!(schedule.events()[0].display_name(), "heartbeat");
    // Job name seeds the description
    assert_eq!(schedule.events()[1].description(), Some("prune-sessions"));
}

#[test]
fn find_by_mutex_name_returns_first_match() {
    let mut schedule = Schedule::new();
    schedule.exec("one").name("shared");
    schedule.exec("two").name("shared");

    let mutex_name = schedule.events()[0].mutex_name();
    let found = schedule.find_by_mutex_name(&mutex_name).unwrap();
    assert_eq!(found.command(), Some("one"));
}

#[test]
fn group_merges_attributes_onto_registered_events() {
    let tz: chrono_tz::Tz = "Europe/Berlin".parse().unwrap();
    let mut schedule = Schedule::new();

    schedule
        .group(
            PendingAttributes::new()
                .timezone(tz)
                .environments(["production"])
                .run_in_background(),
            |s| {
                s.exec("first");
                s.exec("second");
            },
        )
        .unwrap();

    for event in schedule.events() {
        assert_eq!(event.tz(), tz);
        assert!(event.is_background());
        assert!(!event.runs_in_environment("staging"));
    }
}

#[test]
fn group_does_not_overwrite_explicit_event_values() {
    let berlin: chrono_tz::Tz = "Europe/Berlin".parse().unwrap();
    let tokyo: chrono_tz::Tz = "Asia/Tokyo".parse().unwrap();
    let mut schedule = Schedule::new();

    schedule
        .group(PendingAttributes::new().timezone(berlin), |s| {
            s.exec("local").timezone(tokyo);
            s.exec("grouped");
        })
        .unwrap();

    assert_eq!(schedule.events()[0].tz(), tokyo);
    assert_eq!(schedule.events()[1].tz(), berlin);
}

#[test]
fn group_overlap_without_description_fails_fast() {
    let mut schedule = Schedule::new();

    let result = schedule.group(PendingAttributes::new().without_overlapping(), |s| {
        s.exec("anonymous");
    });

    assert!(matches!(
        result,
        Err(ConfigError::DescriptionRequired { .. })
    ));
}

#[test]
fn group_attributes_do_not_leak_outside_the_closure() {
    let mut schedule = Schedule::new();

    schedule
        .group(PendingAttributes::new().run_in_background(), |s| {
            s.exec("inside");
        })
        .unwrap();
    schedule.exec("outside");

    assert!(schedule.events()[0].is_background());
    assert!(!schedule.events()[1].is_background());
}
