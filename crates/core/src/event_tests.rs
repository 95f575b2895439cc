use super::*;

fn exec_event(command: &str) -> Event {
    Event::exec(command)
}

#[test]
fn default_expression_is_every_minute() {
    let event = exec_event("true");
    assert_eq!(event.expression(), "* * * * *");
    assert_eq!(event.repeat_seconds(), None);
    assert!(event.output().is_null_sink());
}

#[test]
fn mutex_name_is_a_prefixed_sha1_hex() {
    let mut event = exec_event("true");
    event.name("backup");

    let name = event.mutex_name();
    assert!(name.starts_with("schedule-"));
    assert_eq!(name.len(), "schedule-".len() + 40);
    assert!(name["schedule-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn mutex_name_hashes_the_description_alone() {
    let mut first = exec_event("one-command");
    first.name("shared");
    let mut second = exec_event("completely-different");
    second.name("shared");

    // Two differently-configured events sharing a description collide
    // by design
    assert_eq!(first.mutex_name(), second.mutex_name());
}

#[test]
fn description_less_events_fall_back_to_expression_and_command() {
    let mut first = exec_event("report");
    first.daily();
    let mut second = exec_event("report");
    second.hourly();

    assert_ne!(first.mutex_name(), second.mutex_name());
    assert_eq!(first.mutex_name(), {
        let mut again = exec_event("report");
        again.daily();
        again.mutex_name()
    });
}

#[test]
fn overlap_prevention_requires_a_description() {
    let mut event = exec_event("true");
    assert!(matches!(
        event.without_overlapping(),
        Err(ConfigError::DescriptionRequired { .. })
    ));

    event.name("named");
    event.without_overlapping().unwrap();
    assert!(event.prevents_overlapping());
    assert_eq!(event.mutex_ttl(), DEFAULT_MUTEX_TTL);
}

#[test]
fn one_server_requires_a_description() {
    let mut event = exec_event("true");
    assert!(matches!(
        event.on_one_server(),
        Err(ConfigError::DescriptionRequired { .. })
    ));

    event.name("named");
    event.on_one_server().unwrap();
    assert!(event.runs_on_one_server());
}

#[test]
fn email_requires_captured_output() {
    let mut event = exec_event("true");
    assert!(matches!(
        event.email_output_to(["ops@example.com"]),
        Err(ConfigError::OutputNotCaptured)
    ));

    event.send_output_to("/tmp/out.log");
    event.email_output_to(["ops@example.com"]).unwrap();
    assert_eq!(event.email_addresses(), ["ops@example.com"]);
}

#[test]
fn output_redirection_modes() {
    let mut event = exec_event("true");
    event.send_output_to("/tmp/out.log");
    assert!(!event.output().append);

    event.append_output_to("/tmp/out.log");
    assert!(event.output().append);
    assert!(!event.output().is_null_sink());
}

#[test]
fn display_name_prefers_description() {
    let mut event = exec_event("some-command");
    assert_eq!(event.display_name(), "some-command");

    event.name("nightly backup");
    assert_eq!(event.display_name(), "nightly backup");

    let closure = Event::call(|_| Ok(()));
    assert_eq!(closure.display_name(), "Closure");
}

#[test]
fn run_outcome_reports_success() {
    assert!(RunOutcome::with_exit_code(0).succeeded());
    assert!(!RunOutcome::with_exit_code(1).succeeded());
}

#[test]
fn callbacks_fire_in_registration_order() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc as StdArc;

    let calls = StdArc::new(AtomicUsize::new(0));
    let mut event = exec_event("true");

    let c = calls.clone();
    event.before(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    let c = calls.clone();
    event.after(move |_, _| {
        c.fetch_add(10, Ordering::SeqCst);
    });

    let ctx = RunContext::new("production");
    event.run_before_callbacks(&ctx);
    event.run_after_callbacks(&ctx, &RunOutcome::with_exit_code(0));

    assert_eq!(calls.load(Ordering::SeqCst), 11);
}

#[test]
fn success_and_failure_callbacks_filter_on_exit_code() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc as StdArc;

    let successes = StdArc::new(AtomicUsize::new(0));
    let failures = StdArc::new(AtomicUsize::new(0));
    let mut event = exec_event("true");

    let s = successes.clone();
    event.on_success(move |_, _| {
        s.fetch_add(1, Ordering::SeqCst);
    });
    let f = failures.clone();
    event.on_failure(move |_, _| {
        f.fetch_add(1, Ordering::SeqCst);
    });

    let ctx = RunContext::new("production");
    event.run_after_callbacks(&ctx, &RunOutcome::with_exit_code(0));
    event.run_after_callbacks(&ctx, &RunOutcome::with_exit_code(2));

    assert_eq!(successes.load(Ordering::SeqCst), 1);
    assert_eq!(failures.load(Ordering::SeqCst), 1);
}

#[test]
fn run_inline_maps_job_errors() {
    let failing = Event::call(|_| Err("boom".into()));
    let ctx = RunContext::new("production");

    let err = failing.run_inline(&ctx).unwrap_err();
    assert!(matches!(err, DispatchError::Callback { .. }));
    assert!(err.to_string().contains("boom"));
}
