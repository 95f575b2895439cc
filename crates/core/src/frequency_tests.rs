use super::*;
use crate::schedule::Schedule;
use yare::parameterized;

fn event() -> Event {
    Event::exec("true")
}

#[test]
fn splice_replaces_only_the_named_field() {
    let spliced = splice_into_position("* * * * *", Field::Hour, "6");
    assert_eq!(spliced, "* 6 * * *");

    let spliced = splice_into_position(&spliced, Field::DayOfWeek, "1-5");
    assert_eq!(spliced, "* 6 * * 1-5");
}

#[test]
fn splice_skips_a_leading_seconds_field() {
    let spliced = splice_into_position("30 * * * * *", Field::Minute, "0");
    assert_eq!(spliced, "30 0 * * * *");
}

#[test]
fn frequency_methods_are_idempotent() {
    let mut once = event();
    once.daily();
    let mut twice = event();
    twice.daily().daily();

    assert_eq!(once.expression(), twice.expression());

    let mut once = event();
    once.every_five_minutes();
    let mut twice = event();
    twice.every_five_minutes().every_five_minutes();

    assert_eq!(once.expression(), twice.expression());
}

#[test]
fn daily_splices_midnight() {
    let mut e = event();
    e.daily();
    assert_eq!(e.expression(), "0 0 * * *");
}

#[test]
fn daily_at_parses_time_of_day() {
    let mut e = event();
    e.daily_at("13:45").unwrap();
    assert_eq!(e.expression(), "45 13 * * *");
}

#[test]
fn daily_at_rejects_malformed_time() {
    let mut e = event();
    assert!(matches!(
        e.daily_at("25:99"),
        Err(ConfigError::InvalidTime { .. })
    ));
}

#[test]
fn hourly_variants() {
    let mut e = event();
    e.hourly();
    assert_eq!(e.expression(), "0 * * * *");

    let mut e = event();
    e.hourly_at(17);
    assert_eq!(e.expression(), "17 * * * *");

    let mut e = event();
    e.every_six_hours();
    assert_eq!(e.expression(), "0 */6 * * *");
}

#[test]
fn weekly_on_combines_day_and_time() {
    let mut e = event();
    e.weekly_on(week_day::MONDAY, "08:00").unwrap();
    assert_eq!(e.expression(), "0 8 * * 1");
}

#[test]
fn weekday_and_weekend_helpers() {
    let mut e = event();
    e.weekdays();
    assert_eq!(e.expression(), "* * * * 1,2,3,4,5");

    let mut e = event();
    e.weekends();
    assert_eq!(e.expression(), "* * * * 6,0");

    let mut e = event();
    e.fridays();
    assert_eq!(e.expression(), "* * * * 5");
}

#[test]
fn month_and_year_helpers() {
    let mut e = event();
    e.monthly();
    assert_eq!(e.expression(), "0 0 1 * *");

    let mut e = event();
    e.monthly_on(4, "15:00").unwrap();
    assert_eq!(e.expression(), "0 15 4 * *");

    let mut e = event();
    e.twice_monthly(1, 16, "00:00").unwrap();
    assert_eq!(e.expression(), "0 0 1,16 * *");

    let mut e = event();
    e.quarterly();
    assert_eq!(e.expression(), "0 0 1 1-12/3 *");

    let mut e = event();
    e.yearly_on(6, 15, "09:30").unwrap();
    assert_eq!(e.expression(), "30 9 15 6 *");
}

#[parameterized(
        one = { 1 },
        two = { 2 },
        three = { 3 },
        four = { 4 },
        five = { 5 },
        six = { 6 },
        ten = { 10 },
        twelve = { 12 },
        fifteen = { 15 },
        twenty = { 20 },
        thirty = { 30 },
        sixty = { 60 },
    )]
fn repeat_every_accepts_even_divisors(seconds: u32) {
    let mut e = event();
    e.repeat_every(seconds).unwrap();
    assert_eq!(e.repeat_seconds(), Some(seconds));
}

#[parameterized(
        seven = { 7 },
        eleven = { 11 },
        thirteen = { 13 },
        zero = { 0 },
    )]
fn repeat_every_rejects_uneven_divisors(seconds: u32) {
    let mut e = event();
    assert!(matches!(
        e.repeat_every(seconds),
        Err(ConfigError::InvalidRepeatInterval { .. })
    ));
    assert_eq!(e.repeat_seconds(), None);
}

#[test]
fn repeat_every_forces_every_minute() {
    let mut e = event();
    e.daily();
    e.every_five_seconds().unwrap();
    assert_eq!(e.expression(), "* * * * *");
}

#[test]
fn sub_minute_scenario_yields_twelve_offsets() {
    // An every-five-seconds event fires at offsets 0,5,...,55: twelve
    // dispatch instants within a due minute
    let mut e = event();
    e.every_five_seconds().unwrap();
    let n = e.repeat_seconds().unwrap();
    let offsets: Vec<u32> = (0..60).filter(|s| s % n == 0).collect();
    assert_eq!(offsets.len(), 12);
}

#[test]
fn cron_validates_expressions() {
    let mut e = event();
    e.cron("0 4 * * 0").unwrap();
    assert_eq!(e.expression(), "0 4 * * 0");

    assert!(e.cron("bogus").is_err());
    // A failed rewrite leaves the previous expression in place
    assert_eq!(e.expression(), "0 4 * * 0");
}

#[test]
fn between_gates_by_local_time() {
    use crate::context::RunContext;
    use chrono::{TimeZone, Utc};

    let mut schedule = Schedule::new();
    schedule.exec("true").between("09:00", "17:00").unwrap();
    let event = &schedule.events()[0];

    let inside = RunContext::new("production").at(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
    let outside = RunContext::new("production").at(Utc.with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap());

    assert!(event.filters_pass(&inside));
    assert!(!event.filters_pass(&outside));
}

#[test]
fn between_wraps_past_midnight() {
    use crate::context::RunContext;
    use chrono::{TimeZone, Utc};

    let mut schedule = Schedule::new();
    schedule.exec("true").between("22:00", "02:00").unwrap();
    let event = &schedule.events()[0];

    let late = RunContext::new("production").at(Utc.with_ymd_and_hms(2024, 1, 15, 23, 0, 0).unwrap());
    let early = RunContext::new("production").at(Utc.with_ymd_and_hms(2024, 1, 16, 1, 0, 0).unwrap());
    let midday = RunContext::new("production").at(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());

    assert!(event.filters_pass(&late));
    assert!(event.filters_pass(&early));
    assert!(!event.filters_pass(&midday));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn splicing_is_idempotent(minute in 0u32..60) {
            let value = minute.to_string();
            let once = splice_into_position("* * * * *", Field::Minute, &value);
            let twice = splice_into_position(&once, Field::Minute, &value);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn spliced_expressions_stay_parseable(
            minute in 0u32..60,
            hour in 0u32..24,
            dow in 0u8..=7,
        ) {
            use crate::expression::CronExpression;

            let mut expr = splice_into_position("* * * * *", Field::Minute, &minute.to_string());
            expr = splice_into_position(&expr, Field::Hour, &hour.to_string());
            expr = splice_into_position(&expr, Field::DayOfWeek, &dow.to_string());
            prop_assert!(CronExpression::parse(&expr).is_ok(), "expression {}", expr);
        }
    }
}

#[test]
fn unless_between_is_the_mirror() {
    use crate::context::RunContext;
    use chrono::{TimeZone, Utc};

    let mut schedule = Schedule::new();
    schedule.exec("true").unless_between("09:00", "17:00").unwrap();
    let event = &schedule.events()[0];

    let inside = RunContext::new("production").at(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap());
    let outside = RunContext::new("production").at(Utc.with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap());

    assert!(!event.filters_pass(&inside));
    assert!(event.filters_pass(&outside));
}
