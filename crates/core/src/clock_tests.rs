use super::*;
use chrono::TimeZone;

#[test]
fn fake_clock_advances() {
    let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
    let clock = FakeClock::at(start);

    clock.advance(Duration::from_secs(90));

    assert_eq!(clock.now(), start + ChronoDuration::seconds(90));
}

#[test]
fn fake_clock_set_overrides() {
    let clock = FakeClock::new();
    let target = Utc.with_ymd_and_hms(2030, 6, 1, 12, 30, 0).unwrap();

    clock.set(target);

    assert_eq!(clock.now(), target);
}

#[test]
fn fake_clock_clones_share_time() {
    let clock = FakeClock::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    let other = clock.clone();

    clock.advance(Duration::from_secs(5));

    assert_eq!(clock.now(), other.now());
}

#[test]
fn fake_sleeper_advances_clock() {
    let clock = FakeClock::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    let sleeper = FakeSleeper::new(clock.clone());

    sleeper.sleep(Duration::from_secs(5));

    assert_eq!(
        clock.now(),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 5).unwrap()
    );
}

#[test]
fn system_clock_is_monotonic_enough() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}
