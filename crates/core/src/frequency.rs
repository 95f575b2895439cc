// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frequency builder: human-friendly schedule methods
//!
//! Every method is a pure rewrite of the event's cron expression via
//! positional field splicing; unspecified fields keep `*`. Sub-minute
//! repetition is stored out-of-band as `repeat_seconds` and never
//! encoded in the expression itself.

use crate::error::ConfigError;
use crate::event::Event;
use crate::expression::CronExpression;
use chrono::NaiveTime;
use chrono_tz::Tz;

/// Day-of-week constants, 0 = Sunday through 6 = Saturday
pub mod week_day {
    pub const SUNDAY: u8 = 0;
    pub const MONDAY: u8 = 1;
    pub const TUESDAY: u8 = 2;
    pub const WEDNESDAY: u8 = 3;
    pub const THURSDAY: u8 = 4;
    pub const FRIDAY: u8 = 5;
    pub const SATURDAY: u8 = 6;

    pub const WEEKDAYS: [u8; 5] = [MONDAY, TUESDAY, WEDNESDAY, THURSDAY, FRIDAY];
    pub const WEEKENDS: [u8; 2] = [SATURDAY, SUNDAY];
}

/// A field of a 5-field cron expression
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Minute,
    Hour,
    DayOfMonth,
    Month,
    DayOfWeek,
}

impl Field {
    fn index(self) -> usize {
        match self {
            Field::Minute => 0,
            Field::Hour => 1,
            Field::DayOfMonth => 2,
            Field::Month => 3,
            Field::DayOfWeek => 4,
        }
    }
}

/// Splice a value into one field of a cron expression, leaving the
/// other fields untouched.
///
/// A leading seconds field (6-field form) is skipped over, not
/// addressable.
pub fn splice_into_position(expression: &str, field: Field, value: &str) -> String {
    let mut parts: Vec<String> = expression.split_whitespace().map(String::from).collect();
    let offset = if parts.len() == 6 { 1 } else { 0 };
    let index = offset + field.index();
    if index < parts.len() {
        parts[index] = value.to_string();
    }
    parts.join(" ")
}

fn join_days(days: &[u8]) -> String {
    days.iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_time_of_day(value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| ConfigError::InvalidTime {
        value: value.to_string(),
    })
}

/// Whether a local time falls inside [start, end], wrapping past
/// midnight when end precedes start.
fn in_time_interval(local: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if end >= start {
        local >= start && local <= end
    } else {
        // Window wraps midnight: after the start today, or before the
        // end of a window that started yesterday
        local >= start || local <= end
    }
}

impl Event {
    fn splice(&mut self, field: Field, value: impl ToString) -> &mut Self {
        self.expression = splice_into_position(&self.expression, field, &value.to_string());
        self
    }

    /// Replace the cron expression wholesale
    pub fn cron(&mut self, expression: &str) -> Result<&mut Self, ConfigError> {
        CronExpression::parse(expression)?;
        self.expression = expression.to_string();
        Ok(self)
    }

    /// Set the timezone the expression is evaluated in
    pub fn timezone(&mut self, tz: Tz) -> &mut Self {
        self.timezone = Some(tz);
        self
    }

    // === Minute frequencies ===

    pub fn every_minute(&mut self) -> &mut Self {
        self.splice(Field::Minute, "*")
    }

    pub fn every_two_minutes(&mut self) -> &mut Self {
        self.splice(Field::Minute, "*/2")
    }

    pub fn every_three_minutes(&mut self) -> &mut Self {
        self.splice(Field::Minute, "*/3")
    }

    pub fn every_four_minutes(&mut self) -> &mut Self {
        self.splice(Field::Minute, "*/4")
    }

    pub fn every_five_minutes(&mut self) -> &mut Self {
        self.splice(Field::Minute, "*/5")
    }

    pub fn every_ten_minutes(&mut self) -> &mut Self {
        self.splice(Field::Minute, "*/10")
    }

    pub fn every_fifteen_minutes(&mut self) -> &mut Self {
        self.splice(Field::Minute, "*/15")
    }

    pub fn every_thirty_minutes(&mut self) -> &mut Self {
        self.splice(Field::Minute, "*/30")
    }

    // === Hour frequencies ===

    pub fn hourly(&mut self) -> &mut Self {
        self.splice(Field::Minute, 0)
    }

    /// Run hourly at the given minute offset
    pub fn hourly_at(&mut self, offset: u32) -> &mut Self {
        self.splice(Field::Minute, offset)
    }

    pub fn every_two_hours(&mut self) -> &mut Self {
        self.splice(Field::Minute, 0).splice(Field::Hour, "*/2")
    }

    pub fn every_three_hours(&mut self) -> &mut Self {
        self.splice(Field::Minute, 0).splice(Field::Hour, "*/3")
    }

    pub fn every_four_hours(&mut self) -> &mut Self {
        self.splice(Field::Minute, 0).splice(Field::Hour, "*/4")
    }

    pub fn every_six_hours(&mut self) -> &mut Self {
        self.splice(Field::Minute, 0).splice(Field::Hour, "*/6")
    }

    // === Day frequencies ===

    pub fn daily(&mut self) -> &mut Self {
        self.splice(Field::Minute, 0).splice(Field::Hour, 0)
    }

    /// Run daily at "HH:MM"
    pub fn daily_at(&mut self, time: &str) -> Result<&mut Self, ConfigError> {
        let parsed = parse_time_of_day(time)?;
        use chrono::Timelike;
        Ok(self
            .splice(Field::Minute, parsed.minute())
            .splice(Field::Hour, parsed.hour()))
    }

    /// Alias for daily_at
    pub fn at(&mut self, time: &str) -> Result<&mut Self, ConfigError> {
        self.daily_at(time)
    }

    /// Run twice daily at the given hours (minute 0)
    pub fn twice_daily(&mut self, first: u32, second: u32) -> &mut Self {
        self.twice_daily_at(first, second, 0)
    }

    pub fn twice_daily_at(&mut self, first: u32, second: u32, minute: u32) -> &mut Self {
        self.splice(Field::Minute, minute)
            .splice(Field::Hour, format!("{},{}", first, second))
    }

    // === Week frequencies ===

    pub fn weekly(&mut self) -> &mut Self {
        self.splice(Field::Minute, 0)
            .splice(Field::Hour, 0)
            .splice(Field::DayOfWeek, 0)
    }

    /// Run weekly on the given day at "HH:MM"
    pub fn weekly_on(&mut self, day: u8, time: &str) -> Result<&mut Self, ConfigError> {
        self.daily_at(time)?;
        Ok(self.days(&[day]))
    }

    /// Constrain to the listed days of the week (0 = Sunday)
    pub fn days(&mut self, days: &[u8]) -> &mut Self {
        let value = join_days(days);
        self.splice(Field::DayOfWeek, value)
    }

    pub fn weekdays(&mut self) -> &mut Self {
        self.days(&week_day::WEEKDAYS)
    }

    pub fn weekends(&mut self) -> &mut Self {
        self.days(&week_day::WEEKENDS)
    }

    pub fn sundays(&mut self) -> &mut Self {
        self.days(&[week_day::SUNDAY])
    }

    pub fn mondays(&mut self) -> &mut Self {
        self.days(&[week_day::MONDAY])
    }

    pub fn tuesdays(&mut self) -> &mut Self {
        self.days(&[week_day::TUESDAY])
    }

    pub fn wednesdays(&mut self) -> &mut Self {
        self.days(&[week_day::WEDNESDAY])
    }

    pub fn thursdays(&mut self) -> &mut Self {
        self.days(&[week_day::THURSDAY])
    }

    pub fn fridays(&mut self) -> &mut Self {
        self.days(&[week_day::FRIDAY])
    }

    pub fn saturdays(&mut self) -> &mut Self {
        self.days(&[week_day::SATURDAY])
    }

    // === Month and year frequencies ===

    pub fn monthly(&mut self) -> &mut Self {
        self.splice(Field::Minute, 0)
            .splice(Field::Hour, 0)
            .splice(Field::DayOfMonth, 1)
    }

    /// Run monthly on the given day at "HH:MM"
    pub fn monthly_on(&mut self, day: u32, time: &str) -> Result<&mut Self, ConfigError> {
        self.daily_at(time)?;
        Ok(self.splice(Field::DayOfMonth, day))
    }

    /// Run twice monthly on the given days at "HH:MM"
    pub fn twice_monthly(&mut self, first: u32, second: u32, time: &str) -> Result<&mut Self, ConfigError> {
        self.daily_at(time)?;
        Ok(self.splice(Field::DayOfMonth, format!("{},{}", first, second)))
    }

    pub fn quarterly(&mut self) -> &mut Self {
        self.splice(Field::Minute, 0)
            .splice(Field::Hour, 0)
            .splice(Field::DayOfMonth, 1)
            .splice(Field::Month, "1-12/3")
    }

    pub fn yearly(&mut self) -> &mut Self {
        self.splice(Field::Minute, 0)
            .splice(Field::Hour, 0)
            .splice(Field::DayOfMonth, 1)
            .splice(Field::Month, 1)
    }

    /// Run yearly on the given month and day at "HH:MM"
    pub fn yearly_on(&mut self, month: u32, day: u32, time: &str) -> Result<&mut Self, ConfigError> {
        self.daily_at(time)?;
        Ok(self
            .splice(Field::DayOfMonth, day)
            .splice(Field::Month, month))
    }

    // === Sub-minute frequencies ===

    /// Repeat within each due minute every `seconds` seconds.
    ///
    /// The interval must evenly divide a minute; the minute field is
    /// forced back to `*` because sub-minute events are due every
    /// minute by definition.
    pub fn repeat_every(&mut self, seconds: u32) -> Result<&mut Self, ConfigError> {
        if seconds == 0 || 60 % seconds != 0 {
            return Err(ConfigError::InvalidRepeatInterval { seconds });
        }
        self.repeat_seconds = Some(seconds);
        Ok(self.every_minute())
    }

    pub fn every_second(&mut self) -> Result<&mut Self, ConfigError> {
        self.repeat_every(1)
    }

    pub fn every_two_seconds(&mut self) -> Result<&mut Self, ConfigError> {
        self.repeat_every(2)
    }

    pub fn every_five_seconds(&mut self) -> Result<&mut Self, ConfigError> {
        self.repeat_every(5)
    }

    pub fn every_ten_seconds(&mut self) -> Result<&mut Self, ConfigError> {
        self.repeat_every(10)
    }

    pub fn every_fifteen_seconds(&mut self) -> Result<&mut Self, ConfigError> {
        self.repeat_every(15)
    }

    pub fn every_twenty_seconds(&mut self) -> Result<&mut Self, ConfigError> {
        self.repeat_every(20)
    }

    pub fn every_thirty_seconds(&mut self) -> Result<&mut Self, ConfigError> {
        self.repeat_every(30)
    }

    // === Time windows ===

    /// Only run between two times of day (inclusive), evaluated in the
    /// event's timezone at due-check time.
    ///
    /// When `end` precedes `start` the window wraps past midnight.
    /// Snapshot semantics: set the timezone before calling this.
    pub fn between(&mut self, start: &str, end: &str) -> Result<&mut Self, ConfigError> {
        let (start, end) = (parse_time_of_day(start)?, parse_time_of_day(end)?);
        let tz = self.tz();
        Ok(self.when(move |ctx| in_time_interval(ctx.now.with_timezone(&tz).time(), start, end)))
    }

    /// Skip runs between two times of day (inclusive); the mirror of
    /// `between`
    pub fn unless_between(&mut self, start: &str, end: &str) -> Result<&mut Self, ConfigError> {
        let (start, end) = (parse_time_of_day(start)?, parse_time_of_day(end)?);
        let tz = self.tz();
        Ok(self.skip(move |ctx| in_time_interval(ctx.now.with_timezone(&tz).time(), start, end)))
    }
}

#[cfg(test)]
#[path = "frequency_tests.rs"]
mod tests;
