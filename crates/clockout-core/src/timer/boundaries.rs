//! Shift boundary computation.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::clock::{is_within_interval, progress_percent, seconds_between, with_clock_time};
use crate::error::ValidationError;
use crate::storage::Config;

/// Absolute timestamps delimiting one shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftBoundaries {
    pub start_time: NaiveDateTime,
    pub lunch_start_time: NaiveDateTime,
    pub lunch_end_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub total_work_seconds: i64,
}

impl ShiftBoundaries {
    /// Derive the boundaries of a shift clocking in at `now`.
    ///
    /// 1. start: the configured clock-in time today, corrected by the clock
    ///    offset (slow adds, fast subtracts), or `now` when none is set.
    /// 2. lunch start: the lunch time on the start's date, rolled forward a
    ///    day when it is not after the start.
    /// 3. lunch end: lunch start plus the lunch length.
    /// 4. end: start plus the work hours plus the lunch length. Lunch
    ///    extends the shift rather than being carved out of it.
    ///
    /// # Errors
    /// Refuses to compute anything from a config that fails validation.
    pub fn calculate(config: &Config, now: NaiveDateTime) -> Result<Self, ValidationError> {
        config.validate()?;

        let start_time = match config.start_clock() {
            Some(clock_in) => {
                let offset = config
                    .clock_offset()
                    .ok_or_else(|| invalid_time("clockOffsetTime", &config.clock_offset_time))?;
                with_clock_time(now, clock_in) + offset
            }
            None => now,
        };

        let lunch_clock = config
            .lunch_clock()
            .ok_or_else(|| invalid_time("lunchTime", &config.lunch_time))?;
        let mut lunch_start_time = with_clock_time(start_time, lunch_clock);
        if lunch_start_time <= start_time {
            lunch_start_time += Duration::days(1);
        }

        let lunch = Duration::minutes(i64::from(config.lunch_break));
        let lunch_end_time = lunch_start_time + lunch;

        let total_work_seconds = (config.work_hours * 3600.0).round() as i64;
        let end_time = start_time + Duration::seconds(total_work_seconds) + lunch;

        Ok(Self {
            start_time,
            lunch_start_time,
            lunch_end_time,
            end_time,
            total_work_seconds,
        })
    }

    pub fn lunch_minutes(&self) -> i64 {
        (self.lunch_end_time - self.lunch_start_time).num_minutes()
    }

    pub fn in_lunch(&self, now: NaiveDateTime) -> bool {
        is_within_interval(now, self.lunch_start_time, self.lunch_minutes())
    }

    pub fn is_over(&self, now: NaiveDateTime) -> bool {
        now >= self.end_time
    }

    /// Seconds until the end of the shift, zero once it is over.
    pub fn remaining_seconds(&self, now: NaiveDateTime) -> u64 {
        u64::try_from(seconds_between(self.end_time, now)).unwrap_or(0)
    }

    pub fn elapsed_seconds(&self, now: NaiveDateTime) -> i64 {
        seconds_between(now, self.start_time)
    }

    /// Progress over the work hours, clamped to `[0, 100]`.
    pub fn progress(&self, now: NaiveDateTime) -> f64 {
        progress_percent(self.elapsed_seconds(now), self.total_work_seconds)
    }
}

fn invalid_time(field: &str, value: &str) -> ValidationError {
    ValidationError::InvalidTime {
        field: field.to_string(),
        value: value.to_string(),
    }
}
