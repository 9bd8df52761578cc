//! Clock utilities.
//!
//! Pure time arithmetic on local wall-clock timestamps (`NaiveDateTime`),
//! plus the [`Clock`] source the state machine reads `now` from. All shift
//! boundaries are wall-clock times ("12:00 lunch"), so the core never deals
//! with time zones; the system clock converts once at the edge.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Local, NaiveDateTime, NaiveTime, Timelike};

/// Source of "now". The core never assumes this equals a reference clock;
/// the configured clock offset exists to correct for that.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A settable clock. Clones share the same instant, so a test (or a dev
/// tool) can keep one handle and advance the clock the timer reads.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: NaiveDateTime) {
        if let Ok(mut now) = self.now.lock() {
            *now = at;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Format non-negative seconds as `HH:MM:SS`. Callers clamp negatives.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// `HH:MM` of a timestamp.
pub fn format_clock(at: NaiveDateTime) -> String {
    at.format("%H:%M").to_string()
}

/// Parse `HH:MM`. Malformed input yields `None`; there is no implicit
/// correction, so "25:00" or "9h" are rejected rather than wrapped.
pub fn parse_clock(s: &str) -> Option<NaiveTime> {
    let (h, m) = s.trim().split_once(':')?;
    if h.is_empty() || m.len() != 2 {
        return None;
    }
    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    NaiveTime::from_hms_opt(hours, minutes, 0)
}

/// Same calendar day as `date`, at `time`, seconds and sub-seconds zeroed.
pub fn with_clock_time(date: NaiveDateTime, time: NaiveTime) -> NaiveDateTime {
    let time = time.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(time);
    date.date().and_time(time)
}

/// `floor((a - b) / 1s)`. Negative when `a` is before `b`.
pub fn seconds_between(a: NaiveDateTime, b: NaiveDateTime) -> i64 {
    (a - b).num_milliseconds().div_euclid(1000)
}

/// `elapsed / total` as a percentage clamped to `[0, 100]`; zero total is 0.
pub fn progress_percent(elapsed: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (elapsed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// `start <= t < start + minutes`.
pub fn is_within_interval(t: NaiveDateTime, start: NaiveDateTime, minutes: i64) -> bool {
    t >= start && t < start + Duration::minutes(minutes)
}

/// Local calendar date key, `YYYY-MM-DD`.
pub fn date_key(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn format_duration_pads_every_field() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(59), "00:00:59");
        assert_eq!(format_duration(3661), "01:01:01");
        assert_eq!(format_duration(9 * 3600 + 30 * 60), "09:30:00");
    }

    #[test]
    fn format_clock_drops_seconds() {
        assert_eq!(format_clock(at(7, 5, 59)), "07:05");
    }

    #[test]
    fn parse_clock_rejects_malformed_input() {
        assert_eq!(parse_clock("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_clock("9:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert!(parse_clock("").is_none());
        assert!(parse_clock("24:00").is_none());
        assert!(parse_clock("12:60").is_none());
        assert!(parse_clock("12:5").is_none());
        assert!(parse_clock("noon").is_none());
        assert!(parse_clock("-1:30").is_none());
    }

    #[test]
    fn with_clock_time_keeps_the_day() {
        let t = with_clock_time(at(22, 10, 42), NaiveTime::from_hms_opt(6, 0, 0).unwrap());
        assert_eq!(t, at(6, 0, 0));
    }

    #[test]
    fn date_key_is_the_local_calendar_day() {
        assert_eq!(date_key(at(0, 0, 0)), "2025-03-10");
        assert_eq!(date_key(at(23, 59, 59)), "2025-03-10");
        assert_eq!(date_key(at(23, 59, 59) + Duration::seconds(1)), "2025-03-11");
    }

    #[test]
    fn seconds_between_floors_toward_negative_infinity() {
        let a = at(10, 0, 0);
        let b = a + Duration::milliseconds(1500);
        assert_eq!(seconds_between(b, a), 1);
        assert_eq!(seconds_between(a, b), -2);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(progress_percent(0, 0), 0.0);
        assert_eq!(progress_percent(-10, 100), 0.0);
        assert_eq!(progress_percent(50, 100), 50.0);
        assert_eq!(progress_percent(150, 100), 100.0);
    }

    #[test]
    fn interval_is_half_open() {
        let start = at(12, 0, 0);
        assert!(is_within_interval(start, start, 90));
        assert!(is_within_interval(at(13, 29, 59), start, 90));
        assert!(!is_within_interval(at(13, 30, 0), start, 90));
        assert!(!is_within_interval(at(11, 59, 59), start, 90));
        assert!(!is_within_interval(start, start, 0));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(at(9, 0, 0));
        let handle = clock.clone();
        handle.advance(Duration::minutes(5));
        assert_eq!(clock.now(), at(9, 5, 0));
    }
}
