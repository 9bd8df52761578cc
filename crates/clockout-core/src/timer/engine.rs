//! Shift timer implementation.
//!
//! The shift timer is a wall-clock-based state machine. It does not use
//! internal threads or timers: the break prompt and the break itself are
//! stored deadlines, and the caller is responsible for calling `tick()`
//! about once a second.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!         Running <-> OnBreak
//!         Running -> Idle (completed) -> Overtime <-> PausedOvertime
//! any -> Idle (reset)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = ShiftTimer::new(store, SystemClock, channels);
//! timer.start()?;
//! // In a loop:
//! for event in timer.tick() { /* ... */ }
//! ```

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::boundaries::ShiftBoundaries;
use super::session::Session;
use crate::clock::{date_key, format_clock, format_duration, seconds_between, Clock};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::notify::{Channels, DispatchReport, Dispatcher, ReminderKind};
use crate::storage::{Config, ConfigStore, KvStore};

/// Seconds the break prompt waits before starting the break by itself.
pub const BREAK_PROMPT_SECS: i64 = 15;

/// Seconds ahead the developer shortcut moves the end of the shift.
pub const END_SOON_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    Running,
    Paused,
    OnBreak,
    Overtime,
    PausedOvertime,
}

/// What the user should be told about the shift right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    Idle,
    Working,
    Lunch,
    OnBreak,
    BreakPending,
    Paused,
    Overtime,
    /// The shift ended on its own; overtime is on offer.
    Completed,
}

/// Point-in-time view of the shift for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub phase: Phase,
    pub status: Status,
    /// `HH:MM:SS` countdown, or `+HH:MM:SS` elapsed in overtime.
    pub display: String,
    /// 0 .. 100 progress over the work hours, pinned to 100 in overtime.
    pub progress: f64,
    pub remaining_seconds: Option<u64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub lunch_start_time: Option<String>,
    pub lunch_end_time: Option<String>,
    pub break_remaining_seconds: Option<u64>,
    pub break_prompt_seconds: Option<u64>,
    pub overtime_seconds: Option<u64>,
    pub at: NaiveDateTime,
}

/// The shift state machine.
///
/// Owns the store, the clock and the dispatcher. The host constructs one
/// per process; construction restores any persisted session.
pub struct ShiftTimer<S: KvStore, C: Clock> {
    store: S,
    clock: C,
    dispatcher: Dispatcher,
    config: Config,
    phase: Phase,
    boundaries: Option<ShiftBoundaries>,
    overtime_start: Option<NaiveDateTime>,
    last_break: Option<NaiveDateTime>,
    break_prompt_deadline: Option<NaiveDateTime>,
    break_ends_at: Option<NaiveDateTime>,
    completed_at: Option<NaiveDateTime>,
    current_date: Option<NaiveDate>,
    backlog: Vec<Event>,
}

impl<S: KvStore, C: Clock> ShiftTimer<S, C> {
    /// Load the configuration, settle notification permission and pick up
    /// any persisted session. The restore outcome is delivered by the first
    /// `tick()`.
    pub fn new(store: S, clock: C, channels: Channels) -> Self {
        let config = ConfigStore::new(&store).load();
        let mut dispatcher = Dispatcher::new(channels);
        dispatcher.init(&config);

        let mut timer = Self {
            store,
            clock,
            dispatcher,
            config,
            phase: Phase::Idle,
            boundaries: None,
            overtime_start: None,
            last_break: None,
            break_prompt_deadline: None,
            break_ends_at: None,
            completed_at: None,
            current_date: None,
            backlog: Vec::new(),
        };
        if let Some(event) = timer.restore() {
            timer.backlog.push(event);
        }
        timer
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn boundaries(&self) -> Option<&ShiftBoundaries> {
        self.boundaries.as_ref()
    }

    pub fn overtime_start(&self) -> Option<NaiveDateTime> {
        self.overtime_start
    }

    /// Anchor the break interval is measured from.
    pub fn break_anchor(&self) -> Option<NaiveDateTime> {
        self.last_break.or_else(|| self.boundaries.map(|b| b.start_time))
    }

    pub fn break_prompt_deadline(&self) -> Option<NaiveDateTime> {
        self.break_prompt_deadline
    }

    pub fn break_ends_at(&self) -> Option<NaiveDateTime> {
        self.break_ends_at
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Build a full display snapshot.
    pub fn snapshot(&self) -> Snapshot {
        let now = self.clock.now();
        let b = self.boundaries.as_ref();

        let mut snap = Snapshot {
            phase: self.phase,
            status: Status::Idle,
            display: format_duration(0),
            progress: 0.0,
            remaining_seconds: None,
            start_time: b.map(|b| format_clock(b.start_time)),
            end_time: b.map(|b| format_clock(b.end_time)),
            lunch_start_time: b.map(|b| format_clock(b.lunch_start_time)),
            lunch_end_time: b.map(|b| format_clock(b.lunch_end_time)),
            break_remaining_seconds: self
                .break_ends_at
                .map(|end| non_negative(seconds_between(end, now))),
            break_prompt_seconds: self
                .break_prompt_deadline
                .map(|deadline| non_negative(seconds_between(deadline, now))),
            overtime_seconds: None,
            at: now,
        };

        match self.phase {
            Phase::Overtime | Phase::PausedOvertime => {
                let elapsed = self
                    .overtime_start
                    .map(|start| non_negative(seconds_between(now, start)))
                    .unwrap_or(0);
                snap.display = format!("+{}", format_duration(elapsed));
                snap.progress = 100.0;
                snap.overtime_seconds = Some(elapsed);
                snap.status = if self.phase == Phase::Overtime {
                    Status::Overtime
                } else {
                    Status::Paused
                };
            }
            Phase::Idle => {
                if self.completed_at.is_some() {
                    snap.status = Status::Completed;
                    snap.progress = 100.0;
                }
            }
            Phase::Running | Phase::Paused | Phase::OnBreak => {
                if let Some(b) = b {
                    let remaining = b.remaining_seconds(now);
                    snap.display = format_duration(remaining);
                    snap.remaining_seconds = Some(remaining);
                    snap.progress = b.progress(now);
                    snap.status = match self.phase {
                        Phase::Paused => Status::Paused,
                        Phase::OnBreak => Status::OnBreak,
                        _ if self.break_prompt_deadline.is_some() => Status::BreakPending,
                        _ if b.in_lunch(now) => Status::Lunch,
                        _ => Status::Working,
                    };
                }
            }
        }
        snap
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Clock in. From `Paused` this resumes instead.
    ///
    /// # Errors
    /// Returns a validation error if the configuration cannot produce
    /// boundaries; nothing changes in that case.
    pub fn start(&mut self) -> Result<Option<Event>> {
        match self.phase {
            Phase::Idle => {}
            Phase::Paused | Phase::PausedOvertime => return Ok(self.resume()),
            _ => return Ok(None),
        }

        let now = self.clock.now();
        let b = ShiftBoundaries::calculate(&self.config, now)?;

        self.clear_break_state();
        self.last_break = None;
        self.overtime_start = None;
        self.completed_at = None;
        self.dispatcher.reset();
        self.boundaries = Some(b);
        self.phase = Phase::Running;
        self.persist();

        info!(start = %b.start_time, end = %b.end_time, "shift started");
        Ok(Some(Event::ShiftStarted {
            start: b.start_time,
            end: b.end_time,
            lunch_start: b.lunch_start_time,
            lunch_end: b.lunch_end_time,
            at: now,
        }))
    }

    pub fn pause(&mut self) -> Option<Event> {
        let next = match self.phase {
            Phase::Running => Phase::Paused,
            Phase::Overtime => Phase::PausedOvertime,
            _ => return None,
        };
        if self.break_prompt_deadline.take().is_some() {
            self.dispatcher.rearm_break();
        }
        self.phase = next;
        self.persist();
        info!(phase = ?next, "shift paused");
        Some(Event::ShiftPaused {
            phase: next,
            at: self.clock.now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        let next = match self.phase {
            Phase::Paused => Phase::Running,
            Phase::PausedOvertime => Phase::Overtime,
            _ => return None,
        };
        self.phase = next;
        self.persist();
        info!(phase = ?next, "shift resumed");
        Some(Event::ShiftResumed {
            phase: next,
            at: self.clock.now(),
        })
    }

    /// The single start button: start, pause, resume, or start overtime
    /// after a completed shift.
    ///
    /// # Errors
    /// Fails while on a break, and whenever `start` fails.
    pub fn toggle(&mut self) -> Result<Option<Event>> {
        match self.phase {
            Phase::Idle if self.completed_at.is_some() => Ok(self.start_overtime()),
            Phase::Idle => self.start(),
            Phase::Running | Phase::Overtime => Ok(self.pause()),
            Phase::Paused | Phase::PausedOvertime => Ok(self.resume()),
            Phase::OnBreak => Err(CoreError::InvalidTransition {
                from: self.phase,
                action: "toggle",
            }),
        }
    }

    /// Open-ended overtime, counted from now.
    pub fn start_overtime(&mut self) -> Option<Event> {
        if self.phase != Phase::Idle {
            return None;
        }
        let now = self.clock.now();
        self.clear_break_state();
        self.boundaries = None;
        self.completed_at = None;
        self.overtime_start = Some(now);
        self.phase = Phase::Overtime;
        self.persist();
        info!("overtime started");
        Some(Event::OvertimeStarted { at: now })
    }

    /// Back to `Idle` from anywhere. Also forgets the configured clock-in
    /// time so the next shift starts "now" unless reconfigured.
    pub fn reset(&mut self) -> Option<Event> {
        self.clear_break_state();
        self.phase = Phase::Idle;
        self.boundaries = None;
        self.overtime_start = None;
        self.last_break = None;
        self.completed_at = None;
        self.dispatcher.reset();

        if let Err(e) = Session::clear(&self.store) {
            warn!("failed to clear session: {e}");
        }

        self.config.start_work_time.clear();
        let configs = ConfigStore::new(&self.store);
        let mut stored = configs.load();
        stored.start_work_time.clear();
        if let Err(e) = configs.save(&stored) {
            warn!("failed to clear start time: {e}");
        }

        info!("shift reset");
        Some(Event::ShiftReset {
            at: self.clock.now(),
        })
    }

    /// Begin a break now, whether or not a prompt is pending.
    pub fn start_break(&mut self) -> Option<Event> {
        if self.phase != Phase::Running {
            return None;
        }
        let now = self.clock.now();
        Some(self.begin_break(now))
    }

    /// Dismiss a pending break prompt; the interval restarts from now.
    pub fn skip_break(&mut self) -> Option<Event> {
        if self.phase != Phase::Running || self.break_prompt_deadline.is_none() {
            return None;
        }
        let now = self.clock.now();
        self.break_prompt_deadline = None;
        self.last_break = Some(now);
        self.dispatcher.rearm_break();
        self.persist();
        info!("break skipped");
        Some(Event::BreakSkipped { at: now })
    }

    /// Cut a running break short.
    pub fn end_break(&mut self) -> Option<Event> {
        if self.phase != Phase::OnBreak {
            return None;
        }
        let now = self.clock.now();
        Some(self.finish_break(now))
    }

    /// Save new settings and act on them: boundaries of an active shift are
    /// recomputed at once when any of their inputs changed, and an idle
    /// timer with a configured clock-in time starts a shift.
    ///
    /// # Errors
    /// Invalid settings are refused before anything is saved.
    pub fn apply_settings(&mut self, config: Config) -> Result<Option<Event>> {
        config.validate()?;
        let boundaries_changed = self.config.boundaries_differ(&config);

        ConfigStore::new(&self.store).save(&config)?;
        self.dispatcher.apply_config(&config);
        self.config = config;
        debug!(boundaries_changed, "settings applied");

        match self.phase {
            Phase::Running | Phase::Paused | Phase::OnBreak if boundaries_changed => {
                let now = self.clock.now();
                let b = ShiftBoundaries::calculate(&self.config, now)?;
                self.boundaries = Some(b);
                self.persist();
                info!(start = %b.start_time, end = %b.end_time, "boundaries recalculated");
                Ok(Some(Event::BoundariesRecalculated {
                    start: b.start_time,
                    end: b.end_time,
                    at: now,
                }))
            }
            Phase::Idle if self.config.start_clock().is_some() => self.start(),
            _ => Ok(None),
        }
    }

    /// Developer shortcut: move the end of a running shift one minute out.
    ///
    /// # Errors
    /// Requires developer mode and a running shift.
    pub fn end_soon(&mut self) -> Result<Option<Event>> {
        if !self.config.enable_dev_mode {
            return Err(CoreError::Custom("developer mode is disabled".into()));
        }
        if self.phase != Phase::Running {
            return Err(CoreError::InvalidTransition {
                from: self.phase,
                action: "end soon",
            });
        }
        let now = self.clock.now();
        let Some(b) = self.boundaries.as_mut() else {
            return Ok(None);
        };
        b.end_time = now + Duration::seconds(END_SOON_SECS);
        let (start, end) = (b.start_time, b.end_time);
        self.persist();
        info!(%end, "end of shift moved");
        Ok(Some(Event::BoundariesRecalculated { start, end, at: now }))
    }

    /// Preview a built-in reminder. One-shot flags stay as they are.
    pub fn test_notification(&mut self, kind: ReminderKind) -> DispatchReport {
        self.dispatcher.preview(kind)
    }

    /// Preview the first enabled custom reminder, if there is one.
    pub fn test_custom_reminder(&mut self) -> Option<DispatchReport> {
        let reminder = self.config.custom_reminders.iter().find(|r| r.enabled)?;
        Some(self.dispatcher.preview_custom(reminder))
    }

    /// Call about once a second. Returns the events produced since the
    /// last call, in order.
    pub fn tick(&mut self) -> Vec<Event> {
        let now = self.clock.now();
        let mut events = std::mem::take(&mut self.backlog);

        let today = now.date();
        if self.current_date != Some(today) {
            if self.current_date.is_some() {
                debug!(day = %date_key(now), "new day, clearing reminder cache");
                self.dispatcher.reset_custom_reminders();
            }
            self.current_date = Some(today);
        }

        match self.phase {
            Phase::OnBreak => {
                if self.break_ends_at.map_or(true, |end| now >= end) {
                    events.push(self.finish_break(now));
                }
            }
            Phase::Running => self.tick_running(now, &mut events),
            Phase::Idle | Phase::Paused | Phase::Overtime | Phase::PausedOvertime => {}
        }
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn tick_running(&mut self, now: NaiveDateTime, events: &mut Vec<Event>) {
        if self.break_prompt_deadline.is_some_and(|deadline| now >= deadline) {
            events.push(self.begin_break(now));
            return;
        }

        let Some(b) = self.boundaries else {
            warn!("running without boundaries, returning to idle");
            self.phase = Phase::Idle;
            return;
        };

        if b.is_over(now) {
            events.push(self.complete(now));
            return;
        }

        let in_lunch = b.in_lunch(now);
        if self.config.enable_lunch_notify && in_lunch && self.dispatcher.notify_lunch() {
            info!("lunch reminder");
            events.push(Event::LunchReminded { at: now });
        }

        if self.config.enable_break_reminder && !in_lunch && self.break_prompt_deadline.is_none() {
            let anchor = self.last_break.unwrap_or(b.start_time);
            let minutes = seconds_between(now, anchor).div_euclid(60);
            if minutes >= i64::from(self.config.break_interval) {
                let deadline = now + Duration::seconds(BREAK_PROMPT_SECS);
                self.break_prompt_deadline = Some(deadline);
                self.dispatcher.notify_break();
                info!(%deadline, "break prompted");
                events.push(Event::BreakPrompted { deadline, at: now });
            }
        }

        if self.config.enable_custom_reminders {
            let configs = ConfigStore::new(&self.store);
            let fired = self
                .dispatcher
                .check_custom_reminders(&self.config.custom_reminders, now, &configs);
            for id in fired {
                if let Some(reminder) = self.config.reminder_mut(&id) {
                    reminder.notified_dates.insert(now.date());
                    events.push(Event::ReminderFired {
                        id,
                        title: reminder.title.clone(),
                        at: now,
                    });
                }
            }
        }
    }

    fn begin_break(&mut self, now: NaiveDateTime) -> Event {
        let ends_at = now + Duration::minutes(i64::from(self.config.break_duration));
        self.break_prompt_deadline = None;
        self.break_ends_at = Some(ends_at);
        self.last_break = Some(now);
        self.phase = Phase::OnBreak;
        self.persist();
        info!(%ends_at, "break started");
        Event::BreakStarted { ends_at, at: now }
    }

    fn finish_break(&mut self, now: NaiveDateTime) -> Event {
        let early = self.break_ends_at.is_some_and(|end| now < end);
        self.break_ends_at = None;
        self.last_break = Some(now);
        self.phase = Phase::Running;
        self.dispatcher.rearm_break();
        self.persist();
        info!(early, "break ended");
        Event::BreakEnded { early, at: now }
    }

    fn complete(&mut self, now: NaiveDateTime) -> Event {
        self.clear_break_state();
        self.phase = Phase::Idle;
        self.boundaries = None;
        self.last_break = None;
        self.completed_at = Some(now);
        self.persist();
        self.dispatcher.reset();
        let off_work_notified =
            self.config.enable_off_work_notify && self.dispatcher.notify_off_work();
        info!("shift completed");
        Event::ShiftCompleted {
            off_work_notified,
            at: now,
        }
    }

    fn clear_break_state(&mut self) {
        self.break_prompt_deadline = None;
        self.break_ends_at = None;
    }

    fn persist(&self) {
        let session = Session {
            phase: self.phase,
            boundaries: self.boundaries,
            is_overtime: matches!(self.phase, Phase::Overtime | Phase::PausedOvertime),
            overtime_start_time: self.overtime_start,
            last_break_time: self.last_break,
            break_ends_at: self.break_ends_at,
            break_prompt_deadline: self.break_prompt_deadline,
            completed_at: self.completed_at,
        };
        if let Err(e) = session.save(&self.store) {
            warn!("failed to persist session: {e}");
        }
    }

    fn restore(&mut self) -> Option<Event> {
        let session = Session::load(&self.store)?;
        let now = self.clock.now();

        if session.is_overtime {
            if let Some(start) = session.overtime_start_time {
                self.overtime_start = Some(start);
                self.phase = if session.phase == Phase::PausedOvertime {
                    Phase::PausedOvertime
                } else {
                    Phase::Overtime
                };
                info!(phase = ?self.phase, "overtime restored");
                return Some(Event::ShiftRestored {
                    phase: self.phase,
                    at: now,
                });
            }
        }

        if let Some(done) = session.completed_at {
            if done.date() == now.date() {
                self.completed_at = Some(done);
                info!(%done, "completed shift restored");
                return Some(Event::ShiftRestored {
                    phase: Phase::Idle,
                    at: now,
                });
            }
            // Completed on an earlier day: start fresh.
            if let Err(e) = Session::clear(&self.store) {
                warn!("failed to clear session: {e}");
            }
            debug!(%done, "forgot an earlier completed shift");
            return None;
        }

        match session.boundaries {
            Some(b) if now < b.end_time => {
                self.boundaries = Some(b);
                self.last_break = session.last_break_time;
                // An expired break is ended by the first tick.
                self.phase = match session.phase {
                    Phase::Paused => Phase::Paused,
                    Phase::OnBreak if session.break_ends_at.is_some() => Phase::OnBreak,
                    _ => Phase::Running,
                };
                match self.phase {
                    Phase::OnBreak => self.break_ends_at = session.break_ends_at,
                    Phase::Running => self.break_prompt_deadline = session.break_prompt_deadline,
                    _ => {}
                }
                info!(phase = ?self.phase, end = %b.end_time, "shift restored");
                Some(Event::ShiftRestored {
                    phase: self.phase,
                    at: now,
                })
            }
            stale => {
                if let Err(e) = Session::clear(&self.store) {
                    warn!("failed to clear stale session: {e}");
                }
                info!("discarded stale session");
                Some(Event::SessionDiscarded {
                    stale_end: stale.map(|b| b.end_time),
                    at: now,
                })
            }
        }
    }
}

fn non_negative(seconds: i64) -> u64 {
    u64::try_from(seconds).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::notify::recording::Recorder;
    use crate::notify::NotifyMethod;
    use crate::storage::{MemoryStore, SESSION_KEY};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn timer_at(
        now: NaiveDateTime,
        config: Config,
    ) -> (ShiftTimer<MemoryStore, ManualClock>, ManualClock, Recorder) {
        let store = MemoryStore::new();
        ConfigStore::new(&store).save(&config).unwrap();
        let clock = ManualClock::new(now);
        let recorder = Recorder::new();
        let timer = ShiftTimer::new(store, clock.clone(), recorder.channels());
        (timer, clock, recorder)
    }

    fn nine_oclock_start() -> Config {
        Config {
            start_work_time: "09:00".into(),
            notify_method: NotifyMethod::Notification,
            ..Config::default()
        }
    }

    #[test]
    fn start_pause_resume() {
        let (mut timer, _, _) = timer_at(at(9, 0), nine_oclock_start());
        assert_eq!(timer.phase(), Phase::Idle);

        assert!(timer.start().unwrap().is_some());
        assert_eq!(timer.phase(), Phase::Running);

        assert!(timer.pause().is_some());
        assert_eq!(timer.phase(), Phase::Paused);
        assert!(timer.pause().is_none());

        assert!(timer.resume().is_some());
        assert_eq!(timer.phase(), Phase::Running);
    }

    #[test]
    fn start_refuses_invalid_config() {
        let mut cfg = nine_oclock_start();
        cfg.lunch_time = "noon".into();
        let (mut timer, _, _) = timer_at(at(9, 0), cfg);
        assert!(matches!(timer.start(), Err(CoreError::Validation(_))));
        assert_eq!(timer.phase(), Phase::Idle);
        assert!(timer.boundaries().is_none());
    }

    #[test]
    fn toggle_follows_the_start_button() {
        let (mut timer, clock, _) = timer_at(at(9, 0), nine_oclock_start());
        timer.toggle().unwrap();
        assert_eq!(timer.phase(), Phase::Running);
        timer.toggle().unwrap();
        assert_eq!(timer.phase(), Phase::Paused);
        timer.toggle().unwrap();
        assert_eq!(timer.phase(), Phase::Running);

        clock.set(at(18, 30));
        timer.tick();
        assert!(timer.is_completed());
        timer.toggle().unwrap();
        assert_eq!(timer.phase(), Phase::Overtime);
    }

    #[test]
    fn completion_notifies_and_offers_overtime() {
        let (mut timer, clock, rec) = timer_at(at(9, 0), nine_oclock_start());
        timer.start().unwrap();
        clock.set(at(18, 30));
        let events = timer.tick();
        assert!(matches!(
            events.as_slice(),
            [Event::ShiftCompleted {
                off_work_notified: true,
                ..
            }]
        ));
        assert_eq!(timer.phase(), Phase::Idle);
        assert!(timer.boundaries().is_none());
        let session = Session::load(timer.store()).unwrap();
        assert_eq!(session.completed_at, Some(at(18, 30)));
        assert!(session.boundaries.is_none());
        assert_eq!(rec.titles(), vec![ReminderKind::OffWork.title()]);
        assert_eq!(timer.snapshot().status, Status::Completed);

        assert!(timer.start_overtime().is_some());
        clock.advance(Duration::seconds(65));
        let snap = timer.snapshot();
        assert_eq!(snap.display, "+00:01:05");
        assert_eq!(snap.progress, 100.0);
    }

    #[test]
    fn lunch_reminder_fires_once() {
        let mut cfg = nine_oclock_start();
        cfg.enable_off_work_notify = false;
        let (mut timer, clock, rec) = timer_at(at(9, 0), cfg);
        timer.start().unwrap();

        clock.set(at(12, 0));
        let events = timer.tick();
        assert!(matches!(events.as_slice(), [Event::LunchReminded { .. }]));
        assert_eq!(timer.snapshot().status, Status::Lunch);

        clock.advance(Duration::seconds(1));
        assert!(timer.tick().is_empty());
        assert_eq!(rec.titles().len(), 1);
    }

    #[test]
    fn pause_cancels_a_pending_break_prompt() {
        let mut cfg = nine_oclock_start();
        cfg.enable_break_reminder = true;
        let (mut timer, clock, _) = timer_at(at(9, 0), cfg);
        timer.start().unwrap();

        clock.set(at(10, 0));
        timer.tick();
        assert!(timer.break_prompt_deadline().is_some());
        assert_eq!(timer.snapshot().status, Status::BreakPending);

        timer.pause();
        assert!(timer.break_prompt_deadline().is_none());
        assert!(!timer.dispatcher().break_notified());
    }

    #[test]
    fn skip_break_restarts_the_interval() {
        let mut cfg = nine_oclock_start();
        cfg.enable_break_reminder = true;
        let (mut timer, clock, _) = timer_at(at(9, 0), cfg);
        timer.start().unwrap();

        clock.set(at(10, 0));
        timer.tick();
        clock.advance(Duration::seconds(5));
        assert!(timer.skip_break().is_some());
        assert_eq!(timer.break_anchor(), Some(at(10, 0) + Duration::seconds(5)));
        assert!(timer.skip_break().is_none());

        clock.set(at(10, 59));
        assert!(timer.tick().is_empty());
    }

    #[test]
    fn end_break_early() {
        let (mut timer, clock, _) = timer_at(at(9, 0), nine_oclock_start());
        timer.start().unwrap();
        clock.set(at(10, 0));
        timer.start_break();
        assert_eq!(timer.phase(), Phase::OnBreak);
        assert!(timer.pause().is_none());
        assert!(timer.toggle().is_err());

        clock.advance(Duration::minutes(2));
        assert_eq!(timer.end_break(), Some(Event::BreakEnded { early: true, at: at(10, 2) }));
        assert_eq!(timer.phase(), Phase::Running);
        assert_eq!(timer.break_anchor(), Some(at(10, 2)));
    }

    #[test]
    fn reset_clears_shift_and_start_time() {
        let (mut timer, _, _) = timer_at(at(9, 0), nine_oclock_start());
        timer.start().unwrap();
        assert!(timer.reset().is_some());
        assert_eq!(timer.phase(), Phase::Idle);
        assert!(timer.store().get(SESSION_KEY).unwrap().is_none());
        assert_eq!(timer.config().start_work_time, "");
        assert_eq!(ConfigStore::new(timer.store()).load().start_work_time, "");
    }

    #[test]
    fn settings_change_recomputes_running_shift() {
        let (mut timer, clock, _) = timer_at(at(9, 0), nine_oclock_start());
        timer.start().unwrap();
        clock.set(at(10, 0));

        let mut cfg = timer.config().clone();
        cfg.work_hours = 7.0;
        let event = timer.apply_settings(cfg).unwrap();
        assert!(matches!(event, Some(Event::BoundariesRecalculated { .. })));
        assert_eq!(timer.boundaries().unwrap().end_time, at(17, 30));

        let mut cfg = timer.config().clone();
        cfg.sound_type = crate::notify::SoundType::Bell;
        assert!(timer.apply_settings(cfg).unwrap().is_none());
    }

    #[test]
    fn settings_with_start_time_start_an_idle_timer() {
        let (mut timer, _, _) = timer_at(at(8, 45), Config::default());
        let mut cfg = timer.config().clone();
        cfg.start_work_time = "08:30".into();
        let event = timer.apply_settings(cfg).unwrap();
        assert!(matches!(event, Some(Event::ShiftStarted { .. })));
        assert_eq!(timer.boundaries().unwrap().start_time, at(8, 30));
    }

    #[test]
    fn invalid_settings_are_not_saved() {
        let (mut timer, _, _) = timer_at(at(9, 0), nine_oclock_start());
        let mut cfg = timer.config().clone();
        cfg.break_interval = 0;
        assert!(timer.apply_settings(cfg).is_err());
        assert_eq!(ConfigStore::new(timer.store()).load().break_interval, 60);
    }

    #[test]
    fn end_soon_needs_dev_mode_and_a_running_shift() {
        let (mut timer, clock, _) = timer_at(at(9, 0), nine_oclock_start());
        assert!(timer.end_soon().is_err());

        let mut cfg = timer.config().clone();
        cfg.enable_dev_mode = true;
        timer.apply_settings(cfg).unwrap();
        assert_eq!(timer.phase(), Phase::Running);

        clock.set(at(11, 0));
        timer.end_soon().unwrap();
        assert_eq!(timer.boundaries().unwrap().end_time, at(11, 1));

        clock.set(at(11, 1));
        assert!(matches!(timer.tick().as_slice(), [Event::ShiftCompleted { .. }]));
    }

    #[test]
    fn tests_do_not_consume_one_shot_flags() {
        let mut cfg = nine_oclock_start();
        cfg.custom_reminders.push(crate::storage::CustomReminder::new("15:00", "Tea", ""));
        let (mut timer, _, rec) = timer_at(at(9, 0), cfg);
        timer.test_notification(ReminderKind::Lunch);
        assert!(timer.test_custom_reminder().is_some());
        assert!(!timer.dispatcher().lunch_notified());
        assert_eq!(rec.titles(), vec![ReminderKind::Lunch.title(), "Tea"]);
    }

    #[test]
    fn restore_keeps_paused_sessions_paused() {
        let (mut timer, clock, _) = timer_at(at(9, 0), nine_oclock_start());
        timer.start().unwrap();
        timer.pause();

        let store = timer.store().clone();
        let reloaded = ShiftTimer::new(store, clock.clone(), Channels::unsupported());
        assert_eq!(reloaded.phase(), Phase::Paused);
        assert_eq!(reloaded.boundaries(), timer.boundaries());
    }

    #[test]
    fn break_survives_a_reload() {
        let (mut timer, clock, _) = timer_at(at(9, 0), nine_oclock_start());
        timer.start().unwrap();
        clock.set(at(10, 0));
        assert!(matches!(timer.start_break(), Some(Event::BreakStarted { .. })));

        clock.set(at(10, 1));
        let mut reloaded = ShiftTimer::new(timer.store().clone(), clock.clone(), Channels::unsupported());
        assert_eq!(reloaded.phase(), Phase::OnBreak);
        assert_eq!(reloaded.break_ends_at(), Some(at(10, 5)));
        assert_eq!(reloaded.snapshot().break_remaining_seconds, Some(4 * 60));

        assert_eq!(reloaded.end_break(), Some(Event::BreakEnded { early: true, at: at(10, 1) }));
        assert_eq!(reloaded.phase(), Phase::Running);
    }

    #[test]
    fn break_that_ran_out_while_away_ends_on_first_tick() {
        let (mut timer, clock, _) = timer_at(at(9, 0), nine_oclock_start());
        timer.start().unwrap();
        clock.set(at(10, 0));
        timer.start_break();

        clock.set(at(10, 20));
        let mut reloaded = ShiftTimer::new(timer.store().clone(), clock.clone(), Channels::unsupported());
        assert_eq!(reloaded.phase(), Phase::OnBreak);
        let events = reloaded.tick();
        assert_eq!(
            events,
            vec![
                Event::ShiftRestored {
                    phase: Phase::OnBreak,
                    at: at(10, 20),
                },
                Event::BreakEnded {
                    early: false,
                    at: at(10, 20),
                },
            ]
        );
        assert_eq!(reloaded.break_anchor(), Some(at(10, 20)));
    }

    #[test]
    fn pending_break_prompt_survives_a_reload() {
        let mut cfg = nine_oclock_start();
        cfg.enable_break_reminder = true;
        let (mut timer, clock, _) = timer_at(at(9, 0), cfg);
        timer.start().unwrap();
        clock.set(at(10, 0));
        timer.tick();
        let deadline = timer.break_prompt_deadline();
        assert!(deadline.is_some());

        let mut reloaded = ShiftTimer::new(timer.store().clone(), clock.clone(), Channels::unsupported());
        assert_eq!(reloaded.break_prompt_deadline(), deadline);
        assert!(reloaded.skip_break().is_some());
    }

    #[test]
    fn completion_is_remembered_for_the_rest_of_the_day() {
        let (mut timer, clock, _) = timer_at(at(9, 0), nine_oclock_start());
        timer.start().unwrap();
        clock.set(at(18, 30));
        timer.tick();
        assert!(timer.is_completed());

        clock.set(at(18, 31));
        let mut reloaded = ShiftTimer::new(timer.store().clone(), clock.clone(), Channels::unsupported());
        assert!(reloaded.is_completed());
        assert_eq!(reloaded.snapshot().status, Status::Completed);
        assert!(matches!(reloaded.toggle().unwrap(), Some(Event::OvertimeStarted { .. })));
        assert_eq!(reloaded.phase(), Phase::Overtime);

        let again = ShiftTimer::new(timer.store().clone(), clock.clone(), Channels::unsupported());
        assert_eq!(again.phase(), Phase::Overtime);
        assert!(!again.is_completed());
    }

    #[test]
    fn completion_from_an_earlier_day_is_forgotten() {
        let (mut timer, clock, _) = timer_at(at(9, 0), nine_oclock_start());
        timer.start().unwrap();
        clock.set(at(18, 30));
        timer.tick();

        clock.set(at(9, 0) + Duration::days(1));
        let mut reloaded = ShiftTimer::new(timer.store().clone(), clock.clone(), Channels::unsupported());
        assert!(!reloaded.is_completed());
        assert!(reloaded.tick().is_empty());
        assert!(reloaded.store().get(SESSION_KEY).unwrap().is_none());
        assert!(matches!(reloaded.toggle().unwrap(), Some(Event::ShiftStarted { .. })));
    }
}
