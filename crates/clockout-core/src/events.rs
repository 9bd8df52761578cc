use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every state change of a shift produces an Event.
/// Hosts print them, log them or forward them to a UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ShiftStarted {
        start: NaiveDateTime,
        end: NaiveDateTime,
        lunch_start: NaiveDateTime,
        lunch_end: NaiveDateTime,
        at: NaiveDateTime,
    },
    ShiftPaused {
        phase: Phase,
        at: NaiveDateTime,
    },
    ShiftResumed {
        phase: Phase,
        at: NaiveDateTime,
    },
    /// A persisted session was picked up at startup.
    ShiftRestored {
        phase: Phase,
        at: NaiveDateTime,
    },
    /// A persisted session had already ended and was thrown away.
    SessionDiscarded {
        stale_end: Option<NaiveDateTime>,
        at: NaiveDateTime,
    },
    /// Settings changed mid-shift (or the dev shortcut moved the end).
    BoundariesRecalculated {
        start: NaiveDateTime,
        end: NaiveDateTime,
        at: NaiveDateTime,
    },
    LunchReminded {
        at: NaiveDateTime,
    },
    BreakPrompted {
        /// The break starts on its own at this instant.
        deadline: NaiveDateTime,
        at: NaiveDateTime,
    },
    BreakStarted {
        ends_at: NaiveDateTime,
        at: NaiveDateTime,
    },
    BreakSkipped {
        at: NaiveDateTime,
    },
    BreakEnded {
        early: bool,
        at: NaiveDateTime,
    },
    ShiftCompleted {
        off_work_notified: bool,
        at: NaiveDateTime,
    },
    OvertimeStarted {
        at: NaiveDateTime,
    },
    ShiftReset {
        at: NaiveDateTime,
    },
    ReminderFired {
        id: String,
        title: String,
        at: NaiveDateTime,
    },
}

impl Event {
    /// Timestamp the event was produced at.
    pub fn at(&self) -> NaiveDateTime {
        match self {
            Event::ShiftStarted { at, .. }
            | Event::ShiftPaused { at, .. }
            | Event::ShiftResumed { at, .. }
            | Event::ShiftRestored { at, .. }
            | Event::SessionDiscarded { at, .. }
            | Event::BoundariesRecalculated { at, .. }
            | Event::LunchReminded { at }
            | Event::BreakPrompted { at, .. }
            | Event::BreakStarted { at, .. }
            | Event::BreakSkipped { at }
            | Event::BreakEnded { at, .. }
            | Event::ShiftCompleted { at, .. }
            | Event::OvertimeStarted { at }
            | Event::ShiftReset { at }
            | Event::ReminderFired { at, .. } => *at,
        }
    }
}
