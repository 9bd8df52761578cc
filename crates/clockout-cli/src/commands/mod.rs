pub mod config;
pub mod dev;
pub mod notify;
pub mod reminder;
pub mod shift;
pub mod sound;

use clockout_core::{DispatchReport, Event, ShiftTimer, SqliteStore, SystemClock};
use serde::Serialize;

use crate::terminal;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub type Timer = ShiftTimer<SqliteStore, SystemClock>;

/// Open the on-disk store and build the shift timer on it.
pub fn open_timer() -> CliResult<Timer> {
    let store = SqliteStore::open()?;
    Ok(ShiftTimer::new(store, SystemClock, terminal::channels()))
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the event a command produced, or the current state when the
/// command was a no-op.
pub fn print_outcome(timer: &Timer, event: Option<Event>) -> CliResult {
    match event {
        Some(event) => print_json(&event),
        None => print_json(&timer.snapshot()),
    }
}

pub fn print_report(report: &DispatchReport) {
    let delivered: Vec<_> = report.delivered.iter().map(|c| c.as_str()).collect();
    if delivered.is_empty() {
        println!("delivered: none");
    } else {
        println!("delivered: {}", delivered.join(", "));
    }
    for (channel, error) in &report.failed {
        println!("failed: {} ({error})", channel.as_str());
    }
}
