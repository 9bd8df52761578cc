use std::io::Write;
use std::time::Duration;

use clap::Subcommand;
use clockout_core::{Event, Snapshot, Status};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use super::{open_timer, print_json, print_outcome, CliResult, Timer};

#[derive(Subcommand)]
pub enum ShiftAction {
    /// Clock in (or resume a paused shift)
    Start,
    /// Pause the countdown
    Pause,
    /// Resume a paused countdown
    Resume,
    /// Start, pause or resume, like the start button
    Toggle,
    /// Abandon the shift and forget the configured start time
    Reset,
    /// Start overtime after the shift ended
    Overtime,
    /// Print the current shift state
    Status {
        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the countdown in the foreground and deliver reminders
    Watch {
        /// Print events as JSON lines instead of a status line
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum BreakAction {
    /// Start a break now
    Start,
    /// Dismiss the pending break prompt
    Skip,
    /// End the current break early
    End,
}

pub fn run(action: ShiftAction) -> CliResult {
    let mut timer = open_timer()?;

    match action {
        ShiftAction::Start => {
            let event = timer.start()?;
            print_outcome(&timer, event)?;
        }
        ShiftAction::Pause => {
            let event = timer.pause();
            print_outcome(&timer, event)?;
        }
        ShiftAction::Resume => {
            let event = timer.resume();
            print_outcome(&timer, event)?;
        }
        ShiftAction::Toggle => {
            let event = timer.toggle()?;
            print_outcome(&timer, event)?;
        }
        ShiftAction::Reset => {
            let event = timer.reset();
            print_outcome(&timer, event)?;
        }
        ShiftAction::Overtime => {
            let event = timer.start_overtime();
            print_outcome(&timer, event)?;
        }
        ShiftAction::Status { json } => {
            let snapshot = timer.snapshot();
            if json {
                print_json(&snapshot)?;
            } else {
                println!("{}", status_line(&snapshot));
            }
        }
        ShiftAction::Watch { json } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(watch(timer, json))?;
        }
    }
    Ok(())
}

pub fn run_break(action: BreakAction) -> CliResult {
    let mut timer = open_timer()?;
    let event = match action {
        BreakAction::Start => timer.start_break(),
        BreakAction::Skip => timer.skip_break(),
        BreakAction::End => timer.end_break(),
    };
    print_outcome(&timer, event)
}

/// One-line human summary of a snapshot.
pub fn status_line(snap: &Snapshot) -> String {
    let label = match snap.status {
        Status::Idle => "Idle",
        Status::Working => "Working",
        Status::Lunch => "Lunch",
        Status::OnBreak => "On break",
        Status::BreakPending => "Break due",
        Status::Paused => "Paused",
        Status::Overtime => "Overtime",
        Status::Completed => "Done for today",
    };

    let mut line = format!("{label:<14} {}  {:5.1}%", snap.display, snap.progress);
    if let (Some(start), Some(end)) = (&snap.start_time, &snap.end_time) {
        line.push_str(&format!("  {start} -> {end}"));
    }
    if let Some(secs) = snap.break_remaining_seconds {
        line.push_str(&format!("  break {}", clockout_core::clock::format_duration(secs)));
    }
    if let Some(secs) = snap.break_prompt_seconds {
        line.push_str(&format!("  (b: break now, s: skip, auto in {secs}s)"));
    }
    line
}

const KEYS_HELP: &str = "keys: p pause/resume, b break, s skip break, e end break, o overtime, r reset, q quit";

async fn watch(mut timer: Timer, json: bool) -> CliResult {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    if !json {
        eprintln!("{KEYS_HELP}");
    }
    info!("watch loop started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let events = timer.tick();
                emit(&timer, &events, json)?;
            }
            line = lines.next_line(), if stdin_open => {
                match line? {
                    Some(input) => {
                        if !handle_key(&mut timer, input.trim(), json)? {
                            break;
                        }
                    }
                    None => {
                        debug!("stdin closed, keys disabled");
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    if !json {
        println!();
    }
    Ok(())
}

/// Returns `false` when the user asked to quit.
fn handle_key(timer: &mut Timer, key: &str, json: bool) -> CliResult<bool> {
    let event = match key {
        "" => return Ok(true),
        "q" => return Ok(false),
        "p" => timer.toggle()?,
        "b" => timer.start_break(),
        "s" => timer.skip_break(),
        "e" => timer.end_break(),
        "o" => timer.start_overtime(),
        "r" => timer.reset(),
        other => {
            eprintln!("unknown key '{other}'; {KEYS_HELP}");
            return Ok(true);
        }
    };
    let events: Vec<Event> = event.into_iter().collect();
    emit(timer, &events, json)?;
    Ok(true)
}

fn emit(timer: &Timer, events: &[Event], json: bool) -> CliResult {
    let mut out = std::io::stdout().lock();
    if json {
        for event in events {
            writeln!(out, "{}", serde_json::to_string(event)?)?;
        }
    } else {
        for event in events {
            writeln!(out, "\r{}", describe(event))?;
        }
        write!(out, "\r{}\x1b[K", status_line(&timer.snapshot()))?;
    }
    out.flush()?;
    Ok(())
}

fn describe(event: &Event) -> String {
    use clockout_core::clock::format_clock;
    match event {
        Event::ShiftStarted { start, end, .. } => {
            format!("shift started {} -> {}", format_clock(*start), format_clock(*end))
        }
        Event::ShiftPaused { .. } => "paused".into(),
        Event::ShiftResumed { .. } => "resumed".into(),
        Event::ShiftRestored { phase, .. } => format!("restored ({phase:?})"),
        Event::SessionDiscarded { .. } => "previous shift already ended".into(),
        Event::BoundariesRecalculated { start, end, .. } => {
            format!("shift now {} -> {}", format_clock(*start), format_clock(*end))
        }
        Event::LunchReminded { .. } => "lunch time".into(),
        Event::BreakPrompted { .. } => "break due".into(),
        Event::BreakStarted { ends_at, .. } => format!("break until {}", format_clock(*ends_at)),
        Event::BreakSkipped { .. } => "break skipped".into(),
        Event::BreakEnded { .. } => "back to work".into(),
        Event::ShiftCompleted { .. } => "shift complete, press o for overtime".into(),
        Event::OvertimeStarted { .. } => "overtime started".into(),
        Event::ShiftReset { .. } => "reset".into(),
        Event::ReminderFired { title, .. } => format!("reminder: {title}"),
    }
}
