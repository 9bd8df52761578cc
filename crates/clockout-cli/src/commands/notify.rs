use clap::Subcommand;
use clockout_core::ReminderKind;

use super::{open_timer, print_json, print_report, CliResult};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Send the lunch reminder now
    Lunch,
    /// Send the clock-out reminder now
    OffWork,
    /// Send the break reminder now
    Break,
    /// Read a text aloud
    Speak {
        text: String,
    },
    /// Show the desktop notification permission
    Permission,
}

pub fn run(action: NotifyAction) -> CliResult {
    let mut timer = open_timer()?;

    match action {
        NotifyAction::Lunch => print_report(&timer.test_notification(ReminderKind::Lunch)),
        NotifyAction::OffWork => print_report(&timer.test_notification(ReminderKind::OffWork)),
        NotifyAction::Break => print_report(&timer.test_notification(ReminderKind::Break)),
        NotifyAction::Speak { text } => {
            if !timer.dispatcher_mut().speak(&text) {
                return Err("speech is not available (set CLOCKOUT_SPEECH_CMD)".into());
            }
            println!("ok");
        }
        NotifyAction::Permission => {
            print_json(&timer.dispatcher().permission())?;
        }
    }
    Ok(())
}
