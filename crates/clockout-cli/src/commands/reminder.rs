use clap::Subcommand;
use clockout_core::clock::parse_clock;
use clockout_core::{ConfigError, ConfigStore, CustomReminder, ReminderPatch, SqliteStore, ValidationError};

use super::{open_timer, print_json, print_report, CliResult};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Add a reminder at a time of day
    Add {
        /// Time of day (HH:MM)
        time: String,
        /// Reminder title
        title: String,
        /// Notification body
        #[arg(long, default_value = "")]
        content: String,
        /// Fire on one day only instead of every day
        #[arg(long)]
        once: bool,
    },
    /// List reminders
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a reminder
    Edit {
        /// Reminder ID
        id: String,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        /// Fire every day (true) or once (false)
        #[arg(long)]
        repeat: Option<bool>,
    },
    /// Remove a reminder
    Remove {
        /// Reminder ID
        id: String,
    },
    /// Enable a reminder
    Enable {
        /// Reminder ID
        id: String,
    },
    /// Disable a reminder
    Disable {
        /// Reminder ID
        id: String,
    },
    /// Forget which days reminders already fired
    Clear,
    /// Deliver a reminder now without recording it
    Test {
        /// Reminder ID (defaults to the first enabled reminder)
        id: Option<String>,
    },
}

pub fn run(action: ReminderAction) -> CliResult {
    let store = SqliteStore::open()?;
    let configs = ConfigStore::new(&store);

    match action {
        ReminderAction::Add {
            time,
            title,
            content,
            once,
        } => {
            check_time(&time)?;
            check_title(&title)?;
            let mut reminder = CustomReminder::new(time, title, content);
            reminder.repeat = !once;
            let id = reminder.id.clone();
            configs.add_reminder(reminder)?;
            println!("{id}");
        }
        ReminderAction::List { json } => {
            let config = configs.load();
            if json {
                print_json(&config.custom_reminders)?;
            } else if config.custom_reminders.is_empty() {
                println!("no reminders");
            } else {
                if !config.enable_custom_reminders {
                    println!("(custom reminders are switched off: config set enableCustomReminders true)");
                }
                for r in &config.custom_reminders {
                    let state = if r.enabled { "on " } else { "off" };
                    let repeat = if r.repeat { "daily" } else { "once " };
                    println!("{}  {state}  {repeat}  {}  {}", r.time, r.id, r.title);
                }
            }
        }
        ReminderAction::Edit {
            id,
            time,
            title,
            content,
            repeat,
        } => {
            if let Some(time) = &time {
                check_time(time)?;
            }
            if let Some(title) = &title {
                check_title(title)?;
            }
            let patch = ReminderPatch {
                time,
                title,
                content,
                repeat,
                ..ReminderPatch::default()
            };
            update(&configs, id, patch)?;
        }
        ReminderAction::Remove { id } => {
            if !configs.remove_reminder(&id)? {
                return Err(ConfigError::ReminderNotFound(id).into());
            }
            println!("ok");
        }
        ReminderAction::Enable { id } => {
            let patch = ReminderPatch {
                enabled: Some(true),
                ..ReminderPatch::default()
            };
            update(&configs, id, patch)?;
        }
        ReminderAction::Disable { id } => {
            let patch = ReminderPatch {
                enabled: Some(false),
                ..ReminderPatch::default()
            };
            update(&configs, id, patch)?;
        }
        ReminderAction::Clear => {
            configs.clear_all_notified()?;
            println!("ok");
        }
        ReminderAction::Test { id } => {
            let mut timer = open_timer()?;
            let report = match id {
                Some(id) => {
                    let reminder = timer
                        .config()
                        .reminder(&id)
                        .cloned()
                        .ok_or(ConfigError::ReminderNotFound(id))?;
                    timer.dispatcher_mut().preview_custom(&reminder)
                }
                None => timer
                    .test_custom_reminder()
                    .ok_or("no enabled reminder to test")?,
            };
            print_report(&report);
        }
    }
    Ok(())
}

fn update(configs: &ConfigStore<'_>, id: String, patch: ReminderPatch) -> CliResult {
    if !configs.update_reminder(&id, patch)? {
        return Err(ConfigError::ReminderNotFound(id).into());
    }
    println!("ok");
    Ok(())
}

fn check_time(time: &str) -> Result<(), ValidationError> {
    match parse_clock(time) {
        Some(_) => Ok(()),
        None => Err(ValidationError::InvalidTime {
            field: "time".into(),
            value: time.into(),
        }),
    }
}

fn check_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "title".into(),
            message: "must not be empty".into(),
        });
    }
    Ok(())
}
