use std::path::PathBuf;

use clap::Subcommand;
use clockout_core::storage::validate_custom_sound;
use clockout_core::SoundType;
use tracing::info;

use super::{open_timer, print_report, CliResult};

#[derive(Subcommand)]
pub enum SoundAction {
    /// Use an audio file (at most 5 MiB) as the reminder sound
    Set {
        /// Path to an mp3, wav, ogg, m4a, aac, flac, opus or webm file
        path: PathBuf,
    },
    /// Go back to the built-in beep
    Clear,
    /// Play the current reminder sound
    Play,
}

pub fn run(action: SoundAction) -> CliResult {
    let mut timer = open_timer()?;

    match action {
        SoundAction::Set { path } => {
            let reference = validate_custom_sound(&path)?;
            let mut config = timer.config().clone();
            config.custom_sound_url = Some(reference.clone());
            config.sound_type = SoundType::Custom;
            timer.apply_settings(config)?;
            info!(%reference, "custom sound saved");
            println!("{reference}");
        }
        SoundAction::Clear => {
            let mut config = timer.config().clone();
            config.custom_sound_url = None;
            if config.sound_type == SoundType::Custom {
                config.sound_type = SoundType::Beep;
            }
            timer.apply_settings(config)?;
            println!("ok");
        }
        SoundAction::Play => {
            let report = timer.dispatcher_mut().test_sound();
            print_report(&report);
        }
    }
    Ok(())
}
