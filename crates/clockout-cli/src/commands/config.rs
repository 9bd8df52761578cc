use clap::Subcommand;
use clockout_core::storage::data_dir;
use clockout_core::{Config, ConfigError};

use super::{open_timer, print_json, print_outcome, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "startWorkTime", "workHours")
        key: String,
    },
    /// Set a config value and apply it to the current shift
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Print the data directory
    Path,
}

pub fn run(action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let timer = open_timer()?;
            let value = timer
                .config()
                .get(&key)
                .ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut timer = open_timer()?;
            let mut config = timer.config().clone();
            config.set(&key, &value)?;
            let event = timer.apply_settings(config)?;
            match event {
                Some(_) => print_outcome(&timer, event)?,
                None => println!("ok"),
            }
        }
        ConfigAction::List => {
            let timer = open_timer()?;
            print_json(timer.config())?;
        }
        ConfigAction::Reset => {
            let mut timer = open_timer()?;
            timer.apply_settings(Config::default())?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", data_dir()?.display());
        }
    }
    Ok(())
}
