pub mod config;
mod database;
mod memory;

pub use config::{
    validate_custom_sound, ClockOffsetType, Config, ConfigStore, CustomReminder, ReminderPatch,
    MAX_CUSTOM_SOUND_BYTES,
};
pub use database::SqliteStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::StoreError;

/// Key of the persisted configuration record.
pub const CONFIG_KEY: &str = "countdown_config";
/// Key of the persisted shift session record.
pub const SESSION_KEY: &str = "countdown_timer_state";

/// String key-value persistence.
///
/// Both records the core persists (configuration and session) are whole
/// JSON documents written under a single key, so a `set` replaces the full
/// record and readers never observe a partial write.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }
}

/// Returns the clockout data directory, creating it if needed.
///
/// `CLOCKOUT_DATA_DIR` wins when set. Otherwise `~/.config/clockout/`, or
/// `~/.config/clockout-dev/` when `CLOCKOUT_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let dir = match std::env::var_os("CLOCKOUT_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("CLOCKOUT_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("clockout-dev")
            } else {
                base_dir.join("clockout")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StoreError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
