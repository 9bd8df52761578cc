//! Shift configuration.
//!
//! Stored as a JSON document under [`CONFIG_KEY`]. Loading is forgiving:
//! the persisted document is merged over the defaults one field at a time,
//! so a bad value in one field never costs the user the rest of their
//! settings, and a document that is not JSON at all yields the defaults.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{KvStore, CONFIG_KEY};
use crate::clock::parse_clock;
use crate::error::{ConfigError, Result, ValidationError};
use crate::notify::{NotifyMethod, SoundType};

/// Largest accepted custom sound file.
pub const MAX_CUSTOM_SOUND_BYTES: u64 = 5 * 1024 * 1024;

const MAX_LUNCH_MINUTES: u32 = 24 * 60;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "oga", "m4a", "aac", "flac", "opus", "webm"];

/// Which way the device clock is off from the reference clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockOffsetType {
    /// Device runs ahead: the nominal start is pulled earlier.
    #[default]
    Fast,
    /// Device runs behind: the nominal start is pushed later.
    Slow,
}

/// A user-defined time-of-day reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomReminder {
    pub id: String,
    /// `HH:MM`
    pub time: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub repeat: bool,
    /// Calendar dates this reminder already fired on.
    #[serde(default)]
    pub notified_dates: BTreeSet<NaiveDate>,
}

impl CustomReminder {
    pub fn new(time: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: format!("reminder_{}", Uuid::new_v4().simple()),
            time: time.into(),
            title: title.into(),
            content: content.into(),
            enabled: true,
            repeat: true,
            notified_dates: BTreeSet::new(),
        }
    }

    /// Exact hour-and-minute match against `now`.
    pub fn is_due_at(&self, now: NaiveDateTime) -> bool {
        match parse_clock(&self.time) {
            Some(t) => t.hour() == now.hour() && t.minute() == now.minute(),
            None => false,
        }
    }
}

/// Partial update for a custom reminder. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPatch {
    pub time: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub enabled: Option<bool>,
    pub repeat: Option<bool>,
}

impl ReminderPatch {
    fn apply(self, reminder: &mut CustomReminder) {
        if let Some(time) = self.time {
            reminder.time = time;
        }
        if let Some(title) = self.title {
            reminder.title = title;
        }
        if let Some(content) = self.content {
            reminder.content = content;
        }
        if let Some(enabled) = self.enabled {
            reminder.enabled = enabled;
        }
        if let Some(repeat) = self.repeat {
            reminder.repeat = repeat;
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// `HH:MM`, or empty to start the shift at the moment of clock-in.
    #[serde(default)]
    pub start_work_time: String,
    #[serde(default)]
    pub clock_offset_type: ClockOffsetType,
    /// Offset magnitude as `HH:MM`.
    #[serde(default = "default_clock_offset_time")]
    pub clock_offset_time: String,
    #[serde(default = "default_work_hours")]
    pub work_hours: f64,
    /// Lunch break length in minutes.
    #[serde(default = "default_lunch_break")]
    pub lunch_break: u32,
    #[serde(default = "default_lunch_time")]
    pub lunch_time: String,
    #[serde(default = "default_true")]
    pub enable_lunch_notify: bool,
    #[serde(default = "default_true")]
    pub enable_off_work_notify: bool,
    #[serde(default)]
    pub notify_method: NotifyMethod,
    #[serde(default)]
    pub sound_type: SoundType,
    #[serde(default)]
    pub custom_sound_url: Option<String>,
    #[serde(default)]
    pub enable_break_reminder: bool,
    /// Minutes of work between break prompts.
    #[serde(default = "default_break_interval")]
    pub break_interval: u32,
    /// Break length in minutes.
    #[serde(default = "default_break_duration")]
    pub break_duration: u32,
    #[serde(default)]
    pub enable_dev_mode: bool,
    #[serde(default)]
    pub enable_custom_reminders: bool,
    #[serde(default)]
    pub custom_reminders: Vec<CustomReminder>,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_clock_offset_time() -> String {
    "00:00".into()
}
fn default_work_hours() -> f64 {
    8.0
}
fn default_lunch_break() -> u32 {
    90
}
fn default_lunch_time() -> String {
    "12:00".into()
}
fn default_break_interval() -> u32 {
    60
}
fn default_break_duration() -> u32 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_work_time: String::new(),
            clock_offset_type: ClockOffsetType::Fast,
            clock_offset_time: default_clock_offset_time(),
            work_hours: default_work_hours(),
            lunch_break: default_lunch_break(),
            lunch_time: default_lunch_time(),
            enable_lunch_notify: true,
            enable_off_work_notify: true,
            notify_method: NotifyMethod::All,
            sound_type: SoundType::Beep,
            custom_sound_url: None,
            enable_break_reminder: false,
            break_interval: default_break_interval(),
            break_duration: default_break_duration(),
            enable_dev_mode: false,
            enable_custom_reminders: false,
            custom_reminders: Vec::new(),
        }
    }
}

impl Config {
    /// Merge a persisted document over the defaults.
    ///
    /// Returns `None` when `raw` is not a JSON object at all. Fields that are
    /// unknown, or whose value does not fit the field, keep their default.
    /// `customReminders` replaces the default list only when it is a
    /// non-empty array; individual malformed reminders are dropped.
    pub fn merge_json(raw: &str) -> Option<Self> {
        let saved: Value = serde_json::from_str(raw).ok()?;
        let saved = saved.as_object()?;

        let mut merged: Map<String, Value> = match serde_json::to_value(Self::default()) {
            Ok(Value::Object(map)) => map,
            _ => return None,
        };

        for (key, value) in saved {
            if key == "customReminders" || !merged.contains_key(key) {
                continue;
            }
            let previous = merged.insert(key.clone(), value.clone());
            if serde_json::from_value::<Self>(Value::Object(merged.clone())).is_err() {
                warn!("config field '{key}' has an invalid value, using default");
                if let Some(previous) = previous {
                    merged.insert(key.clone(), previous);
                }
            }
        }

        let mut config: Self = serde_json::from_value(Value::Object(merged)).ok()?;

        if let Some(Value::Array(items)) = saved.get("customReminders") {
            if !items.is_empty() {
                config.custom_reminders = items
                    .iter()
                    .filter_map(|item| match serde_json::from_value(item.clone()) {
                        Ok(reminder) => Some(reminder),
                        Err(e) => {
                            warn!("dropping malformed custom reminder: {e}");
                            None
                        }
                    })
                    .collect();
            }
        }

        Some(config)
    }

    /// Check every time field and numeric range before the config is used
    /// to compute shift boundaries.
    ///
    /// # Errors
    /// Returns the first offending field.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if !self.start_work_time.trim().is_empty() {
            require_clock("startWorkTime", &self.start_work_time)?;
        }
        require_clock("clockOffsetTime", &self.clock_offset_time)?;
        require_clock("lunchTime", &self.lunch_time)?;

        if !self.work_hours.is_finite() || self.work_hours <= 0.0 || self.work_hours > 24.0 {
            return Err(ValidationError::InvalidValue {
                field: "workHours".into(),
                message: format!("must be between 0 and 24 hours, got {}", self.work_hours),
            });
        }
        if self.lunch_break > MAX_LUNCH_MINUTES {
            return Err(ValidationError::InvalidValue {
                field: "lunchBreak".into(),
                message: format!("must be at most {MAX_LUNCH_MINUTES} minutes"),
            });
        }
        if self.break_interval == 0 {
            return Err(ValidationError::InvalidValue {
                field: "breakInterval".into(),
                message: "must be at least one minute".into(),
            });
        }
        if self.break_duration == 0 {
            return Err(ValidationError::InvalidValue {
                field: "breakDuration".into(),
                message: "must be at least one minute".into(),
            });
        }

        for reminder in &self.custom_reminders {
            require_clock(&format!("customReminders[{}].time", reminder.id), &reminder.time)?;
            if reminder.title.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: format!("customReminders[{}].title", reminder.id),
                    message: "must not be empty".into(),
                });
            }
        }
        Ok(())
    }

    /// The configured clock-in time, if any.
    pub fn start_clock(&self) -> Option<NaiveTime> {
        let raw = self.start_work_time.trim();
        if raw.is_empty() {
            None
        } else {
            parse_clock(raw)
        }
    }

    pub fn lunch_clock(&self) -> Option<NaiveTime> {
        parse_clock(&self.lunch_time)
    }

    /// Signed correction applied to the nominal start: negative when the
    /// device clock is fast, positive when slow.
    pub fn clock_offset(&self) -> Option<Duration> {
        let t = parse_clock(&self.clock_offset_time)?;
        let magnitude = Duration::minutes(i64::from(t.hour()) * 60 + i64::from(t.minute()));
        Some(match self.clock_offset_type {
            ClockOffsetType::Fast => -magnitude,
            ClockOffsetType::Slow => magnitude,
        })
    }

    /// Whether any input to the boundary computation differs.
    pub fn boundaries_differ(&self, other: &Config) -> bool {
        self.start_work_time != other.start_work_time
            || self.work_hours != other.work_hours
            || self.lunch_break != other.lunch_break
            || self.lunch_time != other.lunch_time
            || self.clock_offset_type != other.clock_offset_type
            || self.clock_offset_time != other.clock_offset_time
    }

    /// Get a config value as string by its camelCase key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.get(key)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, parsing `value` according to the type the
    /// field currently holds. Does not persist.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or the value does not fit.
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let new_value = match existing {
            Value::Bool(_) => Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            Value::Number(_) => {
                if let Ok(n) = value.parse::<u64>() {
                    Value::Number(n.into())
                } else if let Ok(n) = value.parse::<f64>() {
                    serde_json::Number::from_f64(n)
                        .map(Value::Number)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                } else {
                    return Err(invalid(format!("cannot parse '{value}' as number")));
                }
            }
            Value::Object(_) | Value::Array(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            Value::Null if value == "null" => Value::Null,
            _ => Value::String(value.into()),
        };

        obj.insert(key.to_string(), new_value);
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    pub fn reminder(&self, id: &str) -> Option<&CustomReminder> {
        self.custom_reminders.iter().find(|r| r.id == id)
    }

    pub fn reminder_mut(&mut self, id: &str) -> Option<&mut CustomReminder> {
        self.custom_reminders.iter_mut().find(|r| r.id == id)
    }
}

fn require_clock(field: &str, value: &str) -> std::result::Result<NaiveTime, ValidationError> {
    parse_clock(value).ok_or_else(|| ValidationError::InvalidTime {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Check a custom sound file before its path is stored as the clip
/// reference: it must exist, look like audio and be at most 5 MiB.
///
/// # Errors
/// Returns [`ConfigError::SoundRejected`] describing the first failed check.
pub fn validate_custom_sound(path: &Path) -> std::result::Result<String, ConfigError> {
    let meta = std::fs::metadata(path)
        .map_err(|e| ConfigError::SoundRejected(format!("{}: {e}", path.display())))?;
    if !meta.is_file() {
        return Err(ConfigError::SoundRejected(format!("{} is not a file", path.display())));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ConfigError::SoundRejected(format!(
            "{} is not an audio file",
            path.display()
        )));
    }

    if meta.len() > MAX_CUSTOM_SOUND_BYTES {
        return Err(ConfigError::SoundRejected(format!(
            "{} is larger than 5 MiB",
            path.display()
        )));
    }

    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    Ok(absolute.to_string_lossy().into_owned())
}

/// Read-modify-write access to the persisted configuration.
///
/// Every mutation loads the current document, changes it and writes the
/// whole thing back, so callers holding a stale `Config` cannot clobber
/// fields they did not touch.
#[derive(Clone, Copy)]
pub struct ConfigStore<'a> {
    store: &'a dyn KvStore,
}

impl<'a> ConfigStore<'a> {
    pub fn new(store: &'a dyn KvStore) -> Self {
        Self { store }
    }

    /// Load the configuration. Never fails: absence, store errors and
    /// corrupt documents all yield defaults.
    pub fn load(&self) -> Config {
        match self.store.get(CONFIG_KEY) {
            Ok(Some(raw)) => Config::merge_json(&raw).unwrap_or_else(|| {
                warn!("stored config is not a JSON object, using defaults");
                Config::default()
            }),
            Ok(None) => Config::default(),
            Err(e) => {
                warn!("failed to read config, using defaults: {e}");
                Config::default()
            }
        }
    }

    /// Persist the whole configuration in a single write.
    pub fn save(&self, config: &Config) -> Result<()> {
        let raw = serde_json::to_string(config)?;
        self.store.set(CONFIG_KEY, &raw)?;
        Ok(())
    }

    fn modify<T>(&self, f: impl FnOnce(&mut Config) -> T) -> Result<T> {
        let mut config = self.load();
        let out = f(&mut config);
        self.save(&config)?;
        Ok(out)
    }

    pub fn add_reminder(&self, reminder: CustomReminder) -> Result<()> {
        self.modify(|c| c.custom_reminders.push(reminder))
    }

    /// Returns whether a reminder was removed.
    pub fn remove_reminder(&self, id: &str) -> Result<bool> {
        self.modify(|c| {
            let before = c.custom_reminders.len();
            c.custom_reminders.retain(|r| r.id != id);
            c.custom_reminders.len() != before
        })
    }

    /// Returns whether a reminder with `id` existed.
    pub fn update_reminder(&self, id: &str, patch: ReminderPatch) -> Result<bool> {
        self.modify(|c| match c.reminder_mut(id) {
            Some(reminder) => {
                patch.apply(reminder);
                true
            }
            None => false,
        })
    }

    pub fn mark_notified(&self, id: &str, date: NaiveDate) -> Result<()> {
        self.modify(|c| {
            if let Some(reminder) = c.reminder_mut(id) {
                reminder.notified_dates.insert(date);
            }
        })
    }

    pub fn clear_notified(&self, id: &str, date: NaiveDate) -> Result<()> {
        self.modify(|c| {
            if let Some(reminder) = c.reminder_mut(id) {
                reminder.notified_dates.remove(&date);
            }
        })
    }

    /// Forget every reminder's firing history.
    pub fn clear_all_notified(&self) -> Result<()> {
        self.modify(|c| {
            for reminder in &mut c.custom_reminders {
                reminder.notified_dates.clear();
            }
        })
    }

    pub fn is_notified(&self, id: &str, date: NaiveDate) -> bool {
        self.load()
            .reminder(id)
            .is_some_and(|r| r.notified_dates.contains(&date))
    }

    /// Store (or clear) the opaque custom sound reference.
    pub fn save_custom_sound(&self, reference: Option<String>) -> Result<()> {
        debug!("custom sound reference updated");
        self.modify(|c| c.custom_sound_url = reference)
    }
}
