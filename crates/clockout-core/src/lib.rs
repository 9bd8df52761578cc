//! # Clockout Core Library
//!
//! This library provides the core logic for the clockout work-shift
//! countdown. It implements a CLI-first philosophy: the library owns every
//! rule about a shift, and hosts (the `clockout` binary, or any GUI) only
//! drive the tick loop and provide delivery channels.
//!
//! ## Architecture
//!
//! - **Shift Timer**: A wall-clock-based state machine that requires the
//!   caller to periodically invoke `tick()`
//! - **Storage**: Key-value persistence (SQLite or in-memory) holding the
//!   JSON configuration and the current session
//! - **Notifications**: A dispatcher fanning reminders out to desktop, tone,
//!   flash, haptic and speech channels supplied by the host
//!
//! ## Key Components
//!
//! - [`ShiftTimer`]: Core shift state machine
//! - [`ShiftBoundaries`]: Start, lunch and end computation
//! - [`Config`] / [`ConfigStore`]: Settings and custom reminders
//! - [`Dispatcher`]: One-shot reminder delivery

pub mod clock;
pub mod error;
pub mod events;
pub mod notify;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ChannelError, ConfigError, CoreError, Result, StoreError, ValidationError};
pub use events::Event;
pub use notify::{Channels, DispatchReport, Dispatcher, NotifyMethod, Permission, ReminderKind, SoundType};
pub use storage::{Config, ConfigStore, CustomReminder, KvStore, MemoryStore, ReminderPatch, SqliteStore};
pub use timer::{Phase, ShiftBoundaries, ShiftTimer, Snapshot, Status};
