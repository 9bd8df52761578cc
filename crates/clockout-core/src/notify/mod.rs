//! Multi-channel reminder delivery.
//!
//! The [`Dispatcher`] turns "remind the user" into calls on whichever
//! channels the configured [`NotifyMethod`] selects. It owns the shift-level
//! one-shot flags (lunch, off-work, break) and the in-memory cache of custom
//! reminders already fired today. The durable per-date markers live in the
//! configuration and are only touched through [`ConfigStore`].

mod channels;
pub mod recording;

pub use channels::{
    AudioChannel, Channel, Channels, ClickAction, FlashChannel, HapticChannel, NotificationChannel,
    NotificationHandle, NotifyMethod, NotifyOptions, Permission, SoundType, SpeechChannel,
    ToneSpec, Unsupported, Utterance, Waveform,
};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::error::ChannelError;
use crate::storage::{Config, ConfigStore, CustomReminder};

/// Vibration pattern in milliseconds: buzz, gap, buzz, gap, buzz.
pub const HAPTIC_PATTERN: [u64; 5] = [200, 100, 200, 100, 200];

const BREAK_AUTO_CLOSE: Duration = Duration::from_secs(15);
const CUSTOM_AUTO_CLOSE: Duration = Duration::from_secs(10);

const CUSTOM_FALLBACK_BODY: &str = "Scheduled reminder";

/// The built-in shift reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKind {
    Lunch,
    OffWork,
    Break,
}

impl ReminderKind {
    pub fn title(self) -> &'static str {
        match self {
            ReminderKind::Lunch => "Lunch time!",
            ReminderKind::OffWork => "Time to clock out!",
            ReminderKind::Break => "Take a break!",
        }
    }

    pub fn body(self) -> &'static str {
        match self {
            ReminderKind::Lunch => "Time to step away and enjoy your lunch break.",
            ReminderKind::OffWork => "Long day. You can go home now.",
            ReminderKind::Break => {
                "You have been at it for a while. Stand up, look at something far away and stretch."
            }
        }
    }

    /// Lunch and off-work stay until dismissed; the break reminder goes
    /// away with its prompt.
    pub fn options(self) -> NotifyOptions {
        match self {
            ReminderKind::Lunch | ReminderKind::OffWork => NotifyOptions::sticky(),
            ReminderKind::Break => NotifyOptions::auto_close(BREAK_AUTO_CLOSE),
        }
    }
}

/// What happened to one `dispatch` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub delivered: Vec<Channel>,
    pub failed: Vec<(Channel, ChannelError)>,
}

impl DispatchReport {
    pub fn any_delivered(&self) -> bool {
        !self.delivered.is_empty()
    }

    fn record(&mut self, channel: Channel, result: Result<(), ChannelError>) {
        match result {
            Ok(()) => self.delivered.push(channel),
            Err(e) => {
                debug!(?channel, "delivery failed: {e}");
                self.failed.push((channel, e));
            }
        }
    }
}

pub struct Dispatcher {
    channels: Channels,
    method: NotifyMethod,
    sound: SoundType,
    custom_sound: Option<String>,
    permission: Permission,
    lunch_notified: bool,
    off_work_notified: bool,
    break_notified: bool,
    fired_reminders: HashSet<(String, NaiveDate)>,
    sticky: Vec<Box<dyn NotificationHandle>>,
    click_hook: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl Dispatcher {
    pub fn new(channels: Channels) -> Self {
        Self {
            channels,
            method: NotifyMethod::default(),
            sound: SoundType::default(),
            custom_sound: None,
            permission: Permission::Default,
            lunch_notified: false,
            off_work_notified: false,
            break_notified: false,
            fired_reminders: HashSet::new(),
            sticky: Vec::new(),
            click_hook: None,
        }
    }

    /// Run `hook` whenever the user clicks one of our desktop notifications,
    /// typically to bring the host window forward.
    pub fn on_click(&mut self, hook: impl Fn() + Send + Sync + 'static) {
        self.click_hook = Some(Arc::new(hook));
    }

    /// Apply delivery preferences and settle desktop permission.
    ///
    /// Asks the channel for permission only while the answer is still
    /// undecided, so repeated calls never re-prompt.
    pub fn init(&mut self, config: &Config) {
        self.apply_config(config);

        if !self.channels.notification.is_supported() {
            self.permission = Permission::Unsupported;
            return;
        }
        if self.permission.is_decided() {
            return;
        }
        self.permission = self.channels.notification.permission();
        if !self.permission.is_decided() {
            self.permission = self.channels.notification.request_permission();
            info!(permission = ?self.permission, "desktop notification permission requested");
        }
    }

    /// Pick up changed delivery preferences without touching permission
    /// or any one-shot state.
    pub fn apply_config(&mut self, config: &Config) {
        self.method = config.notify_method;
        self.sound = config.sound_type;
        self.custom_sound = config.custom_sound_url.clone();
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    pub fn method(&self) -> NotifyMethod {
        self.method
    }

    /// Fan a reminder out to every channel of the configured method.
    /// Channel failures are recorded in the report and never stop the
    /// remaining channels.
    pub fn dispatch(&mut self, title: &str, body: &str, options: &NotifyOptions) -> DispatchReport {
        let mut report = DispatchReport::default();
        for &channel in self.method.channels() {
            let result = match channel {
                Channel::Desktop => self.show_desktop(title, body, options),
                Channel::Tone => self.play_sound(),
                Channel::Flash => self.channels.flash.flash(),
                Channel::Haptic => self.channels.haptic.vibrate(&HAPTIC_PATTERN),
                Channel::Speech => self.channels.speech.speak(&Utterance::new(body)),
            };
            report.record(channel, result);
        }
        report
    }

    fn show_desktop(&mut self, title: &str, body: &str, options: &NotifyOptions) -> Result<(), ChannelError> {
        match self.permission {
            Permission::Granted => {}
            Permission::Unsupported => return Err(ChannelError::Unsupported),
            Permission::Default | Permission::Denied => return Err(ChannelError::PermissionDenied),
        }
        let mut handle = self.channels.notification.show(title, body, options)?;
        if let Some(hook) = &self.click_hook {
            let hook = Arc::clone(hook);
            handle.on_click(Box::new(move || hook()));
        }
        if options.require_interaction {
            self.sticky.push(handle);
        }
        Ok(())
    }

    fn play_sound(&mut self) -> Result<(), ChannelError> {
        if self.sound == SoundType::Custom {
            if let Some(clip) = &self.custom_sound {
                match self.channels.audio.play_clip(clip) {
                    Ok(()) => return Ok(()),
                    Err(e) => warn!("custom sound failed, falling back to beep: {e}"),
                }
            }
        }
        self.channels.audio.play_tone(&self.sound.tone())
    }

    /// Read `text` aloud. Returns whether the speech channel accepted it.
    pub fn speak(&mut self, text: &str) -> bool {
        match self.channels.speech.speak(&Utterance::new(text)) {
            Ok(()) => true,
            Err(e) => {
                debug!("speech unavailable: {e}");
                false
            }
        }
    }

    /// Play the configured reminder sound on its own.
    pub fn test_sound(&mut self) -> DispatchReport {
        let mut report = DispatchReport::default();
        let result = self.play_sound();
        report.record(Channel::Tone, result);
        report
    }

    /// Deliver a built-in reminder without touching its one-shot flag.
    pub fn preview(&mut self, kind: ReminderKind) -> DispatchReport {
        self.dispatch(kind.title(), kind.body(), &kind.options())
    }

    /// Deliver a custom reminder without recording that it fired.
    pub fn preview_custom(&mut self, reminder: &CustomReminder) -> DispatchReport {
        let body = custom_body(reminder);
        self.dispatch(&reminder.title, body, &NotifyOptions::auto_close(CUSTOM_AUTO_CLOSE))
    }

    fn notify_once(&mut self, kind: ReminderKind) -> bool {
        let flag = match kind {
            ReminderKind::Lunch => &mut self.lunch_notified,
            ReminderKind::OffWork => &mut self.off_work_notified,
            ReminderKind::Break => &mut self.break_notified,
        };
        if *flag {
            return false;
        }
        *flag = true;
        self.preview(kind);
        true
    }

    /// Lunch reminder, once per shift. Returns whether it fired.
    pub fn notify_lunch(&mut self) -> bool {
        self.notify_once(ReminderKind::Lunch)
    }

    /// Off-work reminder, once per shift. Returns whether it fired.
    pub fn notify_off_work(&mut self) -> bool {
        self.notify_once(ReminderKind::OffWork)
    }

    /// Break reminder, once until the break is taken or skipped.
    pub fn notify_break(&mut self) -> bool {
        self.notify_once(ReminderKind::Break)
    }

    /// Re-arm the break reminder after a break ends or is skipped.
    pub fn rearm_break(&mut self) {
        self.break_notified = false;
    }

    pub fn lunch_notified(&self) -> bool {
        self.lunch_notified
    }

    pub fn off_work_notified(&self) -> bool {
        self.off_work_notified
    }

    pub fn break_notified(&self) -> bool {
        self.break_notified
    }

    /// Fire one custom reminder for `date` unless it already fired, either
    /// in this process or according to the persisted markers. Returns
    /// whether it fired.
    pub fn notify_custom_reminder(
        &mut self,
        reminder: &CustomReminder,
        date: NaiveDate,
        configs: &ConfigStore<'_>,
    ) -> bool {
        let key = (reminder.id.clone(), date);
        if self.fired_reminders.contains(&key) {
            return false;
        }
        if reminder.notified_dates.contains(&date) || configs.is_notified(&reminder.id, date) {
            self.fired_reminders.insert(key);
            return false;
        }

        self.preview_custom(reminder);
        self.fired_reminders.insert(key);

        if let Err(e) = configs.mark_notified(&reminder.id, date) {
            warn!(id = %reminder.id, "failed to persist reminder marker: {e}");
        }
        info!(id = %reminder.id, %date, "custom reminder fired");
        true
    }

    /// Fire every enabled reminder due at `now`'s hour and minute, in list
    /// order. A reminder with `repeat` off only ever fires on one date.
    /// Returns the ids that fired.
    pub fn check_custom_reminders(
        &mut self,
        reminders: &[CustomReminder],
        now: NaiveDateTime,
        configs: &ConfigStore<'_>,
    ) -> Vec<String> {
        let today = now.date();
        let mut fired = Vec::new();
        for reminder in reminders {
            if !reminder.enabled || !reminder.is_due_at(now) {
                continue;
            }
            if !reminder.repeat && reminder.notified_dates.iter().any(|d| *d != today) {
                continue;
            }
            if self.notify_custom_reminder(reminder, today, configs) {
                fired.push(reminder.id.clone());
            }
        }
        fired
    }

    /// Clear the shift-level flags and close any notification still
    /// waiting for the user.
    pub fn reset(&mut self) {
        self.lunch_notified = false;
        self.off_work_notified = false;
        self.break_notified = false;
        for mut handle in self.sticky.drain(..) {
            handle.close();
        }
    }

    /// Forget which custom reminders fired in this process. Persisted
    /// markers are untouched.
    pub fn reset_custom_reminders(&mut self) {
        self.fired_reminders.clear();
    }
}

fn custom_body(reminder: &CustomReminder) -> &str {
    if reminder.content.trim().is_empty() {
        CUSTOM_FALLBACK_BODY
    } else {
        &reminder.content
    }
}
