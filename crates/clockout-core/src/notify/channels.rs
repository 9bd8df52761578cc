//! Delivery channel contracts.
//!
//! The core never talks to an OS or a browser directly. Hosts hand the
//! dispatcher one implementation per channel; anything the host cannot do
//! is [`Unsupported`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// A single delivery medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Desktop,
    Tone,
    Flash,
    Haptic,
    Speech,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Desktop => "desktop",
            Channel::Tone => "tone",
            Channel::Flash => "flash",
            Channel::Haptic => "haptic",
            Channel::Speech => "speech",
        }
    }
}

/// How reminders are delivered, as chosen in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyMethod {
    #[default]
    All,
    Notification,
    Sound,
    Flash,
    Vibrate,
}

impl NotifyMethod {
    /// The channels a reminder fans out to. `Vibrate` is a mode of its own
    /// and is not part of `All`.
    pub fn channels(self) -> &'static [Channel] {
        match self {
            NotifyMethod::All => &[Channel::Desktop, Channel::Tone, Channel::Flash],
            NotifyMethod::Notification => &[Channel::Desktop],
            NotifyMethod::Sound => &[Channel::Tone],
            NotifyMethod::Flash => &[Channel::Flash],
            NotifyMethod::Vibrate => &[Channel::Haptic],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundType {
    #[default]
    Beep,
    Bell,
    Chime,
    Ding,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
}

/// One built-in tone. `repeat_after` plays the tone a second time after
/// the given gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneSpec {
    pub frequency_hz: u32,
    pub waveform: Waveform,
    pub duration: Duration,
    pub repeat_after: Option<Duration>,
}

impl SoundType {
    /// Built-in tone for this sound. `Custom` has no tone of its own and
    /// falls back to the beep.
    pub fn tone(self) -> ToneSpec {
        match self {
            SoundType::Bell => ToneSpec {
                frequency_hz: 1000,
                waveform: Waveform::Triangle,
                duration: Duration::from_millis(800),
                repeat_after: None,
            },
            SoundType::Chime => ToneSpec {
                frequency_hz: 1200,
                waveform: Waveform::Sine,
                duration: Duration::from_millis(600),
                repeat_after: Some(Duration::from_millis(400)),
            },
            SoundType::Ding => ToneSpec {
                frequency_hz: 1500,
                waveform: Waveform::Square,
                duration: Duration::from_millis(300),
                repeat_after: Some(Duration::from_millis(200)),
            },
            SoundType::Beep | SoundType::Custom => ToneSpec {
                frequency_hz: 800,
                waveform: Waveform::Sine,
                duration: Duration::from_millis(500),
                repeat_after: Some(Duration::from_millis(300)),
            },
        }
    }
}

/// Desktop notification permission as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    #[default]
    Default,
    Granted,
    Denied,
    Unsupported,
}

impl Permission {
    /// Whether the user (or the platform) has already answered.
    pub fn is_decided(self) -> bool {
        !matches!(self, Permission::Default)
    }
}

/// Per-notification display options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyOptions {
    /// Keep the notification until the user dismisses it.
    pub require_interaction: bool,
    /// Auto-dismiss delay when `require_interaction` is off.
    pub auto_close_delay: Duration,
}

impl Default for NotifyOptions {
    fn default() -> Self {
        Self {
            require_interaction: false,
            auto_close_delay: Duration::from_millis(5000),
        }
    }
}

impl NotifyOptions {
    pub fn sticky() -> Self {
        Self {
            require_interaction: true,
            ..Self::default()
        }
    }

    pub fn auto_close(delay: Duration) -> Self {
        Self {
            require_interaction: false,
            auto_close_delay: delay,
        }
    }
}

/// Text-to-speech request.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub locale: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            locale: "zh-CN".to_string(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// Runs when the user clicks a shown notification.
pub type ClickAction = Box<dyn FnMut() + Send>;

/// A shown desktop notification.
pub trait NotificationHandle {
    fn close(&mut self);

    /// Run `action` when the notification is clicked, then close it.
    /// Channels that cannot report clicks ignore this.
    fn on_click(&mut self, _action: ClickAction) {}
}

pub trait NotificationChannel {
    fn is_supported(&self) -> bool;
    fn permission(&self) -> Permission;
    fn request_permission(&mut self) -> Permission;
    /// Show a notification. Auto-dismiss per `options` is the channel's job.
    fn show(
        &mut self,
        title: &str,
        body: &str,
        options: &NotifyOptions,
    ) -> Result<Box<dyn NotificationHandle>, ChannelError>;
}

pub trait AudioChannel {
    fn play_tone(&mut self, tone: &ToneSpec) -> Result<(), ChannelError>;
    /// Play an opaque clip reference (a path, URL or data blob).
    fn play_clip(&mut self, clip: &str) -> Result<(), ChannelError>;
}

pub trait FlashChannel {
    fn flash(&mut self) -> Result<(), ChannelError>;
}

pub trait HapticChannel {
    fn vibrate(&mut self, pattern_ms: &[u64]) -> Result<(), ChannelError>;
}

pub trait SpeechChannel {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), ChannelError>;
}

/// Stand-in for any capability the host lacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl NotificationChannel for Unsupported {
    fn is_supported(&self) -> bool {
        false
    }

    fn permission(&self) -> Permission {
        Permission::Unsupported
    }

    fn request_permission(&mut self) -> Permission {
        Permission::Unsupported
    }

    fn show(
        &mut self,
        _title: &str,
        _body: &str,
        _options: &NotifyOptions,
    ) -> Result<Box<dyn NotificationHandle>, ChannelError> {
        Err(ChannelError::Unsupported)
    }
}

impl AudioChannel for Unsupported {
    fn play_tone(&mut self, _tone: &ToneSpec) -> Result<(), ChannelError> {
        Err(ChannelError::Unsupported)
    }

    fn play_clip(&mut self, _clip: &str) -> Result<(), ChannelError> {
        Err(ChannelError::Unsupported)
    }
}

impl FlashChannel for Unsupported {
    fn flash(&mut self) -> Result<(), ChannelError> {
        Err(ChannelError::Unsupported)
    }
}

impl HapticChannel for Unsupported {
    fn vibrate(&mut self, _pattern_ms: &[u64]) -> Result<(), ChannelError> {
        Err(ChannelError::Unsupported)
    }
}

impl SpeechChannel for Unsupported {
    fn speak(&mut self, _utterance: &Utterance) -> Result<(), ChannelError> {
        Err(ChannelError::Unsupported)
    }
}

/// The full set of channels a host provides.
pub struct Channels {
    pub notification: Box<dyn NotificationChannel>,
    pub audio: Box<dyn AudioChannel>,
    pub flash: Box<dyn FlashChannel>,
    pub haptic: Box<dyn HapticChannel>,
    pub speech: Box<dyn SpeechChannel>,
}

impl Channels {
    /// A host with no delivery capability at all.
    pub fn unsupported() -> Self {
        Self {
            notification: Box::new(Unsupported),
            audio: Box::new(Unsupported),
            flash: Box::new(Unsupported),
            haptic: Box::new(Unsupported),
            speech: Box::new(Unsupported),
        }
    }
}

impl Default for Channels {
    fn default() -> Self {
        Self::unsupported()
    }
}
