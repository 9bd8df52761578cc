//! Channels that record deliveries instead of performing them.
//!
//! Useful for dry runs and for asserting exactly what a shift delivered.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::channels::{
    AudioChannel, Channel, Channels, ClickAction, FlashChannel, HapticChannel, NotificationChannel,
    NotificationHandle, NotifyOptions, Permission, SpeechChannel, ToneSpec, Utterance,
};
use crate::error::ChannelError;

#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Desktop {
        title: String,
        body: String,
        options: NotifyOptions,
    },
    Closed {
        title: String,
    },
    Tone(ToneSpec),
    Clip(String),
    Flash,
    Haptic(Vec<u64>),
    Speech(Utterance),
}

/// Click actions registered on shown notifications, keyed by title.
#[derive(Default)]
struct ClickHandlers(Vec<(String, ClickAction)>);

impl fmt::Debug for ClickHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().map(|(title, _)| title)).finish()
    }
}

#[derive(Debug)]
struct State {
    deliveries: Vec<Delivery>,
    permission: Permission,
    permission_requests: usize,
    failing: HashSet<Channel>,
    failing_clips: bool,
    clicks: ClickHandlers,
}

/// Shared recorder. Every clone, and every channel handed out by
/// [`Recorder::channels`], writes to the same log.
#[derive(Debug, Clone)]
pub struct Recorder {
    state: Arc<Mutex<State>>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::with_permission(Permission::Granted)
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given desktop permission. A `Default` permission is
    /// granted on the first request.
    pub fn with_permission(permission: Permission) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                deliveries: Vec::new(),
                permission,
                permission_requests: 0,
                failing: HashSet::new(),
                failing_clips: false,
                clicks: ClickHandlers::default(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every delivery on `channel` fail.
    pub fn fail(&self, channel: Channel) {
        self.lock().failing.insert(channel);
    }

    /// Make clip playback fail while built-in tones keep working.
    pub fn fail_clips(&self) {
        self.lock().failing_clips = true;
    }

    pub fn channels(&self) -> Channels {
        Channels {
            notification: Box::new(self.clone()),
            audio: Box::new(self.clone()),
            flash: Box::new(self.clone()),
            haptic: Box::new(self.clone()),
            speech: Box::new(self.clone()),
        }
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.lock().deliveries.clone()
    }

    /// Titles of the desktop notifications shown so far, in order.
    pub fn titles(&self) -> Vec<String> {
        self.lock()
            .deliveries
            .iter()
            .filter_map(|d| match d {
                Delivery::Desktop { title, .. } => Some(title.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, channel: Channel) -> usize {
        self.lock()
            .deliveries
            .iter()
            .filter(|d| {
                let c = match d {
                    Delivery::Desktop { .. } => Channel::Desktop,
                    Delivery::Closed { .. } => return false,
                    Delivery::Tone(_) | Delivery::Clip(_) => Channel::Tone,
                    Delivery::Flash => Channel::Flash,
                    Delivery::Haptic(_) => Channel::Haptic,
                    Delivery::Speech(_) => Channel::Speech,
                };
                c == channel
            })
            .count()
    }

    /// Click every open notification titled `title`: run its click action
    /// and close it. Returns whether anything was clicked.
    pub fn click(&self, title: &str) -> bool {
        let mut actions = Vec::new();
        {
            let mut state = self.lock();
            let (hit, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.clicks.0)
                .into_iter()
                .partition(|(t, _)| t == title);
            state.clicks.0 = kept;
            for (t, action) in hit {
                state.deliveries.push(Delivery::Closed { title: t });
                actions.push(action);
            }
        }
        // Actions may call back into the recorder.
        let clicked = !actions.is_empty();
        for mut action in actions {
            action();
        }
        clicked
    }

    pub fn permission_requests(&self) -> usize {
        self.lock().permission_requests
    }

    pub fn clear(&self) {
        self.lock().deliveries.clear();
    }

    fn record(&self, channel: Channel, delivery: Delivery) -> Result<(), ChannelError> {
        let mut state = self.lock();
        if state.failing.contains(&channel) {
            return Err(ChannelError::Failed(format!("{channel:?} rigged to fail")));
        }
        state.deliveries.push(delivery);
        Ok(())
    }
}

struct RecordedHandle {
    recorder: Recorder,
    title: String,
}

impl NotificationHandle for RecordedHandle {
    fn close(&mut self) {
        let mut state = self.recorder.lock();
        state.clicks.0.retain(|(t, _)| *t != self.title);
        state.deliveries.push(Delivery::Closed {
            title: self.title.clone(),
        });
    }

    fn on_click(&mut self, action: ClickAction) {
        self.recorder.lock().clicks.0.push((self.title.clone(), action));
    }
}

impl NotificationChannel for Recorder {
    fn is_supported(&self) -> bool {
        self.lock().permission != Permission::Unsupported
    }

    fn permission(&self) -> Permission {
        self.lock().permission
    }

    fn request_permission(&mut self) -> Permission {
        let mut state = self.lock();
        state.permission_requests += 1;
        if state.permission == Permission::Default {
            state.permission = Permission::Granted;
        }
        state.permission
    }

    fn show(
        &mut self,
        title: &str,
        body: &str,
        options: &NotifyOptions,
    ) -> Result<Box<dyn NotificationHandle>, ChannelError> {
        self.record(
            Channel::Desktop,
            Delivery::Desktop {
                title: title.to_string(),
                body: body.to_string(),
                options: *options,
            },
        )?;
        Ok(Box::new(RecordedHandle {
            recorder: self.clone(),
            title: title.to_string(),
        }))
    }
}

impl AudioChannel for Recorder {
    fn play_tone(&mut self, tone: &ToneSpec) -> Result<(), ChannelError> {
        self.record(Channel::Tone, Delivery::Tone(*tone))
    }

    fn play_clip(&mut self, clip: &str) -> Result<(), ChannelError> {
        if self.lock().failing_clips {
            return Err(ChannelError::Failed(format!("cannot decode {clip}")));
        }
        self.record(Channel::Tone, Delivery::Clip(clip.to_string()))
    }
}

impl FlashChannel for Recorder {
    fn flash(&mut self) -> Result<(), ChannelError> {
        self.record(Channel::Flash, Delivery::Flash)
    }
}

impl HapticChannel for Recorder {
    fn vibrate(&mut self, pattern_ms: &[u64]) -> Result<(), ChannelError> {
        self.record(Channel::Haptic, Delivery::Haptic(pattern_ms.to_vec()))
    }
}

impl SpeechChannel for Recorder {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), ChannelError> {
        self.record(Channel::Speech, Delivery::Speech(utterance.clone()))
    }
}
