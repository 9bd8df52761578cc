//! Delivery channels for a terminal host.
//!
//! Desktop notifications and the flash go to stderr, tones are the terminal
//! bell. Custom clips and speech run an external program named by
//! `CLOCKOUT_PLAYER` / `CLOCKOUT_SPEECH_CMD`; without one they report
//! `Unsupported` and the core falls back on its own.

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};

use clockout_core::notify::{
    AudioChannel, Channels, FlashChannel, NotificationChannel, NotificationHandle, NotifyOptions,
    SpeechChannel, ToneSpec, Unsupported, Utterance,
};
use clockout_core::{ChannelError, Permission};
use tracing::{debug, warn};

const BELL: &str = "\x07";

pub fn channels() -> Channels {
    Channels {
        notification: Box::new(StderrNotifications),
        audio: Box::new(TerminalAudio),
        flash: Box::new(InverseFlash),
        haptic: Box::new(Unsupported),
        speech: Box::new(SpeechCommand),
    }
}

fn stderr_write(text: &str) -> Result<(), ChannelError> {
    let mut err = io::stderr().lock();
    err.write_all(text.as_bytes())
        .and_then(|()| err.flush())
        .map_err(|e| ChannelError::Failed(e.to_string()))
}

fn spawn_with(var: &str, arg: &str) -> Result<(), ChannelError> {
    let Some(program) = std::env::var_os(var).filter(|p| !p.is_empty()) else {
        return Err(ChannelError::Unsupported);
    };
    spawn_helper(program, arg)
        .map(drop)
        .map_err(|e| ChannelError::Failed(format!("{var}: {e}")))
}

/// Run `program arg` detached from our stdio. The returned thread waits on
/// the child, so a finished helper is reaped while `watch` keeps running.
fn spawn_helper(program: OsString, arg: &str) -> io::Result<JoinHandle<()>> {
    debug!(?program, "spawning helper");
    let mut child = Command::new(&program)
        .arg(arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => warn!(?program, %status, "helper failed"),
        Ok(_) => {}
        Err(e) => warn!(?program, "failed to wait on helper: {e}"),
    }))
}

struct StderrNotifications;

/// Terminal lines cannot be taken back or clicked.
struct PrintedNotification;

impl NotificationHandle for PrintedNotification {
    fn close(&mut self) {}
}

impl NotificationChannel for StderrNotifications {
    fn is_supported(&self) -> bool {
        true
    }

    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn request_permission(&mut self) -> Permission {
        Permission::Granted
    }

    fn show(
        &mut self,
        title: &str,
        body: &str,
        _options: &NotifyOptions,
    ) -> Result<Box<dyn NotificationHandle>, ChannelError> {
        stderr_write(&format!("\r\n\x1b[1m{title}\x1b[0m {body}\n"))?;
        Ok(Box::new(PrintedNotification))
    }
}

struct TerminalAudio;

impl AudioChannel for TerminalAudio {
    fn play_tone(&mut self, tone: &ToneSpec) -> Result<(), ChannelError> {
        let rings = if tone.repeat_after.is_some() { 2 } else { 1 };
        stderr_write(&BELL.repeat(rings))
    }

    fn play_clip(&mut self, clip: &str) -> Result<(), ChannelError> {
        spawn_with("CLOCKOUT_PLAYER", clip)
    }
}

struct InverseFlash;

impl FlashChannel for InverseFlash {
    fn flash(&mut self) -> Result<(), ChannelError> {
        stderr_write("\r\x1b[7m  clockout  \x1b[0m\n")
    }
}

struct SpeechCommand;

impl SpeechChannel for SpeechCommand {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), ChannelError> {
        spawn_with("CLOCKOUT_SPEECH_CMD", &utterance.text)
    }
}
