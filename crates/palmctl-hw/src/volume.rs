//! System output volume via PulseAudio/PipeWire (`pactl`), with ALSA
//! (`amixer`) as the fallback.

use palmctl_core::sinks::{SinkError, VolumeSink};
use std::process::Command;

/// Sets the default sink's volume. Repeated requests for the level that
/// was last applied are skipped, since the volume path fires every frame.
#[derive(Debug, Default)]
pub struct SystemVolume {
    last_applied: Option<u8>,
}

impl SystemVolume {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_applied(&self) -> Option<u8> {
        self.last_applied
    }
}

/// Run a command, mapping spawn failures and non-zero exits to `SinkError`.
fn run(program: &str, args: &[&str]) -> Result<(), SinkError> {
    let command = format!("{program} {}", args.join(" "));
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| SinkError::Command {
            command: command.clone(),
            reason: e.to_string(),
        })?;
    if output.status.success() {
        Ok(())
    } else {
        Err(SinkError::Command {
            command,
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

fn pactl_args(percent: u8) -> [String; 3] {
    [
        "set-sink-volume".to_string(),
        "@DEFAULT_SINK@".to_string(),
        format!("{percent}%"),
    ]
}

fn amixer_args(percent: u8) -> [String; 4] {
    [
        "-q".to_string(),
        "sset".to_string(),
        "Master".to_string(),
        format!("{percent}%"),
    ]
}

fn as_strs<const N: usize>(args: &[String; N]) -> Vec<&str> {
    args.iter().map(String::as_str).collect()
}

impl VolumeSink for SystemVolume {
    fn set_volume(&mut self, percent: u8) -> bool {
        let percent = percent.min(100);
        if self.last_applied == Some(percent) {
            return true;
        }

        let result = run("pactl", &as_strs(&pactl_args(percent))).or_else(|e| {
            tracing::debug!(error = %e, "pactl failed, trying amixer");
            run("amixer", &as_strs(&amixer_args(percent)))
        });

        match result {
            Ok(()) => {
                tracing::debug!(percent, "volume set");
                self.last_applied = Some(percent);
                true
            }
            Err(e) => {
                tracing::warn!(percent, error = %e, "failed to set volume");
                false
            }
        }
    }
}
