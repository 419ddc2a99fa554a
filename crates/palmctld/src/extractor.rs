use crate::engine::EngineError;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use palmctl_core::landmarks::{Detection, LandmarkError, LandmarkSource};
use palmctl_core::{Config, LandmarkStream};
use std::io::BufReader;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::time::Duration;

/// How long the extractor gets to exit after SIGTERM before it is killed.
const TERM_GRACE: Duration = Duration::from_secs(1);
const TERM_POLL: Duration = Duration::from_millis(50);

/// Camera and model settings forwarded to the extractor.
pub fn extractor_args(config: &Config) -> Vec<String> {
    vec![
        "--camera-index".into(),
        config.camera_index.to_string(),
        "--width".into(),
        config.camera_width.to_string(),
        "--height".into(),
        config.camera_height.to_string(),
        "--min-confidence".into(),
        config.mediapipe_confidence.to_string(),
        "--max-hands".into(),
        config.max_hands.to_string(),
        "--window-scale".into(),
        config.window_scale.to_string(),
    ]
}

/// The landmark extractor child process. It owns the camera while it
/// runs; dropping this terminates and reaps it.
pub struct ExtractorProcess {
    child: Child,
    stream: LandmarkStream<BufReader<ChildStdout>>,
}

impl ExtractorProcess {
    pub fn spawn(config: &Config) -> Result<Self, EngineError> {
        let (program, leading) = config
            .extractor_command
            .split_first()
            .ok_or_else(|| EngineError::Spawn {
                program: String::new(),
                source: std::io::Error::other("extractor command is empty"),
            })?;

        let mut child = Command::new(program)
            .args(leading)
            .args(extractor_args(config))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: program.clone(),
                source,
            })?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(EngineError::Spawn {
                program: program.clone(),
                source: std::io::Error::other("stdout was not captured"),
            });
        };

        tracing::info!(pid = child.id(), program = %program, "landmark extractor spawned");

        Ok(Self {
            child,
            stream: LandmarkStream::new(BufReader::new(stdout), config.max_hands),
        })
    }

    pub fn pid(&self) -> Pid {
        Pid::from_raw(self.child.id() as i32)
    }
}

impl LandmarkSource for ExtractorProcess {
    fn next_detection(&mut self) -> Result<Option<Detection>, LandmarkError> {
        self.stream.next_detection()
    }
}

impl Drop for ExtractorProcess {
    fn drop(&mut self) {
        if let Ok(Some(status)) = self.child.try_wait() {
            tracing::info!(%status, "landmark extractor exited");
            return;
        }

        if let Err(e) = signal::kill(self.pid(), Signal::SIGTERM) {
            tracing::debug!(error = %e, "SIGTERM to extractor failed");
        }

        let polls = TERM_GRACE.as_millis() / TERM_POLL.as_millis();
        for _ in 0..polls {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    tracing::info!(%status, "landmark extractor stopped");
                    return;
                }
                Ok(None) => std::thread::sleep(TERM_POLL),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to poll extractor");
                    break;
                }
            }
        }

        tracing::warn!("extractor ignored SIGTERM, killing");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str) -> Config {
        Config {
            // Trailing extractor arguments become the script's positional
            // parameters and are ignored.
            extractor_command: vec!["sh".into(), "-c".into(), script.into()],
            ..Config::default()
        }
    }

    #[test]
    fn test_args_forward_camera_settings() {
        let config = Config {
            camera_index: 0,
            max_hands: 1,
            ..Config::default()
        };
        let args = extractor_args(&config);
        assert_eq!(args[0..2], ["--camera-index", "0"]);
        assert_eq!(args[2..6], ["--width", "1280", "--height", "720"]);
        assert_eq!(args[6..8], ["--min-confidence", "0.8"]);
        assert_eq!(args[8..10], ["--max-hands", "1"]);
        assert_eq!(args[10..12], ["--window-scale", "1"]);
    }

    #[test]
    fn test_reads_frames_from_child_stdout() {
        let config = shell(r#"echo '{"hands": []}'; echo '{"timestamp_ms": 5, "hands": []}'"#);
        let mut extractor = ExtractorProcess::spawn(&config).unwrap();

        let first = extractor.next_detection().unwrap().unwrap();
        assert!(first.hands.is_empty());
        let second = extractor.next_detection().unwrap().unwrap();
        assert_eq!(second.timestamp_ms, Some(5));
        assert!(extractor.next_detection().unwrap().is_none());
    }

    #[test]
    fn test_drop_terminates_running_child() {
        let extractor = ExtractorProcess::spawn(&shell("sleep 30")).unwrap();
        let pid = extractor.pid();
        drop(extractor);
        // Reaped: signalling the pid now fails.
        assert!(signal::kill(pid, None).is_err());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let config = Config {
            extractor_command: vec!["palmctl-no-such-extractor".into()],
            ..Config::default()
        };
        assert!(matches!(
            ExtractorProcess::spawn(&config),
            Err(EngineError::Spawn { .. })
        ));
    }
}
