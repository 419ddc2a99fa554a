use crate::extractor::ExtractorProcess;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use palmctl_core::controller::{ControlAction, FrameReport, InteractionController};
use palmctl_core::landmarks::LandmarkSource;
use palmctl_core::sinks::{MediaKeys, RateLimitedMediaKeys, VolumeSink};
use palmctl_core::{Config, InteractionMode, LandmarkError, MediaGestureMode, PlayPauseState};
use palmctl_hw::{MprisMediaKeys, SystemVolume};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{oneshot, watch};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("camera error: {0}")]
    Camera(#[from] palmctl_hw::CameraError),
    #[error("failed to start landmark extractor `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("landmark stream error: {0}")]
    Landmark(#[from] LandmarkError),
    #[error("failed to spawn engine thread: {0}")]
    Thread(std::io::Error),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Latest controller state, published after every frame.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub mode: InteractionMode,
    pub play_pause: PlayPauseState,
    pub media_gesture_mode: MediaGestureMode,
    pub head_angle: Option<f32>,
    pub face_detected: bool,
    pub blocked_by_face: bool,
    pub hands: usize,
    pub last_volume: Option<u8>,
    pub last_action: Option<ControlAction>,
    pub frames: u64,
}

impl StatusSnapshot {
    pub fn new(config: &Config) -> Self {
        Self {
            mode: InteractionMode::Idle,
            play_pause: PlayPauseState::Waiting,
            media_gesture_mode: config.media_gesture_mode,
            head_angle: None,
            face_detected: false,
            blocked_by_face: false,
            hands: 0,
            last_volume: None,
            last_action: None,
            frames: 0,
        }
    }

    pub fn record(&mut self, report: &FrameReport) {
        self.frames += 1;
        self.mode = report.mode;
        self.play_pause = report.play_pause;
        self.head_angle = report.head_angle;
        self.face_detected = report.face_detected;
        self.blocked_by_face = report.blocked_by_face;
        self.hands = report.hands.len();
        if report.volume.is_some() {
            self.last_volume = report.volume;
        }
        if let Some(action) = report.delivered().last() {
            self.last_action = Some(action);
        }
    }
}

/// Cooperative stop: the frame loop checks the flag between frames, and
/// the extractor is signalled so a blocked read returns.
#[derive(Clone)]
pub struct Stopper {
    shutdown: Arc<AtomicBool>,
    extractor: Option<Pid>,
}

impl Stopper {
    pub fn stop(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(pid) = self.extractor {
            if let Err(e) = signal::kill(pid, Signal::SIGTERM) {
                tracing::debug!(error = %e, "extractor already gone");
            }
        }
    }
}

/// Handle to the running engine thread.
pub struct EngineHandle {
    status: watch::Receiver<StatusSnapshot>,
    stopper: Stopper,
    done: oneshot::Receiver<Result<u64, EngineError>>,
}

impl EngineHandle {
    pub fn status(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.clone()
    }

    pub fn stopper(&self) -> Stopper {
        self.stopper.clone()
    }

    /// Wait for the frame loop to finish. Resolves to the number of
    /// frames processed.
    pub async fn wait(self) -> Result<u64, EngineError> {
        self.done.await.map_err(|_| EngineError::ChannelClosed)?
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// Probes the camera and starts the landmark extractor synchronously so
/// startup fails fast, then runs the frame loop until the stream ends or
/// a stop is requested.
pub fn spawn_engine(config: &Config) -> Result<EngineHandle, EngineError> {
    palmctl_hw::camera::probe(config.camera_index, config.camera_width, config.camera_height)?;

    let mut extractor = ExtractorProcess::spawn(config)?;
    let shutdown = Arc::new(AtomicBool::new(false));
    let stopper = Stopper {
        shutdown: shutdown.clone(),
        extractor: Some(extractor.pid()),
    };

    let (status_tx, status_rx) = watch::channel(StatusSnapshot::new(config));
    let (done_tx, done_rx) = oneshot::channel();
    let config = config.clone();

    std::thread::Builder::new()
        .name("palmctl-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            let media_keys =
                RateLimitedMediaKeys::new(MprisMediaKeys::new(), config.media_cooldown());
            let mut controller =
                InteractionController::new(&config, SystemVolume::new(), media_keys);

            let result = run_loop(&mut extractor, &mut controller, &shutdown, |report| {
                status_tx.send_modify(|status| status.record(report));
            });
            drop(extractor);

            match &result {
                Ok(frames) => tracing::info!(frames, "engine thread exiting"),
                Err(e) => tracing::error!(error = %e, "engine thread failed"),
            }
            let _ = done_tx.send(result);
        })
        .map_err(EngineError::Thread)?;

    Ok(EngineHandle {
        status: status_rx,
        stopper,
        done: done_rx,
    })
}

/// Drive the controller with frames from `source`, in order, until the
/// source ends or `shutdown` is set. Returns the number of frames processed.
pub fn run_loop<S, V, M, F>(
    source: &mut S,
    controller: &mut InteractionController<V, M>,
    shutdown: &AtomicBool,
    mut on_frame: F,
) -> Result<u64, EngineError>
where
    S: LandmarkSource,
    V: VolumeSink,
    M: MediaKeys,
    F: FnMut(&FrameReport),
{
    let mut frames = 0u64;
    while !shutdown.load(Ordering::SeqCst) {
        let Some(detection) = source.next_detection()? else {
            tracing::info!("landmark stream ended");
            break;
        };
        let report = controller.process(&detection, Instant::now());
        frames += 1;
        on_frame(&report);
    }
    Ok(frames)
}
