//! Offline replay of a recorded landmark stream through the controller.
//!
//! Sinks are dry-run: volume always succeeds and media keys are accepted
//! by a no-op backend, but the shared media-key cooldown still runs on
//! the recording's own clock, so the output matches what the daemon
//! would have dispatched.

use palmctl_core::controller::{DispatchedAction, InteractionController};
use palmctl_core::landmarks::{LandmarkError, LandmarkSource};
use palmctl_core::sinks::{ManualClock, MediaKey, MediaKeyBackend, RateLimitedMediaKeys, SinkError, VolumeSink};
use palmctl_core::Config;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Assumed spacing of frames that carry no timestamp (~30 fps).
const FRAME_INTERVAL_MS: u64 = 33;

#[derive(Debug, Clone, Copy)]
struct DryRun;

impl VolumeSink for DryRun {
    fn set_volume(&mut self, _percent: u8) -> bool {
        true
    }
}

impl MediaKeyBackend for DryRun {
    fn send(&mut self, _key: MediaKey) -> Result<(), SinkError> {
        Ok(())
    }
}

/// One action the controller invoked during replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayEvent {
    pub frame: u64,
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: DispatchedAction,
}

#[derive(Debug, Default)]
pub struct ReplaySummary {
    pub frames: u64,
    pub events: Vec<ReplayEvent>,
}

pub fn replay<S: LandmarkSource>(source: &mut S, config: &Config) -> Result<ReplaySummary, LandmarkError> {
    let start = Instant::now();
    let clock = ManualClock::new(start);
    let media_keys = RateLimitedMediaKeys::with_clock(DryRun, config.media_cooldown(), clock.clone());
    let mut controller = InteractionController::new(config, DryRun, media_keys);

    let mut summary = ReplaySummary::default();
    let mut last_ms = 0u64;

    while let Some(detection) = source.next_detection()? {
        let at_ms = match detection.timestamp_ms {
            // Keep time monotonic even if the recording jitters backwards.
            Some(ts) => ts.max(last_ms),
            None if summary.frames == 0 => 0,
            None => last_ms + FRAME_INTERVAL_MS,
        };
        last_ms = at_ms;

        let now = start + Duration::from_millis(at_ms);
        clock.set(now);
        let report = controller.process(&detection, now);

        summary.events.extend(report.actions.into_iter().map(|action| ReplayEvent {
            frame: summary.frames,
            at_ms,
            action,
        }));
        summary.frames += 1;
    }

    Ok(summary)
}
