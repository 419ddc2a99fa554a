//! Action sinks: the volume setter and media-key sender the controller
//! drives, plus the shared media-key cooldown.
//!
//! Sinks never propagate errors to the controller. A failed dispatch is
//! logged and reported as `false`; the next frame retries naturally if the
//! gesture is still held.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use thiserror::Error;

pub const DEFAULT_MEDIA_COOLDOWN: Duration = Duration::from_secs(2);

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("`{command}` failed: {reason}")]
    Command { command: String, reason: String },
    #[error("no media player found")]
    NoPlayer,
    #[error("backend error: {0}")]
    Backend(String),
}

/// Sets the output volume, best effort.
pub trait VolumeSink {
    /// Returns whether the volume was applied.
    fn set_volume(&mut self, percent: u8) -> bool;
}

/// Media keys as seen by the controller.
pub trait MediaKeys {
    fn next_track(&mut self) -> bool;
    fn previous_track(&mut self) -> bool;
    fn play_pause(&mut self) -> bool;
    fn stop(&mut self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKey {
    Next,
    Previous,
    PlayPause,
    Stop,
}

impl MediaKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Previous => "previous",
            Self::PlayPause => "play_pause",
            Self::Stop => "stop",
        }
    }
}

/// Platform mechanism that actually delivers a media key.
pub trait MediaKeyBackend {
    fn send(&mut self, key: MediaKey) -> Result<(), SinkError>;
}

/// Source of the current time for cooldown bookkeeping.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, now: Instant) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Wraps a backend with one cooldown shared by all four keys, measured
/// from the last successful dispatch.
pub struct RateLimitedMediaKeys<B, C = SystemClock> {
    backend: B,
    clock: C,
    cooldown: Duration,
    last_dispatch: Option<Instant>,
}

impl<B: MediaKeyBackend> RateLimitedMediaKeys<B, SystemClock> {
    pub fn new(backend: B, cooldown: Duration) -> Self {
        Self::with_clock(backend, cooldown, SystemClock)
    }
}

impl<B: MediaKeyBackend, C: Clock> RateLimitedMediaKeys<B, C> {
    pub fn with_clock(backend: B, cooldown: Duration, clock: C) -> Self {
        Self {
            backend,
            clock,
            cooldown,
            last_dispatch: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn dispatch(&mut self, key: MediaKey) -> bool {
        let now = self.clock.now();
        if let Some(last) = self.last_dispatch {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.cooldown {
                tracing::debug!(
                    key = key.as_str(),
                    remaining_ms = (self.cooldown - elapsed).as_millis() as u64,
                    "media key suppressed by cooldown"
                );
                return false;
            }
        }

        match self.backend.send(key) {
            Ok(()) => {
                self.last_dispatch = Some(now);
                tracing::info!(key = key.as_str(), "media key sent");
                true
            }
            Err(e) => {
                tracing::warn!(key = key.as_str(), error = %e, "media key dispatch failed");
                false
            }
        }
    }
}

impl<B: MediaKeyBackend, C: Clock> MediaKeys for RateLimitedMediaKeys<B, C> {
    fn next_track(&mut self) -> bool {
        self.dispatch(MediaKey::Next)
    }

    fn previous_track(&mut self) -> bool {
        self.dispatch(MediaKey::Previous)
    }

    fn play_pause(&mut self) -> bool {
        self.dispatch(MediaKey::PlayPause)
    }

    fn stop(&mut self) -> bool {
        self.dispatch(MediaKey::Stop)
    }
}
