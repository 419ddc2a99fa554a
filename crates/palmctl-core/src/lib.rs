//! palmctl-core — Hand and face landmark interpretation for media control.
//!
//! Classifies hand poses and head tilt from per-frame landmarks, guards
//! against hands near the face, and drives volume and media-key sinks
//! through the interaction controller. No platform I/O lives here.

pub mod config;
pub mod controller;
pub mod head_tilt;
pub mod landmarks;
pub mod pose;
pub mod proximity;
pub mod sinks;
pub mod stabilizer;
pub mod stream;

#[cfg(test)]
mod testing;

pub use config::{Config, ConfigError, MediaGestureMode};
pub use controller::{
    map_distance_to_volume, ControlAction, DispatchedAction, FrameReport, InteractionController,
    InteractionMode, PlayPauseState,
};
pub use landmarks::{Detection, FaceLandmarks, HandLandmarks, Handedness, LandmarkError, LandmarkSource};
pub use pose::{Direction, PoseClassification};
pub use sinks::{MediaKey, MediaKeyBackend, MediaKeys, RateLimitedMediaKeys, SinkError, VolumeSink};
pub use stream::LandmarkStream;
