//! palmctl-hw — Platform capabilities for the gesture controller.
//!
//! V4L2 camera probing, the system volume sink, and MPRIS media keys over
//! the D-Bus session bus.

pub mod camera;
pub mod mpris;
pub mod volume;

pub use camera::{CameraError, CameraProbe, DeviceInfo};
pub use mpris::MprisMediaKeys;
pub use volume::SystemVolume;
