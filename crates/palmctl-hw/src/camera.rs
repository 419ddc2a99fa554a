//! V4L2 camera probing via the `v4l` crate.
//!
//! Frames are captured by the landmark extractor, not by us. The daemon
//! only opens the device long enough to confirm it exists, supports video
//! capture, and accepts the requested resolution, then releases it so the
//! extractor can take it over.

use std::path::Path;
use thiserror::Error;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::FourCC;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device busy")]
    DeviceBusy,
    #[error("format negotiation failed: {0}")]
    FormatNegotiationFailed(String),
    #[error("{0} is not a video capture device")]
    NotCaptureDevice(String),
}

/// Info about a discovered V4L2 device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

/// What the driver agreed to when probed.
#[derive(Debug, Clone)]
pub struct CameraProbe {
    pub device_path: String,
    pub card: String,
    pub width: u32,
    pub height: u32,
    pub fourcc: FourCC,
}

/// `/dev/video{index}`.
pub fn device_path(index: u32) -> String {
    format!("/dev/video{index}")
}

/// Open the camera at `index`, request `width`x`height`, and report the
/// negotiated format. The device is closed again before returning.
pub fn probe(index: u32, width: u32, height: u32) -> Result<CameraProbe, CameraError> {
    let path = device_path(index);
    if !Path::new(&path).exists() {
        return Err(CameraError::DeviceNotFound(path));
    }

    let device = Device::with_path(&path).map_err(|e| {
        if e.to_string().contains("busy") || e.to_string().contains("EBUSY") {
            CameraError::DeviceBusy
        } else {
            CameraError::DeviceNotFound(format!("{path}: {e}"))
        }
    })?;

    let caps = device
        .query_caps()
        .map_err(|e| CameraError::DeviceNotFound(format!("{path}: failed to query capabilities: {e}")))?;
    if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
        return Err(CameraError::NotCaptureDevice(path));
    }

    let mut fmt = device.format().map_err(|e| {
        CameraError::FormatNegotiationFailed(format!("failed to get format: {e}"))
    })?;
    fmt.width = width;
    fmt.height = height;

    let negotiated = device.set_format(&fmt).map_err(|e| {
        CameraError::FormatNegotiationFailed(format!("failed to set format: {e}"))
    })?;

    if negotiated.width != width || negotiated.height != height {
        tracing::warn!(
            requested_width = width,
            requested_height = height,
            width = negotiated.width,
            height = negotiated.height,
            "camera did not accept requested resolution"
        );
    }

    tracing::info!(
        device = %path,
        card = %caps.card,
        width = negotiated.width,
        height = negotiated.height,
        fourcc = ?negotiated.fourcc,
        "camera probed"
    );

    Ok(CameraProbe {
        device_path: path,
        card: caps.card,
        width: negotiated.width,
        height: negotiated.height,
        fourcc: negotiated.fourcc,
    })
}

/// List available V4L2 video capture devices.
pub fn list_devices() -> Vec<DeviceInfo> {
    let mut devices = Vec::new();

    for i in 0..16 {
        let path = device_path(i);
        if !Path::new(&path).exists() {
            continue;
        }
        let Ok(dev) = Device::with_path(&path) else {
            continue;
        };
        let Ok(caps) = dev.query_caps() else {
            continue;
        };
        if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            continue;
        }
        devices.push(DeviceInfo {
            path,
            name: caps.card.clone(),
            driver: caps.driver.clone(),
            bus: caps.bus.clone(),
        });
    }

    devices
}
