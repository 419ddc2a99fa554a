//! JSON-lines landmark stream produced by the extractor sidecar.
//!
//! One object per frame:
//!
//! ```json
//! {"timestamp_ms": 1200,
//!  "hands": [{"handedness": "Right", "landmarks": [[0.5, 0.8, 0.0], ...]}],
//!  "face": {"mesh": [[0.41, 0.22], ...]}}
//! ```
//!
//! `face` may also be `null` or `{"named": {"left_eye_outer": {"x": .., "y": ..}, ...}}`.

use crate::landmarks::{
    Detection, FaceLandmarks, HandLandmarks, Handedness, LandmarkError, LandmarkSource, Point,
};
use serde::Deserialize;
use std::io::BufRead;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WirePoint {
    Xyz([f32; 3]),
    Xy([f32; 2]),
}

impl From<WirePoint> for Point {
    fn from(p: WirePoint) -> Self {
        match p {
            WirePoint::Xyz([x, y, z]) => Point { x, y, z },
            WirePoint::Xy([x, y]) => Point::new(x, y),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireHand {
    handedness: Handedness,
    landmarks: Vec<WirePoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum WireFace {
    Mesh(Vec<WirePoint>),
    Named(FaceLandmarks),
}

#[derive(Debug, Deserialize)]
struct WireFrame {
    #[serde(default)]
    timestamp_ms: Option<u64>,
    #[serde(default)]
    hands: Vec<WireHand>,
    #[serde(default)]
    face: Option<WireFace>,
}

/// Decode one line into a detection. Individual hands or a face with the
/// wrong topology are dropped with a warning; the rest of the frame is kept.
pub fn parse_frame(line: &str, max_hands: usize) -> Result<Detection, LandmarkError> {
    let frame: WireFrame = serde_json::from_str(line)?;

    let mut hands = Vec::with_capacity(frame.hands.len());
    for hand in frame.hands {
        let points = hand.landmarks.into_iter().map(Point::from).collect();
        match HandLandmarks::from_points(hand.handedness, points) {
            Ok(h) => hands.push(h),
            Err(e) => tracing::warn!(error = %e, "dropping hand"),
        }
    }

    let face = match frame.face {
        None => None,
        Some(WireFace::Named(face)) => Some(face),
        Some(WireFace::Mesh(mesh)) => {
            let mesh: Vec<Point> = mesh.into_iter().map(Point::from).collect();
            match FaceLandmarks::from_mesh(&mesh) {
                Ok(face) => Some(face),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping face");
                    None
                }
            }
        }
    };

    let mut detection = Detection {
        hands,
        face,
        timestamp_ms: frame.timestamp_ms,
    };
    detection.enforce_hand_limits(max_hands);
    Ok(detection)
}

/// Reads detections from any buffered reader (extractor stdout, a
/// recorded file, an in-memory buffer).
pub struct LandmarkStream<R> {
    reader: R,
    max_hands: usize,
    line: Vec<u8>,
    line_no: u64,
}

impl<R: BufRead> LandmarkStream<R> {
    pub fn new(reader: R, max_hands: usize) -> Self {
        Self {
            reader,
            max_hands,
            line: Vec::new(),
            line_no: 0,
        }
    }

    /// Number of lines consumed so far, blank ones included.
    pub fn lines_read(&self) -> u64 {
        self.line_no
    }
}

impl<R: BufRead> LandmarkSource for LandmarkStream<R> {
    fn next_detection(&mut self) -> Result<Option<Detection>, LandmarkError> {
        loop {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let text = match std::str::from_utf8(&self.line) {
                Ok(text) => text.trim(),
                Err(e) => {
                    tracing::warn!(line = self.line_no, error = %e, "landmark frame is not UTF-8");
                    return Ok(Some(Detection::empty()));
                }
            };
            if text.is_empty() {
                continue;
            }

            return match parse_frame(text, self.max_hands) {
                Ok(detection) => Ok(Some(detection)),
                Err(e) => {
                    tracing::warn!(line = self.line_no, error = %e, "malformed landmark frame");
                    Ok(Some(Detection::empty()))
                }
            };
        }
    }
}
