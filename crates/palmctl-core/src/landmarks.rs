//! Fixed-shape hand and face landmark sets.
//!
//! Coordinates are normalized to the camera frame: `x` and `y` in [0, 1]
//! with `y` growing downward. `z` is carried through but never consulted
//! by the classifiers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of points in a hand landmark set.
pub const HAND_LANDMARK_COUNT: usize = 21;

// Face-mesh indices of the points the controller consumes.
const MESH_NOSE_TIP: usize = 1;
const MESH_FOREHEAD: usize = 10;
const MESH_LEFT_EYE_OUTER: usize = 33;
const MESH_CHIN: usize = 152;
const MESH_LEFT_CHEEK: usize = 234;
const MESH_RIGHT_EYE_OUTER: usize = 263;
const MESH_RIGHT_CHEEK: usize = 454;

#[derive(Error, Debug)]
pub enum LandmarkError {
    #[error("hand has {got} landmarks, expected {expected}")]
    WrongPointCount { expected: usize, got: usize },
    #[error("face mesh has {got} points, need at least {needed}")]
    FaceMeshTooShort { needed: usize, got: usize },
    #[error("malformed frame: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("landmark stream read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A normalized landmark coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Planar Euclidean distance; depth is ignored.
    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        Point {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z: (self.z + other.z) / 2.0,
        }
    }
}

/// Which hand a landmark set belongs to, as labelled by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
}

/// Named positions in the 21-point hand topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// The four non-thumb fingers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    pub fn tip(self) -> HandLandmark {
        match self {
            Finger::Index => HandLandmark::IndexTip,
            Finger::Middle => HandLandmark::MiddleTip,
            Finger::Ring => HandLandmark::RingTip,
            Finger::Pinky => HandLandmark::PinkyTip,
        }
    }

    /// Proximal interphalangeal joint, the reference for curl tests.
    pub fn pip(self) -> HandLandmark {
        match self {
            Finger::Index => HandLandmark::IndexPip,
            Finger::Middle => HandLandmark::MiddlePip,
            Finger::Ring => HandLandmark::RingPip,
            Finger::Pinky => HandLandmark::PinkyPip,
        }
    }
}

/// One hand's landmarks for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    pub handedness: Handedness,
    points: [Point; HAND_LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(handedness: Handedness, points: [Point; HAND_LANDMARK_COUNT]) -> Self {
        Self { handedness, points }
    }

    /// Build from a variable-length point list, rejecting any other topology.
    pub fn from_points(handedness: Handedness, points: Vec<Point>) -> Result<Self, LandmarkError> {
        let got = points.len();
        let points: [Point; HAND_LANDMARK_COUNT] =
            points.try_into().map_err(|_| LandmarkError::WrongPointCount {
                expected: HAND_LANDMARK_COUNT,
                got,
            })?;
        Ok(Self { handedness, points })
    }

    pub fn point(&self, landmark: HandLandmark) -> Point {
        self.points[landmark as usize]
    }

    pub fn set_point(&mut self, landmark: HandLandmark, point: Point) {
        self.points[landmark as usize] = point;
    }

    pub fn points(&self) -> &[Point; HAND_LANDMARK_COUNT] {
        &self.points
    }
}

/// The named subset of face points consumed by head-tilt and proximity checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceLandmarks {
    /// Outer corner of the eye on the image-left side.
    pub left_eye_outer: Point,
    /// Outer corner of the eye on the image-right side.
    pub right_eye_outer: Point,
    pub nose_tip: Point,
    pub forehead: Point,
    pub chin: Point,
    pub left_cheek: Point,
    pub right_cheek: Point,
}

impl FaceLandmarks {
    /// Pick the named points out of a full face mesh (468 or 478 points).
    pub fn from_mesh(mesh: &[Point]) -> Result<Self, LandmarkError> {
        let needed = MESH_RIGHT_CHEEK + 1;
        if mesh.len() < needed {
            return Err(LandmarkError::FaceMeshTooShort {
                needed,
                got: mesh.len(),
            });
        }
        Ok(Self {
            left_eye_outer: mesh[MESH_LEFT_EYE_OUTER],
            right_eye_outer: mesh[MESH_RIGHT_EYE_OUTER],
            nose_tip: mesh[MESH_NOSE_TIP],
            forehead: mesh[MESH_FOREHEAD],
            chin: mesh[MESH_CHIN],
            left_cheek: mesh[MESH_LEFT_CHEEK],
            right_cheek: mesh[MESH_RIGHT_CHEEK],
        })
    }

    /// Contour points used by the face-proximity guard.
    pub fn contour(&self) -> [Point; 5] {
        [
            self.forehead,
            self.chin,
            self.left_cheek,
            self.right_cheek,
            self.nose_tip,
        ]
    }
}

/// Everything the landmark extractor reported for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    pub hands: Vec<HandLandmarks>,
    pub face: Option<FaceLandmarks>,
    /// Extractor-side capture time, when the stream carries one.
    pub timestamp_ms: Option<u64>,
}

impl Detection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn hand(&self, handedness: Handedness) -> Option<&HandLandmarks> {
        self.hands.iter().find(|h| h.handedness == handedness)
    }

    /// Enforce the per-frame hand invariants: at most one hand per label
    /// and at most `max_hands` hands. Later duplicates are dropped.
    pub fn enforce_hand_limits(&mut self, max_hands: usize) {
        let mut seen_left = false;
        let mut seen_right = false;
        self.hands.retain(|hand| {
            let seen = match hand.handedness {
                Handedness::Left => &mut seen_left,
                Handedness::Right => &mut seen_right,
            };
            if *seen {
                tracing::warn!(handedness = ?hand.handedness, "duplicate hand label, dropping");
                return false;
            }
            *seen = true;
            true
        });
        self.hands.truncate(max_hands);
    }
}

/// Producer of per-frame detections (the external landmark engine).
pub trait LandmarkSource {
    /// Next frame's detection, or `None` once the source is exhausted.
    fn next_detection(&mut self) -> Result<Option<Detection>, LandmarkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_hand(handedness: Handedness) -> HandLandmarks {
        HandLandmarks::new(handedness, [Point::new(0.5, 0.5); HAND_LANDMARK_COUNT])
    }

    #[test]
    fn test_from_points_rejects_wrong_topology() {
        let err = HandLandmarks::from_points(Handedness::Left, vec![Point::default(); 20]).unwrap_err();
        assert!(matches!(
            err,
            LandmarkError::WrongPointCount { expected: 21, got: 20 }
        ));
    }

    #[test]
    fn test_point_lookup_by_name() {
        let mut points = vec![Point::default(); HAND_LANDMARK_COUNT];
        points[8] = Point::new(0.25, 0.75);
        let hand = HandLandmarks::from_points(Handedness::Right, points).unwrap();
        assert_eq!(hand.point(HandLandmark::IndexTip), Point::new(0.25, 0.75));
        assert_eq!(hand.point(HandLandmark::PinkyTip), Point::default());
        assert_eq!(HandLandmark::PinkyTip as usize, HAND_LANDMARK_COUNT - 1);
    }

    #[test]
    fn test_face_from_mesh_picks_named_indices() {
        let mesh: Vec<Point> = (0..468).map(|i| Point::new(i as f32 / 1000.0, 0.0)).collect();
        let face = FaceLandmarks::from_mesh(&mesh).unwrap();
        assert!((face.left_eye_outer.x - 0.033).abs() < 1e-6);
        assert!((face.right_eye_outer.x - 0.263).abs() < 1e-6);
        assert!((face.right_cheek.x - 0.454).abs() < 1e-6);
    }

    #[test]
    fn test_face_from_short_mesh_fails() {
        let mesh = vec![Point::default(); 100];
        assert!(matches!(
            FaceLandmarks::from_mesh(&mesh),
            Err(LandmarkError::FaceMeshTooShort { got: 100, .. })
        ));
    }

    #[test]
    fn test_enforce_hand_limits_drops_duplicate_labels() {
        let mut det = Detection {
            hands: vec![
                flat_hand(Handedness::Left),
                flat_hand(Handedness::Left),
                flat_hand(Handedness::Right),
            ],
            ..Detection::default()
        };
        det.enforce_hand_limits(2);
        assert_eq!(det.hands.len(), 2);
        assert!(det.hand(Handedness::Left).is_some());
        assert!(det.hand(Handedness::Right).is_some());
    }

    #[test]
    fn test_enforce_hand_limits_truncates() {
        let mut det = Detection {
            hands: vec![flat_hand(Handedness::Left), flat_hand(Handedness::Right)],
            ..Detection::default()
        };
        det.enforce_hand_limits(1);
        assert_eq!(det.hands.len(), 1);
        assert_eq!(det.hands[0].handedness, Handedness::Left);
    }

    #[test]
    fn test_distance_ignores_depth() {
        let a = Point { x: 0.0, y: 0.0, z: 5.0 };
        let b = Point { x: 3.0, y: 4.0, z: -5.0 };
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }
}
