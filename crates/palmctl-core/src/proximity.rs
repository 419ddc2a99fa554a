//! Face-proximity safety guard: a hand near the face disables controls.

use crate::landmarks::{FaceLandmarks, HandLandmark, HandLandmarks};

pub const DEFAULT_TOUCH_THRESHOLD: f32 = 0.15;

/// Smallest planar distance between the hand's reference points (middle
/// knuckle, wrist) and the face contour points.
pub fn hand_face_distance(hand: &HandLandmarks, face: &FaceLandmarks) -> f32 {
    let hand_points = [
        hand.point(HandLandmark::MiddleMcp),
        hand.point(HandLandmark::Wrist),
    ];
    face.contour()
        .iter()
        .flat_map(|f| hand_points.iter().map(move |h| h.distance(f)))
        .fold(f32::INFINITY, f32::min)
}

/// Applies the touch threshold and logs lockout transitions once per edge.
pub struct FaceProximityGuard {
    threshold: f32,
    locked_out: bool,
}

impl FaceProximityGuard {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            locked_out: false,
        }
    }

    /// Whether this hand is touching (or nearly touching) the face. No
    /// face means no contact.
    pub fn is_touching(&self, hand: &HandLandmarks, face: Option<&FaceLandmarks>) -> bool {
        match face {
            Some(face) => hand_face_distance(hand, face) < self.threshold,
            None => false,
        }
    }

    /// Record whether any hand was near the face this frame. Returns the
    /// same flag for chaining.
    pub fn update_lockout(&mut self, any_touching: bool) -> bool {
        if any_touching != self.locked_out {
            if any_touching {
                tracing::warn!("hand near face, controls disabled");
            } else {
                tracing::info!("hand released from face, controls re-enabled");
            }
            self.locked_out = any_touching;
        }
        any_touching
    }

    pub fn is_locked_out(&self) -> bool {
        self.locked_out
    }
}

impl Default for FaceProximityGuard {
    fn default() -> Self {
        Self::new(DEFAULT_TOUCH_THRESHOLD)
    }
}
