//! Head-tilt classification from the eye line, with a trigger cooldown.

use crate::landmarks::FaceLandmarks;
use crate::pose::Direction;
use std::time::{Duration, Instant};

/// Added to the eye-line run so a vertical eye line cannot divide by zero.
const EYE_SLOPE_EPSILON: f32 = 1e-4;

pub const DEFAULT_TILT_COOLDOWN: Duration = Duration::from_millis(1500);
pub const DEFAULT_TILT_THRESHOLD_DEG: f32 = 35.0;

/// Signed eye-line angle in degrees. Positive when the image-right eye
/// corner sits lower in the frame than the image-left one.
pub fn eye_line_angle(face: &FaceLandmarks) -> f32 {
    let left = face.left_eye_outer;
    let right = face.right_eye_outer;
    let slope = (right.y - left.y) / (right.x - left.x + EYE_SLOPE_EPSILON);
    slope.atan().to_degrees()
}

pub struct HeadTiltClassifier {
    cooldown: Duration,
    threshold_deg: f32,
    last_trigger: Option<Instant>,
    last_angle: Option<f32>,
}

impl HeadTiltClassifier {
    pub fn new(cooldown: Duration, threshold_deg: f32) -> Self {
        Self {
            cooldown,
            threshold_deg,
            last_trigger: None,
            last_angle: None,
        }
    }

    /// Measure and remember the current angle without classifying.
    pub fn observe(&mut self, face: &FaceLandmarks) -> f32 {
        let angle = eye_line_angle(face);
        self.last_angle = Some(angle);
        angle
    }

    /// Classify the tilt. Positive angles map to [`Direction::Right`]
    /// (next track), negative to [`Direction::Left`]. Returns `None` while
    /// the cooldown since the previous trigger is still running; the angle
    /// is recorded either way.
    pub fn classify(&mut self, face: &FaceLandmarks, now: Instant) -> Option<Direction> {
        let angle = self.observe(face);

        if let Some(last) = self.last_trigger {
            if now.saturating_duration_since(last) < self.cooldown {
                return None;
            }
        }

        let direction = if angle >= self.threshold_deg {
            Direction::Right
        } else if angle <= -self.threshold_deg {
            Direction::Left
        } else {
            return None;
        };

        self.last_trigger = Some(now);
        tracing::info!(angle, direction = direction.as_str(), "head tilt detected");
        Some(direction)
    }

    /// Most recently measured angle, for status display.
    pub fn last_angle(&self) -> Option<f32> {
        self.last_angle
    }
}

impl Default for HeadTiltClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_TILT_COOLDOWN, DEFAULT_TILT_THRESHOLD_DEG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{face_tilted, level_face};

    #[test]
    fn test_level_eyes_zero_angle() {
        assert!(eye_line_angle(&level_face()).abs() < 1e-4);
    }

    #[test]
    fn test_angle_sign_follows_right_eye() {
        assert!(eye_line_angle(&face_tilted(20.0)) > 19.0);
        assert!(eye_line_angle(&face_tilted(-20.0)) < -19.0);
    }

    #[test]
    fn test_vertical_eye_line_is_finite() {
        let mut face = level_face();
        face.right_eye_outer.x = face.left_eye_outer.x;
        face.right_eye_outer.y = face.left_eye_outer.y + 0.1;
        let angle = eye_line_angle(&face);
        assert!(angle.is_finite());
        assert!(angle > 89.0);
    }

    #[test]
    fn test_small_tilt_is_none() {
        let mut tilt = HeadTiltClassifier::default();
        assert_eq!(tilt.classify(&face_tilted(20.0), Instant::now()), None);
        assert!((tilt.last_angle().unwrap() - 20.0).abs() < 0.1);
    }

    #[test]
    fn test_tilt_cooldown_and_direction() {
        let mut tilt = HeadTiltClassifier::default();
        let t0 = Instant::now();

        assert_eq!(tilt.classify(&face_tilted(40.0), t0), Some(Direction::Right));

        // Opposite tilt right away is suppressed, but the angle is still tracked.
        let t1 = t0 + Duration::from_millis(100);
        assert_eq!(tilt.classify(&face_tilted(-40.0), t1), None);
        assert!(tilt.last_angle().unwrap() < -39.0);

        let t2 = t0 + Duration::from_millis(1400);
        assert_eq!(tilt.classify(&face_tilted(-40.0), t2), None);

        let t3 = t0 + Duration::from_millis(1500);
        assert_eq!(tilt.classify(&face_tilted(-40.0), t3), Some(Direction::Left));
    }

    #[test]
    fn test_untriggered_frames_do_not_restart_cooldown() {
        let mut tilt = HeadTiltClassifier::default();
        let t0 = Instant::now();
        assert_eq!(tilt.classify(&level_face(), t0), None);
        assert_eq!(
            tilt.classify(&face_tilted(-45.0), t0 + Duration::from_millis(10)),
            Some(Direction::Left)
        );
    }
}
