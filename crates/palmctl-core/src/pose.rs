//! Per-frame hand pose classification.
//!
//! Every test compares a fingertip's `y` against its PIP joint (image `y`
//! grows downward, so a smaller tip `y` means the finger is raised) or
//! measures the sideways offset of the thumb tip from its IP joint. The
//! fist margins are stricter than the inverse of the open-palm test, so a
//! half-curled hand reads as neither.

use crate::landmarks::{Finger, HandLandmark, HandLandmarks, Handedness, Point};
use serde::{Deserialize, Serialize};

// --- Thresholds, in normalized frame units ---
const THUMB_OPEN_SPREAD: f32 = 0.04;
const THUMB_TUCKED_SPREAD: f32 = 0.03;
const PALM_MIN_OPEN_DIGITS: usize = 4;
const FIST_CURL_MARGIN: f32 = 0.02;
const GUN_EXTEND_MARGIN: f32 = 0.04;
const GUN_FOLD_MARGIN: f32 = 0.03;
const GUN_LEVEL_TOLERANCE: f32 = 0.12;
const GUN_TIP_SEPARATION: f32 = 0.05;

/// Horizontal direction carried by a directional gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

fn tip_and_pip(hand: &HandLandmarks, finger: Finger) -> (Point, Point) {
    (hand.point(finger.tip()), hand.point(finger.pip()))
}

/// Tip raised above the PIP joint by more than `margin`.
fn extended(hand: &HandLandmarks, finger: Finger, margin: f32) -> bool {
    let (tip, pip) = tip_and_pip(hand, finger);
    tip.y < pip.y - margin
}

/// Tip dropped below the PIP joint by more than `margin`.
fn folded(hand: &HandLandmarks, finger: Finger, margin: f32) -> bool {
    let (tip, pip) = tip_and_pip(hand, finger);
    tip.y > pip.y + margin
}

fn thumb_spread(hand: &HandLandmarks) -> f32 {
    (hand.point(HandLandmark::ThumbTip).x - hand.point(HandLandmark::ThumbIp).x).abs()
}

fn thumb_tucked(hand: &HandLandmarks) -> bool {
    thumb_spread(hand) < THUMB_TUCKED_SPREAD
}

/// At least four of the five digits open.
pub fn is_palm_open(hand: &HandLandmarks) -> bool {
    let fingers = Finger::ALL
        .iter()
        .filter(|&&f| extended(hand, f, 0.0))
        .count();
    let thumb = usize::from(thumb_spread(hand) > THUMB_OPEN_SPREAD);
    fingers + thumb >= PALM_MIN_OPEN_DIGITS
}

/// All four fingers clearly curled and the thumb tucked in.
pub fn is_fist(hand: &HandLandmarks) -> bool {
    Finger::ALL
        .iter()
        .all(|&f| folded(hand, f, FIST_CURL_MARGIN))
        && thumb_tucked(hand)
}

/// Index and middle raised like pincers, with at least two of ring,
/// pinky and thumb held in.
pub fn is_cord_grip(hand: &HandLandmarks) -> bool {
    let raised = [Finger::Index, Finger::Middle]
        .iter()
        .filter(|&&f| extended(hand, f, 0.0))
        .count();
    let held_in = [
        folded(hand, Finger::Ring, 0.0),
        folded(hand, Finger::Pinky, 0.0),
        thumb_tucked(hand),
    ]
    .iter()
    .filter(|&&b| b)
    .count();
    raised == 2 && held_in >= 2
}

/// A level finger-gun: index and thumb clearly up, the rest clearly
/// curled, index roughly at wrist height and visibly apart from the thumb.
pub fn is_gun(hand: &HandLandmarks) -> bool {
    let wrist = hand.point(HandLandmark::Wrist);
    let index_tip = hand.point(HandLandmark::IndexTip);
    let thumb_tip = hand.point(HandLandmark::ThumbTip);
    let thumb_ip = hand.point(HandLandmark::ThumbIp);

    let index_up = extended(hand, Finger::Index, GUN_EXTEND_MARGIN);
    let thumb_up = thumb_tip.y < thumb_ip.y - GUN_EXTEND_MARGIN;
    let others_curled = [Finger::Middle, Finger::Ring, Finger::Pinky]
        .iter()
        .all(|&f| folded(hand, f, GUN_FOLD_MARGIN));
    let level = (index_tip.y - wrist.y).abs() < GUN_LEVEL_TOLERANCE;
    let separated = (index_tip.x - thumb_tip.x).abs() > GUN_TIP_SEPARATION;

    index_up && thumb_up && others_curled && level && separated
}

/// Index and middle up, ring and pinky down, thumb tucked.
pub fn is_peace(hand: &HandLandmarks) -> bool {
    extended(hand, Finger::Index, 0.0)
        && extended(hand, Finger::Middle, 0.0)
        && folded(hand, Finger::Ring, 0.0)
        && folded(hand, Finger::Pinky, 0.0)
        && thumb_tucked(hand)
}

fn side_of_wrist(hand: &HandLandmarks, x: f32) -> Direction {
    if x > hand.point(HandLandmark::Wrist).x {
        Direction::Right
    } else {
        Direction::Left
    }
}

/// Which side of the wrist the index fingertip points to. Only meaningful
/// while [`is_gun`] holds.
pub fn gun_direction(hand: &HandLandmarks) -> Direction {
    side_of_wrist(hand, hand.point(HandLandmark::IndexTip).x)
}

/// Which side of the wrist the raised fingers lean to. Only meaningful
/// while [`is_peace`] holds.
pub fn peace_direction(hand: &HandLandmarks) -> Direction {
    let index = hand.point(HandLandmark::IndexTip);
    let middle = hand.point(HandLandmark::MiddleTip);
    side_of_wrist(hand, (index.x + middle.x) / 2.0)
}

/// Tracked point for two-hand measurements: between index and middle tips.
pub fn hand_center(hand: &HandLandmarks) -> Point {
    hand.point(HandLandmark::IndexTip)
        .midpoint(&hand.point(HandLandmark::MiddleTip))
}

/// All pose labels for one hand in one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseClassification {
    pub handedness: Handedness,
    pub palm_open: bool,
    pub fist: bool,
    pub cord_grip: bool,
    pub gun: bool,
    pub peace: bool,
    /// Fist held while the head-tilt classifier fired on the same frame.
    pub fist_with_head_tilt: bool,
    pub gun_direction: Option<Direction>,
    pub peace_direction: Option<Direction>,
    pub head_tilt_direction: Option<Direction>,
    pub center: Point,
    pub is_touching_face: bool,
}

impl PoseClassification {
    /// Run the stateless classifiers. Head tilt and face proximity need
    /// frame-level context and are filled in by the controller.
    pub fn classify(hand: &HandLandmarks) -> Self {
        let gun = is_gun(hand);
        let peace = is_peace(hand);
        Self {
            handedness: hand.handedness,
            palm_open: is_palm_open(hand),
            fist: is_fist(hand),
            cord_grip: is_cord_grip(hand),
            gun,
            peace,
            fist_with_head_tilt: false,
            gun_direction: gun.then(|| gun_direction(hand)),
            peace_direction: peace.then(|| peace_direction(hand)),
            head_tilt_direction: None,
            center: hand_center(hand),
            is_touching_face: false,
        }
    }

    /// Record a head-tilt result; only a fist can carry one.
    pub fn set_head_tilt(&mut self, direction: Option<Direction>) {
        self.head_tilt_direction = if self.fist { direction } else { None };
        self.fist_with_head_tilt = self.head_tilt_direction.is_some();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn test_palm_open_detected() {
        let hand = palm_open(Handedness::Right);
        assert!(is_palm_open(&hand));
        assert!(!is_fist(&hand));
        assert!(!is_cord_grip(&hand));
    }

    #[test]
    fn test_palm_open_with_tucked_thumb_still_counts_four() {
        let mut hand = palm_open(Handedness::Left);
        spread_thumb(&mut hand, 0.0);
        assert!(is_palm_open(&hand));
    }

    #[test]
    fn test_palm_needs_four_digits() {
        let mut hand = palm_open(Handedness::Left);
        spread_thumb(&mut hand, 0.0);
        fold(&mut hand, Finger::Pinky);
        assert!(!is_palm_open(&hand));
    }

    #[test]
    fn test_fist_detected() {
        let hand = fist(Handedness::Right);
        assert!(is_fist(&hand));
        assert!(!is_palm_open(&hand));
    }

    #[test]
    fn test_fist_rejects_open_thumb() {
        let mut hand = fist(Handedness::Right);
        spread_thumb(&mut hand, 0.05);
        assert!(!is_fist(&hand));
    }

    #[test]
    fn test_fist_requires_curl_margin() {
        let mut hand = fist(Handedness::Right);
        // Ring tip only 0.01 below its PIP: inside the margin.
        set_tip_y(&mut hand, Finger::Ring, 0.56);
        assert!(!is_fist(&hand));
    }

    #[test]
    fn test_palm_and_fist_never_both_true() {
        // Sweep every fingertip through the ambiguous band around the PIP
        // joint, with the thumb both tucked and spread.
        let offsets: Vec<f32> = (-20..=20).map(|i| i as f32 * 0.005).collect();
        for &spread in &[0.0, 0.02, 0.035, 0.05] {
            for &a in &offsets {
                for &b in &offsets {
                    let mut hand = neutral_hand(Handedness::Right);
                    spread_thumb(&mut hand, spread);
                    set_tip_y(&mut hand, Finger::Index, 0.55 + a);
                    set_tip_y(&mut hand, Finger::Middle, 0.55 + b);
                    set_tip_y(&mut hand, Finger::Ring, 0.55 + a);
                    set_tip_y(&mut hand, Finger::Pinky, 0.55 + b);
                    assert!(
                        !(is_palm_open(&hand) && is_fist(&hand)),
                        "palm and fist both true at a={a} b={b} spread={spread}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_cord_grip_detected() {
        let hand = cord_grip(Handedness::Left);
        assert!(is_cord_grip(&hand));
        assert!(!is_palm_open(&hand));
        assert!(!is_fist(&hand));
    }

    #[test]
    fn test_cord_grip_tolerates_one_loose_digit() {
        let mut hand = cord_grip(Handedness::Left);
        spread_thumb(&mut hand, 0.08);
        assert!(is_cord_grip(&hand));
        set_tip_y(&mut hand, Finger::Pinky, 0.50);
        assert!(!is_cord_grip(&hand));
    }

    #[test]
    fn test_cord_grip_needs_both_pincers() {
        let mut hand = cord_grip(Handedness::Right);
        fold(&mut hand, Finger::Middle);
        assert!(!is_cord_grip(&hand));
    }

    #[test]
    fn test_gun_detected_both_directions() {
        let right = gun(Handedness::Right, Direction::Right);
        assert!(is_gun(&right));
        assert_eq!(gun_direction(&right), Direction::Right);

        let left = gun(Handedness::Right, Direction::Left);
        assert!(is_gun(&left));
        assert_eq!(gun_direction(&left), Direction::Left);
    }

    #[test]
    fn test_gun_rejects_pointing_up() {
        let mut hand = gun(Handedness::Right, Direction::Right);
        hand.set_point(HandLandmark::IndexTip, Point::new(0.70, 0.30));
        assert!(!is_gun(&hand));
    }

    #[test]
    fn test_gun_rejects_thumb_touching_index() {
        let mut hand = gun(Handedness::Right, Direction::Right);
        hand.set_point(HandLandmark::ThumbTip, Point::new(0.68, 0.38));
        assert!(!is_gun(&hand));
    }

    #[test]
    fn test_gun_rejects_lowered_thumb() {
        let mut hand = gun(Handedness::Right, Direction::Right);
        hand.set_point(HandLandmark::ThumbTip, Point::new(0.50, 0.43));
        assert!(!is_gun(&hand));
    }

    #[test]
    fn test_gun_rejects_loose_middle_finger() {
        let mut hand = gun(Handedness::Right, Direction::Right);
        set_tip_y(&mut hand, Finger::Middle, 0.57);
        assert!(!is_gun(&hand));
    }

    #[test]
    fn test_peace_direction() {
        let right = peace(Handedness::Right, Direction::Right);
        assert!(is_peace(&right));
        assert_eq!(peace_direction(&right), Direction::Right);

        let left = peace(Handedness::Left, Direction::Left);
        assert!(is_peace(&left));
        assert_eq!(peace_direction(&left), Direction::Left);
    }

    #[test]
    fn test_peace_rejects_spread_thumb() {
        let mut hand = peace(Handedness::Right, Direction::Right);
        spread_thumb(&mut hand, 0.06);
        assert!(!is_peace(&hand));
    }

    #[test]
    fn test_hand_center_between_index_and_middle_tips() {
        let hand = palm_open(Handedness::Right);
        let c = hand_center(&hand);
        assert!((c.x - 0.47).abs() < 1e-6);
        assert!((c.y - 0.40).abs() < 1e-6);
    }

    #[test]
    fn test_classify_directions_only_when_pose_active() {
        let pose = PoseClassification::classify(&palm_open(Handedness::Right));
        assert!(pose.palm_open);
        assert_eq!(pose.gun_direction, None);
        assert_eq!(pose.peace_direction, None);

        let pose = PoseClassification::classify(&gun(Handedness::Left, Direction::Left));
        assert!(pose.gun);
        assert_eq!(pose.gun_direction, Some(Direction::Left));
    }

    #[test]
    fn test_head_tilt_only_sticks_to_fist() {
        let mut pose = PoseClassification::classify(&palm_open(Handedness::Right));
        pose.set_head_tilt(Some(Direction::Right));
        assert!(!pose.fist_with_head_tilt);
        assert_eq!(pose.head_tilt_direction, None);

        let mut pose = PoseClassification::classify(&fist(Handedness::Right));
        pose.set_head_tilt(Some(Direction::Right));
        assert!(pose.fist_with_head_tilt);
        assert_eq!(pose.head_tilt_direction, Some(Direction::Right));
    }
}
