//! Synthetic landmark builders shared by the unit tests.

use crate::landmarks::{
    FaceLandmarks, Finger, HandLandmark, HandLandmarks, Handedness, Point, HAND_LANDMARK_COUNT,
};
use crate::pose::Direction;

const PIP_Y: f32 = 0.55;
const EXTENDED_TIP_Y: f32 = 0.40;
const FOLDED_TIP_Y: f32 = 0.63;

/// A relaxed hand: every fingertip level with its PIP joint, thumb tucked.
pub(crate) fn neutral_hand(handedness: Handedness) -> HandLandmarks {
    let mut hand = HandLandmarks::new(handedness, [Point::new(0.5, 0.6); HAND_LANDMARK_COUNT]);
    hand.set_point(HandLandmark::Wrist, Point::new(0.5, 0.8));
    hand.set_point(HandLandmark::ThumbCmc, Point::new(0.42, 0.75));
    hand.set_point(HandLandmark::ThumbMcp, Point::new(0.38, 0.70));
    hand.set_point(HandLandmark::ThumbIp, Point::new(0.35, 0.65));
    hand.set_point(HandLandmark::ThumbTip, Point::new(0.35, 0.65));

    let columns = [
        (Finger::Index, HandLandmark::IndexMcp, HandLandmark::IndexDip, 0.44),
        (Finger::Middle, HandLandmark::MiddleMcp, HandLandmark::MiddleDip, 0.50),
        (Finger::Ring, HandLandmark::RingMcp, HandLandmark::RingDip, 0.56),
        (Finger::Pinky, HandLandmark::PinkyMcp, HandLandmark::PinkyDip, 0.62),
    ];
    for (finger, mcp, dip, x) in columns {
        hand.set_point(mcp, Point::new(x, 0.65));
        hand.set_point(finger.pip(), Point::new(x, PIP_Y));
        hand.set_point(dip, Point::new(x, 0.50));
        hand.set_point(finger.tip(), Point::new(x, PIP_Y));
    }
    hand
}

pub(crate) fn set_tip_y(hand: &mut HandLandmarks, finger: Finger, y: f32) {
    let tip = hand.point(finger.tip());
    hand.set_point(finger.tip(), Point::new(tip.x, y));
}

pub(crate) fn extend(hand: &mut HandLandmarks, finger: Finger) {
    set_tip_y(hand, finger, EXTENDED_TIP_Y);
}

pub(crate) fn fold(hand: &mut HandLandmarks, finger: Finger) {
    set_tip_y(hand, finger, FOLDED_TIP_Y);
}

/// Abduct the thumb: tip offset sideways from the IP joint by `spread`.
pub(crate) fn spread_thumb(hand: &mut HandLandmarks, spread: f32) {
    let ip = hand.point(HandLandmark::ThumbIp);
    hand.set_point(HandLandmark::ThumbTip, Point::new(ip.x - spread, ip.y));
}

pub(crate) fn palm_open(handedness: Handedness) -> HandLandmarks {
    let mut hand = neutral_hand(handedness);
    for finger in Finger::ALL {
        extend(&mut hand, finger);
    }
    spread_thumb(&mut hand, 0.10);
    hand
}

pub(crate) fn fist(handedness: Handedness) -> HandLandmarks {
    let mut hand = neutral_hand(handedness);
    for finger in Finger::ALL {
        fold(&mut hand, finger);
    }
    hand
}

/// Index and middle up, ring and pinky curled, thumb tucked. Doubles as
/// the peace sign.
pub(crate) fn cord_grip(handedness: Handedness) -> HandLandmarks {
    let mut hand = neutral_hand(handedness);
    extend(&mut hand, Finger::Index);
    extend(&mut hand, Finger::Middle);
    fold(&mut hand, Finger::Ring);
    fold(&mut hand, Finger::Pinky);
    hand
}

/// Peace sign with the raised fingers leaning toward `direction` of the wrist.
pub(crate) fn peace(handedness: Handedness, direction: Direction) -> HandLandmarks {
    let mut hand = cord_grip(handedness);
    let shift = match direction {
        Direction::Right => 0.15,
        Direction::Left => -0.15,
    };
    for finger in [Finger::Index, Finger::Middle] {
        let tip = hand.point(finger.tip());
        hand.set_point(finger.tip(), Point::new(0.5 + shift + (tip.x - 0.5), tip.y));
    }
    hand
}

/// A level finger-gun pointing toward `direction`.
pub(crate) fn gun(handedness: Handedness, direction: Direction) -> HandLandmarks {
    let mut hand = neutral_hand(handedness);
    let (wrist_x, index_tip_x) = match direction {
        Direction::Right => (0.30, 0.70),
        Direction::Left => (0.80, 0.30),
    };
    hand.set_point(HandLandmark::Wrist, Point::new(wrist_x, 0.50));
    hand.set_point(HandLandmark::IndexPip, Point::new(0.50, 0.55));
    hand.set_point(HandLandmark::IndexTip, Point::new(index_tip_x, 0.48));
    hand.set_point(HandLandmark::ThumbIp, Point::new(0.50, 0.45));
    hand.set_point(HandLandmark::ThumbTip, Point::new(0.50, 0.38));
    for finger in [Finger::Middle, Finger::Ring, Finger::Pinky] {
        set_tip_y(&mut hand, finger, PIP_Y + 0.08);
    }
    hand
}

/// Shift every point of a hand.
pub(crate) fn translate(hand: &HandLandmarks, dx: f32, dy: f32) -> HandLandmarks {
    let mut points = *hand.points();
    for p in points.iter_mut() {
        p.x += dx;
        p.y += dy;
    }
    HandLandmarks::new(hand.handedness, points)
}

/// A face high in the frame, clear of the neutral hand layout, with the
/// eye line tilted by `degrees` (positive = right eye lower in the image).
pub(crate) fn face_tilted(degrees: f32) -> FaceLandmarks {
    let dy = 0.1 * degrees.to_radians().tan();
    FaceLandmarks {
        left_eye_outer: Point::new(0.45, 0.20),
        right_eye_outer: Point::new(0.55, 0.20 + dy),
        nose_tip: Point::new(0.50, 0.25),
        forehead: Point::new(0.50, 0.10),
        chin: Point::new(0.50, 0.35),
        left_cheek: Point::new(0.40, 0.25),
        right_cheek: Point::new(0.60, 0.25),
    }
}

pub(crate) fn level_face() -> FaceLandmarks {
    face_tilted(0.0)
}
