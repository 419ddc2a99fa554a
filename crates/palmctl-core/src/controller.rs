//! Interaction controller: turns one frame of landmarks into control
//! actions via three independent paths (two-hand volume, palm-then-fist
//! play/pause, single-hand track change).
//!
//! The controller is confined to one thread and fed frames in order. All
//! time-dependent behavior takes the frame's `Instant` explicitly.

use crate::config::{Config, MediaGestureMode};
use crate::head_tilt::HeadTiltClassifier;
use crate::landmarks::{Detection, Handedness};
use crate::pose::{Direction, PoseClassification};
use crate::proximity::FaceProximityGuard;
use crate::sinks::{MediaKeys, VolumeSink};
use crate::stabilizer::GestureStabilizer;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Advisory label for the path that most recently produced activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    Idle,
    Volume,
    PlayPause,
    Media,
}

impl InteractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Volume => "volume",
            Self::PlayPause => "play_pause",
            Self::Media => "media",
        }
    }
}

/// Progress through the palm-hold-then-fist toggle sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayPauseState {
    Waiting,
    PalmDetected,
    ReadyToToggle,
}

impl PlayPauseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::PalmDetected => "palm_detected",
            Self::ReadyToToggle => "ready_to_toggle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum ControlAction {
    SetVolume(u8),
    PlayPause,
    NextTrack,
    PreviousTrack,
}

/// An action the controller invoked on a sink, and whether the sink
/// reported it as delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchedAction {
    #[serde(flatten)]
    pub action: ControlAction,
    pub delivered: bool,
}

/// Everything decided about one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub mode: InteractionMode,
    pub play_pause: PlayPauseState,
    pub hands: Vec<PoseClassification>,
    pub actions: Vec<DispatchedAction>,
    /// Volume computed by the two-hand path this frame.
    pub volume: Option<u8>,
    pub face_detected: bool,
    pub blocked_by_face: bool,
    /// Most recent eye-line angle, even if no tilt fired.
    pub head_angle: Option<f32>,
}

impl FrameReport {
    pub fn delivered(&self) -> impl Iterator<Item = ControlAction> + '_ {
        self.actions.iter().filter(|a| a.delivered).map(|a| a.action)
    }
}

/// Linear map of hand distance onto 0..=100, clamped outside `[min, max]`.
pub fn map_distance_to_volume(distance: f32, min: f32, max: f32) -> u8 {
    if !(max > min) || distance.is_nan() {
        return 0;
    }
    let t = ((distance - min) / (max - min)).clamp(0.0, 1.0);
    (t * 100.0).round() as u8
}

/// A track-change candidate. Only `mode` is fed to the stabilizer; the
/// direction is taken from the frame that confirms it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MediaGesture {
    mode: MediaGestureMode,
    direction: Direction,
}

pub struct InteractionController<V, M> {
    volume_sink: V,
    media_keys: M,
    head_tilt: HeadTiltClassifier,
    guard: FaceProximityGuard,
    stabilizer: GestureStabilizer<MediaGestureMode>,

    mode: InteractionMode,
    play_pause: PlayPauseState,
    palm_since: Option<Instant>,
    last_activity: Option<Instant>,

    media_mode: MediaGestureMode,
    palm_hold: Duration,
    mode_cooldown: Duration,
    volume_min_distance: f32,
    volume_max_distance: f32,
    show_debug_info: bool,
}

impl<V: VolumeSink, M: MediaKeys> InteractionController<V, M> {
    pub fn new(config: &Config, volume_sink: V, media_keys: M) -> Self {
        Self {
            volume_sink,
            media_keys,
            head_tilt: HeadTiltClassifier::new(
                config.head_tilt_cooldown(),
                config.head_tilt_threshold,
            ),
            guard: FaceProximityGuard::new(config.face_touch_threshold),
            stabilizer: GestureStabilizer::new(
                config.stable_frames_required,
                config.require_stable_gesture,
            ),
            mode: InteractionMode::Idle,
            play_pause: PlayPauseState::Waiting,
            palm_since: None,
            last_activity: None,
            media_mode: config.media_gesture_mode,
            palm_hold: config.palm_hold_duration(),
            mode_cooldown: config.mode_cooldown(),
            volume_min_distance: config.volume_min_distance,
            volume_max_distance: config.volume_max_distance,
            show_debug_info: config.show_debug_info,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn play_pause_state(&self) -> PlayPauseState {
        self.play_pause
    }

    /// Frames currently held by the media-gesture stabilizer.
    pub fn gesture_history_len(&self) -> usize {
        self.stabilizer.len()
    }

    pub fn volume_sink(&self) -> &V {
        &self.volume_sink
    }

    pub fn media_keys(&self) -> &M {
        &self.media_keys
    }

    /// Process one frame. Frames must be supplied in capture order with
    /// non-decreasing `now`.
    pub fn process(&mut self, detection: &Detection, now: Instant) -> FrameReport {
        self.expire_mode(now);

        let face = detection.face.as_ref();
        let mut hands: Vec<PoseClassification> = detection
            .hands
            .iter()
            .map(|hand| {
                let mut pose = PoseClassification::classify(hand);
                pose.is_touching_face = self.guard.is_touching(hand, face);
                pose
            })
            .collect();

        let head_angle = match face {
            Some(face) if hands.iter().any(|p| p.fist && !p.is_touching_face) => {
                let tilt = self.head_tilt.classify(face, now);
                for pose in hands.iter_mut().filter(|p| !p.is_touching_face) {
                    pose.set_head_tilt(tilt);
                }
                self.head_tilt.last_angle()
            }
            Some(face) => Some(self.head_tilt.observe(face)),
            None => self.head_tilt.last_angle(),
        };

        let blocked = self
            .guard
            .update_lockout(hands.iter().any(|p| p.is_touching_face));

        let mut actions = Vec::new();
        let volume = self.volume_path(&hands, now, &mut actions);

        match hands.as_slice() {
            [pose] if !blocked => {
                self.play_pause_path(pose, now, &mut actions);
                self.media_path(pose, now, &mut actions);
            }
            _ => {
                // No hand, two hands, or a hand at the face.
                self.reset_play_pause();
                self.stabilizer.clear();
            }
        }

        for pose in &hands {
            tracing::debug!(
                handedness = ?pose.handedness,
                palm = pose.palm_open,
                fist = pose.fist,
                cord = pose.cord_grip,
                gun = pose.gun,
                peace = pose.peace,
                touching_face = pose.is_touching_face,
                "hand classified"
            );
        }

        FrameReport {
            mode: self.mode,
            play_pause: self.play_pause,
            hands,
            actions,
            volume,
            face_detected: face.is_some(),
            blocked_by_face: blocked,
            head_angle,
        }
    }

    fn expire_mode(&mut self, now: Instant) {
        let expired = match self.last_activity {
            Some(last) => now.saturating_duration_since(last) > self.mode_cooldown,
            None => true,
        };
        // A toggle keeps its mode until another path takes over.
        let sticky = matches!(self.mode, InteractionMode::Idle | InteractionMode::PlayPause);
        if expired && !sticky {
            tracing::debug!(from = self.mode.as_str(), "mode back to idle");
            self.mode = InteractionMode::Idle;
        }
    }

    fn mark_active(&mut self, mode: InteractionMode, now: Instant, delivered: bool) {
        self.mode = mode;
        if delivered {
            self.last_activity = Some(now);
        }
    }

    fn report(&self, action: &DispatchedAction) {
        if self.show_debug_info {
            tracing::info!(action = ?action.action, delivered = action.delivered, "control active");
        } else {
            tracing::debug!(action = ?action.action, delivered = action.delivered, "control active");
        }
    }

    fn volume_path(
        &mut self,
        hands: &[PoseClassification],
        now: Instant,
        actions: &mut Vec<DispatchedAction>,
    ) -> Option<u8> {
        if hands.len() != 2 {
            return None;
        }
        let left = hands.iter().find(|p| p.handedness == Handedness::Left)?;
        let right = hands.iter().find(|p| p.handedness == Handedness::Right)?;
        if !(left.cord_grip && right.cord_grip) || left.is_touching_face || right.is_touching_face {
            return None;
        }

        let distance = left.center.distance(&right.center);
        let percent =
            map_distance_to_volume(distance, self.volume_min_distance, self.volume_max_distance);
        let delivered = self.volume_sink.set_volume(percent);

        // Continuous tracking keeps the mode alive even if the sink fails.
        self.mark_active(InteractionMode::Volume, now, true);
        let action = DispatchedAction {
            action: ControlAction::SetVolume(percent),
            delivered,
        };
        self.report(&action);
        actions.push(action);
        Some(percent)
    }

    fn reset_play_pause(&mut self) {
        if self.play_pause != PlayPauseState::Waiting {
            tracing::debug!(from = self.play_pause.as_str(), "play/pause sequence reset");
        }
        self.play_pause = PlayPauseState::Waiting;
        self.palm_since = None;
    }

    fn play_pause_path(
        &mut self,
        pose: &PoseClassification,
        now: Instant,
        actions: &mut Vec<DispatchedAction>,
    ) {
        match self.play_pause {
            PlayPauseState::Waiting => {
                if pose.palm_open {
                    tracing::debug!("palm detected, holding");
                    self.play_pause = PlayPauseState::PalmDetected;
                    self.palm_since = Some(now);
                }
            }
            PlayPauseState::PalmDetected => {
                if pose.palm_open {
                    let held = self
                        .palm_since
                        .map(|since| now.saturating_duration_since(since))
                        .unwrap_or_default();
                    if held >= self.palm_hold {
                        tracing::debug!(held_ms = held.as_millis() as u64, "ready to toggle");
                        self.play_pause = PlayPauseState::ReadyToToggle;
                    }
                } else {
                    // Closed too fast, or switched to another pose.
                    self.reset_play_pause();
                }
            }
            PlayPauseState::ReadyToToggle => {
                if pose.fist {
                    let delivered = self.media_keys.play_pause();
                    self.mark_active(InteractionMode::PlayPause, now, delivered);
                    let action = DispatchedAction {
                        action: ControlAction::PlayPause,
                        delivered,
                    };
                    self.report(&action);
                    actions.push(action);
                    self.reset_play_pause();
                }
            }
        }
    }

    fn media_candidate(&self, pose: &PoseClassification) -> Option<MediaGesture> {
        let direction = match self.media_mode {
            MediaGestureMode::FistHeadTilt if pose.fist_with_head_tilt => pose.head_tilt_direction,
            MediaGestureMode::Peace if pose.peace => pose.peace_direction,
            MediaGestureMode::Gun if pose.gun => pose.gun_direction,
            _ => None,
        }?;
        Some(MediaGesture {
            mode: self.media_mode,
            direction,
        })
    }

    fn media_path(
        &mut self,
        pose: &PoseClassification,
        now: Instant,
        actions: &mut Vec<DispatchedAction>,
    ) {
        let Some(candidate) = self.media_candidate(pose) else {
            self.stabilizer.clear();
            return;
        };

        // Head tilt is already rate limited by its own cooldown.
        let confirmed = match candidate.mode {
            MediaGestureMode::FistHeadTilt => true,
            _ => self.stabilizer.observe(candidate.mode),
        };
        if !confirmed {
            return;
        }

        let (action, delivered) = match candidate.direction {
            Direction::Right => (ControlAction::NextTrack, self.media_keys.next_track()),
            Direction::Left => (ControlAction::PreviousTrack, self.media_keys.previous_track()),
        };
        self.mark_active(InteractionMode::Media, now, delivered);
        let action = DispatchedAction { action, delivered };
        self.report(&action);
        actions.push(action);
    }
}
