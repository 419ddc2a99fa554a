//! Process-wide configuration: built-in defaults, then an optional TOML
//! file, then `PALMCTL_*` environment overrides. Read once at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown media gesture mode: {0:?}")]
    UnknownGestureMode(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which single-hand gesture drives track changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum MediaGestureMode {
    Gun,
    Peace,
    FistHeadTilt,
    /// Track changes never fire.
    Disabled,
}

impl MediaGestureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gun => "gun",
            Self::Peace => "peace",
            Self::FistHeadTilt => "fist_head_tilt",
            Self::Disabled => "disabled",
        }
    }
}

impl FromStr for MediaGestureMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gun" => Ok(Self::Gun),
            "peace" => Ok(Self::Peace),
            "fist_head_tilt" => Ok(Self::FistHeadTilt),
            "disabled" | "none" => Ok(Self::Disabled),
            _ => Err(ConfigError::UnknownGestureMode(s.to_string())),
        }
    }
}

/// Unknown modes fall back to [`MediaGestureMode::Disabled`] rather than
/// failing startup.
impl From<String> for MediaGestureMode {
    fn from(s: String) -> Self {
        s.parse().unwrap_or_else(|e: ConfigError| {
            tracing::warn!(error = %e, "media gesture path disabled");
            Self::Disabled
        })
    }
}

/// All recognized options. Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Accepted for compatibility; the heuristics use fixed thresholds.
    pub gesture_sensitivity: f32,
    /// Shared cooldown between any two media-key dispatches.
    pub media_cooldown: f32,
    /// How long an open palm must be held before a fist toggles play/pause.
    pub palm_hold_duration: f32,
    /// Hand distance that maps to 0% volume.
    pub volume_min_distance: f32,
    /// Hand distance that maps to 100% volume.
    pub volume_max_distance: f32,
    /// Minimum detection confidence passed to the landmark extractor.
    pub mediapipe_confidence: f32,
    pub max_hands: usize,
    pub camera_index: u32,
    pub camera_width: u32,
    pub camera_height: u32,
    /// Preview window scale, forwarded to the extractor.
    pub window_scale: f32,
    pub media_gesture_mode: MediaGestureMode,
    pub require_stable_gesture: bool,
    pub stable_frames_required: usize,
    /// Report active controls at `info` instead of `debug`.
    pub show_debug_info: bool,
    /// Idle time after which the advisory mode falls back to idle. A
    /// play/pause toggle holds its mode until another path acts.
    pub mode_cooldown: f32,
    pub head_tilt_cooldown: f32,
    pub head_tilt_threshold: f32,
    pub face_touch_threshold: f32,
    /// Landmark extractor program and leading arguments.
    pub extractor_command: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gesture_sensitivity: 0.7,
            media_cooldown: 2.0,
            palm_hold_duration: 0.5,
            volume_min_distance: 0.08,
            volume_max_distance: 0.7,
            mediapipe_confidence: 0.8,
            max_hands: 2,
            camera_index: 1,
            camera_width: 1280,
            camera_height: 720,
            window_scale: 1.0,
            media_gesture_mode: MediaGestureMode::FistHeadTilt,
            require_stable_gesture: true,
            stable_frames_required: 5,
            show_debug_info: true,
            mode_cooldown: 0.5,
            head_tilt_cooldown: 1.5,
            head_tilt_threshold: 35.0,
            face_touch_threshold: 0.15,
            extractor_command: vec!["palmctl-landmarks".to_string()],
        }
    }
}

impl Config {
    /// Load defaults, the config file (if present) and environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("PALMCTL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path());

        let mut config = if path.exists() {
            tracing::info!(path = %path.display(), "loading config file");
            Self::from_file(&path)?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Overlay `PALMCTL_<OPTION>` variables. Unparseable values are
    /// ignored with a warning.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvOverlay { lookup };
        env.set("PALMCTL_GESTURE_SENSITIVITY", &mut self.gesture_sensitivity);
        env.set("PALMCTL_MEDIA_COOLDOWN", &mut self.media_cooldown);
        env.set("PALMCTL_PALM_HOLD_DURATION", &mut self.palm_hold_duration);
        env.set("PALMCTL_VOLUME_MIN_DISTANCE", &mut self.volume_min_distance);
        env.set("PALMCTL_VOLUME_MAX_DISTANCE", &mut self.volume_max_distance);
        env.set("PALMCTL_MEDIAPIPE_CONFIDENCE", &mut self.mediapipe_confidence);
        env.set("PALMCTL_MAX_HANDS", &mut self.max_hands);
        env.set("PALMCTL_CAMERA_INDEX", &mut self.camera_index);
        env.set("PALMCTL_CAMERA_WIDTH", &mut self.camera_width);
        env.set("PALMCTL_CAMERA_HEIGHT", &mut self.camera_height);
        env.set("PALMCTL_WINDOW_SCALE", &mut self.window_scale);
        env.set("PALMCTL_REQUIRE_STABLE_GESTURE", &mut self.require_stable_gesture);
        env.set("PALMCTL_STABLE_FRAMES_REQUIRED", &mut self.stable_frames_required);
        env.set("PALMCTL_SHOW_DEBUG_INFO", &mut self.show_debug_info);
        env.set("PALMCTL_MODE_COOLDOWN", &mut self.mode_cooldown);
        env.set("PALMCTL_HEAD_TILT_COOLDOWN", &mut self.head_tilt_cooldown);
        env.set("PALMCTL_HEAD_TILT_THRESHOLD", &mut self.head_tilt_threshold);
        env.set("PALMCTL_FACE_TOUCH_THRESHOLD", &mut self.face_touch_threshold);

        if let Some(mode) = (env.lookup)("PALMCTL_MEDIA_GESTURE_MODE") {
            self.media_gesture_mode = MediaGestureMode::from(mode);
        }
        if let Some(cmd) = (env.lookup)("PALMCTL_EXTRACTOR_COMMAND") {
            let argv: Vec<String> = cmd.split_whitespace().map(str::to_string).collect();
            if !argv.is_empty() {
                self.extractor_command = argv;
            }
        }
    }

    /// Reject settings the controller cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.volume_max_distance > self.volume_min_distance) {
            return Err(ConfigError::Invalid(format!(
                "volume_max_distance ({}) must exceed volume_min_distance ({})",
                self.volume_max_distance, self.volume_min_distance
            )));
        }
        if self.max_hands == 0 {
            return Err(ConfigError::Invalid("max_hands must be at least 1".into()));
        }
        for (name, secs) in [
            ("media_cooldown", self.media_cooldown),
            ("palm_hold_duration", self.palm_hold_duration),
            ("mode_cooldown", self.mode_cooldown),
            ("head_tilt_cooldown", self.head_tilt_cooldown),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number of seconds, got {secs}"
                )));
            }
        }
        if self.extractor_command.is_empty() {
            return Err(ConfigError::Invalid("extractor_command is empty".into()));
        }
        Ok(())
    }

    pub fn media_cooldown(&self) -> Duration {
        secs(self.media_cooldown)
    }

    pub fn palm_hold_duration(&self) -> Duration {
        secs(self.palm_hold_duration)
    }

    pub fn mode_cooldown(&self) -> Duration {
        secs(self.mode_cooldown)
    }

    pub fn head_tilt_cooldown(&self) -> Duration {
        secs(self.head_tilt_cooldown)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value.max(0.0)).unwrap_or(Duration::MAX)
}

/// `$XDG_CONFIG_HOME/palmctl/config.toml`, falling back to `~/.config`.
pub fn default_config_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        })
        .join("palmctl")
        .join("config.toml")
}

struct EnvOverlay<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvOverlay<F> {
    fn set<T: FromStr>(&self, key: &str, slot: &mut T) {
        let Some(raw) = (self.lookup)(key) else {
            return;
        };
        match raw.trim().parse() {
            Ok(value) => *slot = value,
            Err(_) => tracing::warn!(key, value = %raw, "ignoring unparseable override"),
        }
    }
}
