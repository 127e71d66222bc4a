//! Configuration for atom_rig
//!
//! Loaded from a TOML file.  Every field has a default, so an empty file (or
//! no file at all) gives a working scripted setup.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use hand_gesture::{ClassifierConfig, ConflictPolicy};

use crate::error::{Error, Result};
use crate::sim::ScriptStep;

// ════════════════════════════════════════════════════════════════════════════
// Sections
// ════════════════════════════════════════════════════════════════════════════

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub source:     SourceConfig,
    pub classifier: ClassifierSection,
    pub render:     RenderConfig,
    pub rig:        RigConfig,
    pub logging:    LoggingConfig,
}

/// Which capture backend feeds the landmark source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Synthetic hands from `[source.scripted]`.
    #[default]
    Scripted,
    /// Webcam + MediaPipe helper (needs the `camera` feature).
    Camera,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind:           SourceKind,
    /// Flip frames horizontally before detection (selfie view).
    pub mirror:         bool,
    /// Observations beyond this many per cycle are dropped.
    pub max_hands:      usize,
    /// Consecutive capture failures before the source reports degraded.
    pub degraded_after: u32,
    /// Pause before retrying a degraded source.
    pub cooldown_ms:    u64,
    pub camera:         CameraConfig,
    pub scripted:       ScriptedConfig,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            kind:           SourceKind::Scripted,
            mirror:         true,
            max_hands:      2,
            degraded_after: 3,
            cooldown_ms:    250,
            camera:         CameraConfig::default(),
            scripted:       ScriptedConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CameraConfig {
    /// OpenCV device index.
    pub device:         i32,
    pub width:          u32,
    pub height:         u32,
    /// Interpreter used to run the detector helper.
    pub python:         String,
    /// Path to the MediaPipe helper script.
    pub helper:         PathBuf,
    /// Hands the detector scores below this are ignored.
    pub min_confidence: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            device:         0,
            width:          640,
            height:         480,
            python:         "python3".to_string(),
            helper:         PathBuf::from("atom_rig/helpers/hand_detect.py"),
            min_confidence: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScriptedConfig {
    pub width:      u32,
    pub height:     u32,
    /// Simulated capture + inference latency per cycle.
    pub cycle_ms:   u64,
    /// Landmark noise amplitude, normalised units.
    pub jitter:     f32,
    /// Fail every n-th capture; 0 never fails.
    pub fail_every: u32,
    pub steps:      Vec<ScriptStep>,
}

impl Default for ScriptedConfig {
    fn default() -> Self {
        ScriptedConfig {
            width:      320,
            height:     240,
            cycle_ms:   33,
            jitter:     0.004,
            fail_every: 0,
            steps:      ScriptStep::demo(),
        }
    }
}

/// `[classifier]`: the classifier's own knobs plus the optional debounce.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierSection {
    pub min_curled_fingers: usize,
    pub dead_zone:          f32,
    pub conflict:           ConflictPolicy,
    /// Cycles a new label must hold before it is published; 1 disables.
    pub debounce_cycles:    usize,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        let c = ClassifierConfig::default();
        ClassifierSection {
            min_curled_fingers: c.min_curled_fingers,
            dead_zone:          c.dead_zone,
            conflict:           c.conflict,
            debounce_cycles:    1,
        }
    }
}

impl ClassifierSection {
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            min_curled_fingers: self.min_curled_fingers,
            dead_zone:          self.dead_zone,
            conflict:           self.conflict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    pub title: String,
    /// Render loop rate.
    pub fps:   u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            title: "Atom Rig - Gesture Control".to_string(),
            fps:   60,
        }
    }
}

/// Playback lengths for the simulated rig.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RigConfig {
    /// Default one-shot length in seconds.
    pub one_shot_secs: f32,
    /// Per-clip overrides, keyed by clip name.
    pub clip_secs:     BTreeMap<String, f32>,
}

impl Default for RigConfig {
    fn default() -> Self {
        let mut clip_secs = BTreeMap::new();
        clip_secs.insert("boxing".to_string(), 1.6);
        RigConfig { one_shot_secs: 0.9, clip_secs }
    }
}

impl RigConfig {
    pub fn seconds_for(&self, clip: &str) -> f32 {
        self.clip_secs.get(clip).copied().unwrap_or(self.one_shot_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: "info".to_string() }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Load / save / validate
// ════════════════════════════════════════════════════════════════════════════

impl AppConfig {
    /// Load configuration from a TOML file.  Not validated here: callers
    /// apply command-line overrides first, then call [`AppConfig::validate`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save configuration to a TOML file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));

        let s = &self.source;
        if s.max_hands == 0 || s.max_hands > 2 {
            return invalid(format!("source.max_hands must be 1 or 2, got {}", s.max_hands));
        }
        if s.degraded_after == 0 {
            return invalid("source.degraded_after must be at least 1".into());
        }
        if s.scripted.width == 0 || s.scripted.height == 0 {
            return invalid("source.scripted frame size must be non-zero".into());
        }
        if s.kind == SourceKind::Scripted && s.scripted.steps.is_empty() {
            return invalid("source.scripted.steps is empty".into());
        }
        if !(0.0..=1.0).contains(&s.camera.min_confidence) {
            return invalid(format!(
                "source.camera.min_confidence must be in [0, 1], got {}",
                s.camera.min_confidence
            ));
        }

        let c = &self.classifier;
        if !(3..=4).contains(&c.min_curled_fingers) {
            return invalid(format!(
                "classifier.min_curled_fingers must be 3 or 4, got {}",
                c.min_curled_fingers
            ));
        }
        if !(0.0..0.9).contains(&c.dead_zone) {
            return invalid(format!("classifier.dead_zone must be in [0, 0.9), got {}", c.dead_zone));
        }
        if c.debounce_cycles == 0 {
            return invalid("classifier.debounce_cycles must be at least 1".into());
        }

        if self.render.fps == 0 {
            return invalid("render.fps must be at least 1".into());
        }
        let bad_length = |v: f32| !v.is_finite() || v <= 0.0;
        if bad_length(self.rig.one_shot_secs) || self.rig.clip_secs.values().any(|&v| bad_length(v)) {
            return invalid("rig clip lengths must be positive and finite".into());
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ScriptPose;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.source.kind, SourceKind::Scripted);
        assert_eq!(config.source.degraded_after, 3);
        assert_eq!(config.classifier.min_curled_fingers, 3);
        assert_eq!(config.classifier.debounce_cycles, 1);
        assert_eq!(config.rig.seconds_for("boxing"), 1.6);
        assert_eq!(config.rig.seconds_for("punch_left"), 0.9);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn toml_serialization_has_every_section() {
        let text = AppConfig::default().to_toml().unwrap();
        for section in ["[source]", "[source.camera]", "[source.scripted]", "[classifier]", "[render]", "[rig]", "[logging]"] {
            assert!(text.contains(section), "missing {}", section);
        }
        assert!(text.contains("conflict = \"fists_first\""));
        assert!(text.contains("kind = \"scripted\""));
    }

    #[test]
    fn toml_deserialization() {
        let toml_content = r#"
[source]
kind = "camera"
mirror = false
cooldown_ms = 500

[source.camera]
device = 2
min_confidence = 0.5

[source.scripted]
steps = [
    { left = "fist", right = "none", cycles = 10 },
    { left = "palm", right = "palm", cycles = 20 },
]

[classifier]
conflict = "left_first"
debounce_cycles = 3

[logging]
level = "debug"
"#;
        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.source.kind, SourceKind::Camera);
        assert!(!config.source.mirror);
        assert_eq!(config.source.cooldown_ms, 500);
        assert_eq!(config.source.max_hands, 2);
        assert_eq!(config.source.camera.device, 2);
        assert_eq!(config.source.scripted.steps.len(), 2);
        assert_eq!(config.source.scripted.steps[0].left, ScriptPose::Fist);
        assert_eq!(config.classifier.conflict, ConflictPolicy::LeftFirst);
        assert_eq!(config.classifier.debounce_cycles, 3);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn round_trip_through_file() {
        let path = std::env::temp_dir().join(format!("atom_rig_cfg_{}.toml", std::process::id()));
        let mut config = AppConfig::default();
        config.render.fps = 30;
        config.to_file(&path).unwrap();
        let loaded = AppConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.classifier.min_curled_fingers = 2;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = AppConfig::default();
        config.source.max_hands = 3;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.rig.clip_secs.insert("dance".into(), 0.0);
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.source.scripted.steps.clear();
        assert!(config.validate().is_err());

        for length in [f32::NAN, f32::INFINITY] {
            let mut config = AppConfig::default();
            config.rig.one_shot_secs = length;
            assert!(config.validate().is_err(), "one_shot_secs = {}", length);

            let mut config = AppConfig::default();
            config.rig.clip_secs.insert("boxing".into(), length);
            assert!(config.validate().is_err(), "boxing = {}", length);
        }
    }

    #[test]
    fn non_finite_lengths_from_toml_are_rejected() {
        let config: AppConfig = toml::from_str("[rig]\none_shot_secs = nan\n").unwrap();
        assert!(config.rig.one_shot_secs.is_nan());
        assert!(config.validate().is_err());

        let config: AppConfig = toml::from_str("[rig.clip_secs]\ndance = inf\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_file_leaves_validation_to_the_caller() {
        let path = std::env::temp_dir().join(format!("atom_rig_cfg_novalidate_{}.toml", std::process::id()));
        std::fs::write(&path, "[source]\nkind = \"scripted\"\n\n[source.scripted]\nsteps = []\n").unwrap();
        let mut config = AppConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(config.validate().is_err());
        config.source.kind = SourceKind::Camera;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn section_maps_to_classifier_config() {
        let section = ClassifierSection { min_curled_fingers: 4, ..ClassifierSection::default() };
        assert_eq!(section.classifier_config().min_curled_fingers, 4);
        assert_eq!(section.classifier_config().conflict, ConflictPolicy::FistsFirst);
    }
}
