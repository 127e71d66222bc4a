//! Scripted capture: synthetic hands on a plain backdrop, no hardware.
//!
//! A script is a list of steps, each holding a left/right pose for a number
//! of cycles; the script loops.  Every cycle the hands get a little seeded
//! jitter and a slow sway so the classifier sees realistic, non-identical
//! input.  `fail_every` makes every n-th capture fail so degradation and
//! recovery can be watched without unplugging a camera.

use std::thread;
use std::time::Duration;

use image::{Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use hand_gesture::landmark::{LandmarkPoint, LANDMARK_COUNT};
use hand_gesture::synth::{synthesize, HandPose, Placement};
use hand_gesture::{HandObservation, HandSide};

use crate::config::ScriptedConfig;
use crate::error::{Error, Result};
use crate::source::{Capture, HandCapture};

const BACKDROP: Rgb<u8> = Rgb([38, 42, 54]);
const SEED:     u64     = 0x5eed_4a4d;

// ════════════════════════════════════════════════════════════════════════════
// Script
// ════════════════════════════════════════════════════════════════════════════

/// Pose of one hand in a script step.  `none` leaves the hand out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptPose {
    #[default]
    None,
    Fist,
    Palm,
    Relaxed,
}

impl ScriptPose {
    fn hand_pose(self) -> Option<HandPose> {
        match self {
            ScriptPose::None    => None,
            ScriptPose::Fist    => Some(HandPose::Fist),
            ScriptPose::Palm    => Some(HandPose::Palm),
            ScriptPose::Relaxed => Some(HandPose::Relaxed),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    #[serde(default)]
    pub left:   ScriptPose,
    #[serde(default)]
    pub right:  ScriptPose,
    /// How many captures this step lasts.
    pub cycles: u32,
    /// Hand tilt in degrees about the camera axis.
    #[serde(default)]
    pub tilt:   f32,
}

impl ScriptStep {
    pub fn new(left: ScriptPose, right: ScriptPose, cycles: u32) -> Self {
        ScriptStep { left, right, cycles, tilt: 0.0 }
    }

    /// A tour of every gesture, roughly 1–2 s each at 30 captures/s.
    pub fn demo() -> Vec<ScriptStep> {
        use ScriptPose::*;
        vec![
            ScriptStep::new(None,    None,    45),
            ScriptStep::new(Fist,    None,    40),
            ScriptStep::new(None,    None,    20),
            ScriptStep::new(None,    Fist,    40),
            ScriptStep::new(Relaxed, Relaxed, 30),
            ScriptStep::new(Palm,    None,    40),
            ScriptStep::new(None,    Palm,    40),
            ScriptStep { tilt: 35.0, ..ScriptStep::new(Fist, Fist, 60) },
            ScriptStep::new(None,    None,    20),
            ScriptStep::new(Palm,    Palm,    90),
            ScriptStep::new(Fist,    Palm,    40),
        ]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ScriptedCapture
// ════════════════════════════════════════════════════════════════════════════

pub struct ScriptedCapture {
    steps:      Vec<ScriptStep>,
    width:      u32,
    height:     u32,
    cycle:      Duration,
    jitter:     f32,
    fail_every: u32,
    rng:        StdRng,
    // position
    step:       usize,
    within:     u32,
    captures:   u64,
}

impl ScriptedCapture {
    pub fn new(config: &ScriptedConfig) -> Result<Self> {
        if config.steps.is_empty() || config.steps.iter().all(|s| s.cycles == 0) {
            return Err(Error::InvalidConfig("scripted source needs at least one non-empty step".into()));
        }
        let first = config.steps.iter().position(|s| s.cycles > 0).unwrap_or(0);
        Ok(ScriptedCapture {
            steps:      config.steps.clone(),
            width:      config.width.max(1),
            height:     config.height.max(1),
            cycle:      Duration::from_millis(config.cycle_ms),
            jitter:     config.jitter.max(0.0),
            fail_every: config.fail_every,
            rng:        StdRng::seed_from_u64(SEED),
            step:       first,
            within:     0,
            captures:   0,
        })
    }

    /// Script step the next capture will use.
    pub fn current_step(&self) -> &ScriptStep { &self.steps[self.step] }

    fn advance(&mut self) {
        self.within += 1;
        while self.within >= self.steps[self.step].cycles {
            self.within = 0;
            self.step = (self.step + 1) % self.steps.len();
            if self.steps[self.step].cycles > 0 { break; }
        }
    }

    fn hand(&mut self, side: HandSide, pose: HandPose, tilt_deg: f32) -> HandObservation {
        // Hands sit either side of centre; the sway is a slow drift keyed
        // off the capture count.
        let t = self.captures as f32 * 0.05;
        let (base_x, phase) = match side {
            HandSide::Left  => (0.68, 0.0),
            HandSide::Right => (0.32, 1.7),
        };
        let mirror = if side == HandSide::Left { -1.0 } else { 1.0 };
        let placement = Placement {
            wrist_x:  base_x + 0.02 * (t + phase).sin(),
            wrist_y:  0.85 + 0.015 * (t * 1.3 + phase).cos(),
            scale:    0.32,
            rotation: mirror * tilt_deg.to_radians(),
        };

        let clean = synthesize(side, pose, placement);
        if self.jitter == 0.0 {
            return clean;
        }
        let j = self.jitter;
        let mut points = [LandmarkPoint::default(); LANDMARK_COUNT];
        for (p, q) in points.iter_mut().zip(clean.points().iter()) {
            *p = LandmarkPoint::new(
                q.x + self.rng.random_range(-j..=j),
                q.y + self.rng.random_range(-j..=j),
            );
        }
        HandObservation::new(side, points)
    }
}

impl HandCapture for ScriptedCapture {
    fn capture_and_detect(&mut self) -> Result<Capture> {
        if !self.cycle.is_zero() {
            thread::sleep(self.cycle);
        }
        self.captures += 1;

        if self.fail_every > 0 && self.captures % u64::from(self.fail_every) == 0 {
            return Err(Error::Capture(format!("scripted failure at capture {}", self.captures)));
        }

        let step = self.steps[self.step].clone();
        self.advance();

        let mut hands = Vec::with_capacity(2);
        if let Some(pose) = step.left.hand_pose() {
            hands.push(self.hand(HandSide::Left, pose, step.tilt));
        }
        if let Some(pose) = step.right.hand_pose() {
            hands.push(self.hand(HandSide::Right, pose, step.tilt));
        }

        Ok(Capture {
            frame: RgbImage::from_pixel(self.width, self.height, BACKDROP),
            hands,
        })
    }

    fn frame_size(&self) -> (u32, u32) { (self.width, self.height) }

    fn name(&self) -> &str { "scripted" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hand_gesture::{classify, GestureLabel};

    fn config(steps: Vec<ScriptStep>) -> ScriptedConfig {
        ScriptedConfig { steps, cycle_ms: 0, ..ScriptedConfig::default() }
    }

    fn labels(cap: &mut ScriptedCapture, n: usize) -> Vec<GestureLabel> {
        (0..n).map(|_| classify(&cap.capture_and_detect().unwrap().hands)).collect()
    }

    #[test]
    fn script_steps_advance_and_loop() {
        use ScriptPose::*;
        let mut cap = ScriptedCapture::new(&config(vec![
            ScriptStep::new(Fist, None, 2),
            ScriptStep::new(None, Palm, 1),
        ]))
        .unwrap();
        assert_eq!(
            labels(&mut cap, 5),
            vec![
                GestureLabel::LeftFist,
                GestureLabel::LeftFist,
                GestureLabel::RightPalm,
                GestureLabel::LeftFist,
                GestureLabel::LeftFist,
            ]
        );
    }

    #[test]
    fn jittered_demo_still_classifies_as_scripted() {
        let mut cap = ScriptedCapture::new(&config(ScriptStep::demo())).unwrap();
        for step in ScriptStep::demo() {
            for _ in 0..step.cycles {
                let hands = cap.capture_and_detect().unwrap().hands;
                let expected = classify(&ScriptedCapture::new(&ScriptedConfig {
                    jitter: 0.0,
                    ..config(vec![step.clone()])
                })
                .unwrap()
                .capture_and_detect()
                .unwrap()
                .hands);
                assert_eq!(classify(&hands), expected, "step {:?}", step);
            }
        }
    }

    #[test]
    fn fail_every_injects_failures() {
        let mut cap = ScriptedCapture::new(&ScriptedConfig {
            fail_every: 3,
            ..config(vec![ScriptStep::new(ScriptPose::Palm, ScriptPose::Palm, 10)])
        })
        .unwrap();
        assert!(cap.capture_and_detect().is_ok());
        assert!(cap.capture_and_detect().is_ok());
        assert!(matches!(cap.capture_and_detect(), Err(Error::Capture(_))));
        assert!(cap.capture_and_detect().is_ok());
    }

    #[test]
    fn zero_cycle_steps_are_skipped() {
        use ScriptPose::*;
        let mut cap = ScriptedCapture::new(&config(vec![
            ScriptStep::new(Fist, Fist, 1),
            ScriptStep::new(Palm, None, 0),
            ScriptStep::new(Palm, Palm, 1),
        ]))
        .unwrap();
        assert_eq!(labels(&mut cap, 3), vec![GestureLabel::BothFists, GestureLabel::BothPalms, GestureLabel::BothFists]);
        assert!(ScriptedCapture::new(&config(vec![ScriptStep::new(Fist, Fist, 0)])).is_err());
    }

    #[test]
    fn leading_zero_cycle_step_is_never_used() {
        use ScriptPose::*;
        let mut cap = ScriptedCapture::new(&config(vec![
            ScriptStep::new(Palm, Palm, 0),
            ScriptStep::new(Fist, None, 2),
            ScriptStep::new(None, Fist, 1),
        ]))
        .unwrap();
        assert_eq!(cap.current_step().left, Fist);
        cap.capture_and_detect().unwrap();
        cap.capture_and_detect().unwrap();
        assert_eq!(cap.current_step().right, Fist);
        cap.capture_and_detect().unwrap();
        // Wraps past the empty step.
        assert_eq!(cap.current_step().left, Fist);
    }

    #[test]
    fn frame_matches_configured_size() {
        let mut cap = ScriptedCapture::new(&ScriptedConfig { width: 64, height: 48, ..config(ScriptStep::demo()) }).unwrap();
        assert_eq!(cap.capture_and_detect().unwrap().frame.dimensions(), (64, 48));
    }
}
