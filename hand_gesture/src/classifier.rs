//! Fist / palm classification.
//!
//! # Algorithm
//!
//! For each of the four non-thumb fingers we look at two vectors that both
//! start at the fingertip: tip → PIP knuckle and tip → wrist.
//!
//! * Extended finger: the PIP lies between the tip and the wrist, so both
//!   vectors point the same way (cosine > `dead_zone`).
//! * Curled finger: the tip has folded back past the PIP toward the palm, so
//!   the PIP now lies on the far side (cosine < `-dead_zone`).
//!
//! Comparing directions instead of a fixed image axis keeps the verdict
//! stable when the hand is rotated about the camera axis.
//!
//! A hand is `Extended` when all four fingers are extended, `Curled` when at
//! least `min_curled_fingers` are curled, and `Neutral` otherwise.

use serde::{Deserialize, Serialize};

use crate::label::GestureLabel;
use crate::landmark::{HandObservation, HandSide, FINGER_JOINTS};

const MIN_SEGMENT: f32 = 1e-6;

// ════════════════════════════════════════════════════════════════════════════
// Per-hand state
// ════════════════════════════════════════════════════════════════════════════

/// Posture of a single hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandState {
    Curled,
    Extended,
    /// Neither curled nor extended; contributes no signal.
    Neutral,
}

impl HandState {
    pub fn is_definite(self) -> bool { self != HandState::Neutral }

    pub fn as_str(self) -> &'static str {
        match self {
            HandState::Curled   => "fist",
            HandState::Extended => "palm",
            HandState::Neutral  => "neutral",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flex { Curled, Extended }

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

/// Which single-hand label wins when both hands are definite but disagree
/// (one curled, one extended).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Left fist, right fist, left palm, right palm.
    #[default]
    FistsFirst,
    /// Left fist, left palm, right fist, right palm.
    LeftFirst,
}

impl ConflictPolicy {
    fn order(self) -> [(HandSide, HandState); 4] {
        use HandSide::{Left, Right};
        use HandState::{Curled, Extended};
        match self {
            ConflictPolicy::FistsFirst => [(Left, Curled), (Right, Curled), (Left, Extended), (Right, Extended)],
            ConflictPolicy::LeftFirst  => [(Left, Curled), (Left, Extended), (Right, Curled), (Right, Extended)],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Curled fingers (of four) needed to call the hand a fist; 3 or 4.
    pub min_curled_fingers: usize,
    /// Cosine band around zero treated as "can't tell" for one finger.
    pub dead_zone: f32,
    pub conflict: ConflictPolicy,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            min_curled_fingers: 3,
            dead_zone:          0.1,
            conflict:           ConflictPolicy::FistsFirst,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Classification result
// ════════════════════════════════════════════════════════════════════════════

/// Everything one cycle's classification produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Classification {
    pub label: GestureLabel,
    /// State of the first left-tagged hand, if any.
    pub left:  Option<HandState>,
    /// State of the first right-tagged hand, if any.
    pub right: Option<HandState>,
    /// Number of observations handed in.
    pub hands_seen: usize,
}

impl Classification {
    /// Display confidence: 1.0 for a two-hand label, 0.85 for one hand,
    /// 0.3 when hands are visible but nothing matched, 0.0 with no hands.
    pub fn confidence(&self) -> f32 {
        if self.label.is_combined() {
            1.0
        } else if !self.label.is_none() {
            0.85
        } else if self.hands_seen > 0 {
            0.3
        } else {
            0.0
        }
    }

    pub fn state_of(&self, side: HandSide) -> Option<HandState> {
        match side {
            HandSide::Left  => self.left,
            HandSide::Right => self.right,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Classifier
// ════════════════════════════════════════════════════════════════════════════

/// Stateless classifier.  Holding a config does not make it stateful: the
/// same observations always produce the same result.
#[derive(Clone, Debug, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(mut config: ClassifierConfig) -> Self {
        config.min_curled_fingers = config.min_curled_fingers.clamp(3, FINGER_JOINTS.len());
        config.dead_zone = config.dead_zone.clamp(0.0, 0.9);
        Classifier { config }
    }

    pub fn config(&self) -> &ClassifierConfig { &self.config }

    pub fn classify(&self, observations: &[HandObservation]) -> GestureLabel {
        self.evaluate(observations).label
    }

    pub fn evaluate(&self, observations: &[HandObservation]) -> Classification {
        // A detector can mislabel both hands with the same side; the first
        // observation of each side is the one that counts.
        let first = |side: HandSide| {
            observations
                .iter()
                .find(|o| o.side() == side)
                .map(|o| self.hand_state(o))
        };
        let left  = first(HandSide::Left);
        let right = first(HandSide::Right);

        Classification {
            label: self.combine(left, right),
            left,
            right,
            hands_seen: observations.len(),
        }
    }

    /// Classify one hand.
    pub fn hand_state(&self, hand: &HandObservation) -> HandState {
        let mut curled   = 0;
        let mut extended = 0;
        for &(pip, tip) in FINGER_JOINTS.iter() {
            match self.finger_flex(hand, pip, tip) {
                Some(Flex::Curled)   => curled += 1,
                Some(Flex::Extended) => extended += 1,
                None => {}
            }
        }

        if extended == FINGER_JOINTS.len() {
            HandState::Extended
        } else if curled >= self.config.min_curled_fingers {
            HandState::Curled
        } else {
            HandState::Neutral
        }
    }

    fn finger_flex(&self, hand: &HandObservation, pip: usize, tip: usize) -> Option<Flex> {
        let tip_pt = hand.point(tip);
        let (ax, ay) = tip_pt.to(hand.point(pip));
        let (bx, by) = tip_pt.to(hand.wrist());

        let la = (ax * ax + ay * ay).sqrt();
        let lb = (bx * bx + by * by).sqrt();
        if la < MIN_SEGMENT || lb < MIN_SEGMENT {
            return None;
        }

        let cos = (ax * bx + ay * by) / (la * lb);
        if cos > self.config.dead_zone {
            Some(Flex::Extended)
        } else if cos < -self.config.dead_zone {
            Some(Flex::Curled)
        } else {
            None
        }
    }

    fn combine(&self, left: Option<HandState>, right: Option<HandState>) -> GestureLabel {
        if let (Some(l), Some(r)) = (left, right) {
            if l == r && l.is_definite() {
                return match l {
                    HandState::Curled => GestureLabel::BothFists,
                    _                 => GestureLabel::BothPalms,
                };
            }
        }

        for (side, wanted) in self.config.conflict.order() {
            let state = match side {
                HandSide::Left  => left,
                HandSide::Right => right,
            };
            if state == Some(wanted) {
                return match wanted {
                    HandState::Curled => GestureLabel::fist(side),
                    _                 => GestureLabel::palm(side),
                };
            }
        }
        GestureLabel::None
    }
}

/// Classify with the default configuration.
pub fn classify(observations: &[HandObservation]) -> GestureLabel {
    Classifier::default().classify(observations)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
