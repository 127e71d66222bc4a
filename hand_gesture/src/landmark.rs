//! Landmark points and per-hand observations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices (MediaPipe hand model ordering)
// ════════════════════════════════════════════════════════════════════════════

/// Number of points in every hand observation.
pub const LANDMARK_COUNT: usize = 21;

pub const WRIST:      usize = 0;
pub const THUMB_CMC:  usize = 1;
pub const THUMB_MCP:  usize = 2;
pub const THUMB_IP:   usize = 3;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_PIP:  usize = 6;
pub const INDEX_DIP:  usize = 7;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP:   usize = 13;
pub const RING_PIP:   usize = 14;
pub const RING_DIP:   usize = 15;
pub const RING_TIP:   usize = 16;
pub const PINKY_MCP:  usize = 17;
pub const PINKY_PIP:  usize = 18;
pub const PINKY_DIP:  usize = 19;
pub const PINKY_TIP:  usize = 20;

/// `(pip, tip)` pairs for the four non-thumb fingers, index → pinky.
pub const FINGER_JOINTS: [(usize, usize); 4] = [
    (INDEX_PIP,  INDEX_TIP),
    (MIDDLE_PIP, MIDDLE_TIP),
    (RING_PIP,   RING_TIP),
    (PINKY_PIP,  PINKY_TIP),
];

/// Fingertip indices, thumb included.
pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Bones drawn when annotating a frame: four per digit plus the knuckle line.
pub const HAND_CONNECTIONS: [(usize, usize); 23] = [
    (WRIST, THUMB_CMC), (THUMB_CMC, THUMB_MCP), (THUMB_MCP, THUMB_IP), (THUMB_IP, THUMB_TIP),
    (WRIST, INDEX_MCP), (INDEX_MCP, INDEX_PIP), (INDEX_PIP, INDEX_DIP), (INDEX_DIP, INDEX_TIP),
    (WRIST, MIDDLE_MCP), (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
    (WRIST, RING_MCP), (RING_MCP, RING_PIP), (RING_PIP, RING_DIP), (RING_DIP, RING_TIP),
    (WRIST, PINKY_MCP), (PINKY_MCP, PINKY_PIP), (PINKY_PIP, PINKY_DIP), (PINKY_DIP, PINKY_TIP),
    (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, RING_MCP), (RING_MCP, PINKY_MCP),
];

// ════════════════════════════════════════════════════════════════════════════
// LandmarkPoint
// ════════════════════════════════════════════════════════════════════════════

/// One landmark.  `x`/`y` are normalised image coordinates in `[0, 1]`
/// (y grows downward); `z` is detector-relative depth and may be zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        LandmarkPoint { x, y, z: 0.0 }
    }

    pub const fn with_depth(x: f32, y: f32, z: f32) -> Self {
        LandmarkPoint { x, y, z }
    }

    /// 2-D vector from `self` to `other`.
    pub fn to(self, other: LandmarkPoint) -> (f32, f32) {
        (other.x - self.x, other.y - self.y)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandSide
// ════════════════════════════════════════════════════════════════════════════

/// Which hand the detector believes it saw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    pub fn as_str(self) -> &'static str {
        match self {
            HandSide::Left  => "left",
            HandSide::Right => "right",
        }
    }
}

impl fmt::Display for HandSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandSide {
    type Err = LandmarkError;

    /// Accepts `left`/`right` in any case (MediaPipe reports `Left`/`Right`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left"  => Ok(HandSide::Left),
            "right" => Ok(HandSide::Right),
            _       => Err(LandmarkError::UnknownSide(s.to_string())),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandObservation
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LandmarkError {
    #[error("expected 21 landmarks, got {0}")]
    WrongCount(usize),

    #[error("unknown hand side \"{0}\"")]
    UnknownSide(String),
}

/// One cycle's landmarks for a single detected hand.
///
/// Fields are private: an observation is built once and read thereafter, so
/// the side tag can never be reassigned.
#[derive(Clone, Debug, PartialEq)]
pub struct HandObservation {
    side:   HandSide,
    points: [LandmarkPoint; LANDMARK_COUNT],
}

impl HandObservation {
    pub fn new(side: HandSide, points: [LandmarkPoint; LANDMARK_COUNT]) -> Self {
        HandObservation { side, points }
    }

    /// Build from a slice, as delivered by a detector.
    pub fn from_points(side: HandSide, points: &[LandmarkPoint]) -> Result<Self, LandmarkError> {
        let points: [LandmarkPoint; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| LandmarkError::WrongCount(points.len()))?;
        Ok(HandObservation { side, points })
    }

    pub fn side(&self) -> HandSide { self.side }

    pub fn points(&self) -> &[LandmarkPoint; LANDMARK_COUNT] { &self.points }

    pub fn point(&self, index: usize) -> LandmarkPoint { self.points[index] }

    pub fn wrist(&self) -> LandmarkPoint { self.points[WRIST] }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
