//! The closed set of gesture labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::landmark::HandSide;

/// A discrete gesture, derived from a single cycle's observations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureLabel {
    #[default]
    None,
    LeftFist,
    RightFist,
    BothFists,
    LeftPalm,
    RightPalm,
    BothPalms,
}

impl GestureLabel {
    pub const ALL: [GestureLabel; 7] = [
        GestureLabel::None,
        GestureLabel::LeftFist,
        GestureLabel::RightFist,
        GestureLabel::BothFists,
        GestureLabel::LeftPalm,
        GestureLabel::RightPalm,
        GestureLabel::BothPalms,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GestureLabel::None      => "none",
            GestureLabel::LeftFist  => "left_fist",
            GestureLabel::RightFist => "right_fist",
            GestureLabel::BothFists => "both_fists",
            GestureLabel::LeftPalm  => "left_palm",
            GestureLabel::RightPalm => "right_palm",
            GestureLabel::BothPalms => "both_palms",
        }
    }

    pub fn fist(side: HandSide) -> Self {
        match side {
            HandSide::Left  => GestureLabel::LeftFist,
            HandSide::Right => GestureLabel::RightFist,
        }
    }

    pub fn palm(side: HandSide) -> Self {
        match side {
            HandSide::Left  => GestureLabel::LeftPalm,
            HandSide::Right => GestureLabel::RightPalm,
        }
    }

    pub fn is_none(self) -> bool { self == GestureLabel::None }

    /// True for the two-hand labels.
    pub fn is_combined(self) -> bool {
        matches!(self, GestureLabel::BothFists | GestureLabel::BothPalms)
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GestureLabel::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == s.trim())
            .ok_or_else(|| format!("unknown gesture label \"{}\"", s))
    }
}
