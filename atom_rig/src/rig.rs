//! The rig capability, the fixed gesture → clip table, and a simulated rig.
//!
//! ## Gesture → clip table
//!
//! | Gesture | Clip | Loops |
//! |---|---|---|
//! | `left_fist`  | `punch_left`  | no  |
//! | `right_fist` | `punch_right` | no  |
//! | `both_fists` | `boxing`      | no  |
//! | `left_palm`  | `kick_left`   | no  |
//! | `right_palm` | `kick_right`  | no  |
//! | `both_palms` | `dance`       | yes |
//! | `none`       | `idle`        | yes |

use std::collections::BTreeMap;
use std::time::Duration;

use hand_gesture::GestureLabel;

use crate::config::RigConfig;
use crate::error::{Error, Result};

// ════════════════════════════════════════════════════════════════════════════
// Rig: anything that can play named clips
// ════════════════════════════════════════════════════════════════════════════

pub trait Rig {
    /// True if `play(name, ..)` would succeed.
    fn has_clip(&self, name: &str) -> bool;

    /// Start `name` immediately, replacing whatever is playing.
    fn play(&mut self, name: &str, looping: bool) -> Result<()>;

    /// True once a one-shot clip has run to the end.  Loops never finish.
    fn is_finished(&self) -> bool;
}

impl<R: Rig + ?Sized> Rig for Box<R> {
    fn has_clip(&self, name: &str) -> bool { (**self).has_clip(name) }
    fn play(&mut self, name: &str, looping: bool) -> Result<()> { (**self).play(name, looping) }
    fn is_finished(&self) -> bool { (**self).is_finished() }
}

// ════════════════════════════════════════════════════════════════════════════
// ClipTable
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Clip {
    pub name:    &'static str,
    pub looping: bool,
    /// Human-readable name for the status panel.
    pub title:   &'static str,
}

impl Clip {
    const fn one_shot(name: &'static str, title: &'static str) -> Self {
        Clip { name, looping: false, title }
    }

    const fn looped(name: &'static str, title: &'static str) -> Self {
        Clip { name, looping: true, title }
    }
}

pub const IDLE: Clip = Clip::looped("idle", "Idle");

const TABLE: [(GestureLabel, Clip); 7] = [
    (GestureLabel::None,      IDLE),
    (GestureLabel::LeftFist,  Clip::one_shot("punch_left",  "Punch Left")),
    (GestureLabel::RightFist, Clip::one_shot("punch_right", "Punch Right")),
    (GestureLabel::BothFists, Clip::one_shot("boxing",      "Boxing")),
    (GestureLabel::LeftPalm,  Clip::one_shot("kick_left",   "Kick Left")),
    (GestureLabel::RightPalm, Clip::one_shot("kick_right",  "Kick Right")),
    (GestureLabel::BothPalms, Clip::looped("dance",         "Dance")),
];

/// The static gesture → clip mapping.
pub struct ClipTable;

impl ClipTable {
    pub fn clip_for(label: GestureLabel) -> Clip {
        TABLE
            .iter()
            .find(|(l, _)| *l == label)
            .map(|&(_, clip)| clip)
            .unwrap_or(IDLE)
    }

    pub fn by_name(name: &str) -> Option<Clip> {
        TABLE.iter().map(|&(_, clip)| clip).find(|c| c.name == name)
    }

    pub fn clips() -> impl Iterator<Item = Clip> {
        TABLE.iter().map(|&(_, clip)| clip)
    }

    /// Check once, at startup, that the rig can play every clip.
    pub fn validate<R: Rig + ?Sized>(rig: &R) -> Result<()> {
        match Self::clips().find(|c| !rig.has_clip(c.name)) {
            Some(missing) => Err(Error::MissingClip(missing.name.to_string())),
            None => Ok(()),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimRig: time-based stand-in for a real animation system
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
struct Playing {
    clip:    String,
    looping: bool,
    elapsed: f32,
    length:  f32,
}

/// Plays clips by the clock: a one-shot lasts its configured length, a loop
/// runs until replaced.  The visualizer poses its robot from
/// [`SimRig::current`] and [`SimRig::progress`].
#[derive(Clone, Debug)]
pub struct SimRig {
    lengths: BTreeMap<String, f32>,
    playing: Option<Playing>,
    plays:   u64,
}

impl SimRig {
    /// A rig that knows every clip in the table.
    pub fn new(config: &RigConfig) -> Self {
        let lengths = ClipTable::clips()
            .map(|c| (c.name.to_string(), config.seconds_for(c.name)))
            .collect();
        SimRig { lengths, playing: None, plays: 0 }
    }

    /// Forget a clip, as if its asset were missing.
    pub fn without_clip(mut self, name: &str) -> Self {
        self.lengths.remove(name);
        self
    }

    pub fn advance(&mut self, dt: Duration) {
        if let Some(p) = self.playing.as_mut() {
            p.elapsed += dt.as_secs_f32();
        }
    }

    /// Name of the clip currently playing, if any.
    pub fn current(&self) -> Option<&str> {
        self.playing.as_ref().map(|p| p.clip.as_str())
    }

    /// 0 → 1 through a one-shot; wraps for loops.
    pub fn progress(&self) -> f32 {
        match &self.playing {
            None => 0.0,
            Some(p) if p.looping => (p.elapsed / p.length).fract(),
            Some(p) => (p.elapsed / p.length).min(1.0),
        }
    }

    /// Total `play` calls accepted.
    pub fn plays(&self) -> u64 { self.plays }
}

impl Rig for SimRig {
    fn has_clip(&self, name: &str) -> bool {
        self.lengths.contains_key(name)
    }

    fn play(&mut self, name: &str, looping: bool) -> Result<()> {
        let length = *self.lengths.get(name).ok_or_else(|| Error::MissingClip(name.to_string()))?;
        self.playing = Some(Playing { clip: name.to_string(), looping, elapsed: 0.0, length });
        self.plays += 1;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        match &self.playing {
            None => true,
            Some(p) => !p.looping && p.elapsed >= p.length,
        }
    }
}
