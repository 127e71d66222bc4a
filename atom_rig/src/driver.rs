//! The animation driver: the consumer half of the pipeline.
//!
//! Called once per render tick.  It never waits: if the mailbox is empty the
//! current clip keeps playing, which is what lets the render rate and the
//! inference rate differ freely.
//!
//! ```text
//!            distinct trigger (loop)                distinct trigger (one-shot)
//!   Idle ─────────────────────────▶ PlayingLoop ◀───────────────┐
//!    ▲ │                                │                       │
//!    │ └──────────── distinct trigger (one-shot) ──▶ PlayingOneShot
//!    └──────────────── rig reports finished ─────────────────────┘
//! ```

use log::{debug, error, info};

use hand_gesture::GestureLabel;
use pose_channel::Taker;

use crate::error::{Error, Result};
use crate::inference::PoseUpdate;
use crate::rig::{Clip, ClipTable, Rig, IDLE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimState {
    /// The idle loop is playing.
    Idle,
    PlayingOneShot(&'static str),
    PlayingLoop(&'static str),
}

impl AnimState {
    fn of(clip: Clip) -> Self {
        if clip == IDLE {
            AnimState::Idle
        } else if clip.looping {
            AnimState::PlayingLoop(clip.name)
        } else {
            AnimState::PlayingOneShot(clip.name)
        }
    }

    pub fn clip(self) -> &'static str {
        match self {
            AnimState::Idle => IDLE.name,
            AnimState::PlayingOneShot(c) | AnimState::PlayingLoop(c) => c,
        }
    }
}

/// What last moved the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Gesture(GestureLabel),
    Manual(&'static str),
}

impl Trigger {
    fn clip(self) -> Clip {
        match self {
            Trigger::Gesture(label) => ClipTable::clip_for(label),
            Trigger::Manual(name) => ClipTable::by_name(name).unwrap_or(IDLE),
        }
    }
}

pub struct AnimationDriver<R: Rig> {
    rig:          R,
    taker:        Taker<PoseUpdate>,
    state:        AnimState,
    last_trigger: Option<Trigger>,
    last_seq:     u64,
}

impl<R: Rig> AnimationDriver<R> {
    /// Check the rig against the clip table and start idling.  A missing
    /// clip fails here, once, rather than on some later tick.
    pub fn new(mut rig: R, taker: Taker<PoseUpdate>) -> Result<Self> {
        ClipTable::validate(&rig)?;
        rig.play(IDLE.name, IDLE.looping)?;
        info!("animation driver ready, {} clips", ClipTable::clips().count());
        Ok(AnimationDriver { rig, taker, state: AnimState::Idle, last_trigger: None, last_seq: 0 })
    }

    pub fn state(&self) -> AnimState { self.state }

    pub fn last_trigger(&self) -> Option<Trigger> { self.last_trigger }

    pub fn rig(&self) -> &R { &self.rig }

    pub fn rig_mut(&mut self) -> &mut R { &mut self.rig }

    /// One render tick.  Returns the update consumed this tick, if any, so
    /// the caller can show its frame.
    pub fn tick(&mut self) -> Option<PoseUpdate> {
        let update = self.taker.try_take();

        let mut moved = false;
        if let Some(u) = &update {
            if u.sequence <= self.last_seq {
                debug!("stale update #{} after #{}", u.sequence, self.last_seq);
            }
            self.last_seq = u.sequence;
            moved = self.apply(Trigger::Gesture(u.gesture));
        }

        // A new clip this tick replaces the finished one; no idle in between.
        if !moved {
            if let AnimState::PlayingOneShot(clip) = self.state {
                if self.rig.is_finished() {
                    debug!("{} finished", clip);
                    self.start(IDLE);
                }
            }
        }
        update
    }

    /// Play `name` now, bypassing the classifier.  Counts as a new distinct
    /// trigger, so it overrides whatever is playing.
    pub fn manual_override(&mut self, name: &str) -> Result<()> {
        let clip = ClipTable::by_name(name).ok_or_else(|| Error::UnknownClip(name.to_string()))?;
        info!("manual override: {}", clip.name);
        self.last_trigger = Some(Trigger::Manual(clip.name));
        if clip.looping && self.state == AnimState::of(clip) {
            return Ok(());
        }
        self.play(clip)
    }

    /// Returns true if a clip was started.
    fn apply(&mut self, trigger: Trigger) -> bool {
        let clip = trigger.clip();
        let distinct = self.last_trigger.map(|t| t.clip()) != Some(clip);
        if distinct {
            debug!("{:?} -> {}", trigger, clip.name);
            self.last_trigger = Some(trigger);
            self.start(clip)
        } else if clip == IDLE && self.state != AnimState::Idle {
            // Held `none` always settles back on the idle loop.
            self.start(IDLE)
        } else {
            false
        }
    }

    /// Start `clip` unless that loop is already running.  Returns true if
    /// the rig accepted it.
    fn start(&mut self, clip: Clip) -> bool {
        if clip.looping && self.state == AnimState::of(clip) {
            return false;
        }
        match self.play(clip) {
            Ok(()) => true,
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }

    fn play(&mut self, clip: Clip) -> Result<()> {
        self.rig.play(clip.name, clip.looping)?;
        self.state = AnimState::of(clip);
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RigConfig;
    use crate::rig::SimRig;
    use image::RgbImage;
    use pose_channel::{mailbox, Publisher};
    use std::time::Duration;

    fn update(gesture: GestureLabel, sequence: u64) -> PoseUpdate {
        PoseUpdate {
            gesture,
            frame: RgbImage::new(1, 1),
            sequence,
            left: None,
            right: None,
            confidence: 0.0,
        }
    }

    fn driver() -> (Publisher<PoseUpdate>, AnimationDriver<SimRig>) {
        let (tx, rx) = mailbox();
        let d = AnimationDriver::new(SimRig::new(&RigConfig::default()), rx).unwrap();
        (tx, d)
    }

    #[test]
    fn starts_idle() {
        let (_tx, d) = driver();
        assert_eq!(d.state(), AnimState::Idle);
        assert_eq!(d.rig().current(), Some("idle"));
        assert_eq!(d.rig().plays(), 1);
    }

    #[test]
    fn missing_clip_fails_construction() {
        let (_tx, rx) = mailbox();
        let rig = SimRig::new(&RigConfig::default()).without_clip("boxing");
        match AnimationDriver::new(rig, rx) {
            Err(Error::MissingClip(name)) => assert_eq!(name, "boxing"),
            Err(e) => panic!("wrong error {}", e),
            Ok(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn empty_mailbox_leaves_animation_alone() {
        let (tx, mut d) = driver();
        tx.publish(update(GestureLabel::BothPalms, 1));
        assert!(d.tick().is_some());
        for _ in 0..10 {
            assert!(d.tick().is_none());
        }
        assert_eq!(d.state(), AnimState::PlayingLoop("dance"));
        assert_eq!(d.rig().plays(), 2);
    }

    #[test]
    fn one_shot_returns_to_idle_when_finished() {
        let (tx, mut d) = driver();
        tx.publish(update(GestureLabel::RightPalm, 1));
        d.tick();
        assert_eq!(d.state(), AnimState::PlayingOneShot("kick_right"));

        // Gesture still held: no re-trigger once the kick ends.
        d.rig_mut().advance(Duration::from_secs(2));
        tx.publish(update(GestureLabel::RightPalm, 2));
        d.tick();
        assert_eq!(d.state(), AnimState::Idle);
        assert_eq!(d.rig().current(), Some("idle"));
    }

    #[test]
    fn new_gesture_as_one_shot_ends_skips_idle() {
        let (tx, mut d) = driver();
        tx.publish(update(GestureLabel::LeftFist, 1));
        d.tick();
        d.rig_mut().advance(Duration::from_secs(2));
        assert!(d.rig().is_finished());

        let before = d.rig().plays();
        tx.publish(update(GestureLabel::RightFist, 2));
        d.tick();
        assert_eq!(d.rig().plays(), before + 1);
        assert_eq!(d.state(), AnimState::PlayingOneShot("punch_right"));
        assert_eq!(d.rig().current(), Some("punch_right"));
    }

    #[test]
    fn held_none_does_not_replay_idle() {
        let (tx, mut d) = driver();
        for seq in 1..=5 {
            tx.publish(update(GestureLabel::None, seq));
            d.tick();
        }
        assert_eq!(d.state(), AnimState::Idle);
        assert_eq!(d.rig().plays(), 1);
    }

    #[test]
    fn distinct_gesture_interrupts_one_shot() {
        let (tx, mut d) = driver();
        tx.publish(update(GestureLabel::LeftFist, 1));
        d.tick();
        tx.publish(update(GestureLabel::BothFists, 2));
        d.tick();
        assert_eq!(d.state(), AnimState::PlayingOneShot("boxing"));
    }

    #[test]
    fn unknown_manual_clip_is_an_error() {
        let (_tx, mut d) = driver();
        assert!(matches!(d.manual_override("moonwalk"), Err(Error::UnknownClip(_))));
        assert_eq!(d.state(), AnimState::Idle);
    }

    #[test]
    fn gesture_after_manual_override_takes_over() {
        let (tx, mut d) = driver();
        d.manual_override("dance").unwrap();
        assert_eq!(d.last_trigger(), Some(Trigger::Manual("dance")));

        // Both palms maps to the dance already playing: nothing restarts.
        tx.publish(update(GestureLabel::BothPalms, 1));
        d.tick();
        assert_eq!(d.rig().plays(), 2);

        tx.publish(update(GestureLabel::LeftPalm, 2));
        d.tick();
        assert_eq!(d.state(), AnimState::PlayingOneShot("kick_left"));
    }

    #[test]
    fn manual_one_shot_replays_on_every_press() {
        let (_tx, mut d) = driver();
        d.manual_override("punch_right").unwrap();
        d.manual_override("punch_right").unwrap();
        assert_eq!(d.rig().plays(), 3);
        assert_eq!(d.state(), AnimState::PlayingOneShot("punch_right"));
    }
}
