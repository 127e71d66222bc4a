//! End-to-end behaviour of the gesture → animation pipeline.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbImage;
use parking_lot::Mutex;

use atom_rig::config::{ClassifierSection, ScriptedConfig, SourceConfig};
use atom_rig::driver::{AnimState, AnimationDriver};
use atom_rig::inference::{InferenceLoop, PoseUpdate};
use atom_rig::rig::Rig;
use atom_rig::sim::{ScriptPose, ScriptStep, ScriptedCapture};
use atom_rig::source::LandmarkSource;
use atom_rig::Result;
use hand_gesture::synth::{synthesize, HandPose, Placement};
use hand_gesture::{classify, GestureLabel, HandSide};
use pose_channel::mailbox;

/// Records every `play` call; one-shots finish when the test says so.
#[derive(Clone, Default)]
struct RecordingRig {
    plays:    Arc<Mutex<Vec<(String, bool)>>>,
    finished: Arc<Mutex<bool>>,
}

impl RecordingRig {
    fn plays(&self) -> Vec<(String, bool)> { self.plays.lock().clone() }

    fn finish(&self) { *self.finished.lock() = true; }
}

impl Rig for RecordingRig {
    fn has_clip(&self, _name: &str) -> bool { true }

    fn play(&mut self, name: &str, looping: bool) -> Result<()> {
        self.plays.lock().push((name.to_string(), looping));
        *self.finished.lock() = false;
        Ok(())
    }

    fn is_finished(&self) -> bool { *self.finished.lock() }
}

fn update(gesture: GestureLabel, sequence: u64) -> PoseUpdate {
    PoseUpdate {
        gesture,
        frame: RgbImage::new(2, 2),
        sequence,
        left: None,
        right: None,
        confidence: 0.0,
    }
}

fn hand(side: HandSide, pose: HandPose) -> hand_gesture::HandObservation {
    let x = match side {
        HandSide::Left => 0.3,
        HandSide::Right => 0.7,
    };
    synthesize(side, pose, Placement { wrist_x: x, ..Placement::default() })
}

// ════════════════════════════════════════════════════════════════════════════
// Classification scenarios
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn fist_beats_palm_across_hands() {
    let hands = [hand(HandSide::Left, HandPose::Fist), hand(HandSide::Right, HandPose::Palm)];
    assert_eq!(classify(&hands), GestureLabel::LeftFist);

    let hands = [hand(HandSide::Left, HandPose::Palm), hand(HandSide::Right, HandPose::Fist)];
    assert_eq!(classify(&hands), GestureLabel::RightFist);
}

#[test]
fn paired_and_empty_scenarios() {
    let fists = [hand(HandSide::Left, HandPose::Fist), hand(HandSide::Right, HandPose::Fist)];
    assert_eq!(classify(&fists), GestureLabel::BothFists);

    let palms = [hand(HandSide::Left, HandPose::Palm), hand(HandSide::Right, HandPose::Palm)];
    assert_eq!(classify(&palms), GestureLabel::BothPalms);

    assert_eq!(classify(&[]), GestureLabel::None);
}

// ════════════════════════════════════════════════════════════════════════════
// Driver scenarios
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn left_fist_plays_punch_left_exactly_once() {
    let rig = RecordingRig::default();
    let (tx, rx) = mailbox();
    let mut driver = AnimationDriver::new(rig.clone(), rx).unwrap();

    for seq in 1..=5 {
        tx.publish(update(GestureLabel::LeftFist, seq));
        driver.tick();
    }

    let punches: Vec<_> = rig.plays().into_iter().filter(|(n, _)| n == "punch_left").collect();
    assert_eq!(punches, vec![("punch_left".to_string(), false)]);
}

#[test]
fn only_newest_update_reaches_the_driver() {
    let rig = RecordingRig::default();
    let (tx, rx) = mailbox();
    let mut driver = AnimationDriver::new(rig.clone(), rx).unwrap();

    tx.publish(update(GestureLabel::LeftFist, 1));
    tx.publish(update(GestureLabel::RightPalm, 2));
    tx.publish(update(GestureLabel::BothPalms, 3));
    let taken = driver.tick().map(|u| u.sequence);

    assert_eq!(taken, Some(3));
    assert_eq!(rig.plays(), vec![("idle".to_string(), true), ("dance".to_string(), true)]);
}

#[test]
fn manual_dance_interrupts_a_punch() {
    let rig = RecordingRig::default();
    let (tx, rx) = mailbox();
    let mut driver = AnimationDriver::new(rig.clone(), rx).unwrap();

    tx.publish(update(GestureLabel::LeftFist, 1));
    driver.tick();
    assert_eq!(driver.state(), AnimState::PlayingOneShot("punch_left"));

    driver.manual_override("dance").unwrap();
    assert_eq!(driver.state(), AnimState::PlayingLoop("dance"));
    assert_eq!(rig.plays().last(), Some(&("dance".to_string(), true)));
}

#[test]
fn finished_one_shot_settles_on_idle() {
    let rig = RecordingRig::default();
    let (tx, rx) = mailbox();
    let mut driver = AnimationDriver::new(rig.clone(), rx).unwrap();

    tx.publish(update(GestureLabel::BothFists, 1));
    driver.tick();
    rig.finish();
    driver.tick();

    assert_eq!(driver.state(), AnimState::Idle);
    assert_eq!(rig.plays().last(), Some(&("idle".to_string(), true)));
}

// ════════════════════════════════════════════════════════════════════════════
// Threads
// ════════════════════════════════════════════════════════════════════════════

#[test]
fn scripted_hands_drive_the_rig_across_threads() {
    let scripted = ScriptedConfig {
        cycle_ms: 1,
        jitter: 0.0,
        steps: vec![
            ScriptStep::new(ScriptPose::Fist, ScriptPose::None, 3),
            ScriptStep::new(ScriptPose::Palm, ScriptPose::Palm, 1000),
        ],
        ..ScriptedConfig::default()
    };
    let capture = ScriptedCapture::new(&scripted).unwrap();
    let source = LandmarkSource::new(capture, &SourceConfig::default());

    let (tx, rx) = mailbox();
    let handle = InferenceLoop::new(source, &ClassifierSection::default(), Duration::from_millis(10), tx)
        .spawn()
        .unwrap();

    let rig = RecordingRig::default();
    let mut driver = AnimationDriver::new(rig.clone(), rx).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while driver.state() != AnimState::PlayingLoop("dance") && Instant::now() < deadline {
        driver.tick();
        std::thread::sleep(Duration::from_millis(1));
    }
    handle.stop();

    assert_eq!(driver.state(), AnimState::PlayingLoop("dance"));
    let dances = rig.plays().into_iter().filter(|(n, _)| n == "dance").count();
    assert_eq!(dances, 1);
}
