//! Top-level application: wires the source, inference thread, animation
//! driver and window together and runs the render loop.
//!
//! `AppState` owns the driver and whatever the window needs to show between
//! updates.  It never touches the window itself, so it can be driven from
//! tests.

use std::time::{Duration, Instant};

use image::RgbImage;
use log::{info, warn};

use hand_gesture::{GestureLabel, HandState};
use pose_channel::mailbox;

use crate::config::{AppConfig, SourceKind};
use crate::driver::{AnimState, AnimationDriver, Trigger};
use crate::error::Result;
use crate::inference::{InferenceLoop, LoopStatus};
use crate::rig::{ClipTable, SimRig};
use crate::sim::ScriptedCapture;
use crate::source::{HandCapture, LandmarkSource};
use crate::visualizer::{UiCommand, View, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    driver:     AnimationDriver<SimRig>,

    // ── last consumed update ─────────────────────────────────────────────
    frame:      Option<RgbImage>,
    gesture:    GestureLabel,
    left:       Option<HandState>,
    right:      Option<HandState>,
    confidence: f32,
    sequence:   u64,
    /// The current clip was picked from the keyboard.
    manual:     bool,

    // ── inference thread, as last observed ───────────────────────────────
    source:     String,
    loop_stats: LoopStatus,

    pub status: String,
}

impl AppState {
    pub fn new(driver: AnimationDriver<SimRig>, source: &str) -> Self {
        let mut app = AppState {
            driver,
            frame:      None,
            gesture:    GestureLabel::None,
            left:       None,
            right:      None,
            confidence: 0.0,
            sequence:   0,
            manual:     false,
            source:     source.to_string(),
            loop_stats: LoopStatus::default(),
            status:     String::new(),
        };
        app.refresh_status();
        app
    }

    pub fn state(&self) -> AnimState { self.driver.state() }

    pub fn gesture(&self) -> GestureLabel { self.gesture }

    pub fn sequence(&self) -> u64 { self.sequence }

    pub fn is_manual(&self) -> bool { self.manual }

    /// Apply one window command.  Returns `false` when the app should quit.
    pub fn handle_command(&mut self, cmd: UiCommand) -> bool {
        match cmd {
            UiCommand::Quit => false,
            UiCommand::Override(clip) => {
                match self.driver.manual_override(clip) {
                    Ok(()) => {
                        self.manual = true;
                        self.confidence = 1.0;
                    }
                    Err(e) => warn!("override {} rejected: {}", clip, e),
                }
                self.refresh_status();
                true
            }
        }
    }

    /// Per-frame logic: advance the rig clock, then let the driver consume
    /// the newest update, if any.
    pub fn tick(&mut self, dt: Duration) {
        self.driver.rig_mut().advance(dt);

        if let Some(update) = self.driver.tick() {
            let trigger = self.driver.last_trigger();
            self.gesture    = update.gesture;
            self.left       = update.left;
            self.right      = update.right;
            self.confidence = update.confidence;
            self.sequence   = update.sequence;
            self.frame      = Some(update.frame);
            if matches!(trigger, Some(Trigger::Gesture(_))) {
                self.manual = false;
            }
        }
        self.refresh_status();
    }

    /// Record the inference thread's counters for the status bar.
    pub fn observe_loop(&mut self, stats: LoopStatus) {
        self.loop_stats = stats;
        self.refresh_status();
    }

    pub fn view(&self) -> View<'_> {
        View {
            preview:    self.frame.as_ref(),
            left:       self.left,
            right:      self.right,
            confidence: self.confidence,
            state:      self.driver.state(),
            progress:   self.driver.rig().progress(),
            manual:     self.manual,
            degraded:   self.loop_stats.health.is_degraded(),
            status:     &self.status,
        }
    }

    fn refresh_status(&mut self) {
        let clip = ClipTable::by_name(self.state().clip()).map_or("?", |c| c.title);
        let origin = if self.manual { "key" } else { self.gesture.as_str() };
        self.status = format!(
            "#{} {} > {}   source {} ({} published, {} skipped)",
            self.sequence, origin, clip,
            self.source, self.loop_stats.published, self.loop_stats.skipped,
        );
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Wiring
// ════════════════════════════════════════════════════════════════════════════

/// Open the configured capture backend.
pub fn build_source(cfg: &AppConfig) -> Result<Box<dyn HandCapture>> {
    match cfg.source.kind {
        SourceKind::Scripted => Ok(Box::new(ScriptedCapture::new(&cfg.source.scripted)?)),
        #[cfg(feature = "camera")]
        SourceKind::Camera => Ok(Box::new(crate::camera::CameraCapture::open(&cfg.source)?)),
        #[cfg(not(feature = "camera"))]
        SourceKind::Camera => Err(crate::error::Error::CameraUnavailable),
    }
}

/// Run until the window closes or the user quits.
pub fn run(cfg: AppConfig) -> Result<()> {
    // ── Driver first: a rig missing a clip fails before anything starts ──
    let (publisher, taker) = mailbox();
    let driver = AnimationDriver::new(SimRig::new(&cfg.rig), taker)?;

    // ── Source + inference thread ─────────────────────────────────────────
    let capture = build_source(&cfg)?;
    let source = LandmarkSource::new(capture, &cfg.source);
    let name = source.name().to_string();
    let inference = InferenceLoop::new(
        source,
        &cfg.classifier,
        Duration::from_millis(cfg.source.cooldown_ms),
        publisher,
    )
    .spawn()?;

    // ── Window ────────────────────────────────────────────────────────────
    let mut vis = Visualizer::new(&cfg.render.title, cfg.render.fps)?;
    let mut app = AppState::new(driver, &name);

    // ── Main loop ─────────────────────────────────────────────────────────
    let mut last = Instant::now();
    let mut inference_gone = false;
    'frames: while vis.is_open() {
        for cmd in vis.poll_input() {
            if !app.handle_command(cmd) {
                break 'frames;
            }
        }

        let now = Instant::now();
        app.tick(now - last);
        last = now;

        app.observe_loop(inference.status());
        if !inference_gone && inference.is_finished() {
            warn!("inference thread exited, rig will hold its pose");
            inference_gone = true;
        }
        vis.render(&app.view())?;
    }

    info!("shutting down");
    inference.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RigConfig;
    use crate::error::Error;
    use crate::inference::PoseUpdate;
    use pose_channel::Publisher;

    fn app() -> (Publisher<PoseUpdate>, AppState) {
        let (tx, rx) = mailbox();
        let driver = AnimationDriver::new(SimRig::new(&RigConfig::default()), rx).unwrap();
        (tx, AppState::new(driver, "test"))
    }

    fn update(gesture: GestureLabel, sequence: u64) -> PoseUpdate {
        PoseUpdate {
            gesture,
            frame: RgbImage::new(4, 3),
            sequence,
            left: Some(HandState::Curled),
            right: None,
            confidence: 0.85,
        }
    }

    #[test]
    fn quit_command_stops_the_app() {
        let (_tx, mut app) = app();
        assert!(!app.handle_command(UiCommand::Quit));
    }

    #[test]
    fn override_switches_clip_and_marks_manual() {
        let (_tx, mut app) = app();
        assert!(app.handle_command(UiCommand::Override("dance")));
        assert_eq!(app.state(), AnimState::PlayingLoop("dance"));
        assert!(app.is_manual());
        assert_eq!(app.view().confidence, 1.0);
        assert!(app.status.contains("Dance"));
    }

    #[test]
    fn tick_consumes_the_newest_update() {
        let (tx, mut app) = app();
        tx.publish(update(GestureLabel::LeftFist, 1));
        tx.publish(update(GestureLabel::BothFists, 2));
        app.tick(Duration::from_millis(16));

        assert_eq!(app.sequence(), 2);
        assert_eq!(app.gesture(), GestureLabel::BothFists);
        assert_eq!(app.state(), AnimState::PlayingOneShot("boxing"));
        let view = app.view();
        assert!(view.preview.is_some());
        assert_eq!(view.left, Some(HandState::Curled));
    }

    #[test]
    fn one_shot_runs_out_and_idles() {
        let (tx, mut app) = app();
        tx.publish(update(GestureLabel::LeftFist, 1));
        app.tick(Duration::from_millis(16));
        assert_eq!(app.state(), AnimState::PlayingOneShot("punch_left"));

        // Rig clock is advanced before the finished check on the next tick.
        app.tick(Duration::from_secs(1));
        assert_eq!(app.state(), AnimState::Idle);
    }

    #[test]
    fn gesture_after_override_clears_manual_flag() {
        let (tx, mut app) = app();
        app.handle_command(UiCommand::Override("kick_left"));
        tx.publish(update(GestureLabel::RightFist, 1));
        app.tick(Duration::from_millis(16));
        assert!(!app.is_manual());
        assert_eq!(app.state(), AnimState::PlayingOneShot("punch_right"));
    }

    #[test]
    fn degraded_loop_shows_in_view() {
        let (_tx, mut app) = app();
        app.observe_loop(LoopStatus {
            health: crate::source::SourceHealth::Degraded { failures: 5 },
            skipped: 5,
            ..LoopStatus::default()
        });
        assert!(app.view().degraded);
        assert!(app.status.contains("5 skipped"));
    }

    #[cfg(not(feature = "camera"))]
    #[test]
    fn camera_source_needs_the_feature() {
        let mut cfg = AppConfig::default();
        cfg.source.kind = SourceKind::Camera;
        assert!(matches!(build_source(&cfg), Err(Error::CameraUnavailable)));
    }

    #[test]
    fn scripted_source_builds() {
        let src = build_source(&AppConfig::default()).unwrap();
        assert_eq!(src.name(), "scripted");
    }
}
