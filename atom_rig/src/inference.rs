//! The inference loop: the producer half of the pipeline.
//!
//! Each cycle reads the landmark source, classifies, optionally debounces,
//! annotates the frame and publishes a [`PoseUpdate`] into the mailbox.  It
//! runs on its own thread at whatever rate capture + detection allow and
//! never waits on the render loop.
//!
//! A failed capture publishes nothing, so the rig holds its last pose.  Once
//! the source reports degraded the loop sleeps `cooldown` between attempts
//! instead of spinning on a dead camera.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use image::RgbImage;
use log::{debug, info, trace, warn};
use parking_lot::Mutex;

use hand_gesture::{Classifier, Debouncer, GestureLabel, HandState};
use pose_channel::Publisher;

use crate::config::ClassifierSection;
use crate::error::Result;
use crate::frame;
use crate::source::{HandCapture, LandmarkSource, SourceHealth};

// ════════════════════════════════════════════════════════════════════════════
// PoseUpdate
// ════════════════════════════════════════════════════════════════════════════

/// The unit handed from inference to animation.  Built once per published
/// cycle and moved through the mailbox; nothing mutates it afterwards.
#[derive(Clone, Debug)]
pub struct PoseUpdate {
    pub gesture:    GestureLabel,
    /// Annotated frame for the preview.
    pub frame:      RgbImage,
    /// Strictly increasing, starting at 1.
    pub sequence:   u64,
    pub left:       Option<HandState>,
    pub right:      Option<HandState>,
    pub confidence: f32,
}

// ════════════════════════════════════════════════════════════════════════════
// Status shared with the UI
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopStatus {
    pub cycles:    u64,
    pub published: u64,
    pub skipped:   u64,
    pub health:    SourceHealth,
    pub running:   bool,
}

impl Default for LoopStatus {
    fn default() -> Self {
        LoopStatus { cycles: 0, published: 0, skipped: 0, health: SourceHealth::Healthy, running: false }
    }
}

/// What a single [`InferenceLoop::cycle`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    Published { sequence: u64, replaced_unread: bool },
    /// Capture failed; nothing published.
    Skipped,
    /// Capture failed and the source is degraded; caller should cool down.
    Degraded,
}

// ════════════════════════════════════════════════════════════════════════════
// InferenceLoop
// ════════════════════════════════════════════════════════════════════════════

pub struct InferenceLoop<C: HandCapture = Box<dyn HandCapture>> {
    source:     LandmarkSource<C>,
    classifier: Classifier,
    debouncer:  Option<Debouncer>,
    publisher:  Publisher<PoseUpdate>,
    cooldown:   Duration,
    sequence:   u64,
    status:     Arc<Mutex<LoopStatus>>,
}

impl<C: HandCapture> InferenceLoop<C> {
    pub fn new(
        source:    LandmarkSource<C>,
        settings:  &ClassifierSection,
        cooldown:  Duration,
        publisher: Publisher<PoseUpdate>,
    ) -> Self {
        let debouncer = (settings.debounce_cycles > 1).then(|| Debouncer::new(settings.debounce_cycles));
        InferenceLoop {
            source,
            classifier: Classifier::new(settings.classifier_config()),
            debouncer,
            publisher,
            cooldown,
            sequence: 0,
            status: Arc::new(Mutex::new(LoopStatus::default())),
        }
    }

    /// Shared view of the loop's counters.
    pub fn status(&self) -> Arc<Mutex<LoopStatus>> { Arc::clone(&self.status) }

    /// One capture → classify → publish pass.
    pub fn cycle(&mut self) -> CycleOutcome {
        let reading = self.source.read();

        let outcome = if !reading.fresh {
            if reading.health.is_degraded() { CycleOutcome::Degraded } else { CycleOutcome::Skipped }
        } else {
            let result = self.classifier.evaluate(&reading.hands);
            let gesture = match self.debouncer.as_mut() {
                Some(d) => d.push(result.label),
                None    => result.label,
            };

            let mut image = reading.frame;
            frame::annotate(&mut image, &reading.hands);

            self.sequence += 1;
            let update = PoseUpdate {
                gesture,
                frame: image,
                sequence: self.sequence,
                left: result.left,
                right: result.right,
                confidence: result.confidence(),
            };
            trace!("#{} {} (raw {}, {} hands)", self.sequence, gesture, result.label, result.hands_seen);
            let replaced_unread = self.publisher.publish(update);
            CycleOutcome::Published { sequence: self.sequence, replaced_unread }
        };

        let mut st = self.status.lock();
        st.cycles += 1;
        st.health = reading.health;
        match outcome {
            CycleOutcome::Published { .. } => st.published += 1,
            _ => st.skipped += 1,
        }
        outcome
    }

    /// Move the loop onto its own thread.
    pub fn spawn(mut self) -> Result<InferenceHandle> {
        let running = Arc::new(AtomicBool::new(true));
        let status = self.status();
        let flag = Arc::clone(&running);

        let thread = thread::Builder::new()
            .name("inference".into())
            .spawn(move || {
                let settings = self.classifier.config();
                info!(
                    "inference loop started ({}, {} curled fingers for a fist, {:?})",
                    self.source.name(), settings.min_curled_fingers, settings.conflict
                );
                self.status.lock().running = true;
                // Checked before every cycle; an in-flight capture always
                // completes.
                while flag.load(Ordering::Acquire) {
                    if let CycleOutcome::Degraded = self.cycle() {
                        debug!("source degraded, cooling down for {:?}", self.cooldown);
                        thread::sleep(self.cooldown);
                    }
                    if !self.publisher.is_connected() {
                        warn!("pose consumer dropped, stopping inference");
                        break;
                    }
                }
                let stats = self.publisher.stats();
                info!(
                    "inference loop stopped after {} updates ({} overwritten unread)",
                    stats.published, stats.overwritten
                );
                self.status.lock().running = false;
            })?;

        Ok(InferenceHandle { running, thread: Some(thread), status })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// InferenceHandle
// ════════════════════════════════════════════════════════════════════════════

/// Owner's handle on the inference thread.  Dropping it stops the thread.
pub struct InferenceHandle {
    running: Arc<AtomicBool>,
    thread:  Option<JoinHandle<()>>,
    status:  Arc<Mutex<LoopStatus>>,
}

impl InferenceHandle {
    pub fn status(&self) -> LoopStatus { *self.status.lock() }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Signal the loop to stop and wait for it.  The loop exits before its
    /// next cycle.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("inference thread panicked");
            }
        }
    }
}

impl Drop for InferenceHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
