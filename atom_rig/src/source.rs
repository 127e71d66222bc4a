//! Landmark source: capture backends behind one trait, plus the wrapper the
//! inference loop actually calls.
//!
//! A backend ([`HandCapture`]) grabs one frame and runs detection on it.  It
//! may fail on any call.  [`LandmarkSource`] turns those failures into
//! something the loop can live with: the cycle yields no hands and the last
//! good frame, and after `degraded_after` failures in a row the reading
//! carries [`SourceHealth::Degraded`] so the loop can back off.

use image::RgbImage;
use log::{debug, info, warn};

use hand_gesture::HandObservation;

use crate::config::SourceConfig;
use crate::error::Result;

// ════════════════════════════════════════════════════════════════════════════
// HandCapture: unified interface for camera and scripted backends
// ════════════════════════════════════════════════════════════════════════════

/// One cycle's raw output: the frame and whatever hands were found in it.
#[derive(Clone, Debug)]
pub struct Capture {
    pub frame: RgbImage,
    pub hands: Vec<HandObservation>,
}

/// Anything that can grab a frame and detect hands in it.
///
/// Implementations own their device exclusively; the inference thread is
/// the only caller.
pub trait HandCapture: Send + 'static {
    fn capture_and_detect(&mut self) -> Result<Capture>;

    /// Size of the frames this backend produces, used for the blank frame
    /// shown before the first successful capture.
    fn frame_size(&self) -> (u32, u32);

    fn name(&self) -> &str;
}

impl<C: HandCapture + ?Sized> HandCapture for Box<C> {
    fn capture_and_detect(&mut self) -> Result<Capture> { (**self).capture_and_detect() }
    fn frame_size(&self) -> (u32, u32) { (**self).frame_size() }
    fn name(&self) -> &str { (**self).name() }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkSource
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceHealth {
    Healthy,
    /// `failures` consecutive captures have failed.
    Degraded { failures: u32 },
}

impl SourceHealth {
    pub fn is_degraded(self) -> bool { matches!(self, SourceHealth::Degraded { .. }) }
}

/// What one call to [`LandmarkSource::read`] produced.
#[derive(Clone, Debug)]
pub struct Reading {
    /// This cycle's frame, or the last good one if the capture failed.
    pub frame:  RgbImage,
    /// At most `max_hands` observations; empty on failure.
    pub hands:  Vec<HandObservation>,
    pub health: SourceHealth,
    /// False when the capture failed and `frame` is a stand-in.
    pub fresh:  bool,
}

pub struct LandmarkSource<C: HandCapture = Box<dyn HandCapture>> {
    capture:        C,
    max_hands:      usize,
    degraded_after: u32,
    failures:       u32,
    last_frame:     Option<RgbImage>,
}

impl<C: HandCapture> LandmarkSource<C> {
    pub fn new(capture: C, config: &SourceConfig) -> Self {
        LandmarkSource {
            capture,
            max_hands:      config.max_hands.max(1),
            degraded_after: config.degraded_after.max(1),
            failures:       0,
            last_frame:     None,
        }
    }

    /// Run one capture. Never fails: errors become an empty, possibly
    /// degraded reading.
    pub fn read(&mut self) -> Reading {
        match self.capture.capture_and_detect() {
            Ok(Capture { frame, mut hands }) => {
                if self.failures >= self.degraded_after {
                    info!("{}: recovered after {} failed captures", self.capture.name(), self.failures);
                }
                self.failures = 0;
                if hands.len() > self.max_hands {
                    debug!("{}: dropping {} extra hands", self.capture.name(), hands.len() - self.max_hands);
                    hands.truncate(self.max_hands);
                }
                self.last_frame = Some(frame.clone());
                Reading { frame, hands, health: SourceHealth::Healthy, fresh: true }
            }
            Err(e) => {
                self.failures = self.failures.saturating_add(1);
                if self.failures == self.degraded_after {
                    warn!("{}: degraded after {} failed captures: {}", self.capture.name(), self.failures, e);
                } else {
                    debug!("{}: capture failed ({}): {}", self.capture.name(), self.failures, e);
                }
                let frame = match &self.last_frame {
                    Some(f) => f.clone(),
                    None => {
                        let (w, h) = self.capture.frame_size();
                        RgbImage::new(w, h)
                    }
                };
                Reading { frame, hands: Vec::new(), health: self.health(), fresh: false }
            }
        }
    }

    pub fn health(&self) -> SourceHealth {
        if self.failures >= self.degraded_after {
            SourceHealth::Degraded { failures: self.failures }
        } else {
            SourceHealth::Healthy
        }
    }

    pub fn name(&self) -> &str { self.capture.name() }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
