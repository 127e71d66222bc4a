//! Synthetic hands.
//!
//! Builds plausible 21-point observations for a handful of canonical poses.
//! The scripted landmark source uses these in place of a camera, and the
//! tests use them as fixtures.
//!
//! Hands are laid out in a local frame with the wrist at the origin and the
//! fingers pointing toward −y (image "up"), one unit from wrist to the
//! middle fingertip.  [`Placement`] then rotates, scales and moves the hand
//! into normalised image coordinates.

use crate::landmark::{HandObservation, HandSide, LandmarkPoint, LANDMARK_COUNT};

/// A canonical hand shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandPose {
    /// All four fingers folded into the palm.
    Fist,
    /// All four fingers straight.
    Palm,
    /// Index and middle straight, ring and pinky folded.
    Relaxed,
}

/// Where the hand sits in the image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Wrist position, normalised.
    pub wrist_x:  f32,
    pub wrist_y:  f32,
    /// Wrist-to-middle-fingertip length, normalised.
    pub scale:    f32,
    /// Rotation about the camera axis in radians; 0 = fingers up.
    pub rotation: f32,
}

impl Default for Placement {
    fn default() -> Self {
        Placement { wrist_x: 0.5, wrist_y: 0.8, scale: 0.35, rotation: 0.0 }
    }
}

// Local-frame joint heights (MCP, PIP, DIP, TIP) along −y.
const EXTENDED: [f32; 4] = [0.45, 0.65, 0.80, 0.93];
const CURLED:   [f32; 4] = [0.45, 0.58, 0.45, 0.35];

// Lateral finger offsets, index → pinky, measured away from the thumb.
const COLUMNS: [f32; 4] = [0.22, 0.07, -0.08, -0.22];

/// Generate an observation for `side` in `pose` at `placement`.
pub fn synthesize(side: HandSide, pose: HandPose, placement: Placement) -> HandObservation {
    // Thumb on +x for a left hand, −x for a right hand.
    let s = match side {
        HandSide::Left  =>  1.0,
        HandSide::Right => -1.0,
    };

    let mut local = [(0.0_f32, 0.0_f32); LANDMARK_COUNT];

    // Thumb: CMC, MCP, IP, TIP.
    let thumb: [(f32, f32); 4] = match pose {
        HandPose::Fist => [(0.15, 0.10), (0.26, 0.20), (0.24, 0.32), (0.12, 0.40)],
        _              => [(0.15, 0.10), (0.28, 0.20), (0.36, 0.30), (0.42, 0.38)],
    };
    for (i, &(x, y)) in thumb.iter().enumerate() {
        local[1 + i] = (s * x, -y);
    }

    for (finger, &column) in COLUMNS.iter().enumerate() {
        let curled = match pose {
            HandPose::Fist    => true,
            HandPose::Palm    => false,
            HandPose::Relaxed => finger >= 2,
        };
        let heights = if curled { &CURLED } else { &EXTENDED };
        // The little finger is a bit shorter.
        let reach = if finger == 3 { 0.88 } else { 1.0 };
        let base = 5 + finger * 4;
        for (joint, &h) in heights.iter().enumerate() {
            let h = if joint == 0 { h } else { heights[0] + (h - heights[0]) * reach };
            local[base + joint] = (s * column, -h);
        }
    }

    let (sin, cos) = placement.rotation.sin_cos();
    let mut points = [LandmarkPoint::default(); LANDMARK_COUNT];
    for (p, &(lx, ly)) in points.iter_mut().zip(local.iter()) {
        let rx = lx * cos - ly * sin;
        let ry = lx * sin + ly * cos;
        *p = LandmarkPoint::new(
            placement.wrist_x + rx * placement.scale,
            placement.wrist_y + ry * placement.scale,
        );
    }

    HandObservation::new(side, points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{INDEX_PIP, INDEX_TIP, MIDDLE_TIP, THUMB_TIP, WRIST};
    use approx::assert_relative_eq;

    fn dist(a: LandmarkPoint, b: LandmarkPoint) -> f32 {
        let (dx, dy) = a.to(b);
        (dx * dx + dy * dy).sqrt()
    }

    #[test]
    fn upright_palm_has_tips_above_pips() {
        let h = synthesize(HandSide::Left, HandPose::Palm, Placement::default());
        assert!(h.point(INDEX_TIP).y < h.point(INDEX_PIP).y);
        assert_relative_eq!(h.point(WRIST).x, 0.5);
        assert_relative_eq!(h.point(WRIST).y, 0.8);
    }

    #[test]
    fn fist_tips_sit_below_pips() {
        let h = synthesize(HandSide::Right, HandPose::Fist, Placement::default());
        assert!(h.point(INDEX_TIP).y > h.point(INDEX_PIP).y);
    }

    #[test]
    fn sides_mirror_the_thumb() {
        let l = synthesize(HandSide::Left,  HandPose::Palm, Placement::default());
        let r = synthesize(HandSide::Right, HandPose::Palm, Placement::default());
        assert!(l.point(THUMB_TIP).x > 0.5);
        assert!(r.point(THUMB_TIP).x < 0.5);
        assert_relative_eq!(l.point(THUMB_TIP).x - 0.5, 0.5 - r.point(THUMB_TIP).x, epsilon = 1e-6);
    }

    #[test]
    fn rotation_preserves_lengths() {
        let upright = synthesize(HandSide::Left, HandPose::Palm, Placement::default());
        let turned  = synthesize(HandSide::Left, HandPose::Palm, Placement {
            rotation: 1.1,
            ..Placement::default()
        });
        assert_relative_eq!(
            dist(upright.point(WRIST), upright.point(MIDDLE_TIP)),
            dist(turned.point(WRIST), turned.point(MIDDLE_TIP)),
            epsilon = 1e-5
        );
        assert_relative_eq!(
            dist(upright.point(WRIST), upright.point(MIDDLE_TIP)),
            0.35 * 0.07_f32.hypot(0.93),
            epsilon = 1e-5
        );
    }
}
