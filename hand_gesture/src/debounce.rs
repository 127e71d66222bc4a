//! Optional temporal smoothing on top of the frame-local classifier.
//!
//! A new label only replaces the stable one after it has been seen for
//! `required` consecutive cycles.  With `required <= 1` every label passes
//! straight through.

use crate::label::GestureLabel;

#[derive(Clone, Debug)]
pub struct Debouncer {
    required:  usize,
    stable:    GestureLabel,
    candidate: GestureLabel,
    streak:    usize,
}

impl Debouncer {
    pub fn new(required: usize) -> Self {
        Debouncer {
            required:  required.max(1),
            stable:    GestureLabel::None,
            candidate: GestureLabel::None,
            streak:    0,
        }
    }

    /// Feed one cycle's label; returns the label to publish.
    pub fn push(&mut self, label: GestureLabel) -> GestureLabel {
        if label == self.stable {
            self.candidate = label;
            self.streak = 0;
            return self.stable;
        }

        if label == self.candidate {
            self.streak += 1;
        } else {
            self.candidate = label;
            self.streak = 1;
        }

        if self.streak >= self.required {
            self.stable = label;
            self.streak = 0;
        }
        self.stable
    }

    pub fn stable(&self) -> GestureLabel { self.stable }

    pub fn required(&self) -> usize { self.required }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_when_required_is_one() {
        let mut d = Debouncer::new(1);
        assert_eq!(d.push(GestureLabel::LeftFist), GestureLabel::LeftFist);
        assert_eq!(d.push(GestureLabel::None), GestureLabel::None);
        assert_eq!(Debouncer::new(0).required(), 1);
    }

    #[test]
    fn change_needs_k_consecutive_cycles() {
        let mut d = Debouncer::new(3);
        assert_eq!(d.push(GestureLabel::BothPalms), GestureLabel::None);
        assert_eq!(d.push(GestureLabel::BothPalms), GestureLabel::None);
        assert_eq!(d.push(GestureLabel::BothPalms), GestureLabel::BothPalms);
        assert_eq!(d.stable(), GestureLabel::BothPalms);
    }

    #[test]
    fn flicker_resets_the_streak() {
        let mut d = Debouncer::new(2);
        d.push(GestureLabel::RightFist);
        d.push(GestureLabel::RightPalm);
        assert_eq!(d.push(GestureLabel::RightFist), GestureLabel::None);
        assert_eq!(d.push(GestureLabel::RightFist), GestureLabel::RightFist);
    }

    #[test]
    fn returning_to_stable_clears_candidate() {
        let mut d = Debouncer::new(2);
        d.push(GestureLabel::LeftPalm);
        assert_eq!(d.push(GestureLabel::None), GestureLabel::None);
        assert_eq!(d.push(GestureLabel::LeftPalm), GestureLabel::None);
    }
}
