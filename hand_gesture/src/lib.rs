//! # hand_gesture
//!
//! Turns per-hand landmark geometry into one of seven discrete gestures.
//!
//! A hand is a fixed list of 21 points in the MediaPipe ordering (wrist,
//! four thumb joints, then MCP/PIP/DIP/TIP for each of the other four
//! fingers).  For every non-thumb finger the classifier asks whether the tip
//! has folded back past its PIP knuckle toward the wrist; the per-hand
//! verdicts are then combined into a single [`GestureLabel`].
//!
//! ## Gesture table
//!
//! | Left hand | Right hand | Label |
//! |---|---|---|
//! | curled | curled | `both_fists` |
//! | extended | extended | `both_palms` |
//! | curled | absent / neutral | `left_fist` |
//! | absent / neutral | curled | `right_fist` |
//! | extended | absent / neutral | `left_palm` |
//! | absent / neutral | extended | `right_palm` |
//! | anything else | | `none` (or the conflict rule, see [`ConflictPolicy`]) |
//!
//! ## Quick start
//!
//! ```rust
//! use hand_gesture::{classify, GestureLabel, HandSide};
//! use hand_gesture::synth::{synthesize, HandPose, Placement};
//!
//! let left = synthesize(HandSide::Left, HandPose::Fist, Placement::default());
//! assert_eq!(classify(&[left]), GestureLabel::LeftFist);
//! ```
//!
//! Classification is frame-local and pure.  Temporal smoothing, when wanted,
//! is a separate step: feed labels through a [`Debouncer`].

pub mod landmark;
pub mod label;
pub mod classifier;
pub mod debounce;
pub mod synth;

pub use landmark::{HandObservation, HandSide, LandmarkError, LandmarkPoint, LANDMARK_COUNT};
pub use label::GestureLabel;
pub use classifier::{
    classify, Classification, Classifier, ClassifierConfig, ConflictPolicy, HandState,
};
pub use debounce::Debouncer;
