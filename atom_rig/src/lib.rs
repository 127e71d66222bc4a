//! # atom_rig
//!
//! Hand-gesture controller for a character rig.  A background thread reads
//! hand landmarks (webcam + MediaPipe, or a scripted stand-in), classifies
//! fists and palms, and drops the newest result into a single-slot mailbox.
//! The render loop drains it once per frame and drives the animation state
//! machine, so a slow detector never stalls the animation.
//!
//! ## Gesture → Clip mapping
//!
//! | Gesture | Hands | Clip |
//! |---|---|---|
//! | Fist | Left | `punch_left` |
//! | Fist | Right | `punch_right` |
//! | Fist | Both | `boxing` |
//! | Open palm | Left | `kick_left` |
//! | Open palm | Right | `kick_right` |
//! | Open palm | Both | `dance` (loops) |
//! | Nothing held | - | `idle` (loops) |
//!
//! One-shot clips play once and fall back to `idle`; holding a gesture does
//! not replay its clip.
//!
//! ## Feature flags
//!
//! * (default): **Scripted mode**, a looping script of synthetic hands.
//! * `camera`: **Webcam mode**, OpenCV capture plus a MediaPipe helper
//!   process (`helpers/hand_detect.py`).
//!
//! ### Keyboard shortcuts
//!
//! | Key | Clip |
//! |---|---|
//! | `1` | idle |
//! | `2` | dance |
//! | `3` / `4` | punch left / right |
//! | `5` / `6` | kick left / right |
//! | `7` | boxing |
//! | `Esc` / `Q` | Quit |

pub mod error;
pub mod config;
pub mod source;
pub mod sim;
pub mod frame;
pub mod detector;
#[cfg(feature = "camera")]
pub mod camera;
pub mod inference;
pub mod rig;
pub mod driver;
pub mod visualizer;
pub mod app;

pub use error::{Error, Result};
