//! Bridge to the MediaPipe hand landmarker running in a Python helper.
//!
//! Protocol, one exchange per frame:
//!
//! 1. On start the helper prints `READY`.
//! 2. We write a 12-byte header (`width`, `height`, `channels`, each `u32`
//!    little-endian) followed by the raw RGB bytes.
//! 3. The helper answers with one JSON line:
//!    `{"hands":[{"handedness":"Left","score":0.93,"landmarks":[{"x":..,"y":..,"z":..}, ...]}],"error":null}`

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use image::RgbImage;
use log::{debug, info, warn};
use serde::Deserialize;

use hand_gesture::{HandObservation, HandSide, LandmarkPoint};

use crate::error::{Error, Result};

#[derive(Deserialize, Debug)]
struct PointJson {
    x: f32,
    y: f32,
    #[serde(default)]
    z: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    handedness: String,
    score:      f32,
    landmarks:  Vec<PointJson>,
}

#[derive(Deserialize, Debug)]
struct Reply {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Write one frame in the helper's wire format.
pub fn encode_frame<W: Write>(out: &mut W, frame: &RgbImage) -> std::io::Result<()> {
    let (w, h) = frame.dimensions();
    out.write_all(&w.to_le_bytes())?;
    out.write_all(&h.to_le_bytes())?;
    out.write_all(&3u32.to_le_bytes())?;
    out.write_all(frame.as_raw())?;
    out.flush()
}

/// Decode one reply line.  Hands below `min_confidence`, with an
/// unrecognised handedness, or with the wrong number of points are skipped
/// with a warning; a helper-reported error fails the whole frame.
pub fn parse_reply(line: &str, min_confidence: f32) -> Result<Vec<HandObservation>> {
    let reply: Reply = serde_json::from_str(line.trim())?;
    if let Some(err) = reply.error {
        return Err(Error::Detector(err));
    }

    let mut hands = Vec::with_capacity(reply.hands.len());
    for hand in reply.hands {
        if hand.score < min_confidence {
            debug!("skipping {} hand, score {:.2}", hand.handedness, hand.score);
            continue;
        }
        let side: HandSide = match hand.handedness.parse() {
            Ok(side) => side,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };
        let points: Vec<LandmarkPoint> = hand
            .landmarks
            .iter()
            .map(|p| LandmarkPoint::with_depth(p.x, p.y, p.z))
            .collect();
        match HandObservation::from_points(side, &points) {
            Ok(obs) => hands.push(obs),
            Err(e) => warn!("{} hand: {}", side, e),
        }
    }
    Ok(hands)
}

/// Read the helper's first line, which must be `READY`.
fn await_ready<R: BufRead>(reader: &mut R) -> Result<()> {
    let mut ready = String::new();
    reader.read_line(&mut ready)?;
    if ready.trim() != "READY" {
        return Err(Error::Detector(format!("helper did not signal ready, got {:?}", ready.trim())));
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// HandDetector: the subprocess
// ════════════════════════════════════════════════════════════════════════════

pub struct HandDetector {
    process:        Child,
    stdin:          ChildStdin,
    stdout:         BufReader<ChildStdout>,
    min_confidence: f32,
}

impl HandDetector {
    /// Start `python helper` and wait for its `READY` line.
    pub fn spawn(python: &str, helper: &Path, min_confidence: f32) -> Result<Self> {
        if !helper.exists() {
            return Err(Error::Detector(format!("helper script not found at {}", helper.display())));
        }
        info!("starting hand detector: {} {}", python, helper.display());

        let mut process = Command::new(python)
            .arg(helper)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let (stdin, stdout) = match (process.stdin.take(), process.stdout.take()) {
            (Some(i), Some(o)) => (i, o),
            _ => {
                let _ = process.kill();
                return Err(Error::Detector("helper pipes unavailable".into()));
            }
        };
        let mut stdout = BufReader::new(stdout);

        if let Err(e) = await_ready(&mut stdout) {
            let _ = process.kill();
            let _ = process.wait();
            return Err(e);
        }
        info!("hand detector ready");

        Ok(HandDetector { process, stdin, stdout, min_confidence })
    }

    pub fn detect(&mut self, frame: &RgbImage) -> Result<Vec<HandObservation>> {
        encode_frame(&mut self.stdin, frame)?;
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(Error::Detector("helper closed its output".into()));
        }
        parse_reply(&line, self.min_confidence)
    }
}

impl Drop for HandDetector {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hand_gesture::landmark::INDEX_TIP;

    fn hand_json(side: &str, score: f32, n: usize) -> String {
        let pts: Vec<String> = (0..n)
            .map(|i| format!(r#"{{"x":{},"y":0.5,"z":-0.01}}"#, i as f32 / 100.0))
            .collect();
        format!(r#"{{"handedness":"{}","score":{},"landmarks":[{}]}}"#, side, score, pts.join(","))
    }

    #[test]
    fn header_then_pixels() {
        let frame = RgbImage::new(2, 3);
        let mut out = Vec::new();
        encode_frame(&mut out, &frame).unwrap();
        assert_eq!(&out[0..4], &2u32.to_le_bytes());
        assert_eq!(&out[4..8], &3u32.to_le_bytes());
        assert_eq!(&out[8..12], &3u32.to_le_bytes());
        assert_eq!(out.len(), 12 + 2 * 3 * 3);
    }

    #[test]
    fn reply_with_two_hands() {
        let line = format!(
            r#"{{"hands":[{},{}],"error":null}}"#,
            hand_json("Left", 0.9, 21),
            hand_json("Right", 0.8, 21)
        );
        let hands = parse_reply(&line, 0.5).unwrap();
        assert_eq!(hands.len(), 2);
        assert_eq!(hands[0].side(), HandSide::Left);
        assert_eq!(hands[1].side(), HandSide::Right);
        assert_eq!(hands[0].point(INDEX_TIP).x, 0.08);
        assert_eq!(hands[0].point(INDEX_TIP).z, -0.01);
    }

    #[test]
    fn low_score_bad_side_and_short_hands_are_skipped() {
        let line = format!(
            r#"{{"hands":[{},{},{}]}}"#,
            hand_json("Left", 0.2, 21),
            hand_json("Both", 0.9, 21),
            hand_json("Right", 0.9, 20)
        );
        assert!(parse_reply(&line, 0.5).unwrap().is_empty());
    }

    #[test]
    fn helper_error_fails_the_frame() {
        let err = parse_reply(r#"{"hands":[],"error":"model not loaded"}"#, 0.5).unwrap_err();
        assert!(matches!(err, Error::Detector(msg) if msg == "model not loaded"));
        assert!(matches!(parse_reply("not json", 0.5), Err(Error::Json(_))));
    }

    struct Unreadable;
    impl std::io::Read for Unreadable {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "helper died"))
        }
    }

    #[test]
    fn ready_handshake() {
        assert!(await_ready(&mut std::io::Cursor::new("READY\n")).is_ok());
        assert!(matches!(
            await_ready(&mut std::io::Cursor::new("Traceback (most recent call last)\n")),
            Err(Error::Detector(_))
        ));
        assert!(matches!(await_ready(&mut std::io::Cursor::new("")), Err(Error::Detector(_))));
        assert!(matches!(await_ready(&mut BufReader::new(Unreadable)), Err(Error::Io(_))));
    }

    #[cfg(unix)]
    #[test]
    fn helper_that_never_gets_ready_is_reaped() {
        let dir = std::env::temp_dir();
        let script = dir.join(format!("atom_rig_not_ready_{}.sh", std::process::id()));
        let pid_file = dir.join(format!("atom_rig_not_ready_{}.pid", std::process::id()));
        std::fs::write(&script, format!("echo $$ > {}\necho loading\nexec sleep 30\n", pid_file.display())).unwrap();

        let r = HandDetector::spawn("sh", &script, 0.5);
        assert!(matches!(r, Err(Error::Detector(_))));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        std::fs::remove_file(&script).ok();
        std::fs::remove_file(&pid_file).ok();
        let check = format!("kill -0 {}", pid.trim());
        let alive = Command::new("sh").args(["-c", &check]).status().unwrap().success();
        assert!(!alive, "helper {} still running", pid.trim());
    }

    #[test]
    fn missing_helper_is_reported() {
        let r = HandDetector::spawn("python3", Path::new("/nonexistent/hand_detect.py"), 0.5);
        assert!(matches!(r, Err(Error::Detector(_))));
    }
}
