//! Software-rendered status window using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────┬─────────────────────┬──────────────────┐
//! │  CAMERA          │                     │  ACTIONS         │
//! │  [preview]       │      robot          │  [boxing]        │
//! │                  │      arena          │  [dance]         │
//! │  DETECTION       │                     │  [punch left] …  │
//! │  left / right    │                     │                  │
//! │  action, conf    │                     │                  │
//! ├──────────────────┴─────────────────────┴──────────────────┤
//! │  status bar / key legend                                  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Drawing goes to a [`Canvas`] so it can be exercised without a window;
//! [`Visualizer`] owns the window, polls keys and presents the canvas.

use std::f32::consts::PI;
use std::time::Duration;

use image::RgbImage;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use hand_gesture::HandState;

use crate::driver::AnimState;
use crate::error::Result;
use crate::frame::pack_argb;
use crate::rig::{ClipTable, IDLE};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:     usize = 1200;
pub const WIN_H:     usize = 640;
const SIDE_W:        usize = 400;
const ARENA_X:       usize = SIDE_W;
const ARENA_W:       usize = WIN_W - 2 * SIDE_W;
const CARDS_X:       usize = WIN_W - SIDE_W;
const PREVIEW_X:     usize = 16;
const PREVIEW_Y:     usize = 40;
const PREVIEW_W:     usize = SIDE_W - 32;
const PREVIEW_H:     usize = PREVIEW_W * 3 / 4;
const DETECT_Y:      usize = PREVIEW_Y + PREVIEW_H + 24;
const CARD_H:        usize = 60;
const CARD_GAP:      usize = 12;
const STATUS_Y:      usize = WIN_H - 60;
const BG_COLOR:      u32   = 0xFF1A1A2E;
const PANEL_BG:      u32   = 0xFF16213E;
const ARENA_BG:      u32   = 0xFF1E1E28;
const BORDER:        u32   = 0xFF3C3C3C;
const TEXT_BG:       u32   = 0xFF0F3460;
const TEXT:          u32   = 0xFFEEEEEE;
const DIM_TEXT:      u32   = 0xFF888888;
const ACCENT:        u32   = 0xFF00C8FF;
const METAL:         u32   = 0xFF8C96A0;
const BODY:          u32   = 0xFF3C5078;
const FIST:          u32   = 0xFFC83232;

/// Keyboard shortcuts, `1`–`7`.
pub const SHORTCUTS: [(Key, &str); 7] = [
    (Key::Key1, "idle"),
    (Key::Key2, "dance"),
    (Key::Key3, "punch_left"),
    (Key::Key4, "punch_right"),
    (Key::Key5, "kick_left"),
    (Key::Key6, "kick_right"),
    (Key::Key7, "boxing"),
];

// ════════════════════════════════════════════════════════════════════════════
// What to draw
// ════════════════════════════════════════════════════════════════════════════

/// Snapshot of everything the window shows, assembled by the app each tick.
pub struct View<'a> {
    pub preview:    Option<&'a RgbImage>,
    pub left:       Option<HandState>,
    pub right:      Option<HandState>,
    pub confidence: f32,
    pub state:      AnimState,
    /// Position within the current clip, 0–1.
    pub progress:   f32,
    pub manual:     bool,
    pub degraded:   bool,
    pub status:     &'a str,
}

/// Input the window turns into app actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiCommand {
    Override(&'static str),
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    canvas: Canvas,
}

impl Visualizer {
    pub fn new(title: &str, fps: u32) -> Result<Self> {
        let mut window = Window::new(
            title,
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;
        window.limit_update_rate(Some(Duration::from_micros(1_000_000 / u64::from(fps.max(1)))));

        Ok(Visualizer { window, canvas: Canvas::new(WIN_W, WIN_H) })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Keys pressed since the last call.
    pub fn poll_input(&mut self) -> Vec<UiCommand> {
        let mut cmds = Vec::new();
        if !self.window.is_open() {
            cmds.push(UiCommand::Quit);
            return cmds;
        }
        let pressed = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        if pressed(Key::Escape) || pressed(Key::Q) {
            cmds.push(UiCommand::Quit);
        }
        for &(key, clip) in SHORTCUTS.iter() {
            if pressed(key) {
                cmds.push(UiCommand::Override(clip));
            }
        }
        cmds
    }

    pub fn render(&mut self, view: &View<'_>) -> Result<()> {
        self.canvas.draw(view);
        self.window.update_with_buffer(&self.canvas.buf, WIN_W, WIN_H)?;
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    w:   usize,
    h:   usize,
    buf: Vec<u32>,
}

impl Canvas {
    pub fn new(w: usize, h: usize) -> Self {
        Canvas { w, h, buf: vec![BG_COLOR; w * h] }
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 { self.buf[y * self.w + x] }

    /// Render one full frame of the UI.
    pub fn draw(&mut self, view: &View<'_>) {
        self.buf.fill(BG_COLOR);

        // ── Camera + detection (left) ─────────────────────────────────────
        self.fill_rect(0, 0, SIDE_W, STATUS_Y, PANEL_BG);
        self.draw_text("CAMERA", PREVIEW_X, 14, 2, ACCENT);
        self.fill_rect(PREVIEW_X, PREVIEW_Y, PREVIEW_W, PREVIEW_H, 0xFF000000);
        match view.preview {
            Some(img) => self.blit_scaled(img, PREVIEW_X, PREVIEW_Y, PREVIEW_W, PREVIEW_H),
            None => self.draw_text("NO CAMERA", PREVIEW_X + 130, PREVIEW_Y + PREVIEW_H / 2, 2, DIM_TEXT),
        }
        self.draw_border(PREVIEW_X, PREVIEW_Y, PREVIEW_W, PREVIEW_H, BORDER);
        if view.degraded {
            self.draw_text("SOURCE DEGRADED", PREVIEW_X + 8, PREVIEW_Y + 8, 2, FIST);
        }
        self.draw_detection(view);

        // ── Robot arena (middle) ──────────────────────────────────────────
        self.fill_rect(ARENA_X, 0, ARENA_W, STATUS_Y, ARENA_BG);
        self.draw_border(ARENA_X, 0, ARENA_W, STATUS_Y, BORDER);
        let skeleton = robot_pose(view.state.clip(), view.progress);
        self.draw_robot(&skeleton, ARENA_X + ARENA_W / 2, STATUS_Y - 60);

        // ── Action cards (right) ──────────────────────────────────────────
        self.fill_rect(CARDS_X, 0, SIDE_W, STATUS_Y, PANEL_BG);
        self.draw_cards(view.state);

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, WIN_H - STATUS_Y, TEXT_BG);
        self.draw_text(view.status, 12, STATUS_Y + 12, 2, TEXT);
        self.draw_text(
            "1 IDLE  2 DANCE  3 PUNCH L  4 PUNCH R  5 KICK L  6 KICK R  7 BOXING  ESC/Q QUIT",
            12, STATUS_Y + 38, 2, DIM_TEXT,
        );
    }

    fn draw_detection(&mut self, view: &View<'_>) {
        let x = PREVIEW_X;
        let mut y = DETECT_Y;
        self.draw_text("DETECTION", x, y, 2, ACCENT);
        y += 26;

        for (label, state) in [("LEFT", view.left), ("RIGHT", view.right)] {
            let text = state.map_or("--", HandState::as_str);
            let color = match state {
                Some(HandState::Curled)   => FIST,
                Some(HandState::Extended) => ACCENT,
                _                         => DIM_TEXT,
            };
            self.draw_text(label, x, y, 2, TEXT);
            self.draw_text(text, x + 96, y, 2, color);
            y += 22;
        }

        let title = ClipTable::by_name(view.state.clip()).map_or("?", |c| c.title);
        self.draw_text("ACTION", x, y, 2, TEXT);
        self.draw_text(title, x + 96, y, 2, if view.manual { FIST } else { ACCENT });
        y += 30;

        self.draw_text("CONFIDENCE", x, y, 2, TEXT);
        y += 20;
        let bar_w = PREVIEW_W;
        self.fill_rect(x, y, bar_w, 14, 0xFF2A2A3A);
        let filled = (bar_w as f32 * view.confidence.clamp(0.0, 1.0)) as usize;
        self.fill_rect(x, y, filled, 14, confidence_color(view.confidence));
        self.draw_border(x, y, bar_w, 14, BORDER);
    }

    fn draw_cards(&mut self, state: AnimState) {
        self.draw_text("ACTIONS", CARDS_X + 16, 14, 2, ACCENT);
        let mut y = 40;
        for clip in ClipTable::clips().filter(|c| *c != IDLE) {
            let active = state.clip() == clip.name;
            let (bg, fg) = if active { (ACCENT, 0xFF000000) } else { (TEXT_BG, TEXT) };
            self.fill_rect(CARDS_X + 16, y, SIDE_W - 32, CARD_H, bg);
            self.draw_border(CARDS_X + 16, y, SIDE_W - 32, CARD_H, if active { 0xFFFFFFFF } else { BORDER });
            self.draw_text(clip.title, CARDS_X + 32, y + CARD_H / 2 - 7, 3, fg);
            if clip.looping {
                self.draw_text("LOOP", CARDS_X + SIDE_W - 80, y + 8, 1, fg);
            }
            y += CARD_H + CARD_GAP;
        }
    }

    fn draw_robot(&mut self, s: &Skeleton, ox: usize, oy: usize) {
        let at = |p: (f32, f32)| (ox as f32 + p.0, oy as f32 + p.1);

        for &(a, b, width) in &[
            (s.hip_l, s.knee_l, 9.0), (s.knee_l, s.foot_l, 8.0),
            (s.hip_r, s.knee_r, 9.0), (s.knee_r, s.foot_r, 8.0),
        ] {
            self.thick_line(at(a), at(b), width, METAL);
        }
        // torso
        let (tx, ty) = at(s.neck);
        self.fill_rect((tx - 30.0) as usize, ty as usize, 60, (s.hip_l.1 - s.neck.1) as usize, BODY);
        self.fill_disc(tx, ty + 30.0, 8.0, ACCENT);

        for &(a, b) in &[(s.shoulder_l, s.elbow_l), (s.elbow_l, s.hand_l), (s.shoulder_r, s.elbow_r), (s.elbow_r, s.hand_r)] {
            self.thick_line(at(a), at(b), 8.0, METAL);
        }
        let (hx, hy) = at(s.hand_l);
        self.fill_disc(hx, hy, 9.0, FIST);
        let (hx, hy) = at(s.hand_r);
        self.fill_disc(hx, hy, 9.0, FIST);

        let (hx, hy) = at(s.head);
        self.fill_rect((hx - 22.0) as usize, (hy - 20.0) as usize, 44, 40, BODY);
        self.fill_rect((hx - 14.0) as usize, (hy - 6.0) as usize, 8, 5, ACCENT);
        self.fill_rect((hx + 6.0) as usize, (hy - 6.0) as usize, 8, 5, ACCENT);
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.h) {
            for col in x..(x + w).min(self.w) {
                self.buf[row * self.w + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x + w).min(self.w) {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..(y + h).min(self.h) {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < self.w && y < self.h {
            self.buf[y * self.w + x] = color;
        }
    }

    fn fill_disc(&mut self, cx: f32, cy: f32, r: f32, color: u32) {
        let ri = r.ceil() as i64;
        let (cxi, cyi) = (cx.round() as i64, cy.round() as i64);
        for dy in -ri..=ri {
            for dx in -ri..=ri {
                if (dx * dx + dy * dy) as f32 <= r * r {
                    let (x, y) = (cxi + dx, cyi + dy);
                    if x >= 0 && y >= 0 {
                        self.set_pixel(x as usize, y as usize, color);
                    }
                }
            }
        }
    }

    fn thick_line(&mut self, a: (f32, f32), b: (f32, f32), width: f32, color: u32) {
        let len = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
        let steps = (len / 2.0).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.fill_disc(a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t, width / 2.0, color);
        }
    }

    /// Nearest-neighbour scale `img` into the box, keeping its aspect ratio
    /// and centring it.
    fn blit_scaled(&mut self, img: &RgbImage, x: usize, y: usize, w: usize, h: usize) {
        let (iw, ih) = (img.width() as usize, img.height() as usize);
        if iw == 0 || ih == 0 { return; }
        let scale = (w as f32 / iw as f32).min(h as f32 / ih as f32);
        let (dw, dh) = ((iw as f32 * scale) as usize, (ih as f32 * scale) as usize);
        let (x0, y0) = (x + (w - dw) / 2, y + (h - dh) / 2);
        for row in 0..dh {
            let sy = ((row as f32 / scale) as usize).min(ih - 1);
            for col in 0..dw {
                let sx = ((col as f32 / scale) as usize).min(iw - 1);
                self.set_pixel(x0 + col, y0 + row, pack_argb(*img.get_pixel(sx as u32, sy as u32)));
            }
        }
    }

    /// 3×5 bitmap font, each pixel drawn as a `scale`×`scale` block.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale;
            if cx + 4 * scale > self.w { break; }
        }
    }
}

fn confidence_color(c: f32) -> u32 {
    if c >= 0.8 {
        0xFF32C850
    } else if c >= 0.5 {
        0xFFFFC832
    } else {
        0xFFC83232
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Robot pose
// ════════════════════════════════════════════════════════════════════════════

/// Joint positions relative to the point between the feet, y up-negative.
/// `_l` limbs are drawn on the viewer's left, matching the mirrored camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Skeleton {
    pub head:       (f32, f32),
    pub neck:       (f32, f32),
    pub shoulder_l: (f32, f32),
    pub elbow_l:    (f32, f32),
    pub hand_l:     (f32, f32),
    pub shoulder_r: (f32, f32),
    pub elbow_r:    (f32, f32),
    pub hand_r:     (f32, f32),
    pub hip_l:      (f32, f32),
    pub knee_l:     (f32, f32),
    pub foot_l:     (f32, f32),
    pub hip_r:      (f32, f32),
    pub knee_r:     (f32, f32),
    pub foot_r:     (f32, f32),
}

impl Skeleton {
    fn rest() -> Self {
        Skeleton {
            head:       (0.0, -330.0),
            neck:       (0.0, -300.0),
            shoulder_l: (-40.0, -290.0),
            elbow_l:    (-55.0, -230.0),
            hand_l:     (-60.0, -170.0),
            shoulder_r: (40.0, -290.0),
            elbow_r:    (55.0, -230.0),
            hand_r:     (60.0, -170.0),
            hip_l:      (-20.0, -160.0),
            knee_l:     (-25.0, -80.0),
            foot_l:     (-30.0, 0.0),
            hip_r:      (20.0, -160.0),
            knee_r:     (25.0, -80.0),
            foot_r:     (30.0, 0.0),
        }
    }
}

/// Where the robot's joints are at `progress` (0–1) through `clip`.
pub fn robot_pose(clip: &str, progress: f32) -> Skeleton {
    let mut s = Skeleton::rest();
    let p = progress.clamp(0.0, 1.0);
    // Out and back over the clip.
    let strike = (PI * p).sin();

    match clip {
        "punch_left" => punch(&mut s, -1.0, strike),
        "punch_right" => punch(&mut s, 1.0, strike),
        "boxing" => {
            // Two jabs per clip, alternating hands.
            let phase = (2.0 * PI * p).sin();
            guard(&mut s);
            punch(&mut s, -1.0, phase.max(0.0));
            punch(&mut s, 1.0, (-phase).max(0.0));
        }
        "kick_left" => kick(&mut s, -1.0, strike),
        "kick_right" => kick(&mut s, 1.0, strike),
        "dance" => {
            let sway = (2.0 * PI * p).sin();
            s.elbow_l = (-70.0, -330.0 + 20.0 * sway);
            s.hand_l  = (-60.0 + 20.0 * sway, -390.0);
            s.elbow_r = (70.0, -330.0 - 20.0 * sway);
            s.hand_r  = (60.0 + 20.0 * sway, -390.0);
            s.head.0 += 10.0 * sway;
            s.knee_l.0 += 12.0 * sway;
            s.knee_r.0 += 12.0 * sway;
        }
        _ => {
            let breathe = 3.0 * (2.0 * PI * p).sin();
            s.head.1 += breathe;
            s.hand_l.1 += breathe;
            s.hand_r.1 += breathe;
        }
    }
    s
}

fn guard(s: &mut Skeleton) {
    s.elbow_l = (-55.0, -250.0);
    s.hand_l  = (-25.0, -290.0);
    s.elbow_r = (55.0, -250.0);
    s.hand_r  = (25.0, -290.0);
}

/// `dir` is −1 for the viewer's left, +1 for the right.
fn punch(s: &mut Skeleton, dir: f32, amount: f32) {
    if amount <= 0.0 { return; }
    let (shoulder, elbow, hand) = if dir < 0.0 {
        (s.shoulder_l, &mut s.elbow_l, &mut s.hand_l)
    } else {
        (s.shoulder_r, &mut s.elbow_r, &mut s.hand_r)
    };
    let reach = 40.0 + 100.0 * amount;
    *elbow = (shoulder.0 + dir * reach * 0.5, shoulder.1 - 5.0);
    *hand  = (shoulder.0 + dir * reach, shoulder.1 - 10.0);
}

fn kick(s: &mut Skeleton, dir: f32, amount: f32) {
    let (hip, knee, foot) = if dir < 0.0 {
        (s.hip_l, &mut s.knee_l, &mut s.foot_l)
    } else {
        (s.hip_r, &mut s.knee_r, &mut s.foot_r)
    };
    let lift = 130.0 * amount;
    *knee = (hip.0 + dir * (10.0 + 0.5 * lift), hip.1 + 80.0 - 0.4 * lift);
    *foot = (hip.0 + dir * (15.0 + lift), hip.1 + 160.0 - 0.9 * lift);
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '#' => [0b101, 0b111, 0b101, 0b111, 0b101],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '_' => [0b000, 0b000, 0b000, 0b000, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '>' => [0b100, 0b010, 0b001, 0b010, 0b100],
        '?' => [0b111, 0b001, 0b011, 0b000, 0b010],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000],
    }
}
