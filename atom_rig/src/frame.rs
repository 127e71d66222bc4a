//! Frame helpers: skeleton annotation, mirroring, ARGB packing for the
//! window.

use image::{imageops, Rgb, RgbImage};

use hand_gesture::landmark::{FINGERTIPS, HAND_CONNECTIONS};
use hand_gesture::{HandObservation, HandSide};

struct Palette {
    line:  Rgb<u8>,
    joint: Rgb<u8>,
    tip:   Rgb<u8>,
}

// Left: green / yellow.  Right: blue / magenta.
const LEFT:  Palette = Palette { line: Rgb([0, 255, 0]), joint: Rgb([0, 200, 0]), tip: Rgb([255, 255, 0]) };
const RIGHT: Palette = Palette { line: Rgb([0, 0, 255]), joint: Rgb([0, 0, 200]), tip: Rgb([255, 0, 255]) };

fn palette(side: HandSide) -> &'static Palette {
    match side {
        HandSide::Left  => &LEFT,
        HandSide::Right => &RIGHT,
    }
}

/// Flip horizontally in place (selfie view).
pub fn mirror(frame: &mut RgbImage) {
    imageops::flip_horizontal_in_place(frame);
}

/// Draw each hand's bones and joints onto `frame`.  Fingertips get larger
/// dots.  Points outside the frame are clipped.
pub fn annotate(frame: &mut RgbImage, hands: &[HandObservation]) {
    let (w, h) = frame.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let joint_r = (w / 128).max(2) as i32;
    let tip_r   = joint_r * 8 / 5;
    // Keeps line walks short when a detector reports wild coordinates.
    let to_px = |v: f32, extent: u32| (v.clamp(-1.0, 2.0) * extent as f32) as i32;

    for hand in hands {
        let colors = palette(hand.side());
        let px: Vec<(i32, i32)> = hand
            .points()
            .iter()
            .map(|p| (to_px(p.x, w), to_px(p.y, h)))
            .collect();

        for &(a, b) in HAND_CONNECTIONS.iter() {
            draw_line(frame, px[a], px[b], colors.line);
        }
        for (i, &(x, y)) in px.iter().enumerate() {
            if FINGERTIPS.contains(&i) {
                fill_disc(frame, x, y, tip_r, colors.tip);
            } else {
                fill_disc(frame, x, y, joint_r, colors.joint);
            }
        }
    }
}

/// `0xFFRRGGBB` as minifb wants it.
pub fn pack_argb(p: Rgb<u8>) -> u32 {
    let [r, g, b] = p.0;
    0xFF00_0000 | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

fn put(frame: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < frame.width() && (y as u32) < frame.height() {
        frame.put_pixel(x as u32, y as u32, color);
    }
}

/// Two-pixel-wide Bresenham line.
fn draw_line(frame: &mut RgbImage, (x0, y0): (i32, i32), (x1, y1): (i32, i32), color: Rgb<u8>) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let (mut x, mut y, mut err) = (x0, y0, dx + dy);
    loop {
        put(frame, x, y, color);
        put(frame, x + 1, y, color);
        put(frame, x, y + 1, color);
        if x == x1 && y == y1 { break; }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; x += sx; }
        if e2 <= dx { err += dx; y += sy; }
    }
}

fn fill_disc(frame: &mut RgbImage, cx: i32, cy: i32, r: i32, color: Rgb<u8>) {
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r * r {
                put(frame, cx + dx, cy + dy, color);
            }
        }
    }
}
