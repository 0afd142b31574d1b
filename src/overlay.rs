use glam::Vec2;
use image::{Rgb, RgbImage};

use crate::features::{DescriptorMatch, KeyPoint};

/// Quad outline color, the original overlay green.
pub const QUAD_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Quad outline thickness in pixels.
pub const QUAD_THICKNESS: i32 = 4;
/// Match line thickness in pixels.
const MATCH_THICKNESS: i32 = 1;
const KEYPOINT_RADIUS: i32 = 2;

/// Places the reference image left of the frame on a shared canvas.
pub fn compose_side_by_side(reference: &RgbImage, frame: &RgbImage) -> RgbImage {
    let width = reference.width() + frame.width();
    let height = reference.height().max(frame.height());
    let mut canvas = RgbImage::new(width, height);
    for (x, y, px) in reference.enumerate_pixels() {
        canvas.put_pixel(x, y, *px);
    }
    let offset = reference.width();
    for (x, y, px) in frame.enumerate_pixels() {
        canvas.put_pixel(x + offset, y, *px);
    }
    canvas
}

/// Renders the side-by-side match visualization: reference left, frame
/// right, one colored line per match between the matched keypoints.
///
/// Inputs are untouched; the composite is a new image.
pub fn draw_matches(
    reference: &RgbImage,
    frame: &RgbImage,
    reference_keypoints: &[KeyPoint],
    frame_keypoints: &[KeyPoint],
    matches: &[DescriptorMatch],
) -> RgbImage {
    let mut canvas = compose_side_by_side(reference, frame);
    let offset = reference.width() as f32;
    let n = matches.len().max(1);
    for (i, m) in matches.iter().enumerate() {
        let c = colorous::TURBO.eval_rational(i, n);
        let color = Rgb([c.r, c.g, c.b]);
        let from = reference_keypoints[m.query_idx].p2d;
        let to = frame_keypoints[m.target_idx].p2d + Vec2::new(offset, 0.0);
        draw_segment(&mut canvas, from, to, color, MATCH_THICKNESS);
        draw_disc(&mut canvas, from, color, KEYPOINT_RADIUS);
        draw_disc(&mut canvas, to, color, KEYPOINT_RADIUS);
    }
    canvas
}

/// Draws the projected quad as 4 cyclic segments, shifted right by
/// `x_offset` (the reference width when drawing on a composite).
///
/// Returns a new image; the input canvas is untouched.
pub fn draw_quad(canvas: &RgbImage, corners: &[Vec2; 4], x_offset: f32) -> RgbImage {
    let mut out = canvas.clone();
    let shift = Vec2::new(x_offset, 0.0);
    for i in 0..4 {
        let from = corners[i] + shift;
        let to = corners[(i + 1) % 4] + shift;
        draw_segment(&mut out, from, to, QUAD_COLOR, QUAD_THICKNESS);
    }
    out
}

/// Bresenham segment with a square brush for thickness.
fn draw_segment(canvas: &mut RgbImage, from: Vec2, to: Vec2, color: Rgb<u8>, thickness: i32) {
    let mut x0 = from.x.round() as i64;
    let mut y0 = from.y.round() as i64;
    let x1 = to.x.round() as i64;
    let y1 = to.y.round() as i64;

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let radius = (thickness / 2).max(0);
    loop {
        plot_brush(canvas, x0, y0, color, radius);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn draw_disc(canvas: &mut RgbImage, center: Vec2, color: Rgb<u8>, radius: i32) {
    plot_brush(
        canvas,
        center.x.round() as i64,
        center.y.round() as i64,
        color,
        radius,
    );
}

fn plot_brush(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>, radius: i32) {
    let r = radius as i64;
    for by in -r..=r {
        for bx in -r..=r {
            let px = x + bx;
            let py = y + by;
            if px >= 0 && py >= 0 && (px as u32) < canvas.width() && (py as u32) < canvas.height() {
                canvas.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}
