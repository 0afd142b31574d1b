use image::DynamicImage;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rerun::{RecordingStream, TimeCell};
use std::io::Cursor;

use crate::pipeline::{FrameResult, LocalizeOutcome};

pub fn log_image_as_compressed(
    recording: &RecordingStream,
    topic: &str,
    img: &DynamicImage,
    format: image::ImageFormat,
) {
    let mut bytes: Vec<u8> = Vec::new();

    img.to_rgb8()
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();

    recording
        .log(
            format!("{}/image", topic),
            &rerun::EncodedImage::from_file_contents(bytes),
        )
        .unwrap();
}

pub fn id_to_color(id: usize) -> (u8, u8, u8, u8) {
    let mut rng = ChaCha8Rng::seed_from_u64(id as u64);
    let color_num = rng.random_range(0..2u32.pow(24));
    (
        ((color_num >> 16) % 256) as u8,
        ((color_num >> 8) % 256) as u8,
        (color_num % 256) as u8,
        255,
    )
}

/// rerun use top left corner as (0, 0)
pub fn rerun_shift(p2ds: &[(f32, f32)]) -> Vec<(f32, f32)> {
    p2ds.iter().map(|(x, y)| (*x + 0.5, *y + 0.5)).collect()
}

/// Logs one frame's localization: keypoints, good-match lines from the
/// reference into the frame topic, and the projected quad when located.
pub fn log_frame_result(
    recording: &RecordingStream,
    topic: &str,
    time_ns: i64,
    result: &FrameResult,
) {
    recording.set_time("stable", TimeCell::from_timestamp_nanos_since_epoch(time_ns));

    let pts: Vec<(f32, f32)> = result.frame_keypoints.iter().map(|p| (p.x, p.y)).collect();
    let pts = rerun_shift(&pts);
    recording
        .log(
            format!("{}/pts", topic),
            &rerun::Points2D::new(pts)
                .with_colors([id_to_color(0)])
                .with_radii([rerun::Radius::new_ui_points(3.0)]),
        )
        .unwrap();

    let (strips, colors): (Vec<_>, Vec<_>) = result
        .match_segments
        .iter()
        .enumerate()
        .map(|(i, (from, to))| {
            (
                vec![[from.x + 0.5, from.y + 0.5], [to.x + 0.5, to.y + 0.5]],
                id_to_color(i),
            )
        })
        .unzip();
    recording
        .log(
            format!("{}/matches", topic),
            &rerun::LineStrips2D::new(strips).with_colors(colors),
        )
        .unwrap();

    if let LocalizeOutcome::Located { corners, .. } = &result.outcome {
        let quad: Vec<[f32; 2]> = corners
            .iter()
            .chain(std::iter::once(&corners[0]))
            .map(|c| [c.x + 0.5, c.y + 0.5])
            .collect();
        recording
            .log(
                format!("{}/quad", topic),
                &rerun::LineStrips2D::new([quad]).with_colors([(0u8, 255u8, 0u8, 255u8)]),
            )
            .unwrap();
    }
}
