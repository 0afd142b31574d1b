use image::GrayImage;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::config::DetectorConfig;
use crate::features::{Descriptor, ImageFeatures, KeyPoint, DESCRIPTOR_BYTES};

/// Bresenham circle of radius 3: 16 (dx, dy) offsets, clockwise from
/// 12 o'clock.
const CIRCLE_OFFSETS: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Contiguous circle pixels required by the segment test (FAST-9).
const ARC_LENGTH: usize = 9;

/// Descriptor sampling patch is 31x31 around the keypoint.
const PATCH_SIZE: i32 = 31;
const HALF_PATCH: i32 = PATCH_SIZE / 2;

/// Keypoints closer than this to the border cannot carry a full
/// orientation patch and are dropped together with their descriptor slot.
const DESCRIPTOR_BORDER: i32 = HALF_PATCH + 1;

/// Comparison pairs in the binary descriptor.
const PATTERN_PAIRS: usize = DESCRIPTOR_BYTES * 8;

/// Fixed seed for the descriptor test pattern. The pattern must be
/// identical for every image and every run, or descriptors stop being
/// comparable.
const PATTERN_SEED: u64 = 97;

/// Corner detector plus binary descriptor extractor.
///
/// Detection is the FAST segment test; description is 256 steered
/// pairwise intensity comparisons sampled from a fixed random pattern.
pub struct FeatureDetector {
    config: DetectorConfig,
    pattern: Vec<(f32, f32, f32, f32)>,
}

impl FeatureDetector {
    pub fn new(config: &DetectorConfig) -> FeatureDetector {
        FeatureDetector {
            config: config.clone(),
            pattern: generate_test_pattern(),
        }
    }

    /// Detects keypoints and computes one descriptor per keypoint.
    ///
    /// Returns equal-length keypoint/descriptor sequences; both are empty
    /// when the image carries no detectable structure.
    pub fn detect_and_describe(&self, image: &GrayImage) -> ImageFeatures {
        let mut keypoints = self.detect(image);

        keypoints.sort_by(|a, b| {
            b.response
                .partial_cmp(&a.response)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        keypoints.truncate(self.config.max_features);

        let width = image.width() as i32;
        let height = image.height() as i32;
        let mut features = ImageFeatures::default();
        for mut kp in keypoints {
            let x = kp.p2d.x as i32;
            let y = kp.p2d.y as i32;
            if x < DESCRIPTOR_BORDER
                || x >= width - DESCRIPTOR_BORDER
                || y < DESCRIPTOR_BORDER
                || y >= height - DESCRIPTOR_BORDER
            {
                continue;
            }
            kp.angle = intensity_centroid_angle(image, x, y);
            let descriptor = self.compute_descriptor(image, &kp);
            features.keypoints.push(kp);
            features.descriptors.push(descriptor);
        }
        log::trace!(
            "detected {} keypoints (threshold {})",
            features.len(),
            self.config.threshold
        );
        features
    }

    /// Runs the FAST segment test over the full image interior.
    fn detect(&self, image: &GrayImage) -> Vec<KeyPoint> {
        let width = image.width() as i32;
        let height = image.height() as i32;
        let mut keypoints = Vec::new();
        if width <= 6 || height <= 6 {
            return keypoints;
        }

        let thresh = self.config.threshold as i16;
        for y in 3..height - 3 {
            for x in 3..width - 3 {
                let center = image.get_pixel(x as u32, y as u32)[0] as i16;
                let mut circle = [0i16; 16];
                for (i, &(dx, dy)) in CIRCLE_OFFSETS.iter().enumerate() {
                    circle[i] = image.get_pixel((x + dx) as u32, (y + dy) as u32)[0] as i16;
                }
                if let Some(response) = segment_test(center, &circle, thresh) {
                    let mut kp = KeyPoint::new(x as f32, y as f32);
                    kp.response = response;
                    keypoints.push(kp);
                }
            }
        }
        keypoints
    }

    /// Samples the steered comparison pattern around one keypoint.
    fn compute_descriptor(&self, image: &GrayImage, kp: &KeyPoint) -> Descriptor {
        let width = image.width() as i32;
        let height = image.height() as i32;
        let cx = kp.p2d.x;
        let cy = kp.p2d.y;
        let cos_a = kp.angle.cos();
        let sin_a = kp.angle.sin();

        let sample = |ox: f32, oy: f32| -> u8 {
            // Rotate the pattern offset by the keypoint orientation.
            let rx = cos_a * ox - sin_a * oy;
            let ry = sin_a * ox + cos_a * oy;
            let px = ((cx + rx).round() as i32).clamp(0, width - 1);
            let py = ((cy + ry).round() as i32).clamp(0, height - 1);
            image.get_pixel(px as u32, py as u32)[0]
        };

        let mut bytes = [0u8; DESCRIPTOR_BYTES];
        for (i, &(x1, y1, x2, y2)) in self.pattern.iter().enumerate() {
            if sample(x1, y1) < sample(x2, y2) {
                bytes[i / 8] |= 1 << (7 - i % 8);
            }
        }
        Descriptor(bytes)
    }
}

/// Checks for `ARC_LENGTH` contiguous brighter or darker circle pixels.
///
/// Returns the corner response (summed arc contrast above threshold) when
/// the test passes.
fn segment_test(center: i16, circle: &[i16; 16], thresh: i16) -> Option<f32> {
    let mut bright_mask: u16 = 0;
    let mut dark_mask: u16 = 0;
    for (i, &v) in circle.iter().enumerate() {
        let diff = v - center;
        if diff > thresh {
            bright_mask |= 1 << i;
        } else if diff < -thresh {
            dark_mask |= 1 << i;
        }
    }

    let bright = has_contiguous_run(bright_mask);
    let dark = has_contiguous_run(dark_mask);
    if !bright && !dark {
        return None;
    }

    let mask = if bright { bright_mask } else { dark_mask };
    let mut response = 0.0f32;
    for (i, &v) in circle.iter().enumerate() {
        if mask & (1 << i) != 0 {
            response += ((v - center).abs() - thresh).max(0) as f32;
        }
    }
    Some(response)
}

/// Circular run-length check: double the 16-bit mask into 32 bits to
/// handle wrap-around, then AND-shift `ARC_LENGTH - 1` times.
fn has_contiguous_run(mask: u16) -> bool {
    if (mask.count_ones() as usize) < ARC_LENGTH {
        return false;
    }
    let mut acc = (mask as u32) | ((mask as u32) << 16);
    for _ in 1..ARC_LENGTH {
        acc &= acc >> 1;
    }
    acc != 0
}

/// Patch orientation from the intensity centroid, in radians.
///
/// The caller guarantees the full patch is inside the image.
fn intensity_centroid_angle(image: &GrayImage, x: i32, y: i32) -> f32 {
    let mut m01 = 0.0f32;
    let mut m10 = 0.0f32;
    for dy in -HALF_PATCH..=HALF_PATCH {
        for dx in -HALF_PATCH..=HALF_PATCH {
            let v = image.get_pixel((x + dx) as u32, (y + dy) as u32)[0] as f32;
            m01 += v * dy as f32;
            m10 += v * dx as f32;
        }
    }
    m01.atan2(m10)
}

/// Generates the fixed comparison pattern: offset pairs drawn uniformly
/// from the patch interior with a deterministic RNG.
fn generate_test_pattern() -> Vec<(f32, f32, f32, f32)> {
    let mut rng = ChaCha8Rng::seed_from_u64(PATTERN_SEED);
    let spread = (HALF_PATCH - 2) as f32;
    (0..PATTERN_PAIRS)
        .map(|_| {
            (
                rng.random_range(-spread..spread),
                rng.random_range(-spread..spread),
                rng.random_range(-spread..spread),
                rng.random_range(-spread..spread),
            )
        })
        .collect()
}
