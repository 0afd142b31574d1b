use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec2;
use image::GrayImage;
use planar_target_localization::config::{DetectorConfig, RansacConfig};
use planar_target_localization::detector::FeatureDetector;
use planar_target_localization::homography::estimate_homography;

fn bench_image() -> GrayImage {
    let mut img = GrayImage::from_pixel(320, 240, image::Luma([20u8]));
    for sy in 0..4u32 {
        for sx in 0..6u32 {
            let x0 = 30 + sx * 45;
            let y0 = 30 + sy * 50;
            for y in y0..y0 + 20 {
                for x in x0..x0 + 20 {
                    img.put_pixel(x, y, image::Luma([220]));
                }
            }
        }
    }
    img
}

fn bench_detect_and_describe(c: &mut Criterion) {
    let detector = FeatureDetector::new(&DetectorConfig::default());
    let img = bench_image();

    c.bench_function("detect_and_describe", |b| {
        b.iter(|| detector.detect_and_describe(black_box(&img)))
    });
}

fn bench_estimate_homography(c: &mut Criterion) {
    let mut pairs: Vec<(Vec2, Vec2)> = (0..100)
        .map(|i| {
            let p = Vec2::new((i % 10) as f32 * 31.0, (i / 10) as f32 * 23.0);
            (p, p * 1.5 + Vec2::new(12.0, 7.0))
        })
        .collect();
    // A fifth of the correspondences are mismatches.
    for i in (0..100).step_by(5) {
        pairs[i].1 = Vec2::new((i * 37 % 500) as f32, (i * 91 % 400) as f32);
    }
    let config = RansacConfig::default();

    c.bench_function("estimate_homography", |b| {
        b.iter(|| estimate_homography(black_box(&pairs), black_box(&config)))
    });
}

criterion_group!(benches, bench_detect_and_describe, bench_estimate_homography);
criterion_main!(benches);
