use glam::Vec2;
use image::{Rgb, RgbImage};
use planar_target_localization::features::{DescriptorMatch, KeyPoint};
use planar_target_localization::overlay::{
    compose_side_by_side, draw_matches, draw_quad, QUAD_COLOR,
};

#[test]
fn test_compose_layout() {
    let reference = RgbImage::from_pixel(40, 30, Rgb([10, 20, 30]));
    let frame = RgbImage::from_pixel(60, 50, Rgb([40, 50, 60]));
    let canvas = compose_side_by_side(&reference, &frame);

    assert_eq!(canvas.width(), 100);
    assert_eq!(canvas.height(), 50);
    assert_eq!(*canvas.get_pixel(5, 5), Rgb([10, 20, 30]));
    assert_eq!(*canvas.get_pixel(45, 5), Rgb([40, 50, 60]));
}

#[test]
fn test_draw_quad_does_not_mutate_input() {
    let canvas = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
    let before = canvas.clone();
    let corners = [
        Vec2::new(20.0, 20.0),
        Vec2::new(80.0, 20.0),
        Vec2::new(80.0, 80.0),
        Vec2::new(20.0, 80.0),
    ];
    let out = draw_quad(&canvas, &corners, 0.0);

    assert_eq!(canvas, before);
    // The outline landed on the output: probe the midpoints of all four
    // sides.
    assert_eq!(*out.get_pixel(50, 20), QUAD_COLOR);
    assert_eq!(*out.get_pixel(80, 50), QUAD_COLOR);
    assert_eq!(*out.get_pixel(50, 80), QUAD_COLOR);
    assert_eq!(*out.get_pixel(20, 50), QUAD_COLOR);
    // The interior stays untouched.
    assert_eq!(*out.get_pixel(50, 50), Rgb([0, 0, 0]));
}

#[test]
fn test_draw_quad_offset_shifts_outline() {
    let canvas = RgbImage::from_pixel(200, 100, Rgb([0, 0, 0]));
    let corners = [
        Vec2::new(10.0, 10.0),
        Vec2::new(50.0, 10.0),
        Vec2::new(50.0, 50.0),
        Vec2::new(10.0, 50.0),
    ];
    let out = draw_quad(&canvas, &corners, 100.0);
    assert_eq!(*out.get_pixel(130, 10), QUAD_COLOR);
    assert_eq!(*out.get_pixel(30, 10), Rgb([0, 0, 0]));
}

#[test]
fn test_draw_quad_clips_out_of_bounds_corners() {
    let canvas = RgbImage::from_pixel(50, 50, Rgb([0, 0, 0]));
    let corners = [
        Vec2::new(-30.0, -30.0),
        Vec2::new(80.0, -30.0),
        Vec2::new(80.0, 80.0),
        Vec2::new(-30.0, 80.0),
    ];
    // A quad projected outside the canvas must not panic.
    let _ = draw_quad(&canvas, &corners, 0.0);
}

#[test]
fn test_draw_matches_connects_keypoints() {
    let reference = RgbImage::from_pixel(50, 50, Rgb([0, 0, 0]));
    let frame = RgbImage::from_pixel(50, 50, Rgb([0, 0, 0]));
    let ref_kps = vec![KeyPoint::new(10.0, 10.0)];
    let frame_kps = vec![KeyPoint::new(20.0, 30.0)];
    let matches = vec![DescriptorMatch::new(0, 0, 0.0)];

    let canvas = draw_matches(&reference, &frame, &ref_kps, &frame_kps, &matches);
    assert_eq!(canvas.width(), 100);
    // Both endpoints got a colored dot: reference side at (10, 10), frame
    // side shifted by the reference width to (70, 30).
    assert_ne!(*canvas.get_pixel(10, 10), Rgb([0, 0, 0]));
    assert_ne!(*canvas.get_pixel(70, 30), Rgb([0, 0, 0]));
}

#[test]
fn test_draw_matches_with_no_matches_is_plain_composite() {
    let reference = RgbImage::from_pixel(30, 30, Rgb([5, 5, 5]));
    let frame = RgbImage::from_pixel(30, 30, Rgb([9, 9, 9]));
    let canvas = draw_matches(&reference, &frame, &[], &[], &[]);
    assert_eq!(canvas, compose_side_by_side(&reference, &frame));
}
