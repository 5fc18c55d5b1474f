//! Recovery tests against synthetic frame pairs with known ground truth.

use blockmatch::{
    ActionMode, FrameView, MotionEngine, PixelLayout, ScanRequest, OVERSAMPLE,
};

const W: usize = 128;
const H: usize = 128;

/// Smooth multi-scale pattern defined for any integer coordinate, so shifted
/// frames can be generated exactly without border artifacts.
fn pattern(x: f64, y: f64) -> f64 {
    127.5
        + 50.0 * (0.35 * x).sin() * (0.27 * y).cos()
        + 45.0 * (0.12 * x + 0.18 * y).sin()
        + 28.0 * (0.07 * x - 0.23 * y).cos()
}

fn rgb_frame(sample: impl Fn(f64, f64) -> f64) -> Vec<u8> {
    let mut data = Vec::with_capacity(W * H * 3);
    for y in 0..H {
        for x in 0..W {
            let v = sample(x as f64, y as f64).clamp(0.0, 255.0) as u8;
            data.extend_from_slice(&[v, v.wrapping_add(10), v]);
        }
    }
    data
}

fn base_request() -> ScanRequest {
    ScanRequest {
        scan_w: 32,
        scan_h: 32,
        block_w: 64,
        block_h: 64,
        block_x: 64,
        block_y: 64,
        ..ScanRequest::default()
    }
}

#[test]
fn integer_shift_is_recovered_exactly() {
    let shift_x = 5.0;
    let shift_y = -3.0;
    let previous = rgb_frame(|x, y| pattern(x, y));
    let current = rgb_frame(|x, y| pattern(x + shift_x, y + shift_y));
    let prev = FrameView::from_u8(&previous, W, H, PixelLayout::Rgb888).unwrap();
    let cur = FrameView::from_u8(&current, W, H, PixelLayout::Rgb888).unwrap();

    let mut engine = MotionEngine::with_workers(4).unwrap();
    let result = engine.scan(&prev, &cur, &base_request()).unwrap();

    assert!(!result.failed);
    assert_eq!(result.dx, shift_x as i32 * OVERSAMPLE);
    assert_eq!(result.dy, shift_y as i32 * OVERSAMPLE);
}

#[test]
fn integer_shift_is_recovered_for_float_layouts() {
    let shift_x = 4.0;
    let shift_y = 6.0;
    let mut previous = Vec::with_capacity(W * H * 3);
    let mut current = Vec::with_capacity(W * H * 3);
    for y in 0..H {
        for x in 0..W {
            let a = (pattern(x as f64, y as f64) / 255.0) as f32;
            let b = (pattern(x as f64 + shift_x, y as f64 + shift_y) / 255.0) as f32;
            previous.extend_from_slice(&[a, a, a]);
            current.extend_from_slice(&[b, b, b]);
        }
    }
    let prev = FrameView::from_f32(&previous, W, H, PixelLayout::RgbFloat).unwrap();
    let cur = FrameView::from_f32(&current, W, H, PixelLayout::RgbFloat).unwrap();

    let mut engine = MotionEngine::with_workers(2).unwrap();
    let result = engine.scan(&prev, &cur, &base_request()).unwrap();

    assert!(!result.failed);
    assert_eq!(result.dx, shift_x as i32 * OVERSAMPLE);
    assert_eq!(result.dy, shift_y as i32 * OVERSAMPLE);
}

#[test]
fn fractional_shift_is_recovered_within_one_oversample_unit() {
    let fx = 0.5;
    let fy = 0.25;
    let previous = rgb_frame(|x, y| pattern(x, y));
    // Bilinear shift, matching the evaluator's interpolation model.
    let current = rgb_frame(|x, y| {
        let a = pattern(x, y);
        let b = pattern(x + 1.0, y);
        let c = pattern(x, y + 1.0);
        let d = pattern(x + 1.0, y + 1.0);
        a * (1.0 - fx) * (1.0 - fy) + b * fx * (1.0 - fy) + c * (1.0 - fx) * fy + d * fx * fy
    });
    let prev = FrameView::from_u8(&previous, W, H, PixelLayout::Rgb888).unwrap();
    let cur = FrameView::from_u8(&current, W, H, PixelLayout::Rgb888).unwrap();

    let mut engine = MotionEngine::with_workers(4).unwrap();
    let result = engine.scan(&prev, &cur, &base_request()).unwrap();

    assert!(!result.failed);
    let expected_dx = (fx * f64::from(OVERSAMPLE)).round() as i32;
    let expected_dy = (fy * f64::from(OVERSAMPLE)).round() as i32;
    assert!((result.dx - expected_dx).abs() <= 1, "dx = {}", result.dx);
    assert!((result.dy - expected_dy).abs() <= 1, "dy = {}", result.dy);
}

#[test]
fn rotation_is_recovered_within_one_angle_step() {
    use blockmatch::{BilinearRotator, OwnedFrame, Pivot, RotationRenderer, Viewport};

    let angle = 2.0;
    let previous = rgb_frame(|x, y| pattern(x, y));
    let prev = FrameView::from_u8(&previous, W, H, PixelLayout::Rgb888).unwrap();

    // Current frame: the reference rotated about the block center.
    let mut rotated = OwnedFrame::new(W, H, PixelLayout::Rgb888).unwrap();
    let viewport = Viewport::full(&prev);
    let pivot = Pivot { x: 64.0, y: 64.0 };
    BilinearRotator::new()
        .rotate(&mut rotated, &prev, angle, viewport, viewport, pivot, pivot)
        .unwrap();
    let cur = rotated.view();

    let request = ScanRequest {
        scan_w: 16,
        scan_h: 16,
        do_rotation: true,
        rotation_center: 0.0,
        rotation_range: 4.0,
        ..base_request()
    };
    let mut engine = MotionEngine::with_workers(4).unwrap();
    let result = engine.scan(&prev, &cur, &request).unwrap();

    assert!(!result.failed);
    // The result is the angle that re-aligns the current frame, so the ground
    // truth is -angle. The finest discretized step at this frame size is
    // about 0.9 degrees.
    assert!(
        (result.dr_deg + angle).abs() <= 1.0,
        "dr = {}",
        result.dr_deg
    );
    // The block itself did not translate.
    assert!(result.dx.abs() <= OVERSAMPLE, "dx = {}", result.dx);
    assert!(result.dy.abs() <= OVERSAMPLE, "dy = {}", result.dy);
}

#[test]
fn horizontal_only_zeroes_the_vertical_component() {
    let shift_x = 5.0;
    let previous = rgb_frame(|x, y| pattern(x, y));
    let current = rgb_frame(|x, y| pattern(x + shift_x, y));
    let prev = FrameView::from_u8(&previous, W, H, PixelLayout::Rgb888).unwrap();
    let cur = FrameView::from_u8(&current, W, H, PixelLayout::Rgb888).unwrap();

    let request = ScanRequest {
        horizontal_only: true,
        action: ActionMode::StabilizePixel,
        ..base_request()
    };
    let mut engine = MotionEngine::with_workers(2).unwrap();
    let result = engine.scan(&prev, &cur, &request).unwrap();

    assert!(!result.failed);
    assert_eq!(result.dx, shift_x as i32 * OVERSAMPLE);
    assert_eq!(result.dy, 0);
}

#[test]
fn vertical_only_zeroes_the_horizontal_component() {
    let shift_y = 4.0;
    let previous = rgb_frame(|x, y| pattern(x, y));
    let current = rgb_frame(|x, y| pattern(x, y + shift_y));
    let prev = FrameView::from_u8(&previous, W, H, PixelLayout::Rgb888).unwrap();
    let cur = FrameView::from_u8(&current, W, H, PixelLayout::Rgb888).unwrap();

    let request = ScanRequest {
        vertical_only: true,
        action: ActionMode::StabilizePixel,
        ..base_request()
    };
    let mut engine = MotionEngine::with_workers(2).unwrap();
    let result = engine.scan(&prev, &cur, &request).unwrap();

    assert!(!result.failed);
    assert_eq!(result.dx, 0);
    assert_eq!(result.dy, shift_y as i32 * OVERSAMPLE);
}
