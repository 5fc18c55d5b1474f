//! Fast paths, tracking modes, and failure fallbacks of the engine facade.

use blockmatch::{
    FrameView, FsStore, MemoryStore, MotionEngine, PixelLayout, ScanRequest, ScanResult,
    TrackingMode,
};

const W: usize = 128;
const H: usize = 128;

fn textured_frame(phase: f64) -> Vec<u8> {
    let mut data = Vec::with_capacity(W * H * 3);
    for y in 0..H {
        for x in 0..W {
            let v = 127.5
                + 55.0 * (0.31 * x as f64 + phase).sin() * (0.23 * y as f64).cos()
                + 40.0 * (0.13 * x as f64 - 0.17 * y as f64 + phase).sin();
            let v = v.clamp(0.0, 255.0) as u8;
            data.extend_from_slice(&[v, v, v]);
        }
    }
    data
}

fn flat_frame(value: u8) -> Vec<u8> {
    vec![value; W * H * 3]
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
fn identical_frames_take_the_fast_path() {
    let data = textured_frame(0.0);
    let prev = FrameView::from_u8(&data, W, H, PixelLayout::Rgb888).unwrap();
    let cur = FrameView::from_u8(&data, W, H, PixelLayout::Rgb888).unwrap();

    let request = ScanRequest {
        do_rotation: true,
        rotation_center: 1.5,
        rotation_range: 2.0,
        ..base_request()
    };
    let mut engine = MotionEngine::with_workers(2).unwrap();
    let result = engine.scan(&prev, &cur, &request).unwrap();

    assert_eq!(result.dx, 0);
    assert_eq!(result.dy, 0);
    assert_eq!(result.dr_deg, 1.5);
    assert!(!result.failed);
}

#[test]
fn uniform_frames_fail_without_panicking() {
    let previous = flat_frame(128);
    let current = flat_frame(127);
    let prev = FrameView::from_u8(&previous, W, H, PixelLayout::Rgb888).unwrap();
    let cur = FrameView::from_u8(&current, W, H, PixelLayout::Rgb888).unwrap();

    let mut engine = MotionEngine::with_workers(2).unwrap();
    let result = engine.scan(&prev, &cur, &base_request()).unwrap();

    assert!(result.failed);
    assert_eq!((result.dx, result.dy), (0, 0));
    assert_eq!(result.dr_deg, 0.0);
}

#[test]
fn flat_identical_frames_prefer_the_fast_path_over_failure() {
    let data = flat_frame(90);
    let prev = FrameView::from_u8(&data, W, H, PixelLayout::Rgb888).unwrap();
    let cur = FrameView::from_u8(&data, W, H, PixelLayout::Rgb888).unwrap();

    let mut engine = MotionEngine::with_workers(1).unwrap();
    let result = engine.scan(&prev, &cur, &base_request()).unwrap();
    assert!(!result.failed);

    // With the fast path disabled the same pair degrades to a failed scan.
    engine.set_test_match(false);
    let result = engine.scan(&prev, &cur, &base_request()).unwrap();
    assert!(result.failed);
}

#[test]
fn no_calculate_skips_the_search() {
    let previous = textured_frame(0.0);
    let current = textured_frame(1.0);
    let prev = FrameView::from_u8(&previous, W, H, PixelLayout::Rgb888).unwrap();
    let cur = FrameView::from_u8(&current, W, H, PixelLayout::Rgb888).unwrap();

    let request = ScanRequest {
        tracking: TrackingMode::NoCalculate,
        rotation_center: -0.75,
        ..base_request()
    };
    let mut engine = MotionEngine::with_workers(1).unwrap();
    let result = engine.scan(&prev, &cur, &request).unwrap();
    assert_eq!(
        result,
        ScanResult {
            dx: 0,
            dy: 0,
            dr_deg: -0.75,
            failed: false
        }
    );
}

#[test]
fn save_then_load_round_trips_without_rescanning() {
    let shift = 3.0;
    let previous = textured_frame(0.0);
    let current: Vec<u8> = {
        let mut data = Vec::with_capacity(W * H * 3);
        for y in 0..H {
            for x in 0..W {
                let v = 127.5
                    + 55.0 * (0.31 * (x as f64 + shift)).sin() * (0.23 * y as f64).cos()
                    + 40.0 * (0.13 * (x as f64 + shift) - 0.17 * y as f64).sin();
                let v = v.clamp(0.0, 255.0) as u8;
                data.extend_from_slice(&[v, v, v]);
            }
        }
        data
    };
    let prev = FrameView::from_u8(&previous, W, H, PixelLayout::Rgb888).unwrap();
    let cur = FrameView::from_u8(&current, W, H, PixelLayout::Rgb888).unwrap();

    let mut engine =
        MotionEngine::with_workers(2).unwrap().with_store(Box::new(MemoryStore::new()));

    let save_request = ScanRequest {
        tracking: TrackingMode::Save,
        source_position: 11,
        ..base_request()
    };
    let saved = engine.scan(&prev, &cur, &save_request).unwrap();
    assert!(!saved.failed);

    // Loading must reproduce the saved result even for a frame pair that
    // would scan to something else entirely.
    let unrelated = textured_frame(2.5);
    let other = FrameView::from_u8(&unrelated, W, H, PixelLayout::Rgb888).unwrap();
    let load_request = ScanRequest {
        tracking: TrackingMode::Load,
        source_position: 11,
        ..base_request()
    };
    let loaded = engine.scan(&prev, &other, &load_request).unwrap();
    assert_eq!((loaded.dx, loaded.dy), (saved.dx, saved.dy));
}

#[test]
fn fs_store_round_trips_through_side_files() {
    let dir = tempfile::tempdir().unwrap();
    let previous = textured_frame(0.0);
    let current = textured_frame(0.35);
    let prev = FrameView::from_u8(&previous, W, H, PixelLayout::Rgb888).unwrap();
    let cur = FrameView::from_u8(&current, W, H, PixelLayout::Rgb888).unwrap();

    let mut engine = MotionEngine::with_workers(2)
        .unwrap()
        .with_store(Box::new(FsStore::new(dir.path())));

    let save_request = ScanRequest {
        tracking: TrackingMode::Save,
        source_position: 7,
        do_rotation: true,
        rotation_range: 2.0,
        ..base_request()
    };
    let saved = engine.scan(&prev, &cur, &save_request).unwrap();
    assert!(dir.path().join("m000007").exists());
    assert!(dir.path().join("r000007").exists());

    let load_request = ScanRequest {
        tracking: TrackingMode::Load,
        ..save_request
    };
    let loaded = engine.scan(&prev, &cur, &load_request).unwrap();
    assert_eq!((loaded.dx, loaded.dy), (saved.dx, saved.dy));
    assert!((loaded.dr_deg - saved.dr_deg).abs() < 1e-5);
}

#[test]
fn load_without_entries_falls_back_to_no_calculate() {
    let previous = textured_frame(0.0);
    let current = textured_frame(1.0);
    let prev = FrameView::from_u8(&previous, W, H, PixelLayout::Rgb888).unwrap();
    let cur = FrameView::from_u8(&current, W, H, PixelLayout::Rgb888).unwrap();

    let request = ScanRequest {
        tracking: TrackingMode::Load,
        source_position: 99,
        rotation_center: 2.25,
        ..base_request()
    };
    let mut engine =
        MotionEngine::with_workers(1).unwrap().with_store(Box::new(MemoryStore::new()));
    let result = engine.scan(&prev, &cur, &request).unwrap();
    assert_eq!(
        result,
        ScanResult {
            dx: 0,
            dy: 0,
            dr_deg: 2.25,
            failed: false
        }
    );
}

#[test]
fn degenerate_geometry_returns_the_zero_estimate() {
    let previous = textured_frame(0.0);
    let current = textured_frame(1.0);
    let prev = FrameView::from_u8(&previous, W, H, PixelLayout::Rgb888).unwrap();
    let cur = FrameView::from_u8(&current, W, H, PixelLayout::Rgb888).unwrap();

    // Block centered on the frame corner: the clamped scan window collapses
    // before any level can run.
    let request = ScanRequest {
        scan_w: 8,
        scan_h: 8,
        block_w: 32,
        block_h: 32,
        block_x: 0,
        block_y: 0,
        ..ScanRequest::default()
    };
    let mut engine = MotionEngine::with_workers(1).unwrap();
    let result = engine.scan(&prev, &cur, &request).unwrap();
    assert_eq!((result.dx, result.dy), (0, 0));
    assert!(!result.failed);
}
