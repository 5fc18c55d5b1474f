//! Per-call scan state and rectangle clamping.
//!
//! All scan-in-progress state lives in a `ScanContext` value threaded through
//! the pixel and sub-pixel passes, so one engine instance stays usable across
//! calls without hidden coupling between them.

use crate::scan::{ActionMode, ScanRequest};

/// Block and scan rectangles in full-resolution pixel coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ScanRects {
    pub block_x1: i32,
    pub block_y1: i32,
    pub block_x2: i32,
    pub block_y2: i32,
    pub scan_x1: i32,
    pub scan_y1: i32,
    pub scan_x2: i32,
    pub scan_y2: i32,
}

impl ScanRects {
    pub(crate) fn block_w(&self) -> i32 {
        self.block_x2 - self.block_x1
    }

    pub(crate) fn block_h(&self) -> i32 {
        self.block_y2 - self.block_y1
    }

    /// True when either rectangle collapsed to zero or negative extent.
    pub(crate) fn degenerate(&self) -> bool {
        self.scan_x2 <= self.scan_x1
            || self.scan_y2 <= self.scan_y1
            || self.block_x2 <= self.block_x1
            || self.block_y2 <= self.block_y1
    }
}

/// Clamps block and scan rectangles to the frame.
///
/// In absolute mode the scan rectangle is an area in frame coordinates and is
/// clipped directly. In tracking mode the scan rectangle holds candidate
/// top-left block positions, so its far edge is limited by the block size.
/// Block coordinates always end up inside `[0, w] x [0, h]`.
pub(crate) fn clamp_scan(w: i32, h: i32, r: &mut ScanRects, use_absolute: bool) {
    if use_absolute {
        r.scan_x1 = r.scan_x1.clamp(0, w);
        r.scan_y1 = r.scan_y1.clamp(0, h);
        r.scan_x2 = r.scan_x2.clamp(0, w);
        r.scan_y2 = r.scan_y2.clamp(0, h);
    } else {
        if r.scan_x1 < 0 {
            r.scan_x1 = 0;
        }
        if r.scan_y1 < 0 {
            r.scan_y1 = 0;
        }
        if r.scan_x2 + r.block_w() > w {
            r.scan_x2 = w - r.block_w();
        }
        if r.scan_y2 + r.block_h() > h {
            r.scan_y2 = h - r.block_h();
        }
    }

    r.block_x1 = r.block_x1.clamp(0, w);
    r.block_x2 = r.block_x2.clamp(0, w);
    r.block_y1 = r.block_y1.clamp(0, h);
    r.block_y2 = r.block_y2.clamp(0, h);
}

/// Mutable per-call search state.
pub(crate) struct ScanContext {
    pub frame_w: i32,
    pub frame_h: i32,
    pub rects: ScanRects,
    /// Current search window extent, shrunk by the narrow step.
    pub scan_w: i32,
    pub scan_h: i32,
    /// Current downsample factor, halved toward 1.
    pub downsample: i32,
    /// Angular step of the last pixel pass, in degrees.
    pub angle_step_deg: f64,
    pub rotation_center: f64,
    pub rotation_range: f64,
    pub do_rotation: bool,
    pub horizontal_only: bool,
    pub vertical_only: bool,
    pub action: ActionMode,
    pub origin_x: i32,
    pub origin_y: i32,
}

impl ScanContext {
    pub(crate) fn new(
        frame_w: i32,
        frame_h: i32,
        rects: ScanRects,
        request: &ScanRequest,
        starting_downsample: i32,
    ) -> Self {
        Self {
            frame_w,
            frame_h,
            rects,
            scan_w: request.scan_w,
            scan_h: request.scan_h,
            downsample: starting_downsample,
            angle_step_deg: 0.0,
            rotation_center: request.rotation_center,
            rotation_range: request.rotation_range,
            do_rotation: request.do_rotation,
            horizontal_only: request.horizontal_only,
            vertical_only: request.vertical_only,
            action: request.action,
            origin_x: request.origin_x,
            origin_y: request.origin_y,
        }
    }
}

/// One candidate alignment hypothesis and its output slots.
///
/// Coordinates are in downsampled pixels during the pixel phase and full
/// resolution during the sub-pixel phase. `cost2` is only written in
/// sub-pixel mode, where both interpolation directions are evaluated.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Candidate {
    pub block_x1: i32,
    pub block_y1: i32,
    pub block_x2: i32,
    pub block_y2: i32,
    pub search_x: i32,
    pub search_y: i32,
    pub sub_x: i32,
    pub sub_y: i32,
    pub angle_step: usize,
    pub cost1: i64,
    pub cost2: i64,
    pub valid: bool,
}

impl Candidate {
    pub(crate) fn block_w(&self) -> i32 {
        self.block_x2 - self.block_x1
    }

    pub(crate) fn block_h(&self) -> i32 {
        self.block_y2 - self.block_y1
    }
}

#[cfg(test)]
mod tests {
    use super::{clamp_scan, ScanRects};

    fn rects(block: (i32, i32, i32, i32), scan: (i32, i32, i32, i32)) -> ScanRects {
        ScanRects {
            block_x1: block.0,
            block_y1: block.1,
            block_x2: block.2,
            block_y2: block.3,
            scan_x1: scan.0,
            scan_y1: scan.1,
            scan_x2: scan.2,
            scan_y2: scan.3,
        }
    }

    fn assert_invariants(w: i32, h: i32, r: &ScanRects, use_absolute: bool) {
        assert!(r.block_x1 >= 0 && r.block_x2 <= w);
        assert!(r.block_y1 >= 0 && r.block_y2 <= h);
        assert!(r.scan_x1 >= 0 && r.scan_y1 >= 0);
        if use_absolute {
            assert!(r.scan_x2 <= w && r.scan_y2 <= h);
        } else if !r.degenerate() {
            assert!(r.scan_x2 + r.block_w() <= w);
            assert!(r.scan_y2 + r.block_h() <= h);
        }
    }

    #[test]
    fn tracking_mode_limits_scan_by_block_size() {
        let mut r = rects((10, 10, 42, 42), (-20, -20, 100, 100));
        clamp_scan(64, 64, &mut r, false);
        assert_eq!(r.scan_x1, 0);
        assert_eq!(r.scan_x2, 64 - 32);
        assert_invariants(64, 64, &r, false);
    }

    #[test]
    fn absolute_mode_clips_to_frame() {
        let mut r = rects((0, 0, 16, 16), (-5, -9, 80, 81));
        clamp_scan(64, 48, &mut r, true);
        assert_eq!((r.scan_x1, r.scan_y1), (0, 0));
        assert_eq!((r.scan_x2, r.scan_y2), (64, 48));
        assert_invariants(64, 48, &r, true);
    }

    #[test]
    fn out_of_frame_block_is_pulled_inside() {
        let mut r = rects((-8, -4, 90, 70), (0, 0, 10, 10));
        clamp_scan(64, 64, &mut r, false);
        assert_invariants(64, 64, &r, false);
        assert_eq!((r.block_x1, r.block_y1), (0, 0));
        assert_eq!((r.block_x2, r.block_y2), (64, 64));
    }

    #[test]
    fn arbitrary_rectangles_respect_invariants() {
        // Small deterministic sweep standing in for arbitrary caller input.
        let mut seed = 0x2545f491u64;
        let mut next = || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((seed >> 33) as i32 % 200) - 60
        };
        for _ in 0..500 {
            let (a, b, c, d) = (next(), next(), next(), next());
            let (e, f, g, h) = (next(), next(), next(), next());
            for use_absolute in [false, true] {
                let mut r = rects((a, b, a + c.abs(), b + d.abs()), (e, f, e + g.abs(), f + h.abs()));
                clamp_scan(128, 96, &mut r, use_absolute);
                assert_invariants(128, 96, &r, use_absolute);
            }
        }
    }
}
