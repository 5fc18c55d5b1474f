//! Scalar cost kernels for each storage type.
//!
//! Callers validate window bounds before dispatching here, so row lookups are
//! infallible. Only the first three components of each pixel participate.

use crate::cost::FLOAT_COST_SCALE;
use crate::frame::FrameView;
use crate::scan::OVERSAMPLE;

#[allow(clippy::too_many_arguments)]
pub(super) fn ssd_u8(
    a: &FrameView<'_>,
    ax: usize,
    ay: usize,
    b: &FrameView<'_>,
    bx: usize,
    by: usize,
    width: usize,
    height: usize,
    channels: usize,
) -> i64 {
    let mut acc: i64 = 0;
    for row in 0..height {
        let a_row = a.row_u8(ay + row).expect("window row in bounds");
        let b_row = b.row_u8(by + row).expect("window row in bounds");
        for col in 0..width {
            let pa = &a_row[(ax + col) * channels..];
            let pb = &b_row[(bx + col) * channels..];
            for k in 0..3 {
                let diff = i64::from(pa[k]) - i64::from(pb[k]);
                acc += diff * diff;
            }
        }
    }
    acc
}

#[allow(clippy::too_many_arguments)]
pub(super) fn ssd_f32(
    a: &FrameView<'_>,
    ax: usize,
    ay: usize,
    b: &FrameView<'_>,
    bx: usize,
    by: usize,
    width: usize,
    height: usize,
    channels: usize,
) -> i64 {
    let mut acc: f64 = 0.0;
    for row in 0..height {
        let a_row = a.row_f32(ay + row).expect("window row in bounds");
        let b_row = b.row_f32(by + row).expect("window row in bounds");
        for col in 0..width {
            let pa = &a_row[(ax + col) * channels..];
            let pb = &b_row[(bx + col) * channels..];
            for k in 0..3 {
                let diff = f64::from(pa[k]) - f64::from(pb[k]);
                acc += diff * diff;
            }
        }
    }
    (acc * FLOAT_COST_SCALE) as i64
}

#[allow(clippy::too_many_arguments)]
pub(super) fn ssd_sub_u8(
    shifted: &FrameView<'_>,
    sx: usize,
    sy: usize,
    fixed: &FrameView<'_>,
    fx: usize,
    fy: usize,
    width: usize,
    height: usize,
    channels: usize,
    sub_x: usize,
    sub_y: usize,
) -> i64 {
    // 8.8 fixed-point bilinear weights.
    let x2f = (sub_x * 0x100 / OVERSAMPLE as usize) as i64;
    let x1f = 0x100 - x2f;
    let y2f = (sub_y * 0x100 / OVERSAMPLE as usize) as i64;
    let y1f = 0x100 - y2f;

    let mut acc: i64 = 0;
    for row in 0..height - 1 {
        let s_row0 = shifted.row_u8(sy + row).expect("window row in bounds");
        let s_row1 = shifted.row_u8(sy + row + 1).expect("window row in bounds");
        let f_row = fixed.row_u8(fy + row).expect("window row in bounds");
        for col in 0..width - 1 {
            let s00 = &s_row0[(sx + col) * channels..];
            let s01 = &s_row0[(sx + col + 1) * channels..];
            let s10 = &s_row1[(sx + col) * channels..];
            let s11 = &s_row1[(sx + col + 1) * channels..];
            let pf = &f_row[(fx + col) * channels..];
            for k in 0..3 {
                let sample = (i64::from(s00[k]) * x1f * y1f
                    + i64::from(s01[k]) * x2f * y1f
                    + i64::from(s10[k]) * x1f * y2f
                    + i64::from(s11[k]) * x2f * y2f)
                    / 0x100
                    / 0x100;
                let diff = sample - i64::from(pf[k]);
                acc += diff * diff;
            }
        }
    }
    acc
}

#[allow(clippy::too_many_arguments)]
pub(super) fn ssd_sub_f32(
    shifted: &FrameView<'_>,
    sx: usize,
    sy: usize,
    fixed: &FrameView<'_>,
    fx: usize,
    fy: usize,
    width: usize,
    height: usize,
    channels: usize,
    sub_x: usize,
    sub_y: usize,
) -> i64 {
    let wx = sub_x as f64 / OVERSAMPLE as f64;
    let wy = sub_y as f64 / OVERSAMPLE as f64;
    let w00 = (1.0 - wx) * (1.0 - wy);
    let w01 = wx * (1.0 - wy);
    let w10 = (1.0 - wx) * wy;
    let w11 = wx * wy;

    let mut acc: f64 = 0.0;
    for row in 0..height - 1 {
        let s_row0 = shifted.row_f32(sy + row).expect("window row in bounds");
        let s_row1 = shifted.row_f32(sy + row + 1).expect("window row in bounds");
        let f_row = fixed.row_f32(fy + row).expect("window row in bounds");
        for col in 0..width - 1 {
            let s00 = &s_row0[(sx + col) * channels..];
            let s01 = &s_row0[(sx + col + 1) * channels..];
            let s10 = &s_row1[(sx + col) * channels..];
            let s11 = &s_row1[(sx + col + 1) * channels..];
            let pf = &f_row[(fx + col) * channels..];
            for k in 0..3 {
                let sample = f64::from(s00[k]) * w00
                    + f64::from(s01[k]) * w01
                    + f64::from(s10[k]) * w10
                    + f64::from(s11[k]) * w11;
                let diff = sample - f64::from(pf[k]);
                acc += diff * diff;
            }
        }
    }
    (acc * FLOAT_COST_SCALE) as i64
}

pub(super) fn range_u8(
    frame: &FrameView<'_>,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    channels: usize,
) -> f64 {
    let mut min = [u8::MAX; 3];
    let mut max = [u8::MIN; 3];
    for row in 0..height {
        let data = frame.row_u8(y + row).expect("window row in bounds");
        for col in 0..width {
            let pixel = &data[(x + col) * channels..];
            for k in 0..3 {
                min[k] = min[k].min(pixel[k]);
                max[k] = max[k].max(pixel[k]);
            }
        }
    }
    (0..3)
        .map(|k| f64::from(max[k]) - f64::from(min[k]))
        .fold(0.0, f64::max)
}

pub(super) fn range_f32(
    frame: &FrameView<'_>,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    channels: usize,
) -> f64 {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for row in 0..height {
        let data = frame.row_f32(y + row).expect("window row in bounds");
        for col in 0..width {
            let pixel = &data[(x + col) * channels..];
            for k in 0..3 {
                min[k] = min[k].min(pixel[k]);
                max[k] = max[k].max(pixel[k]);
            }
        }
    }
    (0..3)
        .map(|k| (f64::from(max[k]) - f64::from(min[k])) * 255.0)
        .fold(0.0, f64::max)
}
