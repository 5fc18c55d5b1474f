//! Dissimilarity cost between a reference window and a candidate window.
//!
//! Costs are sums of squared per-channel differences with the alpha channel
//! excluded. 8-bit layouts accumulate exactly in `i64`; float layouts
//! accumulate in `f64` and are scaled by `0x10000` so both storage types
//! produce comparable magnitudes. The sub-pixel variant bilinearly shifts the
//! first window by a fraction of a pixel before differencing; callers evaluate
//! it in both shift directions because either convention may win.

mod scalar;

use crate::frame::{FrameView, PixelData};
use crate::util::{BlockMatchError, BlockMatchResult};

/// Scale applied to float-layout costs to line up with 8-bit magnitudes.
pub(crate) const FLOAT_COST_SCALE: f64 = 65536.0;

fn check_window(frame: &FrameView<'_>, x: i32, y: i32, width: i32, height: i32) -> BlockMatchResult<()> {
    let fits = x >= 0
        && y >= 0
        && width > 0
        && height > 0
        && (x as i64 + width as i64) <= frame.width() as i64
        && (y as i64 + height as i64) <= frame.height() as i64;
    if fits {
        Ok(())
    } else {
        Err(BlockMatchError::WindowOutOfBounds {
            x: x as i64,
            y: y as i64,
            width: width as i64,
            height: height as i64,
            frame_width: frame.width(),
            frame_height: frame.height(),
        })
    }
}

fn check_pair(a: &FrameView<'_>, b: &FrameView<'_>) -> BlockMatchResult<()> {
    if a.layout() != b.layout() {
        return Err(BlockMatchError::LayoutMismatch {
            previous: a.layout(),
            current: b.layout(),
        });
    }
    Ok(())
}

/// Integer-pixel cost between two equal-size windows.
#[allow(clippy::too_many_arguments)]
pub fn block_cost(
    previous: &FrameView<'_>,
    prev_x: i32,
    prev_y: i32,
    current: &FrameView<'_>,
    cur_x: i32,
    cur_y: i32,
    width: i32,
    height: i32,
) -> BlockMatchResult<i64> {
    check_pair(previous, current)?;
    check_window(previous, prev_x, prev_y, width, height)?;
    check_window(current, cur_x, cur_y, width, height)?;

    let channels = previous.layout().channels();
    let cost = match (previous.data(), current.data()) {
        (PixelData::U8(_), PixelData::U8(_)) => scalar::ssd_u8(
            previous,
            prev_x as usize,
            prev_y as usize,
            current,
            cur_x as usize,
            cur_y as usize,
            width as usize,
            height as usize,
            channels,
        ),
        (PixelData::F32(_), PixelData::F32(_)) => scalar::ssd_f32(
            previous,
            prev_x as usize,
            prev_y as usize,
            current,
            cur_x as usize,
            cur_y as usize,
            width as usize,
            height as usize,
            channels,
        ),
        _ => unreachable!("layout equality implies matching storage"),
    };
    Ok(cost)
}

/// Sub-pixel cost with the `shifted` window sampled at a fractional offset.
///
/// `sub_x`/`sub_y` are in `OVERSAMPLE` units in `[0, OVERSAMPLE)`. The kernel
/// iterates `width - 1` by `height - 1` samples, the convention that skips the
/// bottom row and right column consumed by the bilinear neighborhood.
#[allow(clippy::too_many_arguments)]
pub fn block_cost_subpixel(
    shifted: &FrameView<'_>,
    shifted_x: i32,
    shifted_y: i32,
    fixed: &FrameView<'_>,
    fixed_x: i32,
    fixed_y: i32,
    width: i32,
    height: i32,
    sub_x: i32,
    sub_y: i32,
) -> BlockMatchResult<i64> {
    check_pair(shifted, fixed)?;
    check_window(shifted, shifted_x, shifted_y, width, height)?;
    check_window(fixed, fixed_x, fixed_y, width, height)?;
    if width < 2 || height < 2 {
        return Err(BlockMatchError::InvalidDimensions {
            width: width as usize,
            height: height as usize,
        });
    }

    let channels = shifted.layout().channels();
    let cost = match (shifted.data(), fixed.data()) {
        (PixelData::U8(_), PixelData::U8(_)) => scalar::ssd_sub_u8(
            shifted,
            shifted_x as usize,
            shifted_y as usize,
            fixed,
            fixed_x as usize,
            fixed_y as usize,
            width as usize,
            height as usize,
            channels,
            sub_x as usize,
            sub_y as usize,
        ),
        (PixelData::F32(_), PixelData::F32(_)) => scalar::ssd_sub_f32(
            shifted,
            shifted_x as usize,
            shifted_y as usize,
            fixed,
            fixed_x as usize,
            fixed_y as usize,
            width as usize,
            height as usize,
            channels,
            sub_x as usize,
            sub_y as usize,
        ),
        _ => unreachable!("layout equality implies matching storage"),
    };
    Ok(cost)
}

/// Largest per-channel value range (max - min) inside a window, on the 8-bit
/// value scale. Float layouts are scaled by 255 so one threshold serves both.
pub fn value_range(
    frame: &FrameView<'_>,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
) -> BlockMatchResult<f64> {
    check_window(frame, x, y, width, height)?;
    let channels = frame.layout().channels();
    let range = match frame.data() {
        PixelData::U8(_) => scalar::range_u8(
            frame,
            x as usize,
            y as usize,
            width as usize,
            height as usize,
            channels,
        ),
        PixelData::F32(_) => scalar::range_f32(
            frame,
            x as usize,
            y as usize,
            width as usize,
            height as usize,
            channels,
        ),
    };
    Ok(range)
}
