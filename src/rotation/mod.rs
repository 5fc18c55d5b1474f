//! Rotation rendering interface and the default bilinear renderer.
//!
//! Rendering rotated candidate frames is an external concern; the engine only
//! requires the [`RotationRenderer`] trait. [`BilinearRotator`] is a
//! self-contained implementation good enough for tests, benchmarks, and the
//! CLI: destination pixels inside the output viewport map through the inverse
//! rotation about the pivot pair and sample the source bilinearly. Pixels that
//! land outside the input viewport are left untouched, so callers clear the
//! destination before rendering.

pub(crate) mod bank;

use crate::frame::{FrameView, OwnedFrame, PixelData};
use crate::util::math::sin_cos_deg;
use crate::util::{BlockMatchError, BlockMatchResult};

/// Integer pixel rectangle, x/y inclusive origin with width/height extent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Viewport {
    /// Viewport covering a whole frame.
    pub fn full(frame: &FrameView<'_>) -> Self {
        Self {
            x: 0,
            y: 0,
            w: frame.width() as i32,
            h: frame.height() as i32,
        }
    }
}

/// Rotation pivot in continuous pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pivot {
    pub x: f64,
    pub y: f64,
}

/// Renders a rotated copy of a source viewport into a destination viewport.
pub trait RotationRenderer: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn rotate(
        &self,
        dst: &mut OwnedFrame,
        src: &FrameView<'_>,
        angle_deg: f64,
        in_viewport: Viewport,
        out_viewport: Viewport,
        in_pivot: Pivot,
        out_pivot: Pivot,
    ) -> BlockMatchResult<()>;
}

/// Default CPU renderer using bilinear sampling.
#[derive(Default)]
pub struct BilinearRotator;

impl BilinearRotator {
    pub fn new() -> Self {
        Self
    }
}

impl RotationRenderer for BilinearRotator {
    fn rotate(
        &self,
        dst: &mut OwnedFrame,
        src: &FrameView<'_>,
        angle_deg: f64,
        in_viewport: Viewport,
        out_viewport: Viewport,
        in_pivot: Pivot,
        out_pivot: Pivot,
    ) -> BlockMatchResult<()> {
        if dst.layout() != src.layout() {
            return Err(BlockMatchError::LayoutMismatch {
                previous: src.layout(),
                current: dst.layout(),
            });
        }
        let channels = src.layout().channels();
        let (sin_a, cos_a) = sin_cos_deg(angle_deg);

        // Sampling bounds: intersection of the input viewport and the frame.
        let in_x1 = in_viewport.x.max(0) as f64;
        let in_y1 = in_viewport.y.max(0) as f64;
        let in_x2 = ((in_viewport.x + in_viewport.w).min(src.width() as i32) - 1) as f64;
        let in_y2 = ((in_viewport.y + in_viewport.h).min(src.height() as i32) - 1) as f64;
        if in_x2 < in_x1 || in_y2 < in_y1 {
            return Ok(());
        }

        let out_x1 = out_viewport.x.max(0) as usize;
        let out_y1 = out_viewport.y.max(0) as usize;
        let out_x2 = ((out_viewport.x + out_viewport.w).max(0) as usize).min(dst.width());
        let out_y2 = ((out_viewport.y + out_viewport.h).max(0) as usize).min(dst.height());

        for y in out_y1..out_y2 {
            for x in out_x1..out_x2 {
                let dx = x as f64 - out_pivot.x;
                let dy = y as f64 - out_pivot.y;
                let src_x = cos_a * dx + sin_a * dy + in_pivot.x;
                let src_y = -sin_a * dx + cos_a * dy + in_pivot.y;
                if !src_x.is_finite()
                    || !src_y.is_finite()
                    || src_x < in_x1
                    || src_y < in_y1
                    || src_x > in_x2
                    || src_y > in_y2
                {
                    continue;
                }

                let x0 = src_x.floor() as usize;
                let y0 = src_y.floor() as usize;
                let x1 = (x0 + 1).min(src.width() - 1);
                let y1 = (y0 + 1).min(src.height() - 1);
                let fx = src_x - x0 as f64;
                let fy = src_y - y0 as f64;
                let w00 = (1.0 - fx) * (1.0 - fy);
                let w10 = fx * (1.0 - fy);
                let w01 = (1.0 - fx) * fy;
                let w11 = fx * fy;

                match src.data() {
                    PixelData::U8(_) => {
                        let row0 = src.row_u8(y0).expect("sample row in bounds");
                        let row1 = src.row_u8(y1).expect("sample row in bounds");
                        let out = dst.row_u8_mut(y).expect("output row in bounds");
                        for k in 0..channels {
                            let a = f64::from(row0[x0 * channels + k]);
                            let b = f64::from(row0[x1 * channels + k]);
                            let c = f64::from(row1[x0 * channels + k]);
                            let d = f64::from(row1[x1 * channels + k]);
                            let value = a * w00 + b * w10 + c * w01 + d * w11;
                            out[x * channels + k] = value.round().clamp(0.0, 255.0) as u8;
                        }
                    }
                    PixelData::F32(_) => {
                        let row0 = src.row_f32(y0).expect("sample row in bounds");
                        let row1 = src.row_f32(y1).expect("sample row in bounds");
                        let out = dst.row_f32_mut(y).expect("output row in bounds");
                        for k in 0..channels {
                            let a = f64::from(row0[x0 * channels + k]);
                            let b = f64::from(row0[x1 * channels + k]);
                            let c = f64::from(row1[x0 * channels + k]);
                            let d = f64::from(row1[x1 * channels + k]);
                            out[x * channels + k] = (a * w00 + b * w10 + c * w01 + d * w11) as f32;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
