//! Cached set of rotated current-frame copies, one per angle hypothesis.
//!
//! Allocation is reused across scan levels while the step count, frame
//! geometry, and layout stay the same; the copies themselves are re-rendered
//! every level because the angle center and step change as the search narrows.
//! Each copy only needs the viewport able to contain the rotated block, which
//! is derived from the block diagonal and the candidate angle.

use crate::frame::{FrameView, OwnedFrame, PixelLayout};
use crate::rotation::{Pivot, RotationRenderer, Viewport};
use crate::util::BlockMatchResult;

/// Maps an angle-step index onto a concrete angle around `center_deg`.
pub(crate) fn step_to_angle(step: usize, steps: usize, center_deg: f64, step_deg: f64) -> f64 {
    let mid = steps / 2;
    if step < mid {
        center_deg - step_deg * (mid - step) as f64
    } else if step > mid {
        center_deg + step_deg * (step - mid) as f64
    } else {
        center_deg
    }
}

/// Downsampled block rectangle the hypotheses are built around.
#[derive(Clone, Copy, Debug)]
pub(crate) struct BlockRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

pub(crate) struct RotationBank {
    frames: Vec<OwnedFrame>,
    width: usize,
    height: usize,
    layout: Option<PixelLayout>,
}

impl RotationBank {
    pub(crate) fn new() -> Self {
        Self {
            frames: Vec::new(),
            width: 0,
            height: 0,
            layout: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns the rotated copy for one angle step.
    pub(crate) fn frame(&self, step: usize) -> FrameView<'_> {
        self.frames[step].view()
    }

    /// Renders `angle_steps` rotated copies of `current`, reusing buffers when
    /// the requested geometry matches the cached one.
    pub(crate) fn prepare(
        &mut self,
        renderer: &dyn RotationRenderer,
        current: &FrameView<'_>,
        block: BlockRect,
        center_deg: f64,
        step_deg: f64,
        angle_steps: usize,
    ) -> BlockMatchResult<()> {
        // Copies are one pixel larger than the source, so rotated samples on
        // the right and bottom block edges stay addressable.
        let width = current.width() + 1;
        let height = current.height() + 1;
        let layout = current.layout();

        if self.frames.len() != angle_steps
            || self.width != width
            || self.height != height
            || self.layout != Some(layout)
        {
            self.frames.clear();
            for _ in 0..angle_steps {
                self.frames.push(OwnedFrame::new(width, height, layout)?);
            }
            self.width = width;
            self.height = height;
            self.layout = Some(layout);
        }

        let bw = (block.x2 - block.x1).max(1) as f64;
        let bh = (block.y2 - block.y1).max(1) as f64;
        let diag = bw.hypot(bh);
        let base_angle = bh.atan2(bw);
        let center_x = (block.x1 + block.x2) / 2;
        let center_y = (block.y1 + block.y2) / 2;
        let pivot = Pivot {
            x: center_x as f64,
            y: center_y as f64,
        };
        let frame_w = current.width() as i32;
        let frame_h = current.height() as i32;

        for (step, dst) in self.frames.iter_mut().enumerate() {
            let angle = step_to_angle(step, angle_steps, center_deg, step_deg);
            let angle_rad = angle.to_radians();
            let a1 = base_angle + angle_rad;
            let a2 = -base_angle + angle_rad;
            let max_horiz = (diag * a1.cos()).abs().max((diag * a2.cos()).abs());
            let max_vert = (diag * a1.sin()).abs().max((diag * a2.sin()).abs());

            let x1 = (center_x - (max_horiz / 2.0) as i32 - 1).clamp(0, frame_w);
            let y1 = (center_y - (max_vert / 2.0) as i32 - 1).clamp(0, frame_h);
            let x2 = (x1 + max_horiz as i32 + 2).clamp(0, frame_w);
            let y2 = (y1 + max_vert as i32 + 2).clamp(0, frame_h);
            let viewport = Viewport {
                x: x1,
                y: y1,
                w: x2 - x1,
                h: y2 - y1,
            };

            dst.clear();
            renderer.rotate(dst, current, angle, viewport, viewport, pivot, pivot)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{step_to_angle, BlockRect, RotationBank};
    use crate::frame::{FrameView, PixelLayout};
    use crate::rotation::BilinearRotator;

    #[test]
    fn step_to_angle_is_centered() {
        assert_eq!(step_to_angle(2, 5, 10.0, 1.0), 10.0);
        assert_eq!(step_to_angle(0, 5, 10.0, 1.0), 8.0);
        assert_eq!(step_to_angle(4, 5, 10.0, 1.0), 12.0);
        // Even counts put the center on the upper middle step.
        assert_eq!(step_to_angle(2, 4, 0.0, 0.5), 0.0);
        assert_eq!(step_to_angle(0, 4, 0.0, 0.5), -1.0);
    }

    fn textured(width: usize, height: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 31 + y * 7) % 256) as u8;
                data.extend_from_slice(&[v, v, v]);
            }
        }
        data
    }

    #[test]
    fn prepare_builds_one_copy_per_step() {
        let data = textured(32, 24);
        let view = FrameView::from_u8(&data, 32, 24, PixelLayout::Rgb888).unwrap();
        let renderer = BilinearRotator::new();
        let mut bank = RotationBank::new();
        let block = BlockRect {
            x1: 8,
            y1: 6,
            x2: 24,
            y2: 18,
        };
        bank.prepare(&renderer, &view, block, 0.0, 0.5, 5).unwrap();
        assert_eq!(bank.len(), 5);
        assert_eq!(bank.frame(0).width(), 33);
        assert_eq!(bank.frame(0).height(), 25);

        // The center step is the unrotated hypothesis; the block interior
        // must match the source frame.
        let center = bank.frame(2);
        let src_row = view.row_u8(12).unwrap();
        let out_row = center.row_u8(12).unwrap();
        for x in 10..22 {
            assert_eq!(out_row[x * 3], src_row[x * 3]);
        }
    }

    #[test]
    fn prepare_rebuilds_on_geometry_change() {
        let data = textured(16, 16);
        let view = FrameView::from_u8(&data, 16, 16, PixelLayout::Rgb888).unwrap();
        let renderer = BilinearRotator::new();
        let mut bank = RotationBank::new();
        let block = BlockRect {
            x1: 4,
            y1: 4,
            x2: 12,
            y2: 12,
        };
        bank.prepare(&renderer, &view, block, 0.0, 1.0, 3).unwrap();
        assert_eq!(bank.len(), 3);
        bank.prepare(&renderer, &view, block, 0.0, 1.0, 7).unwrap();
        assert_eq!(bank.len(), 7);
    }
}
