//! Power-of-two frame reduction and the scaled-frame cache.
//!
//! Reduction is a box average over `factor x factor` pixel tiles; partial
//! tiles at the right and bottom edges average the pixels that exist. The
//! whole frame is reduced, not just the block, because rotation hypotheses
//! sample outside the block rectangle.

use crate::frame::{FrameView, OwnedFrame, PixelData};
use crate::util::{BlockMatchError, BlockMatchResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Reduces `src` by an integer factor, averaging all components.
pub fn downsample(src: &FrameView<'_>, factor: usize) -> BlockMatchResult<OwnedFrame> {
    if factor == 0 || !factor.is_power_of_two() {
        return Err(BlockMatchError::InvalidDownsample { factor });
    }
    let dst_w = (src.width() / factor).max(1);
    let dst_h = (src.height() / factor).max(1);
    let channels = src.layout().channels();
    let mut dst = OwnedFrame::new(dst_w, dst_h, src.layout())?;

    match src.data() {
        PixelData::U8(_) => {
            for oy in 0..dst_h {
                let y1 = oy * factor;
                let y2 = (y1 + factor).min(src.height());
                let out_row = dst.row_u8_mut(oy).expect("destination row in bounds");
                for ox in 0..dst_w {
                    let x1 = ox * factor;
                    let x2 = (x1 + factor).min(src.width());
                    let mut sums = [0u64; 4];
                    for y in y1..y2 {
                        let row = src.row_u8(y).expect("source row in bounds");
                        for x in x1..x2 {
                            let pixel = &row[x * channels..(x + 1) * channels];
                            for (sum, &value) in sums.iter_mut().zip(pixel) {
                                *sum += u64::from(value);
                            }
                        }
                    }
                    let scale = ((x2 - x1) * (y2 - y1)) as u64;
                    let out = &mut out_row[ox * channels..(ox + 1) * channels];
                    for (slot, sum) in out.iter_mut().zip(sums) {
                        *slot = (sum / scale) as u8;
                    }
                }
            }
        }
        PixelData::F32(_) => {
            for oy in 0..dst_h {
                let y1 = oy * factor;
                let y2 = (y1 + factor).min(src.height());
                let out_row = dst.row_f32_mut(oy).expect("destination row in bounds");
                for ox in 0..dst_w {
                    let x1 = ox * factor;
                    let x2 = (x1 + factor).min(src.width());
                    let mut sums = [0.0f64; 4];
                    for y in y1..y2 {
                        let row = src.row_f32(y).expect("source row in bounds");
                        for x in x1..x2 {
                            let pixel = &row[x * channels..(x + 1) * channels];
                            for (sum, &value) in sums.iter_mut().zip(pixel) {
                                *sum += f64::from(value);
                            }
                        }
                    }
                    let scale = ((x2 - x1) * (y2 - y1)) as f64;
                    let out = &mut out_row[ox * channels..(ox + 1) * channels];
                    for (slot, sum) in out.iter_mut().zip(sums) {
                        *slot = (sum / scale) as f32;
                    }
                }
            }
        }
    }
    Ok(dst)
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    factor: usize,
    previous: bool,
}

/// Cache of downsampled frame snapshots keyed by factor and frame role.
///
/// One engine owns a private cache and clears it at the start of every scan;
/// several engines scanning the same frame pair may instead share one cache
/// through an `Arc`, in which case the caller is responsible for clearing it
/// when the frames change.
#[derive(Default)]
pub struct DownsampleCache {
    entries: Mutex<HashMap<CacheKey, Arc<OwnedFrame>>>,
}

impl DownsampleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the reduced copy of `source`, computing and caching it when
    /// the slot is empty or its geometry no longer matches.
    pub fn get_scaled(
        &self,
        factor: usize,
        previous: bool,
        width: usize,
        height: usize,
        source: &FrameView<'_>,
    ) -> BlockMatchResult<Arc<OwnedFrame>> {
        let key = CacheKey { factor, previous };
        let mut entries = self.entries.lock().expect("downsample cache poisoned");
        if let Some(frame) = entries.get(&key) {
            if frame.width() == width
                && frame.height() == height
                && frame.layout() == source.layout()
            {
                return Ok(Arc::clone(frame));
            }
        }
        let frame = Arc::new(downsample(source, factor)?);
        entries.insert(key, Arc::clone(&frame));
        Ok(frame)
    }

    /// Drops every cached snapshot.
    pub fn clear(&self) {
        self.entries
            .lock()
            .expect("downsample cache poisoned")
            .clear();
    }
}
