//! Frame views and owned frame buffers.
//!
//! `FrameView` is a borrowed 2D view into a caller-owned pixel buffer with an
//! explicit stride and a pixel-layout tag. The stride counts elements between
//! the starts of consecutive rows (components, not pixels), so a stride larger
//! than `width * channels` represents padded rows. The engine only ever reads
//! caller frames; downsampled and rotated copies it creates are `OwnedFrame`s.

use crate::util::{BlockMatchError, BlockMatchResult};

pub mod downsample;
#[cfg(feature = "image-io")]
pub mod io;

/// Pixel memory layouts accepted by the scan kernels.
///
/// Packed 8-bit layouts store one byte per component; float layouts store one
/// `f32` per component on a nominal [0, 1] value scale. Cost kernels skip the
/// alpha component of the 4-channel layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// Packed 8-bit RGB.
    Rgb888,
    /// Packed 8-bit RGBA.
    Rgba8888,
    /// Packed 8-bit YUV.
    Yuv888,
    /// Packed 8-bit YUV with alpha.
    Yuva8888,
    /// Packed 32-bit float RGB.
    RgbFloat,
    /// Packed 32-bit float RGBA.
    RgbaFloat,
}

impl PixelLayout {
    /// Number of components per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Rgb888 | PixelLayout::Yuv888 | PixelLayout::RgbFloat => 3,
            PixelLayout::Rgba8888 | PixelLayout::Yuva8888 | PixelLayout::RgbaFloat => 4,
        }
    }

    /// Whether the last component is alpha.
    pub fn has_alpha(self) -> bool {
        self.channels() == 4
    }

    /// Whether components are `f32` rather than `u8`.
    pub fn is_float(self) -> bool {
        matches!(self, PixelLayout::RgbFloat | PixelLayout::RgbaFloat)
    }
}

/// Borrowed component data of a frame.
#[derive(Clone, Copy)]
pub enum PixelData<'a> {
    U8(&'a [u8]),
    F32(&'a [f32]),
}

impl PixelData<'_> {
    fn len(&self) -> usize {
        match self {
            PixelData::U8(data) => data.len(),
            PixelData::F32(data) => data.len(),
        }
    }
}

/// Borrowed 2D frame view with an explicit stride and layout tag.
#[derive(Clone, Copy)]
pub struct FrameView<'a> {
    data: PixelData<'a>,
    width: usize,
    height: usize,
    stride: usize,
    layout: PixelLayout,
}

impl<'a> FrameView<'a> {
    /// Creates a contiguous 8-bit view with `stride == width * channels`.
    pub fn from_u8(
        data: &'a [u8],
        width: usize,
        height: usize,
        layout: PixelLayout,
    ) -> BlockMatchResult<Self> {
        Self::with_stride(PixelData::U8(data), width, height, width * layout.channels(), layout)
    }

    /// Creates a contiguous float view with `stride == width * channels`.
    pub fn from_f32(
        data: &'a [f32],
        width: usize,
        height: usize,
        layout: PixelLayout,
    ) -> BlockMatchResult<Self> {
        Self::with_stride(PixelData::F32(data), width, height, width * layout.channels(), layout)
    }

    /// Creates a view with an explicit stride in components.
    pub fn with_stride(
        data: PixelData<'a>,
        width: usize,
        height: usize,
        stride: usize,
        layout: PixelLayout,
    ) -> BlockMatchResult<Self> {
        match (&data, layout.is_float()) {
            (PixelData::U8(_), true) => {
                return Err(BlockMatchError::StorageMismatch {
                    layout,
                    expected: "f32",
                })
            }
            (PixelData::F32(_), false) => {
                return Err(BlockMatchError::StorageMismatch {
                    layout,
                    expected: "u8",
                })
            }
            _ => {}
        }
        let needed = required_len(width, height, stride, layout)?;
        if data.len() < needed {
            return Err(BlockMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            layout,
        })
    }

    /// Returns the frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in components between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the pixel layout tag.
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Returns the borrowed component data.
    pub fn data(&self) -> PixelData<'a> {
        self.data
    }

    /// Returns row `y` as 8-bit components, `width * channels` long.
    pub fn row_u8(&self, y: usize) -> Option<&'a [u8]> {
        let (start, end) = self.row_span(y)?;
        match self.data {
            PixelData::U8(data) => data.get(start..end),
            PixelData::F32(_) => None,
        }
    }

    /// Returns row `y` as float components, `width * channels` long.
    pub fn row_f32(&self, y: usize) -> Option<&'a [f32]> {
        let (start, end) = self.row_span(y)?;
        match self.data {
            PixelData::F32(data) => data.get(start..end),
            PixelData::U8(_) => None,
        }
    }

    fn row_span(&self, y: usize) -> Option<(usize, usize)> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width * self.layout.channels())?;
        Some((start, end))
    }

    /// Compares pixel content for bit-identical equality, ignoring padding.
    ///
    /// Frames with different layouts or dimensions never match.
    pub fn data_matches(&self, other: &FrameView<'_>) -> bool {
        if self.layout != other.layout || self.width != other.width || self.height != other.height {
            return false;
        }
        match (self.data, other.data) {
            (PixelData::U8(_), PixelData::U8(_)) => {
                (0..self.height).all(|y| self.row_u8(y) == other.row_u8(y))
            }
            (PixelData::F32(_), PixelData::F32(_)) => (0..self.height).all(|y| {
                match (self.row_f32(y), other.row_f32(y)) {
                    (Some(a), Some(b)) => {
                        a.len() == b.len()
                            && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
                    }
                    _ => false,
                }
            }),
            _ => false,
        }
    }
}

fn required_len(
    width: usize,
    height: usize,
    stride: usize,
    layout: PixelLayout,
) -> BlockMatchResult<usize> {
    if width == 0 || height == 0 {
        return Err(BlockMatchError::InvalidDimensions { width, height });
    }
    let row = width
        .checked_mul(layout.channels())
        .ok_or(BlockMatchError::InvalidDimensions { width, height })?;
    if stride < row {
        return Err(BlockMatchError::InvalidStride { row, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row))
        .ok_or(BlockMatchError::InvalidDimensions { width, height })
}

/// Owned component storage of a frame.
pub enum PixelBuffer {
    U8(Vec<u8>),
    F32(Vec<f32>),
}

/// Owned contiguous frame buffer.
///
/// The engine allocates these for downsampled and rotated snapshots; they are
/// treated as immutable for the duration of a scan pass.
pub struct OwnedFrame {
    data: PixelBuffer,
    width: usize,
    height: usize,
    layout: PixelLayout,
}

impl OwnedFrame {
    /// Allocates a zero-filled frame.
    pub fn new(width: usize, height: usize, layout: PixelLayout) -> BlockMatchResult<Self> {
        let len = required_len(width, height, width * layout.channels(), layout)?;
        let data = if layout.is_float() {
            PixelBuffer::F32(vec![0.0; len])
        } else {
            PixelBuffer::U8(vec![0; len])
        };
        Ok(Self {
            data,
            width,
            height,
            layout,
        })
    }

    /// Wraps an existing contiguous 8-bit buffer.
    pub fn from_u8(
        data: Vec<u8>,
        width: usize,
        height: usize,
        layout: PixelLayout,
    ) -> BlockMatchResult<Self> {
        FrameView::from_u8(&data, width, height, layout)?;
        Ok(Self {
            data: PixelBuffer::U8(data),
            width,
            height,
            layout,
        })
    }

    /// Wraps an existing contiguous float buffer.
    pub fn from_f32(
        data: Vec<f32>,
        width: usize,
        height: usize,
        layout: PixelLayout,
    ) -> BlockMatchResult<Self> {
        FrameView::from_f32(&data, width, height, layout)?;
        Ok(Self {
            data: PixelBuffer::F32(data),
            width,
            height,
            layout,
        })
    }

    /// Returns the frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the pixel layout tag.
    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    /// Returns a borrowed view of the frame.
    pub fn view(&self) -> FrameView<'_> {
        let data = match &self.data {
            PixelBuffer::U8(data) => PixelData::U8(data),
            PixelBuffer::F32(data) => PixelData::F32(data),
        };
        FrameView {
            data,
            width: self.width,
            height: self.height,
            stride: self.width * self.layout.channels(),
            layout: self.layout,
        }
    }

    /// Resets every component to zero.
    pub fn clear(&mut self) {
        match &mut self.data {
            PixelBuffer::U8(data) => data.fill(0),
            PixelBuffer::F32(data) => data.fill(0.0),
        }
    }

    pub(crate) fn row_u8_mut(&mut self, y: usize) -> Option<&mut [u8]> {
        let row = self.width * self.layout.channels();
        let start = y.checked_mul(row)?;
        match &mut self.data {
            PixelBuffer::U8(data) => data.get_mut(start..start + row),
            PixelBuffer::F32(_) => None,
        }
    }

    pub(crate) fn row_f32_mut(&mut self, y: usize) -> Option<&mut [f32]> {
        let row = self.width * self.layout.channels();
        let start = y.checked_mul(row)?;
        match &mut self.data {
            PixelBuffer::F32(data) => data.get_mut(start..start + row),
            PixelBuffer::U8(_) => None,
        }
    }
}
