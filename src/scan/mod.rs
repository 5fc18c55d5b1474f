//! Public scan types: request, result, modes, and fixed-point constants.

pub(crate) mod context;
pub(crate) mod pyramid;
pub(crate) mod subpixel;

/// Sub-pixel resolution multiplier; displacements are reported in units of
/// `1 / OVERSAMPLE` pixels.
pub const OVERSAMPLE: i32 = 4;

/// Starting level of detail for the coarse-to-fine search.
pub const STARTING_DOWNSAMPLE: i32 = 16;

/// Minimum downsampled block size in each dimension.
pub(crate) const MIN_DOWNSAMPLED_SIZE: i32 = 16;

/// Minimum downsampled scan range in each dimension.
pub(crate) const MIN_DOWNSAMPLED_SCAN: i32 = 4;

/// Pixel extent of the square sub-pixel neighborhood.
pub(crate) const SUBPIXEL_RANGE: i32 = 4;

/// Minimum pixel value range (8-bit scale) a window must exhibit to be
/// considered trackable.
pub(crate) const DETAIL_THRESHOLD: f64 = 1.0;

/// How the block rectangle relates to previous results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameRelation {
    /// The block stays where the request puts it.
    Single,
    /// The block follows the accumulated displacement of prior scans.
    Previous,
}

/// Whether to compute, persist, or reuse scan results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingMode {
    /// Run the search.
    Calculate,
    /// Run the search and write the result to the tracking store.
    Save,
    /// Read the result from the tracking store instead of searching; falls
    /// back to `NoCalculate` semantics when entries are missing.
    Load,
    /// Skip the search and report a zero displacement.
    NoCalculate,
}

/// What the surrounding system does with the result; the `*Pixel` variants
/// stop at integer-pixel resolution and skip the sub-pixel pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionMode {
    Track,
    TrackPixel,
    Stabilize,
    StabilizePixel,
    Nothing,
}

impl ActionMode {
    pub(crate) fn wants_subpixel(self) -> bool {
        matches!(
            self,
            ActionMode::Track | ActionMode::Stabilize | ActionMode::Nothing
        )
    }
}

/// One motion-scan request. All geometry is in pixels of the input frames;
/// `total_dx`/`total_dy` are quarter-pixel fixed point like the results.
#[derive(Clone, Debug)]
pub struct ScanRequest {
    /// Search range extent around the block, in pixels.
    pub scan_w: i32,
    pub scan_h: i32,
    /// Tracked block extent, in pixels.
    pub block_w: i32,
    pub block_h: i32,
    /// Block center in the reference frame.
    pub block_x: i32,
    pub block_y: i32,
    pub frame_relation: FrameRelation,
    pub tracking: TrackingMode,
    pub action: ActionMode,
    /// Restrict the search to horizontal translation.
    pub horizontal_only: bool,
    /// Restrict the search to vertical translation.
    pub vertical_only: bool,
    /// Key for persisted results in the tracking store.
    pub source_position: i64,
    /// Accumulated displacement from prior scans (quarter-pixel).
    pub total_dx: i32,
    pub total_dy: i32,
    /// Offset of the search origin relative to the block, in pixels.
    pub origin_x: i32,
    pub origin_y: i32,
    /// Persist/load the translation result.
    pub do_translation: bool,
    /// Search rotation hypotheses and report a rotation delta.
    pub do_rotation: bool,
    /// Best-guess rotation angle the search is centered on, in degrees.
    pub rotation_center: f64,
    /// Half-span of the rotation search around the center, in degrees.
    pub rotation_range: f64,
}

impl Default for ScanRequest {
    fn default() -> Self {
        Self {
            scan_w: 0,
            scan_h: 0,
            block_w: 0,
            block_h: 0,
            block_x: 0,
            block_y: 0,
            frame_relation: FrameRelation::Single,
            tracking: TrackingMode::Calculate,
            action: ActionMode::Track,
            horizontal_only: false,
            vertical_only: false,
            source_position: 0,
            total_dx: 0,
            total_dy: 0,
            origin_x: 0,
            origin_y: 0,
            do_translation: true,
            do_rotation: false,
            rotation_center: 0.0,
            rotation_range: 0.0,
        }
    }
}

/// Final scan result.
///
/// `dx`/`dy` are quarter-pixel fixed point; `current(x, y)` best matches
/// `previous(x + dx/4, y + dy/4)` over the tracked block after rotating the
/// current frame by `dr_deg` about the rotation center. `failed` is set when
/// neither window had enough detail to track; the vector is zero then.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScanResult {
    pub dx: i32,
    pub dy: i32,
    pub dr_deg: f64,
    pub failed: bool,
}

impl ScanResult {
    /// Horizontal displacement in pixels.
    pub fn dx_pixels(&self) -> f64 {
        f64::from(self.dx) / f64::from(OVERSAMPLE)
    }

    /// Vertical displacement in pixels.
    pub fn dy_pixels(&self) -> f64 {
        f64::from(self.dy) / f64::from(OVERSAMPLE)
    }
}
