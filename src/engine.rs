//! Engine facade tying the scan pipeline together.
//!
//! One engine owns the worker pool, the downsample cache, and the rotation
//! bank, and reuses them across calls. All per-call state is carried in a
//! `ScanContext`, so a single engine can scan frame pairs back to back;
//! concurrent scans use one engine each, optionally sharing a downsample
//! cache.

use crate::frame::downsample::DownsampleCache;
use crate::frame::FrameView;
use crate::pool::WorkerPool;
use crate::rotation::bank::RotationBank;
use crate::rotation::{BilinearRotator, RotationRenderer};
use crate::scan::context::{ScanContext, ScanRects};
use crate::scan::pyramid::{run_scan, ScannerDeps};
use crate::scan::{
    FrameRelation, ScanRequest, ScanResult, TrackingMode, OVERSAMPLE, STARTING_DOWNSAMPLE,
};
use crate::store::{NullStore, TrackingStore};
use crate::trace::{trace_event, trace_span};
use crate::util::{BlockMatchError, BlockMatchResult};
use std::sync::Arc;

/// Motion-estimation engine.
pub struct MotionEngine {
    pool: WorkerPool,
    cache: Arc<DownsampleCache>,
    shared_cache: bool,
    bank: RotationBank,
    renderer: Box<dyn RotationRenderer>,
    store: Box<dyn TrackingStore>,
    test_match: bool,
}

impl MotionEngine {
    /// Creates an engine with one worker per available processor.
    pub fn new() -> BlockMatchResult<Self> {
        Self::with_workers(num_cpus::get())
    }

    /// Creates an engine with an explicit worker count.
    pub fn with_workers(workers: usize) -> BlockMatchResult<Self> {
        Ok(Self {
            pool: WorkerPool::new(workers)?,
            cache: Arc::new(DownsampleCache::new()),
            shared_cache: false,
            bank: RotationBank::new(),
            renderer: Box::new(BilinearRotator::new()),
            store: Box::new(NullStore),
            test_match: true,
        })
    }

    /// Uses a downsample cache shared with other engines. The caller becomes
    /// responsible for clearing it when the frame pair changes.
    pub fn with_shared_cache(mut self, cache: Arc<DownsampleCache>) -> Self {
        self.cache = cache;
        self.shared_cache = true;
        self
    }

    /// Replaces the persistence backend used by Load/Save tracking modes.
    pub fn with_store(mut self, store: Box<dyn TrackingStore>) -> Self {
        self.store = store;
        self
    }

    /// Replaces the rotation renderer.
    pub fn with_renderer(mut self, renderer: Box<dyn RotationRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Enables or disables the byte-identical-frame fast path.
    pub fn set_test_match(&mut self, enabled: bool) {
        self.test_match = enabled;
    }

    /// Returns the worker count of the underlying pool.
    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    /// Computes the displacement aligning the requested block of `current`
    /// with `previous`. See [`ScanResult`] for unit conventions.
    pub fn scan(
        &mut self,
        previous: &FrameView<'_>,
        current: &FrameView<'_>,
        request: &ScanRequest,
    ) -> BlockMatchResult<ScanResult> {
        if previous.layout() != current.layout() {
            return Err(BlockMatchError::LayoutMismatch {
                previous: previous.layout(),
                current: current.layout(),
            });
        }
        if previous.width() != current.width() || previous.height() != current.height() {
            return Err(BlockMatchError::SizeMismatch {
                prev_width: previous.width(),
                prev_height: previous.height(),
                cur_width: current.width(),
                cur_height: current.height(),
            });
        }
        let _span = trace_span!("engine_scan").entered();

        let frame_w = current.width() as i32;
        let frame_h = current.height() as i32;

        // Block location in the reference frame, optionally following the
        // accumulated displacement of prior scans. The offset needn't be
        // exact; only the previous-to-current difference matters.
        let mut rects = ScanRects {
            block_x1: request.block_x - request.block_w / 2,
            block_y1: request.block_y - request.block_h / 2,
            block_x2: request.block_x + request.block_w / 2,
            block_y2: request.block_y + request.block_h / 2,
            ..ScanRects::default()
        };
        if request.frame_relation == FrameRelation::Previous {
            rects.block_x1 += request.total_dx / OVERSAMPLE;
            rects.block_y1 += request.total_dy / OVERSAMPLE;
            rects.block_x2 += request.total_dx / OVERSAMPLE;
            rects.block_y2 += request.total_dy / OVERSAMPLE;
        }

        let mut result = ScanResult::default();
        let mut skip = false;

        match request.tracking {
            TrackingMode::NoCalculate => {
                result.dr_deg = request.rotation_center;
                skip = true;
            }
            TrackingMode::Load => {
                let mut complete = true;
                if request.do_translation {
                    match self.store.load_translation(request.source_position) {
                        Some((dx, dy)) => {
                            result.dx = dx;
                            result.dy = dy;
                        }
                        None => complete = false,
                    }
                }
                if request.do_rotation {
                    match self.store.load_rotation(request.source_position) {
                        Some(dr) => result.dr_deg = dr,
                        None => complete = false,
                    }
                }
                if !complete {
                    // Missing or unreadable entries degrade to NoCalculate.
                    result = ScanResult {
                        dr_deg: request.rotation_center,
                        ..ScanResult::default()
                    };
                }
                skip = true;
            }
            TrackingMode::Calculate | TrackingMode::Save => {}
        }

        if !skip && self.test_match && previous.data_matches(current) {
            trace_event!("frames_match");
            result = ScanResult {
                dr_deg: request.rotation_center,
                ..ScanResult::default()
            };
            skip = true;
        }

        if !skip {
            let ctx = ScanContext::new(frame_w, frame_h, rects, request, STARTING_DOWNSAMPLE);
            let deps = ScannerDeps {
                pool: &self.pool,
                cache: &self.cache,
                shared_cache: self.shared_cache,
                renderer: self.renderer.as_ref(),
            };
            let outcome = run_scan(&deps, &mut self.bank, previous, current, ctx)?;
            result = ScanResult {
                dx: outcome.dx,
                dy: outcome.dy,
                dr_deg: outcome.dr_deg,
                failed: outcome.failed,
            };

            if request.tracking == TrackingMode::Save {
                if request.do_translation {
                    self.store
                        .save_translation(request.source_position, result.dx, result.dy)?;
                }
                if request.do_rotation {
                    self.store
                        .save_rotation(request.source_position, result.dr_deg)?;
                }
            }
        }

        if request.vertical_only {
            result.dx = 0;
        }
        if request.horizontal_only {
            result.dy = 0;
        }
        Ok(result)
    }
}
