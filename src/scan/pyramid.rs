//! Coarse-to-fine integer-pixel search.
//!
//! Each level reduces both frames by the current power-of-two factor, fans the
//! full candidate grid (position x rotation) out over the worker pool, keeps
//! the best candidate, then narrows the window and halves the factor. Once the
//! factor reaches 1 the search either stops at integer resolution or hands the
//! estimate to the sub-pixel pass.

use crate::cost;
use crate::frame::downsample::DownsampleCache;
use crate::frame::FrameView;
use crate::pool::WorkerPool;
use crate::rotation::bank::{step_to_angle, BlockRect, RotationBank};
use crate::rotation::RotationRenderer;
use crate::scan::context::{clamp_scan, Candidate, ScanContext};
use crate::scan::subpixel::subpixel_search;
use crate::scan::{
    DETAIL_THRESHOLD, MIN_DOWNSAMPLED_SCAN, MIN_DOWNSAMPLED_SIZE, OVERSAMPLE, SUBPIXEL_RANGE,
};
use crate::trace::{trace_event, trace_span};
use crate::util::BlockMatchResult;

/// Collaborators the scanner borrows for one call.
pub(crate) struct ScannerDeps<'a> {
    pub pool: &'a WorkerPool,
    pub cache: &'a DownsampleCache,
    pub shared_cache: bool,
    pub renderer: &'a dyn RotationRenderer,
}

/// Scanner-internal outcome, already in result orientation.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ScanOutcome {
    pub dx: i32,
    pub dy: i32,
    pub dr_deg: f64,
    pub failed: bool,
}

struct LevelResult {
    x_result: i32,
    y_result: i32,
    r_result: f64,
    best_angle_step: usize,
}

enum LevelStatus {
    Done(LevelResult),
    /// Not enough pixel value range to track.
    Failed,
    /// Every candidate fell outside the frame; keep the prior estimate.
    NoCandidates,
}

/// Runs the full pyramid search plus the optional sub-pixel pass.
pub(crate) fn run_scan(
    deps: &ScannerDeps<'_>,
    bank: &mut RotationBank,
    previous: &FrameView<'_>,
    current: &FrameView<'_>,
    mut ctx: ScanContext,
) -> BlockMatchResult<ScanOutcome> {
    let _span = trace_span!("scan").entered();

    // Top-left corner of the block the search starts from.
    let mut x_result = ctx.rects.block_x1 + ctx.origin_x;
    let mut y_result = ctx.rects.block_y1 + ctx.origin_y;
    let mut r_result = ctx.rotation_center;
    let mut best_angle_step = 0usize;

    let mut dx_result = 0i32;
    let mut dy_result = 0i32;
    let mut dr_result = 0f64;
    let mut failed = false;
    let mut subpixel_mode = false;

    loop {
        ctx.rects.scan_x1 = x_result - ctx.scan_w / 2;
        ctx.rects.scan_y1 = y_result - ctx.scan_h / 2;
        ctx.rects.scan_x2 = x_result + ctx.scan_w / 2;
        ctx.rects.scan_y2 = y_result + ctx.scan_h / 2;

        if ctx.horizontal_only {
            ctx.rects.scan_y1 = ctx.rects.block_y1;
            ctx.rects.scan_y2 = ctx.rects.block_y1 + 1;
        }
        if ctx.vertical_only {
            ctx.rects.scan_x1 = ctx.rects.block_x1;
            ctx.rects.scan_x2 = ctx.rects.block_x1 + 1;
        }

        // Clamp the block before the scan so the scan coords stay useful.
        clamp_scan(ctx.frame_w, ctx.frame_h, &mut ctx.rects, false);
        if ctx.rects.degenerate() {
            break;
        }

        if subpixel_mode {
            let selection = subpixel_search(
                deps.pool,
                previous,
                current,
                if ctx.do_rotation { Some(&*bank) } else { None },
                best_angle_step,
                &ctx,
                x_result,
                y_result,
            );
            if let Some(sel) = selection {
                dx_result = ctx.rects.block_x1 * OVERSAMPLE - sel.x_result;
                dy_result = ctx.rects.block_y1 * OVERSAMPLE - sel.y_result;
            }
            break;
        }

        match pixel_search(deps, bank, previous, current, &mut ctx, x_result, y_result, r_result)? {
            LevelStatus::Failed => {
                failed = true;
                dx_result = 0;
                dy_result = 0;
                dr_result = 0.0;
                break;
            }
            LevelStatus::NoCandidates => break,
            LevelStatus::Done(level) => {
                x_result = level.x_result;
                y_result = level.y_result;
                r_result = level.r_result;
                best_angle_step = level.best_angle_step;

                // Keep the estimate so degenerate geometry on a later level
                // still reports the last converged value.
                dx_result = ctx.rects.block_x1 * OVERSAMPLE - x_result;
                dy_result = ctx.rects.block_y1 * OVERSAMPLE - y_result;
                dr_result = ctx.rotation_center - r_result;

                if ctx.downsample <= 1 {
                    if ctx.action.wants_subpixel() {
                        x_result /= OVERSAMPLE;
                        y_result /= OVERSAMPLE;
                        ctx.scan_w = SUBPIXEL_RANGE;
                        ctx.scan_h = SUBPIXEL_RANGE;
                        subpixel_mode = true;
                    } else {
                        break;
                    }
                } else {
                    // Narrow: a bit more than 2x the next downsample factor.
                    if ctx.downsample * 3 < ctx.scan_w && ctx.downsample * 3 < ctx.scan_h {
                        ctx.scan_w = ctx.downsample * 3;
                        ctx.scan_h = ctx.downsample * 3;
                    }
                    if ctx.angle_step_deg * 1.5 < ctx.rotation_range {
                        ctx.rotation_range = ctx.angle_step_deg * 1.5;
                    }
                    ctx.downsample /= 2;
                    x_result /= OVERSAMPLE;
                    y_result /= OVERSAMPLE;
                }
            }
        }
    }

    if failed {
        return Ok(ScanOutcome {
            dx: 0,
            dy: 0,
            dr_deg: 0.0,
            failed: true,
        });
    }
    Ok(ScanOutcome {
        dx: -dx_result,
        dy: -dy_result,
        dr_deg: -dr_result,
        failed: false,
    })
}

/// Window clamped to the frame, for the detail check.
fn clamped_window(x: i32, y: i32, w: i32, h: i32, frame_w: i32, frame_h: i32) -> (i32, i32, i32, i32) {
    let x = x.clamp(0, frame_w - 1);
    let y = y.clamp(0, frame_h - 1);
    let w = w.clamp(1, frame_w - x);
    let h = h.clamp(1, frame_h - y);
    (x, y, w, h)
}

#[allow(clippy::too_many_arguments)]
fn pixel_search(
    deps: &ScannerDeps<'_>,
    bank: &mut RotationBank,
    previous: &FrameView<'_>,
    current: &FrameView<'_>,
    ctx: &mut ScanContext,
    x_entry: i32,
    y_entry: i32,
    r_entry: f64,
) -> BlockMatchResult<LevelStatus> {
    // Reduce the level of detail until the block and range survive it.
    while ctx.downsample > 1
        && (ctx.rects.block_w() / ctx.downsample < MIN_DOWNSAMPLED_SIZE
            || ctx.rects.block_h() / ctx.downsample < MIN_DOWNSAMPLED_SIZE
            || (ctx.rects.scan_x2 - ctx.rects.scan_x1) / ctx.downsample < MIN_DOWNSAMPLED_SCAN
            || (ctx.rects.scan_y2 - ctx.rects.scan_y1) / ctx.downsample < MIN_DOWNSAMPLED_SCAN)
    {
        ctx.downsample /= 2;
    }
    let ds = ctx.downsample;

    let prev_w = (previous.width() as i32 / ds).max(1);
    let prev_h = (previous.height() as i32 / ds).max(1);
    let cur_w = (current.width() as i32 / ds).max(1);
    let cur_h = (current.height() as i32 / ds).max(1);

    let x_steps = ((ctx.rects.scan_x2 - ctx.rects.scan_x1) / ds).max(1);
    let y_steps = ((ctx.rects.scan_y2 - ctx.rects.scan_y1) / ds).max(1);

    // Smallest angle resolvable at this resolution: one pixel of displacement
    // at the frame edge.
    let half_w = f64::from(cur_w) / 2.0;
    let half_h = f64::from(cur_h) / 2.0;
    let test_angle1 = (half_h - 1.0).atan2(half_w);
    let test_angle2 = half_h.atan2(half_w - 1.0);
    ctx.angle_step_deg = (test_angle1 - test_angle2).abs().to_degrees();

    let angle_steps = if ctx.do_rotation && ctx.angle_step_deg < ctx.rotation_range {
        1 + ((2.0 * ctx.rotation_range) / ctx.angle_step_deg + 0.5) as usize
    } else {
        1
    };

    // Reduced snapshots; the whole frame is kept for rotation hypotheses.
    let scaled = if ds > 1 {
        if !deps.shared_cache {
            deps.cache.clear();
        }
        let prev = deps
            .cache
            .get_scaled(ds as usize, true, prev_w as usize, prev_h as usize, previous)?;
        let cur = deps
            .cache
            .get_scaled(ds as usize, false, cur_w as usize, cur_h as usize, current)?;
        Some((prev, cur))
    } else {
        None
    };
    let prev_view = scaled
        .as_ref()
        .map(|(p, _)| p.view())
        .unwrap_or(*previous);
    let cur_view = scaled.as_ref().map(|(_, c)| c.view()).unwrap_or(*current);

    let block_x1 = ctx.rects.block_x1 / ds;
    let block_y1 = ctx.rects.block_y1 / ds;
    let block_x2 = ctx.rects.block_x2 / ds;
    let block_y2 = ctx.rects.block_y2 / ds;

    // Not enough detail in either window means nothing to track.
    let (bx, by, bw, bh) = clamped_window(
        block_x1,
        block_y1,
        block_x2 - block_x1,
        block_y2 - block_y1,
        cur_w,
        cur_h,
    );
    let block_range = cost::value_range(&cur_view, bx, by, bw, bh)?;
    if block_range < DETAIL_THRESHOLD {
        trace_event!("insufficient_detail", range = block_range);
        return Ok(LevelStatus::Failed);
    }
    let (sx, sy, sw, sh) = clamped_window(
        ctx.rects.scan_x1 / ds,
        ctx.rects.scan_y1 / ds,
        (ctx.rects.scan_x2 - ctx.rects.scan_x1 + ctx.rects.block_w()) / ds,
        (ctx.rects.scan_y2 - ctx.rects.scan_y1 + ctx.rects.block_h()) / ds,
        prev_w,
        prev_h,
    );
    let scan_range = cost::value_range(&prev_view, sx, sy, sw, sh)?;
    if scan_range < DETAIL_THRESHOLD {
        trace_event!("insufficient_detail", range = scan_range);
        return Ok(LevelStatus::Failed);
    }

    if ctx.do_rotation {
        bank.prepare(
            deps.renderer,
            &cur_view,
            BlockRect {
                x1: block_x1,
                y1: block_y1,
                x2: block_x2,
                y2: block_y2,
            },
            r_entry,
            ctx.angle_step_deg,
            angle_steps,
        )?;
    }

    // Full candidate grid for this level.
    let scan_x1_ds = ctx.rects.scan_x1 / ds;
    let scan_y1_ds = ctx.rects.scan_y1 / ds;
    let range_x = ctx.rects.scan_x2 - ctx.rects.scan_x1;
    let range_y = ctx.rects.scan_y2 - ctx.rects.scan_y1;
    let total = (x_steps * y_steps) as usize * angle_steps;
    let mut candidates: Vec<Candidate> = (0..total)
        .map(|i| {
            let position = i / angle_steps;
            let x_step = (position % x_steps as usize) as i32;
            let y_step = (position / x_steps as usize) as i32;
            Candidate {
                block_x1,
                block_y1,
                block_x2,
                block_y2,
                search_x: scan_x1_ds + x_step * range_x / ds / x_steps,
                search_y: scan_y1_ds + y_step * range_y / ds / y_steps,
                sub_x: 0,
                sub_y: 0,
                angle_step: if ctx.do_rotation { i % angle_steps } else { 0 },
                cost1: 0,
                cost2: 0,
                valid: true,
            }
        })
        .collect();

    trace_event!(
        "pixel_search",
        downsample = ds,
        x_steps = x_steps,
        y_steps = y_steps,
        angle_steps = angle_steps
    );

    let do_rotation = ctx.do_rotation;
    let bank_ref: &RotationBank = bank;
    deps.pool.run(&mut candidates, |pkg| {
        let rotated;
        let cur = if do_rotation {
            rotated = bank_ref.frame(pkg.angle_step);
            &rotated
        } else {
            &cur_view
        };
        match cost::block_cost(
            &prev_view,
            pkg.search_x,
            pkg.search_y,
            cur,
            pkg.block_x1,
            pkg.block_y1,
            pkg.block_w(),
            pkg.block_h(),
        ) {
            Ok(cost) => pkg.cost1 = cost,
            Err(_) => pkg.valid = false,
        }
    });

    // Least difference wins; ties prefer the smallest displacement from the
    // entry estimate, then the angle nearest the range center, then the
    // lowest package index.
    let mid_step = angle_steps / 2;
    let mut best: Option<((i64, i64, usize, usize), &Candidate)> = None;
    for (index, pkg) in candidates.iter().enumerate() {
        if !pkg.valid {
            continue;
        }
        let dx = i64::from(pkg.search_x * ds - x_entry);
        let dy = i64::from(pkg.search_y * ds - y_entry);
        let displacement = dx * dx + dy * dy;
        let angle_distance = pkg.angle_step.abs_diff(mid_step);
        let key = (pkg.cost1, displacement, angle_distance, index);
        if best.as_ref().map_or(true, |(bk, _)| key < *bk) {
            best = Some((key, pkg));
        }
    }

    let Some((_, winner)) = best else {
        return Ok(LevelStatus::NoCandidates);
    };

    Ok(LevelStatus::Done(LevelResult {
        x_result: winner.search_x * ds * OVERSAMPLE,
        y_result: winner.search_y * ds * OVERSAMPLE,
        r_result: step_to_angle(winner.angle_step, angle_steps, r_entry, ctx.angle_step_deg),
        best_angle_step: winner.angle_step,
    }))
}
