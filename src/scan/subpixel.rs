//! Fractional-offset refinement after integer convergence.
//!
//! Runs only at downsample 1 over a fixed `SUBPIXEL_RANGE`-pixel square
//! oversampled by `OVERSAMPLE`. Every fractional candidate is evaluated in
//! both interpolation directions (shifting the reference toward the candidate
//! and the candidate toward the reference); the cheaper direction wins.
//! Rotation is not re-searched here; the winning rotated copy of the last
//! integer level stays fixed.

use crate::cost;
use crate::frame::FrameView;
use crate::pool::WorkerPool;
use crate::rotation::bank::RotationBank;
use crate::scan::context::{Candidate, ScanContext};
use crate::scan::{OVERSAMPLE, SUBPIXEL_RANGE};
use crate::trace::trace_event;

/// Winning sub-pixel position in quarter-pixel units.
pub(crate) struct SubpixelSelection {
    pub x_result: i32,
    pub y_result: i32,
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn subpixel_search(
    pool: &WorkerPool,
    previous: &FrameView<'_>,
    current: &FrameView<'_>,
    bank: Option<&RotationBank>,
    best_angle_step: usize,
    ctx: &ScanContext,
    x_entry: i32,
    y_entry: i32,
) -> Option<SubpixelSelection> {
    let grid = (SUBPIXEL_RANGE * OVERSAMPLE) as usize;
    let total = grid * grid;

    let mut candidates: Vec<Candidate> = (0..total)
        .map(|i| {
            let mut sub_x = (i % grid) as i32;
            let mut sub_y = (i / grid) as i32;
            // The sub coords sit one pixel right and below the scan corner.
            let search_x = ctx.rects.scan_x1 + sub_x / OVERSAMPLE + 1;
            let search_y = ctx.rects.scan_y1 + sub_y / OVERSAMPLE + 1;
            sub_x %= OVERSAMPLE;
            sub_y %= OVERSAMPLE;
            Candidate {
                block_x1: ctx.rects.block_x1,
                block_y1: ctx.rects.block_y1,
                block_x2: ctx.rects.block_x2,
                block_y2: ctx.rects.block_y2,
                search_x,
                search_y,
                sub_x,
                sub_y,
                angle_step: best_angle_step,
                cost1: 0,
                cost2: 0,
                valid: true,
            }
        })
        .collect();

    trace_event!("subpixel_search", candidates = total);

    pool.run(&mut candidates, |pkg| {
        let rotated;
        let cur = match bank {
            Some(bank) => {
                rotated = bank.frame(pkg.angle_step);
                &rotated
            }
            None => current,
        };
        let first = cost::block_cost_subpixel(
            previous,
            pkg.search_x,
            pkg.search_y,
            cur,
            pkg.block_x1,
            pkg.block_y1,
            pkg.block_w(),
            pkg.block_h(),
            pkg.sub_x,
            pkg.sub_y,
        );
        let second = cost::block_cost_subpixel(
            cur,
            pkg.block_x1,
            pkg.block_y1,
            previous,
            pkg.search_x,
            pkg.search_y,
            pkg.block_w(),
            pkg.block_h(),
            pkg.sub_x,
            pkg.sub_y,
        );
        match (first, second) {
            (Ok(cost1), Ok(cost2)) => {
                pkg.cost1 = cost1;
                pkg.cost2 = cost2;
            }
            _ => pkg.valid = false,
        }
    });

    // Both interpolation directions compete; ties prefer the smallest
    // displacement from the entry estimate, then the lowest package index.
    let entry_x = x_entry * OVERSAMPLE;
    let entry_y = y_entry * OVERSAMPLE;
    let mut best: Option<((i64, i64, usize), (i32, i32))> = None;
    for (index, pkg) in candidates.iter().enumerate() {
        if !pkg.valid {
            continue;
        }
        let positions = [
            (
                pkg.cost1,
                pkg.search_x * OVERSAMPLE + pkg.sub_x,
                pkg.search_y * OVERSAMPLE + pkg.sub_y,
            ),
            (
                pkg.cost2,
                pkg.search_x * OVERSAMPLE - pkg.sub_x,
                pkg.search_y * OVERSAMPLE - pkg.sub_y,
            ),
        ];
        for (cost, x, y) in positions {
            let dx = i64::from(x - entry_x);
            let dy = i64::from(y - entry_y);
            let key = (cost, dx * dx + dy * dy, index);
            if best.as_ref().map_or(true, |(bk, _)| key < *bk) {
                best = Some((key, (x, y)));
            }
        }
    }

    best.map(|(_, (x, y))| SubpixelSelection {
        x_result: x,
        y_result: y,
    })
}
