//! Vertical and white vertical line detection.
//!
//! Column `k` is scanned top to bottom. Runs of recurrent cells are vertical
//! lines, runs of non-recurrent cells are white vertical lines, and the
//! recurrent cells are also tallied per column.
//!
//! In symmetric mode only the upper triangle is buffered, so column `k` is
//! read along the mirrored path: down column `k` to the main diagonal, then
//! right along row `k`. Within a square-aligned tile that path is a single
//! contiguous stretch of positions.

use std::ops::Range;

use super::{scan_segment, LinePath, ScanContext, Segment, TileRuns};
use crate::storage::SubMatrix;
use crate::types::Axis;

/// Scan every column touching the tile core.
pub fn scan(sub: &SubMatrix, ctx: &ScanContext<'_, '_>) -> TileRuns {
    let n = ctx.evaluator.n();
    let symmetric = ctx.evaluator.is_symmetric();
    let tile = &sub.descriptor;
    let (x0, x1) = (tile.start_x, tile.end_x());
    let (y0, y1) = (tile.start_y, tile.end_y());

    let mut out = TileRuns::new(Axis::Vertical);
    let keys = if symmetric { x0.min(y0)..x1.max(y1) } else { x0..x1 };

    for k in keys {
        let range = if symmetric {
            match mirrored_range(k, x0..x1, y0..y1) {
                Some(range) => range,
                None => continue,
            }
        } else {
            y0..y1
        };
        let seg = Segment {
            key: k as i64,
            start: range.start,
            end: range.end,
            path_start: 0,
            path_end: n,
        };
        let points = if symmetric {
            let line = LinePath {
                cell: |t: usize| (t.min(k), t.max(k)),
                weight: 1,
                track_gaps: true,
            };
            scan_segment(sub, seg, &line, ctx, &mut out)
        } else {
            let line = LinePath {
                cell: |t: usize| (t, k),
                weight: 1,
                track_gaps: true,
            };
            scan_segment(sub, seg, &line, ctx, &mut out)
        };
        if points > 0 {
            out.recurrence_points.push((k, points));
        }
    }
    out
}

/// Positions of column `k`'s mirrored path that fall inside the tile core.
///
/// Positions `t <= k` read column `k`; positions `t > k` read row `k`.
fn mirrored_range(k: usize, cols: Range<usize>, rows: Range<usize>) -> Option<Range<usize>> {
    let down = cols
        .contains(&k)
        .then(|| rows.start..rows.end.min(k + 1))
        .filter(|r| !r.is_empty());
    let across = rows
        .contains(&k)
        .then(|| cols.start.max(k + 1)..cols.end)
        .filter(|r| !r.is_empty());
    match (down, across) {
        (Some(down), Some(across)) => {
            debug_assert_eq!(down.end, across.start, "mirrored path split in column {k}");
            Some(down.start..across.end)
        }
        (down, across) => down.or(across),
    }
}
