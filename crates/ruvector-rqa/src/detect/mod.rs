//! Line detection over materialised tiles.
//!
//! Both detectors reduce a tile to a set of segments: for one line key
//! (diagonal offset or column), the contiguous stretch of path positions `t`
//! whose cells fall inside the tile core. A path maps `t` to a matrix cell:
//!
//! | Line                 | Cell of position `t`        |
//! |----------------------|-----------------------------|
//! | diagonal `d`         | `(t, t + d)`                |
//! | column `k`           | `(t, k)`                    |
//! | column `k`, mirrored | `(min(t, k), max(t, k))`    |
//!
//! The mirrored column path lets symmetric runs scan full columns while
//! reading only upper-triangle cells.
//!
//! A shared run-length state machine then walks each segment. In carryover
//! mode it starts from the key's stored open run and hands the open run at
//! the trailing edge back as a [`CarryUpdate`]. In overlap mode it ignores
//! runs that started before the tile (their predecessor cell, buffered in the
//! overlap row/column, is set) and extends runs that leave the tile by
//! evaluating cells directly.

pub mod diagonal;
pub mod vertical;

use serde::Serialize;

use crate::carryover::CarryoverStore;
use crate::frequency::FrequencyDistribution;
use crate::similarity::SimilarityEvaluator;
use crate::storage::SubMatrix;
use crate::types::Axis;

/// Open-run stores for all line kinds, shared across carryover-mode tiles.
#[derive(Debug, Clone)]
pub struct LineCarryover {
    /// Open diagonal runs keyed by offset.
    pub diagonal: CarryoverStore,
    /// Open vertical runs keyed by column.
    pub vertical: CarryoverStore,
    /// Open white vertical runs keyed by column.
    pub white_vertical: CarryoverStore,
}

impl LineCarryover {
    /// Empty stores for an `n x n` matrix.
    pub fn new(n: usize) -> Self {
        Self {
            diagonal: CarryoverStore::diagonals(n),
            vertical: CarryoverStore::columns(n),
            white_vertical: CarryoverStore::columns(n),
        }
    }

    /// Write a tile's trailing-edge state back into the stores.
    pub fn apply(&mut self, runs: &TileRuns) {
        match runs.axis {
            Axis::Diagonal => {
                for update in &runs.carry_out {
                    self.diagonal.set(update.key, update.run);
                }
            }
            Axis::Vertical => {
                for update in &runs.carry_out {
                    self.vertical.set(update.key, update.run);
                    self.white_vertical.set(update.key, update.gap);
                }
            }
        }
    }

    /// Total number of open entries across all stores.
    pub fn open_count(&self) -> usize {
        self.diagonal.open_count() + self.vertical.open_count() + self.white_vertical.open_count()
    }
}

/// How runs crossing the tile boundary are resolved.
#[derive(Debug, Clone, Copy)]
pub enum ScanMode<'s> {
    /// Continue from, and hand back to, the carryover stores.
    Carryover(&'s LineCarryover),
    /// Attribute runs to the tile they start in and extend them by direct
    /// evaluation.
    Overlap,
}

/// Everything a detector needs besides the tile itself.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'s, 'a> {
    /// Cell predicate, also used to extend runs in overlap mode.
    pub evaluator: &'s SimilarityEvaluator<'a>,
    /// Boundary resolution.
    pub mode: ScanMode<'s>,
}

/// Open state of one line at a tile's trailing edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CarryUpdate {
    /// Line key.
    pub key: i64,
    /// Open recurrent run (0 if none).
    pub run: u64,
    /// Open non-recurrent run (0 if none or not tracked).
    pub gap: u64,
}

/// Result of scanning one tile along one axis.
#[derive(Debug, Clone)]
pub struct TileRuns {
    /// Scanned axis.
    pub axis: Axis,
    /// Closed recurrent runs.
    pub lines: FrequencyDistribution,
    /// Closed non-recurrent runs (vertical axis only).
    pub gaps: FrequencyDistribution,
    /// Trailing-edge state per key (carryover mode only).
    pub carry_out: Vec<CarryUpdate>,
    /// `(column, recurrent cells)` found in the tile core (vertical axis only).
    pub recurrence_points: Vec<(usize, u64)>,
}

impl TileRuns {
    pub(crate) fn new(axis: Axis) -> Self {
        Self {
            axis,
            lines: FrequencyDistribution::new(),
            gaps: FrequencyDistribution::new(),
            carry_out: Vec::new(),
            recurrence_points: Vec::new(),
        }
    }
}

/// Stretch of one line's path inside a tile core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Segment {
    pub key: i64,
    /// First path position inside the tile.
    pub start: usize,
    /// One past the last path position inside the tile.
    pub end: usize,
    /// First path position of the whole line.
    pub path_start: usize,
    /// One past the last path position of the whole line.
    pub path_end: usize,
}

/// Per-line scanning parameters.
pub(crate) struct LinePath<F> {
    /// Maps a path position to its matrix cell.
    pub cell: F,
    /// Each closed recurrent run counts this many times.
    pub weight: u64,
    /// Also track non-recurrent runs.
    pub track_gaps: bool,
}

/// Walk one segment and fold its runs into `out`. Returns the number of
/// recurrent cells inside the segment.
pub(crate) fn scan_segment<F>(
    sub: &SubMatrix,
    seg: Segment,
    line: &LinePath<F>,
    ctx: &ScanContext<'_, '_>,
    out: &mut TileRuns,
) -> u64
where
    F: Fn(usize) -> (usize, usize),
{
    let value = |t: usize| {
        let (i, j) = (line.cell)(t);
        sub.get(i, j)
    };

    let mut tracker = match ctx.mode {
        ScanMode::Carryover(carry) => {
            let (run_store, gap_store) = match out.axis {
                Axis::Diagonal => (&carry.diagonal, None),
                Axis::Vertical => (&carry.vertical, Some(&carry.white_vertical)),
            };
            RunTracker {
                run: run_store.get(seg.key).unwrap_or(0),
                gap: gap_store.and_then(|s| s.get(seg.key)).unwrap_or(0),
                foreign_run: false,
                foreign_gap: false,
            }
        }
        ScanMode::Overlap => {
            // The predecessor is buffered in the overlap row/column.
            let before = (seg.start > seg.path_start).then(|| value(seg.start - 1));
            RunTracker {
                run: 0,
                gap: 0,
                foreign_run: before == Some(true),
                foreign_gap: before == Some(false),
            }
        }
    };

    let mut points = 0u64;
    for t in seg.start..seg.end {
        let recurrent = value(t);
        points += u64::from(recurrent);
        tracker.push(recurrent, line, out);
    }

    let continues = seg.end < seg.path_end;
    match ctx.mode {
        ScanMode::Carryover(_) => {
            if !continues {
                tracker.close_run(line, out);
                tracker.close_gap(line, out);
            }
            out.carry_out.push(CarryUpdate {
                key: seg.key,
                run: tracker.run,
                gap: if line.track_gaps { tracker.gap } else { 0 },
            });
        }
        ScanMode::Overlap => {
            let recurs_at = |t: usize| {
                let (i, j) = (line.cell)(t);
                ctx.evaluator.cell(i, j)
            };
            if continues && tracker.run > 0 && !tracker.foreign_run {
                let mut t = seg.end;
                while t < seg.path_end && recurs_at(t) {
                    tracker.run += 1;
                    t += 1;
                }
            }
            if continues && line.track_gaps && tracker.gap > 0 && !tracker.foreign_gap {
                let mut t = seg.end;
                while t < seg.path_end && !recurs_at(t) {
                    tracker.gap += 1;
                    t += 1;
                }
            }
            tracker.close_run(line, out);
            tracker.close_gap(line, out);
        }
    }
    points
}

/// Run-length state of one line.
struct RunTracker {
    run: u64,
    gap: u64,
    /// The current recurrent run started before this tile (overlap mode).
    foreign_run: bool,
    /// The current non-recurrent run started before this tile (overlap mode).
    foreign_gap: bool,
}

impl RunTracker {
    #[inline]
    fn push<F>(&mut self, recurrent: bool, line: &LinePath<F>, out: &mut TileRuns) {
        if recurrent {
            self.close_gap(line, out);
            self.run += 1;
        } else {
            self.close_run(line, out);
            self.gap += 1;
        }
    }

    #[inline]
    fn close_run<F>(&mut self, line: &LinePath<F>, out: &mut TileRuns) {
        if self.run > 0 && !self.foreign_run {
            out.lines.record_many(self.run, line.weight);
        }
        self.run = 0;
        self.foreign_run = false;
    }

    #[inline]
    fn close_gap<F>(&mut self, line: &LinePath<F>, out: &mut TileRuns) {
        if line.track_gaps && self.gap > 0 && !self.foreign_gap {
            out.gaps.record(self.gap);
        }
        self.gap = 0;
        self.foreign_gap = false;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Tile-by-tile driver used by the detector unit tests.

    use super::*;
    use crate::partition::TilePartitioner;
    use crate::series::{EmbeddedSeries, TimeSeries};
    use crate::settings::Settings;
    use crate::storage::RecurrenceBuffer;
    use crate::types::{Encoding, Partitioning};

    /// Histograms produced by [`drive`].
    #[derive(Debug, PartialEq, Eq)]
    pub struct Driven {
        pub diagonal: FrequencyDistribution,
        pub vertical: FrequencyDistribution,
        pub white: FrequencyDistribution,
        pub points: Vec<u64>,
    }

    /// Partition, fill and scan every tile sequentially.
    pub fn drive(samples: &[f64], settings: &Settings, extent: usize) -> Driven {
        let series = TimeSeries::from_slice(samples);
        let embedded =
            EmbeddedSeries::new(&series, settings.embedding_dimension, settings.time_delay);
        let n = embedded.len();
        let eval = SimilarityEvaluator::new(embedded, settings);
        let overlap = settings.partitioning == Partitioning::Overlap;
        let tiles = TilePartitioner::new(n, extent, settings.is_symmetric, overlap)
            .unwrap()
            .partition();

        let mut carry = LineCarryover::new(n);
        let mut out = Driven {
            diagonal: FrequencyDistribution::new(),
            vertical: FrequencyDistribution::new(),
            white: FrequencyDistribution::new(),
            points: vec![0; n],
        };
        for tile in &tiles {
            let mut bytes = vec![0u8; Encoding::Byte.bytes_for(tile.buffer_cells())];
            eval.fill(tile, Encoding::Byte, &mut bytes, None);
            let sub = SubMatrix::new(
                *tile,
                RecurrenceBuffer::from_bytes(Encoding::Byte, tile.buffer_cells(), bytes),
            );
            for axis in [Axis::Diagonal, Axis::Vertical] {
                let mode = if overlap {
                    ScanMode::Overlap
                } else {
                    ScanMode::Carryover(&carry)
                };
                let ctx = ScanContext {
                    evaluator: &eval,
                    mode,
                };
                let runs = match axis {
                    Axis::Diagonal => diagonal::scan(&sub, &ctx),
                    Axis::Vertical => vertical::scan(&sub, &ctx),
                };
                match axis {
                    Axis::Diagonal => out.diagonal.merge(&runs.lines),
                    Axis::Vertical => {
                        out.vertical.merge(&runs.lines);
                        out.white.merge(&runs.gaps);
                        for &(col, count) in &runs.recurrence_points {
                            out.points[col] += count;
                        }
                    }
                }
                carry.apply(&runs);
            }
        }
        assert_eq!(carry.open_count(), 0, "runs left open after the last tile");
        out
    }

    /// Full-matrix reference: every cell evaluated, every line scanned once.
    pub fn brute(samples: &[f64], settings: &Settings) -> Driven {
        let series = TimeSeries::from_slice(samples);
        let embedded =
            EmbeddedSeries::new(&series, settings.embedding_dimension, settings.time_delay);
        let n = embedded.len();
        let eval = SimilarityEvaluator::new(embedded, settings);

        let mut out = Driven {
            diagonal: FrequencyDistribution::new(),
            vertical: FrequencyDistribution::new(),
            white: FrequencyDistribution::new(),
            points: vec![0; n],
        };
        let mut unused = FrequencyDistribution::new();
        for d in -(n as i64 - 1)..(n as i64) {
            let first = (-d).max(0) as usize;
            let last = (n as i64).min(n as i64 - d) as usize;
            let cells = (first..last).map(|i| eval.is_recurrent(i, (i as i64 + d) as usize));
            scan_line(cells, &mut out.diagonal, &mut unused);
        }
        for j in 0..n {
            out.points[j] = (0..n).filter(|&i| eval.is_recurrent(i, j)).count() as u64;
            let cells = (0..n).map(|i| eval.is_recurrent(i, j));
            scan_line(cells, &mut out.vertical, &mut out.white);
        }
        out
    }

    fn scan_line(
        cells: impl Iterator<Item = bool>,
        lines: &mut FrequencyDistribution,
        gaps: &mut FrequencyDistribution,
    ) {
        let (mut run, mut gap) = (0u64, 0u64);
        for recurrent in cells {
            if recurrent {
                gaps.record(gap);
                gap = 0;
                run += 1;
            } else {
                lines.record(run);
                run = 0;
                gap += 1;
            }
        }
        lines.record(run);
        gaps.record(gap);
    }
}
