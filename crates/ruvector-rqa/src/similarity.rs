//! Similarity evaluation: the recurrence predicate and tile filling.

use crate::partition::TileDescriptor;
use crate::series::EmbeddedSeries;
use crate::settings::Settings;
use crate::storage::{pack_byte, RecurrenceBuffer};
use crate::types::{DistanceMetric, Encoding};

/// Evaluates recurrence for individual cells of the logical matrix.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityEvaluator<'a> {
    series: EmbeddedSeries<'a>,
    metric: DistanceMetric,
    radius: f64,
    theiler: usize,
    symmetric: bool,
}

impl<'a> SimilarityEvaluator<'a> {
    /// Build an evaluator from validated settings.
    pub fn new(series: EmbeddedSeries<'a>, settings: &Settings) -> Self {
        Self {
            series,
            metric: settings.distance_metric,
            radius: settings.radius,
            theiler: settings.theiler_corrector,
            symmetric: settings.is_symmetric,
        }
    }

    /// Matrix edge length `N`.
    #[inline]
    pub fn n(&self) -> usize {
        self.series.len()
    }

    /// Theiler window `w`.
    #[inline]
    pub fn theiler_corrector(&self) -> usize {
        self.theiler
    }

    /// Whether only the upper triangle is evaluated.
    #[inline]
    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    /// Recurrence of `(i, j)` in the full matrix: outside the theiler band
    /// and within `radius`.
    #[inline]
    pub fn is_recurrent(&self, i: usize, j: usize) -> bool {
        i.abs_diff(j) > self.theiler && self.metric.distance(&self.series, i, j) <= self.radius
    }

    /// Whether `(i, j)` is ever evaluated. In symmetric mode this is the
    /// upper triangle beyond the theiler band.
    #[inline]
    pub fn in_region(&self, i: usize, j: usize) -> bool {
        !self.symmetric || j > i + self.theiler
    }

    /// Value stored for `(i, j)` in a tile buffer.
    #[inline]
    pub fn cell(&self, i: usize, j: usize) -> bool {
        self.in_region(i, j) && self.is_recurrent(i, j)
    }

    /// Encode byte `byte_index` of `tile`'s buffer.
    ///
    /// Cells with a buffer index below `recycled_cells` are taken from
    /// `recycled` (see [`recycled_row`]); the rest are evaluated.
    #[inline]
    pub fn tile_byte(
        &self,
        tile: &TileDescriptor,
        encoding: Encoding,
        byte_index: usize,
        recycled: Option<&[bool]>,
    ) -> u8 {
        let cells = tile.buffer_cells();
        pack_byte(encoding, byte_index, cells, |flat| match recycled {
            Some(row) if flat < row.len() => row[flat],
            _ => {
                let (i, j) = tile.cell_at(flat);
                self.cell(i, j)
            }
        })
    }

    /// Fill a whole tile buffer with the sequential reference loop.
    pub fn fill(
        &self,
        tile: &TileDescriptor,
        encoding: Encoding,
        bytes: &mut [u8],
        recycled: Option<&[bool]>,
    ) {
        for (byte_index, byte) in bytes.iter_mut().enumerate() {
            *byte = self.tile_byte(tile, encoding, byte_index, recycled);
        }
    }
}

/// Leading overlap row of `next`, copied from the last buffered row of
/// `previous` when the two tiles are consecutive in one strip.
///
/// Returns `None` when nothing can be recycled.
pub fn recycled_row(
    previous: &TileDescriptor,
    buffer: &RecurrenceBuffer,
    next: &TileDescriptor,
) -> Option<Vec<bool>> {
    let shares_row = next.overlap_y == 1
        && previous.strip == next.strip
        && previous.end_y() == next.start_y
        && previous.buffer_x() == next.buffer_x()
        && previous.buffer_cols() == next.buffer_cols();
    if !shares_row {
        return None;
    }
    let row = next.start_y - 1;
    Some(
        (next.buffer_x()..next.end_x())
            .map(|j| buffer.get(previous.buffer_index(row, j)))
            .collect(),
    )
}
