//! Run orchestration: partition, evaluate, scan, accumulate.
//!
//! [`RqaEngine::new`] validates everything up front. [`RqaEngine::run`] then
//! walks the tiles and returns either a complete [`RqaOutput`] or an error,
//! never partial histograms.
//!
//! # Retry
//!
//! The first [`RqaError::Backend`] of a run discards all partial results and
//! restarts with half the tile extent. A second failure is returned as is.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::backend::{Backend, SequentialBackend, TileRequest};
use crate::detect::{LineCarryover, ScanContext, ScanMode, TileRuns};
use crate::error::RqaError;
use crate::events::RqaEvent;
use crate::frequency::FrequencyDistribution;
use crate::partition::{extent_for_capacity, TileDescriptor, TilePartitioner};
use crate::series::{EmbeddedSeries, TimeSeries};
use crate::settings::Settings;
use crate::similarity::{recycled_row, SimilarityEvaluator};
use crate::storage::SubMatrix;
use crate::types::{Axis, BackendKind, Partitioning, TileSize};
use crate::validation::{validate_extent, validate_series};

/// Histograms and run metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RqaOutput {
    /// Diagonal line lengths over the full matrix.
    pub diagonal: FrequencyDistribution,
    /// Vertical line lengths over the full matrix.
    pub vertical: FrequencyDistribution,
    /// White vertical line lengths over the full matrix.
    pub white_vertical: FrequencyDistribution,
    /// Recurrent cells per column.
    pub recurrence_points: Vec<u64>,
    /// Matrix edge length `N`.
    pub number_of_vectors: usize,
    /// Theiler window the histograms were computed with.
    pub theiler_corrector: usize,
    /// Tile extent of the successful attempt.
    pub tile_extent: usize,
    /// Tiles processed by the successful attempt.
    pub tiles_processed: usize,
    /// Attempts used, including the successful one.
    pub attempts: usize,
    /// Everything that happened, across all attempts.
    pub events: Vec<RqaEvent>,
}

/// Configured RQA computation over one series.
///
/// ```rust
/// use ruvector_rqa::engine::RqaEngine;
/// use ruvector_rqa::series::TimeSeries;
/// use ruvector_rqa::settings::Settings;
///
/// let series = TimeSeries::new(vec![0.0, 1.0, 0.0, 1.0, 0.0, 5.0]);
/// let settings = Settings { radius: 0.5, ..Default::default() };
/// let output = RqaEngine::new(&settings, &series)?.run()?;
/// assert_eq!(output.recurrence_points, vec![2, 1, 2, 1, 2, 0]);
/// # Ok::<(), ruvector_rqa::error::RqaError>(())
/// ```
pub struct RqaEngine<'a> {
    settings: Settings,
    series: &'a TimeSeries,
    number_of_vectors: usize,
    tile_extent: usize,
    backend: Box<dyn Backend>,
}

impl<'a> RqaEngine<'a> {
    /// Engine on the built-in backend named by `settings.backend`.
    ///
    /// # Errors
    ///
    /// [`RqaError::InvalidConfiguration`] for bad settings or series, or when
    /// the parallel backend is requested but not compiled in.
    pub fn new(settings: &Settings, series: &'a TimeSeries) -> Result<Self, RqaError> {
        let backend = builtin_backend(settings.backend)?;
        Self::with_backend(settings, series, backend)
    }

    /// Engine on a caller-provided backend.
    ///
    /// # Errors
    ///
    /// - [`RqaError::InvalidConfiguration`] for bad settings or series, or
    ///   when the backend's capacity cannot hold a single cell.
    /// - [`RqaError::DataTypeMismatch`] if the backend cannot store
    ///   `settings.encoding`.
    pub fn with_backend(
        settings: &Settings,
        series: &'a TimeSeries,
        backend: Box<dyn Backend>,
    ) -> Result<Self, RqaError> {
        settings.validate()?;
        let number_of_vectors = validate_series(series, settings)?;

        if !backend.supports(settings.encoding) {
            return Err(RqaError::DataTypeMismatch {
                encoding: settings.encoding,
                backend: backend.name(),
            });
        }

        let tile_extent = match settings.tile_size {
            TileSize::Fixed(extent) => extent,
            TileSize::Auto => extent_for_capacity(
                backend.capacity_bytes(),
                settings.encoding,
                settings.partitioning,
            ),
        };
        validate_extent(tile_extent)?;

        Ok(Self {
            settings: settings.clone(),
            series,
            number_of_vectors,
            tile_extent: tile_extent.min(number_of_vectors),
            backend,
        })
    }

    /// Matrix edge length `N`.
    pub fn number_of_vectors(&self) -> usize {
        self.number_of_vectors
    }

    /// Tile extent of the first attempt.
    pub fn tile_extent(&self) -> usize {
        self.tile_extent
    }

    /// Name of the active backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Compute all histograms.
    ///
    /// # Errors
    ///
    /// [`RqaError::Backend`] if the retry with smaller tiles fails as well,
    /// or if the first attempt already ran with single-cell tiles.
    #[instrument(
        skip(self),
        fields(n = self.number_of_vectors, backend = self.backend.name())
    )]
    pub fn run(&self) -> Result<RqaOutput, RqaError> {
        let started = Instant::now();
        let embedded = EmbeddedSeries::new(
            self.series,
            self.settings.embedding_dimension,
            self.settings.time_delay,
        );
        let evaluator = SimilarityEvaluator::new(embedded, &self.settings);

        let mut events = Vec::new();
        let mut extent = self.tile_extent;
        let mut attempt = 1;
        loop {
            match self.attempt(&evaluator, extent, attempt, &mut events) {
                Ok((acc, tiles_processed)) => {
                    let wall_time = started.elapsed();
                    events.push(RqaEvent::RunCompleted {
                        attempts: attempt,
                        tiles_processed,
                        wall_time,
                    });
                    info!(
                        attempts = attempt,
                        tile_extent = extent,
                        tiles = tiles_processed,
                        diagonal_lines = acc.diagonal.total_lines(),
                        vertical_lines = acc.vertical.total_lines(),
                        ?wall_time,
                        "rqa run completed"
                    );
                    return Ok(RqaOutput {
                        diagonal: acc.diagonal,
                        vertical: acc.vertical,
                        white_vertical: acc.white_vertical,
                        recurrence_points: acc.recurrence_points,
                        number_of_vectors: self.number_of_vectors,
                        theiler_corrector: self.settings.theiler_corrector,
                        tile_extent: extent,
                        tiles_processed,
                        attempts: attempt,
                        events,
                    });
                }
                Err(err) if attempt == 1 && err.is_retryable() && extent > 1 => {
                    let next = extent / 2;
                    warn!(
                        error = %err,
                        from_extent = extent,
                        to_extent = next,
                        "backend failed, retrying with smaller tiles"
                    );
                    events.push(RqaEvent::RetryWithSmallerTiles {
                        from_extent: extent,
                        to_extent: next,
                        reason: err.to_string(),
                    });
                    extent = next;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(error = %err, attempt, "rqa run aborted");
                    return Err(err);
                }
            }
        }
    }

    fn attempt(
        &self,
        evaluator: &SimilarityEvaluator<'_>,
        extent: usize,
        attempt: usize,
        events: &mut Vec<RqaEvent>,
    ) -> Result<(Accumulator, usize), RqaError> {
        let overlap = self.settings.partitioning == Partitioning::Overlap;
        let tiles = TilePartitioner::new(
            self.number_of_vectors,
            extent,
            self.settings.is_symmetric,
            overlap,
        )?
        .partition();

        info!(
            attempt,
            n = self.number_of_vectors,
            tile_extent = extent,
            tiles = tiles.len(),
            partitioning = ?self.settings.partitioning,
            "rqa run started"
        );
        events.push(RqaEvent::RunStarted {
            attempt,
            number_of_vectors: self.number_of_vectors,
            tile_extent: extent,
            tiles: tiles.len(),
            partitioning: self.settings.partitioning,
        });

        let acc = if overlap {
            self.run_overlap(evaluator, &tiles, events)?
        } else {
            self.run_carryover(evaluator, &tiles, events)?
        };
        Ok((acc, tiles.len()))
    }

    /// Tiles one at a time in dependency order, open runs handed over through
    /// the carryover stores.
    fn run_carryover(
        &self,
        evaluator: &SimilarityEvaluator<'_>,
        tiles: &[TileDescriptor],
        events: &mut Vec<RqaEvent>,
    ) -> Result<Accumulator, RqaError> {
        let mut carry = LineCarryover::new(self.number_of_vectors);
        let mut acc = Accumulator::new(self.number_of_vectors);

        for tile in tiles {
            let tile_started = Instant::now();
            let sub = self.backend.evaluate_tile(
                evaluator,
                &TileRequest::new(*tile),
                self.settings.encoding,
            )?;
            let mut lines = [0u64; 2];
            for (slot, axis) in [Axis::Diagonal, Axis::Vertical].into_iter().enumerate() {
                let ctx = ScanContext {
                    evaluator,
                    mode: ScanMode::Carryover(&carry),
                };
                let runs = self.backend.scan_tile(&sub, axis, &ctx)?;
                lines[slot] = runs.lines.total_lines();
                acc.absorb(&runs);
                carry.apply(&runs);
            }
            events.push(tile_completed(tile, lines, tile_started));
        }

        self.flush(&mut carry, &mut acc, events);
        Ok(acc)
    }

    /// Close runs still open after the last tile at the matrix edge.
    fn flush(&self, carry: &mut LineCarryover, acc: &mut Accumulator, events: &mut Vec<RqaEvent>) {
        if carry.open_count() == 0 {
            return;
        }
        let weight = if self.settings.is_symmetric { 2 } else { 1 };
        let diagonal = carry.diagonal.open_count();
        let vertical = carry.vertical.open_count();
        let white_vertical = carry.white_vertical.open_count();
        warn!(
            diagonal,
            vertical, white_vertical, "flushing runs left open after the last tile"
        );
        for (_, len) in carry.diagonal.drain() {
            acc.diagonal.record_many(len, weight);
        }
        for (_, len) in carry.vertical.drain() {
            acc.vertical.record(len);
        }
        for (_, len) in carry.white_vertical.drain() {
            acc.white_vertical.record(len);
        }
        events.push(RqaEvent::CarryoverFlushed {
            diagonal,
            vertical,
            white_vertical,
        });
    }

    /// Independent column strips, merged at the end.
    fn run_overlap(
        &self,
        evaluator: &SimilarityEvaluator<'_>,
        tiles: &[TileDescriptor],
        events: &mut Vec<RqaEvent>,
    ) -> Result<Accumulator, RqaError> {
        let mut strips: Vec<Vec<TileDescriptor>> = Vec::new();
        for tile in tiles {
            if strips.len() <= tile.strip {
                strips.resize_with(tile.strip + 1, Vec::new);
            }
            strips[tile.strip].push(*tile);
        }
        for strip in &mut strips {
            strip.sort_by_key(|t| t.start_y);
        }

        let outcomes = self.map_strips(&strips, |strip| self.run_strip(evaluator, strip))?;

        let mut acc = Accumulator::new(self.number_of_vectors);
        let mut tile_events = Vec::with_capacity(tiles.len());
        for (strip_acc, strip_events) in outcomes {
            acc.merge(&strip_acc);
            tile_events.extend(strip_events);
        }
        tile_events.sort_by_key(|event| match event {
            RqaEvent::TileCompleted { tile, .. } => *tile,
            _ => usize::MAX,
        });
        events.extend(tile_events);
        Ok(acc)
    }

    fn map_strips<F>(
        &self,
        strips: &[Vec<TileDescriptor>],
        run: F,
    ) -> Result<Vec<(Accumulator, Vec<RqaEvent>)>, RqaError>
    where
        F: Fn(&[TileDescriptor]) -> Result<(Accumulator, Vec<RqaEvent>), RqaError> + Send + Sync,
    {
        #[cfg(feature = "parallel")]
        if self.backend.parallel_tiles() {
            use rayon::prelude::*;
            debug!(strips = strips.len(), "processing strips in parallel");
            return strips.par_iter().map(|strip| run(strip)).collect();
        }
        strips.iter().map(|strip| run(strip)).collect()
    }

    fn run_strip(
        &self,
        evaluator: &SimilarityEvaluator<'_>,
        strip: &[TileDescriptor],
    ) -> Result<(Accumulator, Vec<RqaEvent>), RqaError> {
        let mut acc = Accumulator::new(self.number_of_vectors);
        let mut events = Vec::with_capacity(strip.len());
        let mut previous: Option<SubMatrix> = None;

        for tile in strip {
            let tile_started = Instant::now();
            let recycled = previous
                .as_ref()
                .and_then(|prev| recycled_row(&prev.descriptor, &prev.data, tile));
            let request = TileRequest {
                descriptor: *tile,
                recycled: recycled.as_deref(),
            };
            let sub = self
                .backend
                .evaluate_tile(evaluator, &request, self.settings.encoding)?;

            let ctx = ScanContext {
                evaluator,
                mode: ScanMode::Overlap,
            };
            let mut lines = [0u64; 2];
            for (slot, axis) in [Axis::Diagonal, Axis::Vertical].into_iter().enumerate() {
                let runs = self.backend.scan_tile(&sub, axis, &ctx)?;
                lines[slot] = runs.lines.total_lines();
                acc.absorb(&runs);
            }
            events.push(tile_completed(tile, lines, tile_started));
            previous = self.settings.recycling.then_some(sub);
        }
        Ok((acc, events))
    }
}

impl std::fmt::Debug for RqaEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RqaEngine")
            .field("settings", &self.settings)
            .field("number_of_vectors", &self.number_of_vectors)
            .field("tile_extent", &self.tile_extent)
            .field("backend", &self.backend.name())
            .finish()
    }
}

fn builtin_backend(kind: BackendKind) -> Result<Box<dyn Backend>, RqaError> {
    match kind {
        BackendKind::Sequential => Ok(Box::new(SequentialBackend::new())),
        #[cfg(feature = "parallel")]
        BackendKind::Parallel => Ok(Box::new(crate::backend::ParallelBackend::new())),
        #[cfg(not(feature = "parallel"))]
        BackendKind::Parallel => Err(crate::error::ValidationError::BackendUnavailable(
            "parallel backend requires the `parallel` feature".into(),
        )
        .into()),
    }
}

fn tile_completed(tile: &TileDescriptor, lines: [u64; 2], started: Instant) -> RqaEvent {
    let elapsed = started.elapsed();
    debug!(
        tile = tile.index,
        start_x = tile.start_x,
        start_y = tile.start_y,
        diagonal_lines = lines[0],
        vertical_lines = lines[1],
        ?elapsed,
        "tile completed"
    );
    RqaEvent::TileCompleted {
        tile: tile.index,
        diagonal_lines: lines[0],
        vertical_lines: lines[1],
        elapsed,
    }
}

/// Running totals of one attempt or one strip.
#[derive(Debug, Clone)]
struct Accumulator {
    diagonal: FrequencyDistribution,
    vertical: FrequencyDistribution,
    white_vertical: FrequencyDistribution,
    recurrence_points: Vec<u64>,
}

impl Accumulator {
    fn new(n: usize) -> Self {
        Self {
            diagonal: FrequencyDistribution::with_max_length(n),
            vertical: FrequencyDistribution::with_max_length(n),
            white_vertical: FrequencyDistribution::with_max_length(n),
            recurrence_points: vec![0; n],
        }
    }

    fn absorb(&mut self, runs: &TileRuns) {
        match runs.axis {
            Axis::Diagonal => self.diagonal.merge(&runs.lines),
            Axis::Vertical => {
                self.vertical.merge(&runs.lines);
                self.white_vertical.merge(&runs.gaps);
                for &(column, count) in &runs.recurrence_points {
                    self.recurrence_points[column] += count;
                }
            }
        }
    }

    fn merge(&mut self, other: &Accumulator) {
        self.diagonal.merge(&other.diagonal);
        self.vertical.merge(&other.vertical);
        self.white_vertical.merge(&other.white_vertical);
        for (dst, src) in self.recurrence_points.iter_mut().zip(&other.recurrence_points) {
            *dst += src;
        }
    }
}
