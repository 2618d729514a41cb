//! Multi-threaded backend built on rayon.

use std::sync::OnceLock;

use rayon::prelude::*;
use tracing::{debug, trace};

use super::{allocate_tile, Backend, TileRequest, DEFAULT_CAPACITY_BYTES};
use crate::error::RqaError;
use crate::similarity::SimilarityEvaluator;
use crate::storage::{RecurrenceBuffer, SubMatrix};
use crate::types::Encoding;

/// Bytes handed to one worker at a time.
const CHUNK_BYTES: usize = 256;

/// Fills tile buffers in parallel on a private thread pool.
///
/// The pool is built on first use and reused for every later tile and run
/// of this instance.
#[derive(Debug)]
pub struct ParallelBackend {
    capacity_bytes: usize,
    threads: Option<usize>,
    pool: OnceLock<rayon::ThreadPool>,
}

impl ParallelBackend {
    /// Backend with the default capacity and one worker per core.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend accepting tile buffers of at most `capacity_bytes`.
    pub fn with_capacity(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            threads: None,
            pool: OnceLock::new(),
        }
    }

    /// Fix the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    fn pool(&self) -> Result<&rayon::ThreadPool, RqaError> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("rqa-worker-{i}"));
        if let Some(threads) = self.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build().map_err(|e| RqaError::Backend {
            tile: None,
            detail: format!("building thread pool: {e}"),
        })?;
        debug!(threads = pool.current_num_threads(), "built rqa thread pool");
        // Another thread may have initialised the pool first; keep theirs.
        Ok(self.pool.get_or_init(|| pool))
    }
}

impl Default for ParallelBackend {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY_BYTES)
    }
}

impl Backend for ParallelBackend {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn supports(&self, _encoding: Encoding) -> bool {
        true
    }

    fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    fn parallel_tiles(&self) -> bool {
        true
    }

    fn evaluate_tile(
        &self,
        evaluator: &SimilarityEvaluator<'_>,
        request: &TileRequest<'_>,
        encoding: Encoding,
    ) -> Result<SubMatrix, RqaError> {
        let tile = request.descriptor;
        let mut bytes = allocate_tile(&tile, encoding, self.capacity_bytes)?;
        let recycled = request.recycled;
        self.pool()?.install(|| {
            bytes
                .par_chunks_mut(CHUNK_BYTES)
                .enumerate()
                .for_each(|(chunk, out)| {
                    let first = chunk * CHUNK_BYTES;
                    for (offset, byte) in out.iter_mut().enumerate() {
                        *byte = evaluator.tile_byte(&tile, encoding, first + offset, recycled);
                    }
                });
        });
        trace!(tile = tile.index, bytes = bytes.len(), "filled tile in parallel");
        Ok(SubMatrix::new(
            tile,
            RecurrenceBuffer::from_bytes(encoding, tile.buffer_cells(), bytes),
        ))
    }
}
