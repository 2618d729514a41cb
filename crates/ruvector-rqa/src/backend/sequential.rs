//! Single-threaded reference backend.

use tracing::trace;

use super::{allocate_tile, Backend, TileRequest, DEFAULT_CAPACITY_BYTES};
use crate::error::RqaError;
use crate::similarity::SimilarityEvaluator;
use crate::storage::{RecurrenceBuffer, SubMatrix};
use crate::types::Encoding;

/// Evaluates every cell on the calling thread.
#[derive(Debug, Clone)]
pub struct SequentialBackend {
    capacity_bytes: usize,
}

impl SequentialBackend {
    /// Backend with the default capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend accepting tile buffers of at most `capacity_bytes`.
    pub fn with_capacity(capacity_bytes: usize) -> Self {
        Self { capacity_bytes }
    }
}

impl Default for SequentialBackend {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY_BYTES)
    }
}

impl Backend for SequentialBackend {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn supports(&self, _encoding: Encoding) -> bool {
        true
    }

    fn capacity_bytes(&self) -> usize {
        self.capacity_bytes
    }

    fn evaluate_tile(
        &self,
        evaluator: &SimilarityEvaluator<'_>,
        request: &TileRequest<'_>,
        encoding: Encoding,
    ) -> Result<SubMatrix, RqaError> {
        let tile = request.descriptor;
        let mut bytes = allocate_tile(&tile, encoding, self.capacity_bytes)?;
        evaluator.fill(&tile, encoding, &mut bytes, request.recycled);
        trace!(tile = tile.index, bytes = bytes.len(), "filled tile");
        Ok(SubMatrix::new(
            tile,
            RecurrenceBuffer::from_bytes(encoding, tile.buffer_cells(), bytes),
        ))
    }
}
