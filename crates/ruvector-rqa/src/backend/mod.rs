//! Compute backends.
//!
//! A [`Backend`] turns a tile descriptor into a filled [`SubMatrix`] and scans
//! it for lines. The engine talks to backends only through this trait, so
//! custom implementations can be injected with
//! [`RqaEngine::with_backend`](crate::engine::RqaEngine::with_backend).
//!
//! | Backend               | Feature    | Tile fill                       |
//! |-----------------------|------------|---------------------------------|
//! | [`SequentialBackend`] | always     | plain loop                      |
//! | [`ParallelBackend`]   | `parallel` | rayon chunks on an owned pool   |

mod sequential;
pub use sequential::SequentialBackend;

#[cfg(feature = "parallel")]
mod parallel;
#[cfg(feature = "parallel")]
pub use parallel::ParallelBackend;

use crate::detect::{diagonal, vertical, ScanContext, TileRuns};
use crate::error::RqaError;
use crate::partition::TileDescriptor;
use crate::similarity::SimilarityEvaluator;
use crate::storage::SubMatrix;
use crate::types::{Axis, Encoding};

/// Default buffer capacity of the built-in backends: 64 MiB.
pub const DEFAULT_CAPACITY_BYTES: usize = 64 << 20;

/// One tile to materialise.
#[derive(Debug, Clone, Copy)]
pub struct TileRequest<'r> {
    /// Tile geometry.
    pub descriptor: TileDescriptor,
    /// Leading overlap row copied from the previous tile of the strip.
    pub recycled: Option<&'r [bool]>,
}

impl<'r> TileRequest<'r> {
    /// Request a tile with every cell evaluated.
    pub fn new(descriptor: TileDescriptor) -> Self {
        Self {
            descriptor,
            recycled: None,
        }
    }
}

/// Tile evaluation and scanning for one device or execution strategy.
pub trait Backend: Send + Sync {
    /// Short identifier used in errors and logs.
    fn name(&self) -> &'static str;

    /// Whether tiles can be stored in `encoding`.
    fn supports(&self, encoding: Encoding) -> bool;

    /// Largest tile buffer, in bytes, the backend accepts. Drives
    /// [`TileSize::Auto`](crate::types::TileSize::Auto).
    fn capacity_bytes(&self) -> usize;

    /// Whether independent tiles may be processed concurrently.
    fn parallel_tiles(&self) -> bool {
        false
    }

    /// Allocate and fill the buffer for one tile.
    ///
    /// # Errors
    ///
    /// [`RqaError::Backend`] if the buffer cannot be allocated or exceeds
    /// [`capacity_bytes`](Self::capacity_bytes).
    fn evaluate_tile(
        &self,
        evaluator: &SimilarityEvaluator<'_>,
        request: &TileRequest<'_>,
        encoding: Encoding,
    ) -> Result<SubMatrix, RqaError>;

    /// Scan a filled tile along one axis.
    ///
    /// # Errors
    ///
    /// Implementations that dispatch scanning elsewhere report failures as
    /// [`RqaError::Backend`]. The default never fails.
    fn scan_tile(
        &self,
        sub: &SubMatrix,
        axis: Axis,
        ctx: &ScanContext<'_, '_>,
    ) -> Result<TileRuns, RqaError> {
        Ok(match axis {
            Axis::Diagonal => diagonal::scan(sub, ctx),
            Axis::Vertical => vertical::scan(sub, ctx),
        })
    }
}

/// Zeroed byte buffer for `tile`, bounded by `capacity` bytes.
///
/// # Errors
///
/// [`RqaError::Backend`] if the buffer is larger than `capacity` or the
/// allocation fails.
pub fn allocate_tile(
    tile: &TileDescriptor,
    encoding: Encoding,
    capacity: usize,
) -> Result<Vec<u8>, RqaError> {
    let len = encoding.bytes_for(tile.buffer_cells());
    if len > capacity {
        return Err(RqaError::backend(
            tile.index,
            format!("tile buffer of {len} bytes exceeds capacity of {capacity} bytes"),
        ));
    }
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|e| RqaError::backend(tile.index, format!("allocating {len} bytes: {e}")))?;
    bytes.resize(len, 0);
    Ok(bytes)
}
