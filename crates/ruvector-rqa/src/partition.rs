//! Tile partitioning of the logical `N x N` recurrence matrix.
//!
//! Tiles are square-aligned: every tile starts at a multiple of the extent
//! and the last row/column of tiles is clipped to `N`. Their cores partition
//! the matrix (or its upper triangle in symmetric mode) exactly once.
//!
//! # Traversal order
//!
//! | Mode       | Tiles emitted            | Order                                  |
//! |------------|--------------------------|----------------------------------------|
//! | asymmetric | all `(row, col)`         | by `start_x`, then `start_y`           |
//! | symmetric  | `col >= row` only        | by `start_y`, then `start_x`           |
//!
//! Both orders visit, for every diagonal and every column, the tiles touching
//! it in increasing offset order. The symmetric order additionally keeps the
//! mirrored column path (down column `k`, then right along row `k`) ordered.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;
use crate::types::{Encoding, Partitioning};
use crate::validation::validate_extent;

/// Geometry of one tile.
///
/// The core covers rows `start_y..start_y + dim_y` and columns
/// `start_x..start_x + dim_x`. With overlap enabled the buffered region also
/// includes `overlap_y` leading rows and `overlap_x` leading columns owned by
/// neighbouring tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDescriptor {
    /// Position in traversal order.
    pub index: usize,
    /// Tile-column index (`start_x / extent`); tiles of one strip share it.
    pub strip: usize,
    /// First core column.
    pub start_x: usize,
    /// First core row.
    pub start_y: usize,
    /// Core width.
    pub dim_x: usize,
    /// Core height.
    pub dim_y: usize,
    /// Leading columns buffered from the left neighbour (0 or 1).
    pub overlap_x: usize,
    /// Leading rows buffered from the upper neighbour (0 or 1).
    pub overlap_y: usize,
}

impl TileDescriptor {
    /// One past the last core column.
    #[inline]
    pub fn end_x(&self) -> usize {
        self.start_x + self.dim_x
    }

    /// One past the last core row.
    #[inline]
    pub fn end_y(&self) -> usize {
        self.start_y + self.dim_y
    }

    /// First buffered column.
    #[inline]
    pub fn buffer_x(&self) -> usize {
        self.start_x - self.overlap_x
    }

    /// First buffered row.
    #[inline]
    pub fn buffer_y(&self) -> usize {
        self.start_y - self.overlap_y
    }

    /// Buffered width.
    #[inline]
    pub fn buffer_cols(&self) -> usize {
        self.dim_x + self.overlap_x
    }

    /// Buffered height.
    #[inline]
    pub fn buffer_rows(&self) -> usize {
        self.dim_y + self.overlap_y
    }

    /// Number of buffered cells.
    #[inline]
    pub fn buffer_cells(&self) -> usize {
        self.buffer_rows() * self.buffer_cols()
    }

    /// Whether global cell `(i, j)` lies in the core.
    #[inline]
    pub fn core_contains(&self, i: usize, j: usize) -> bool {
        (self.start_y..self.end_y()).contains(&i) && (self.start_x..self.end_x()).contains(&j)
    }

    /// Whether global cell `(i, j)` lies in the buffered region.
    #[inline]
    pub fn buffer_contains(&self, i: usize, j: usize) -> bool {
        (self.buffer_y()..self.end_y()).contains(&i) && (self.buffer_x()..self.end_x()).contains(&j)
    }

    /// Row-major index of global cell `(i, j)` inside the buffer.
    #[inline]
    pub fn buffer_index(&self, i: usize, j: usize) -> usize {
        debug_assert!(self.buffer_contains(i, j), "({i}, {j}) outside tile {}", self.index);
        (i - self.buffer_y()) * self.buffer_cols() + (j - self.buffer_x())
    }

    /// Global cell of buffer index `flat`.
    #[inline]
    pub fn cell_at(&self, flat: usize) -> (usize, usize) {
        let cols = self.buffer_cols();
        (self.buffer_y() + flat / cols, self.buffer_x() + flat % cols)
    }
}

/// Splits an `N x N` matrix into an ordered list of tiles.
#[derive(Debug, Clone)]
pub struct TilePartitioner {
    n: usize,
    extent: usize,
    symmetric: bool,
    overlap: bool,
}

impl TilePartitioner {
    /// Create a partitioner. Extents larger than `n` are clipped to `n`.
    ///
    /// # Errors
    ///
    /// [`ValidationError::TileExtentTooSmall`] if `extent < 1`.
    pub fn new(
        n: usize,
        extent: usize,
        symmetric: bool,
        overlap: bool,
    ) -> Result<Self, ValidationError> {
        validate_extent(extent)?;
        Ok(Self {
            n,
            extent: extent.min(n.max(1)),
            symmetric,
            overlap,
        })
    }

    /// Effective (clipped) tile extent.
    #[inline]
    pub fn extent(&self) -> usize {
        self.extent
    }

    /// Number of tile rows (equal to tile columns).
    #[inline]
    pub fn tiles_per_side(&self) -> usize {
        self.n.div_ceil(self.extent)
    }

    /// Emit tile descriptors in dependency order.
    pub fn partition(&self) -> Vec<TileDescriptor> {
        let side = self.tiles_per_side();
        let mut tiles = Vec::with_capacity(if self.symmetric {
            side * (side + 1) / 2
        } else {
            side * side
        });

        if self.symmetric {
            for row in 0..side {
                for col in row..side {
                    tiles.push(self.descriptor(tiles.len(), row, col));
                }
            }
        } else {
            for col in 0..side {
                for row in 0..side {
                    tiles.push(self.descriptor(tiles.len(), row, col));
                }
            }
        }

        debug!(
            n = self.n,
            extent = self.extent,
            symmetric = self.symmetric,
            overlap = self.overlap,
            tiles = tiles.len(),
            "partitioned recurrence matrix"
        );
        tiles
    }

    fn descriptor(&self, index: usize, row: usize, col: usize) -> TileDescriptor {
        let start_y = row * self.extent;
        let start_x = col * self.extent;
        TileDescriptor {
            index,
            strip: col,
            start_x,
            start_y,
            dim_x: self.extent.min(self.n - start_x),
            dim_y: self.extent.min(self.n - start_y),
            overlap_x: usize::from(self.overlap && start_x > 0),
            overlap_y: usize::from(self.overlap && start_y > 0),
        }
    }
}

/// Largest square tile extent whose buffer fits in `capacity_bytes`.
///
/// Overlap tiles buffer one extra leading row and column, so their extent
/// satisfies `(extent + 1)^2 <= cells` instead of `extent^2 <= cells`.
/// Returns 0 when not even one core cell fits.
pub fn extent_for_capacity(
    capacity_bytes: usize,
    encoding: Encoding,
    partitioning: Partitioning,
) -> usize {
    let cells = capacity_bytes.saturating_mul(encoding.cells_per_byte());
    let mut side = (cells as f64).sqrt() as usize;
    while side > 0 && side.saturating_mul(side) > cells {
        side -= 1;
    }
    while (side + 1).saturating_mul(side + 1) <= cells {
        side += 1;
    }
    let halo = match partitioning {
        Partitioning::Carryover => 0,
        Partitioning::Overlap => 1,
    };
    side.saturating_sub(halo)
}
