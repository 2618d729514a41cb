//! Core enums and value types shared across the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DistanceMetric
// ---------------------------------------------------------------------------

/// Norm used to measure the distance between two embedded vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// L2 norm.
    #[default]
    Euclidean,
    /// L-infinity norm (Chebyshev).
    Maximum,
    /// L1 norm (Manhattan).
    Taxicab,
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Euclidean => write!(f, "euclidean"),
            Self::Maximum => write!(f, "maximum"),
            Self::Taxicab => write!(f, "taxicab"),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Storage width of one recurrence cell inside a tile buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// One bit per cell, eight cells per byte (LSB first).
    #[default]
    Bit,
    /// One byte per cell.
    Byte,
}

impl Encoding {
    /// Number of cells packed into one byte.
    #[inline]
    pub fn cells_per_byte(self) -> usize {
        match self {
            Self::Bit => 8,
            Self::Byte => 1,
        }
    }

    /// Bytes needed to hold `cells` cells.
    #[inline]
    pub fn bytes_for(self, cells: usize) -> usize {
        cells.div_ceil(self.cells_per_byte())
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bit => write!(f, "bit"),
            Self::Byte => write!(f, "byte"),
        }
    }
}

// ---------------------------------------------------------------------------
// TileSize / BackendKind / Partitioning
// ---------------------------------------------------------------------------

/// Tile sizing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileSize {
    /// Derive the extent from the backend's buffer capacity.
    #[default]
    Auto,
    /// Use square tiles with the given edge length.
    Fixed(usize),
}

/// Built-in compute backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Single-threaded reference loop.
    #[default]
    Sequential,
    /// Rayon data-parallel evaluation (feature `parallel`).
    Parallel,
}

/// How lines crossing tile boundaries are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partitioning {
    /// Tiles are disjoint; open runs are handed to the next tile through the
    /// carryover store, so tiles run in dependency order.
    #[default]
    Carryover,
    /// Tiles buffer one leading row and column from their neighbours and
    /// extend trailing runs by direct evaluation, so tiles are independent.
    Overlap,
}

/// Line orientation scanned by a detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Lines parallel to the main diagonal, keyed by `d = j - i`.
    Diagonal,
    /// Lines along a column, keyed by the column index.
    Vertical,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diagonal => write!(f, "diagonal"),
            Self::Vertical => write!(f, "vertical"),
        }
    }
}
