//! Run events.
//!
//! [`RqaEngine::run`](crate::engine::RqaEngine::run) records [`RqaEvent`]s
//! alongside the histograms: which attempt ran with which tile extent, what
//! each tile contributed, and whether the run had to be retried.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Partitioning;

/// Events emitted during an RQA run.
///
/// Tagged with `#[serde(tag = "type")]` so they serialise as
/// `{ "type": "RunStarted", ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RqaEvent {
    /// An attempt is about to process its first tile.
    RunStarted {
        /// Attempt number (1-indexed).
        attempt: usize,
        /// Matrix edge length `N`.
        number_of_vectors: usize,
        /// Tile extent used by this attempt.
        tile_extent: usize,
        /// Number of tiles in the partition.
        tiles: usize,
        /// Boundary handling.
        partitioning: Partitioning,
    },

    /// Both detectors finished one tile.
    TileCompleted {
        /// Tile index in traversal order.
        tile: usize,
        /// Diagonal lines closed in this tile.
        diagonal_lines: u64,
        /// Vertical lines closed in this tile.
        vertical_lines: u64,
        /// Time spent evaluating and scanning the tile.
        elapsed: Duration,
    },

    /// The backend failed and the run restarts with smaller tiles.
    RetryWithSmallerTiles {
        /// Extent of the failed attempt.
        from_extent: usize,
        /// Extent of the next attempt.
        to_extent: usize,
        /// Error reported by the failed attempt.
        reason: String,
    },

    /// Runs still open after the last tile were closed at the matrix edge.
    CarryoverFlushed {
        /// Open diagonal runs.
        diagonal: usize,
        /// Open vertical runs.
        vertical: usize,
        /// Open white vertical runs.
        white_vertical: usize,
    },

    /// The run finished successfully.
    RunCompleted {
        /// Attempts used, including the successful one.
        attempts: usize,
        /// Tiles processed by the successful attempt.
        tiles_processed: usize,
        /// Wall time across all attempts.
        wall_time: Duration,
    },
}
