//! Error types for the RQA crate.
//!
//! Configuration problems are reported as [`ValidationError`] and surface
//! through [`RqaError::InvalidConfiguration`]; they are raised eagerly before
//! any tile is evaluated. Encoding/backend incompatibilities and backend
//! allocation or dispatch failures have their own variants. All errors
//! implement `std::error::Error` via `thiserror`.

use crate::types::Encoding;

/// Primary error type for RQA runs.
#[derive(Debug, thiserror::Error)]
pub enum RqaError {
    /// The settings or the input series are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ValidationError),

    /// The selected backend cannot store recurrence values in the requested
    /// encoding.
    #[error("encoding {encoding} is not supported by the {backend} backend")]
    DataTypeMismatch {
        /// Requested cell encoding.
        encoding: Encoding,
        /// Name of the backend that rejected it.
        backend: &'static str,
    },

    /// Allocation or dispatch failure on the active backend.
    #[error("backend error (tile {tile:?}): {detail}")]
    Backend {
        /// Index of the tile being processed, if any.
        tile: Option<usize>,
        /// Human-readable explanation.
        detail: String,
    },
}

impl RqaError {
    /// Shorthand for a [`RqaError::Backend`] tied to a tile.
    pub fn backend(tile: usize, detail: impl Into<String>) -> Self {
        Self::Backend {
            tile: Some(tile),
            detail: detail.into(),
        }
    }

    /// Whether the engine may retry the run with a smaller tile extent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}

/// Validation errors for settings and input series.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// A parameter is outside its valid range.
    #[error("parameter out of range: {name} = {value} (expected {expected})")]
    ParameterOutOfRange {
        /// Name of the parameter.
        name: String,
        /// The invalid value (as a string for flexibility).
        value: String,
        /// Human-readable description of the valid range.
        expected: String,
    },

    /// A value is NaN or infinite where a finite number is required.
    #[error("non-finite value detected: {0}")]
    NonFiniteValue(String),

    /// The embedding leaves fewer than two phase-space vectors.
    #[error("series of {samples} samples embeds into {vectors} vectors (need at least 2)")]
    InsufficientVectors {
        /// Number of samples in the series.
        samples: usize,
        /// Number of embedded vectors it yields.
        vectors: usize,
    },

    /// The tile extent, fixed or derived from backend capacity, is below 1.
    #[error("tile extent {extent} is smaller than 1")]
    TileExtentTooSmall {
        /// The offending extent.
        extent: usize,
    },

    /// The embedded series exceeds the implementation limit.
    #[error("series embeds into {vectors} vectors, exceeding the maximum of {max}")]
    SeriesTooLong {
        /// Number of embedded vectors.
        vectors: usize,
        /// Maximum supported number of vectors.
        max: usize,
    },

    /// The requested backend was not compiled into this build.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
}
