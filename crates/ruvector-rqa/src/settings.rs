//! Run configuration.
//!
//! [`Settings`] is plain data: construct it with struct-update syntax over
//! [`Settings::default`], and the engine validates it once before any tile
//! work starts.
//!
//! ```rust
//! use ruvector_rqa::settings::Settings;
//! use ruvector_rqa::types::{Encoding, TileSize};
//!
//! let settings = Settings {
//!     radius: 0.25,
//!     embedding_dimension: 3,
//!     encoding: Encoding::Byte,
//!     tile_size: TileSize::Fixed(512),
//!     ..Default::default()
//! };
//! assert!(settings.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{BackendKind, DistanceMetric, Encoding, Partitioning, TileSize};
use crate::validation;

/// Immutable parameters of one RQA run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Neighbourhood radius; cells with `distance <= radius` are recurrent.
    ///
    /// Default: `1.0`.
    pub radius: f64,

    /// Number of delayed samples per phase-space vector (`m`).
    ///
    /// Default: `1`.
    pub embedding_dimension: usize,

    /// Stride between the samples of one vector (`tau`).
    ///
    /// Default: `1`.
    pub time_delay: usize,

    /// Cells with `|i - j| <= theiler_corrector` are never recurrent.
    ///
    /// Default: `1`.
    pub theiler_corrector: usize,

    /// Norm used by the similarity evaluator.
    pub distance_metric: DistanceMetric,

    /// Evaluate only the upper triangle and mirror the results.
    ///
    /// Default: `true`.
    pub is_symmetric: bool,

    /// Cell width inside tile buffers.
    pub encoding: Encoding,

    /// Tile edge length policy.
    pub tile_size: TileSize,

    /// Built-in backend used when none is injected.
    pub backend: BackendKind,

    /// Cross-tile line reconciliation strategy.
    pub partitioning: Partitioning,

    /// Reuse the overlap row from the previous tile of a strip instead of
    /// re-evaluating it. Only meaningful with [`Partitioning::Overlap`].
    ///
    /// Default: `false`.
    pub recycling: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            radius: 1.0,
            embedding_dimension: 1,
            time_delay: 1,
            theiler_corrector: 1,
            distance_metric: DistanceMetric::Euclidean,
            is_symmetric: true,
            encoding: Encoding::Bit,
            tile_size: TileSize::Auto,
            backend: BackendKind::Sequential,
            partitioning: Partitioning::Carryover,
            recycling: false,
        }
    }
}

impl Settings {
    /// Check every parameter that does not depend on the input series.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_settings(self)
    }
}
