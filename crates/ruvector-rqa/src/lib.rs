//! Tiled recurrence quantification analysis for the ruvector ecosystem.
//!
//! This crate computes the line-length histograms of a recurrence matrix
//! without ever materialising the full `N x N` matrix. The matrix is split
//! into square tiles; each tile is evaluated by a [`Backend`], scanned for
//! diagonal and vertical lines, and dropped. Lines crossing tile borders are
//! stitched together either through a carryover store or through one-cell
//! overlaps.
//!
//! # Outputs
//!
//! | Field | Content |
//! |-------|---------|
//! | `diagonal` | diagonal line lengths |
//! | `vertical` | vertical line lengths |
//! | `white_vertical` | lengths of non-recurrent vertical runs |
//! | `recurrence_points` | recurrent cells per column |
//!
//! All histograms follow the full-matrix convention, whether or not only the
//! upper triangle is evaluated.
//!
//! # Example
//!
//! ```rust
//! use ruvector_rqa::{Partitioning, RqaEngine, Settings, TileSize, TimeSeries};
//!
//! let series = TimeSeries::new((0..200).map(|t| (t as f64 * 0.3).sin()).collect());
//! let settings = Settings {
//!     radius: 0.2,
//!     embedding_dimension: 2,
//!     time_delay: 3,
//!     tile_size: TileSize::Fixed(32),
//!     partitioning: Partitioning::Overlap,
//!     ..Default::default()
//! };
//!
//! let output = RqaEngine::new(&settings, &series)?.run()?;
//! let recurrent: u64 = output.recurrence_points.iter().sum();
//! assert!(recurrent > 0);
//! assert_eq!(output.number_of_vectors, 197);
//! # Ok::<(), ruvector_rqa::RqaError>(())
//! ```

pub mod backend;
pub mod carryover;
pub mod detect;
pub mod engine;
pub mod error;
pub mod events;
pub mod frequency;
pub mod metric;
pub mod partition;
pub mod series;
pub mod settings;
pub mod similarity;
pub mod storage;
pub mod types;
pub mod validation;

#[cfg(feature = "parallel")]
pub use backend::ParallelBackend;
pub use backend::{Backend, SequentialBackend, TileRequest};
pub use engine::{RqaEngine, RqaOutput};
pub use error::{RqaError, ValidationError};
pub use events::RqaEvent;
pub use frequency::FrequencyDistribution;
pub use series::TimeSeries;
pub use settings::Settings;
pub use types::{Axis, BackendKind, DistanceMetric, Encoding, Partitioning, TileSize};
