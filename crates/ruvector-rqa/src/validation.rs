//! Eager input validation.
//!
//! Every check here runs before the first tile is partitioned, so a bad
//! configuration never produces a partial run. Failures convert into
//! [`RqaError::InvalidConfiguration`](crate::error::RqaError) via `From`.
//!
//! # Limits
//!
//! | Resource          | Limit       | Constant               |
//! |-------------------|-------------|------------------------|
//! | Embedded vectors  | 16,777,216  | [`MAX_VECTORS`]        |
//! | Embedding dim     | 4,096       | [`MAX_EMBEDDING_DIM`]  |

use crate::error::ValidationError;
use crate::series::TimeSeries;
use crate::settings::Settings;
use crate::types::TileSize;

/// Maximum number of embedded vectors (matrix edge length).
pub const MAX_VECTORS: usize = 1 << 24;

/// Maximum embedding dimension.
pub const MAX_EMBEDDING_DIM: usize = 4_096;

/// Validate series-independent settings.
///
/// Checks, in order:
///
/// 1. `radius` is finite and strictly positive.
/// 2. `embedding_dimension` is in `1..=MAX_EMBEDDING_DIM`.
/// 3. `time_delay` is at least 1.
/// 4. A fixed tile size is at least 1.
///
/// # Errors
///
/// Returns [`ValidationError`] describing the first violation.
pub fn validate_settings(settings: &Settings) -> Result<(), ValidationError> {
    if !settings.radius.is_finite() {
        return Err(ValidationError::NonFiniteValue(format!(
            "radius = {}",
            settings.radius
        )));
    }
    if settings.radius <= 0.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "radius".into(),
            value: settings.radius.to_string(),
            expected: "> 0".into(),
        });
    }

    if settings.embedding_dimension == 0 || settings.embedding_dimension > MAX_EMBEDDING_DIM {
        return Err(ValidationError::ParameterOutOfRange {
            name: "embedding_dimension".into(),
            value: settings.embedding_dimension.to_string(),
            expected: format!("1..={MAX_EMBEDDING_DIM}"),
        });
    }

    if settings.time_delay == 0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "time_delay".into(),
            value: "0".into(),
            expected: ">= 1".into(),
        });
    }

    if let TileSize::Fixed(extent) = settings.tile_size {
        validate_extent(extent)?;
    }

    Ok(())
}

/// Validate the series against the embedding and return `N`.
///
/// # Errors
///
/// - [`ValidationError::NonFiniteValue`] for NaN or infinite samples.
/// - [`ValidationError::InsufficientVectors`] when fewer than two vectors
///   remain after embedding.
/// - [`ValidationError::SeriesTooLong`] above [`MAX_VECTORS`].
pub fn validate_series(series: &TimeSeries, settings: &Settings) -> Result<usize, ValidationError> {
    if let Some(pos) = series.samples().iter().position(|v| !v.is_finite()) {
        return Err(ValidationError::NonFiniteValue(format!(
            "sample[{pos}] = {}",
            series.samples()[pos]
        )));
    }

    let vectors = series.number_of_vectors(settings.embedding_dimension, settings.time_delay);
    if vectors < 2 {
        return Err(ValidationError::InsufficientVectors {
            samples: series.len(),
            vectors,
        });
    }
    if vectors > MAX_VECTORS {
        return Err(ValidationError::SeriesTooLong {
            vectors,
            max: MAX_VECTORS,
        });
    }
    Ok(vectors)
}

/// Reject tile extents below 1.
pub fn validate_extent(extent: usize) -> Result<(), ValidationError> {
    if extent < 1 {
        return Err(ValidationError::TileExtentTooSmall { extent });
    }
    Ok(())
}
