//! Time series and lazy phase-space embedding.
//!
//! An [`EmbeddedSeries`] never stores its vectors: component `k` of vector
//! `i` is read straight from the underlying samples at `i + k * tau`.

use serde::{Deserialize, Serialize};

/// Ordered sequence of real-valued samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    samples: Vec<f64>,
}

impl TimeSeries {
    /// Wrap an owned sample vector.
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    /// Copy samples from a slice.
    pub fn from_slice(samples: &[f64]) -> Self {
        Self {
            samples: samples.to_vec(),
        }
    }

    /// Raw samples.
    #[inline]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the series has no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of vectors produced by embedding with dimension `m` and delay
    /// `tau`. Zero when the series is too short.
    pub fn number_of_vectors(&self, embedding_dimension: usize, time_delay: usize) -> usize {
        let span = embedding_dimension
            .saturating_sub(1)
            .saturating_mul(time_delay);
        self.samples.len().saturating_sub(span)
    }
}

impl From<Vec<f64>> for TimeSeries {
    fn from(samples: Vec<f64>) -> Self {
        Self::new(samples)
    }
}

/// Time-delay embedding view over a borrowed [`TimeSeries`].
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedSeries<'a> {
    samples: &'a [f64],
    dimension: usize,
    delay: usize,
    vectors: usize,
}

impl<'a> EmbeddedSeries<'a> {
    /// Create the embedding. Callers validate the parameters beforehand.
    pub fn new(series: &'a TimeSeries, embedding_dimension: usize, time_delay: usize) -> Self {
        Self {
            samples: series.samples(),
            dimension: embedding_dimension,
            delay: time_delay,
            vectors: series.number_of_vectors(embedding_dimension, time_delay),
        }
    }

    /// Number of embedded vectors `N`.
    #[inline]
    pub fn len(&self) -> usize {
        self.vectors
    }

    /// Whether the embedding is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors == 0
    }

    /// Iterate the components of vector `index`.
    #[inline]
    pub fn vector(&self, index: usize) -> impl Iterator<Item = f64> + 'a {
        debug_assert!(index < self.vectors, "vector {index} out of range {}", self.vectors);
        let samples = self.samples;
        let delay = self.delay;
        (0..self.dimension).map(move |k| samples[index + k * delay])
    }

    /// Iterate `(a_k, b_k)` component pairs of vectors `a` and `b`.
    #[inline]
    pub fn pairs(&self, a: usize, b: usize) -> impl Iterator<Item = (f64, f64)> + 'a {
        self.vector(a).zip(self.vector(b))
    }
}
