//! Line-length frequency distributions.

use serde::{Deserialize, Serialize};

/// Histogram from line length (`>= 1`) to number of occurrences.
///
/// Stored densely: `counts[len - 1]` is the count for `len`. The vector grows
/// on demand, so two distributions with equal non-zero entries compare equal
/// regardless of spare capacity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrequencyDistribution {
    counts: Vec<u64>,
}

impl FrequencyDistribution {
    /// Empty distribution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty distribution pre-sized for lengths up to `max_length`.
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            counts: vec![0; max_length],
        }
    }

    /// Build from `(length, count)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u64, u64)>) -> Self {
        let mut dist = Self::new();
        for (len, count) in pairs {
            dist.record_many(len, count);
        }
        dist
    }

    /// Count one line of `length`. Zero-length lines are ignored.
    #[inline]
    pub fn record(&mut self, length: u64) {
        self.record_many(length, 1);
    }

    /// Count `count` lines of `length`.
    #[inline]
    pub fn record_many(&mut self, length: u64, count: u64) {
        if length == 0 || count == 0 {
            return;
        }
        let idx = (length - 1) as usize;
        if idx >= self.counts.len() {
            self.counts.resize(idx + 1, 0);
        }
        self.counts[idx] += count;
    }

    /// Add every count of `other` into `self`.
    pub fn merge(&mut self, other: &FrequencyDistribution) {
        if other.counts.len() > self.counts.len() {
            self.counts.resize(other.counts.len(), 0);
        }
        for (dst, src) in self.counts.iter_mut().zip(&other.counts) {
            *dst += src;
        }
    }

    /// Count for `length`.
    #[inline]
    pub fn get(&self, length: u64) -> u64 {
        if length == 0 {
            return 0;
        }
        self.counts.get((length - 1) as usize).copied().unwrap_or(0)
    }

    /// Non-zero `(length, count)` entries in increasing length order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(i, &c)| (i as u64 + 1, c))
    }

    /// Dense counts, index `length - 1`.
    #[inline]
    pub fn as_slice(&self) -> &[u64] {
        &self.counts
    }

    /// Total number of lines.
    pub fn total_lines(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Total number of cells covered by lines (`sum(length * count)`).
    pub fn total_points(&self) -> u64 {
        self.iter().map(|(len, count)| len * count).sum()
    }

    /// Whether no line has been recorded.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }
}

impl PartialEq for FrequencyDistribution {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for FrequencyDistribution {}
