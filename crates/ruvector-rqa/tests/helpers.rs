//! Shared test helpers for the ruvector-rqa integration test suite.
//!
//! Provides deterministic series generators and a full-matrix reference that
//! evaluates every cell of the recurrence matrix and scans each line once.
//! The reference embeds, measures and applies the theiler band itself, so it
//! shares no evaluation code with the library.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ruvector_rqa::{DistanceMetric, FrequencyDistribution, RqaOutput, Settings, TimeSeries};

// ---------------------------------------------------------------------------
// Series generators
// ---------------------------------------------------------------------------

/// The six-sample hand fixture.
pub fn fixture() -> TimeSeries {
    TimeSeries::new(vec![0.0, 1.0, 0.0, 1.0, 0.0, 5.0])
}

/// `sin(2 pi t / period)` at integer `t`.
pub fn sine(len: usize, period: f64) -> TimeSeries {
    TimeSeries::new(
        (0..len)
            .map(|t| (2.0 * std::f64::consts::PI * t as f64 / period).sin())
            .collect(),
    )
}

/// Uniform noise in `[-1, 1)`.
pub fn noise(len: usize, seed: u64) -> TimeSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    TimeSeries::new((0..len).map(|_| rng.gen_range(-1.0..1.0)).collect())
}

/// Random walk with uniform steps in `[-0.5, 0.5)`.
pub fn random_walk(len: usize, seed: u64) -> TimeSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut x = 0.0f64;
    TimeSeries::new(
        (0..len)
            .map(|_| {
                x += rng.gen_range(-0.5..0.5);
                x
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Full-matrix reference
// ---------------------------------------------------------------------------

/// Everything the reference computes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Baseline {
    pub diagonal: FrequencyDistribution,
    pub vertical: FrequencyDistribution,
    pub white_vertical: FrequencyDistribution,
    pub recurrence_points: Vec<u64>,
    /// Cells within `radius`, ignoring the theiler band.
    pub raw_recurrent: u64,
    /// Cells within `radius` that the theiler band removes.
    pub theiler_excluded: u64,
}

/// Delay vectors `(x[t], x[t + tau], ..., x[t + (m - 1) tau])`.
fn embed(series: &TimeSeries, m: usize, tau: usize) -> Vec<Vec<f64>> {
    let samples = series.samples();
    let span = (m - 1) * tau;
    if samples.len() <= span {
        return Vec::new();
    }
    (0..samples.len() - span)
        .map(|t| (0..m).map(|k| samples[t + k * tau]).collect())
        .collect()
}

fn distance(metric: DistanceMetric, a: &[f64], b: &[f64]) -> f64 {
    let diffs = a.iter().zip(b).map(|(x, y)| x - y);
    match metric {
        DistanceMetric::Euclidean => diffs.map(|d| d * d).sum::<f64>().sqrt(),
        DistanceMetric::Maximum => diffs.map(f64::abs).fold(0.0, f64::max),
        DistanceMetric::Taxicab => diffs.map(f64::abs).sum(),
    }
}

/// Evaluate the whole `N x N` matrix and scan every line.
pub fn baseline(series: &TimeSeries, settings: &Settings) -> Baseline {
    let vectors = embed(series, settings.embedding_dimension, settings.time_delay);
    let n = vectors.len();
    let w = settings.theiler_corrector;
    let within = |i: usize, j: usize| {
        distance(settings.distance_metric, &vectors[i], &vectors[j]) <= settings.radius
    };
    let recurrent = |i: usize, j: usize| i.abs_diff(j) > w && within(i, j);

    let mut out = Baseline {
        diagonal: FrequencyDistribution::new(),
        vertical: FrequencyDistribution::new(),
        white_vertical: FrequencyDistribution::new(),
        recurrence_points: vec![0; n],
        raw_recurrent: 0,
        theiler_excluded: 0,
    };

    for i in 0..n {
        for j in 0..n {
            if within(i, j) {
                out.raw_recurrent += 1;
                if i.abs_diff(j) <= w {
                    out.theiler_excluded += 1;
                }
            }
        }
    }

    let mut ignored = FrequencyDistribution::new();
    for d in -(n as i64 - 1)..(n as i64) {
        let first = (-d).max(0) as usize;
        let last = (n as i64 - d).min(n as i64) as usize;
        let cells = (first..last).map(|i| recurrent(i, (i as i64 + d) as usize));
        runs(cells, &mut out.diagonal, &mut ignored);
    }
    for j in 0..n {
        out.recurrence_points[j] = (0..n).filter(|&i| recurrent(i, j)).count() as u64;
        let cells = (0..n).map(|i| recurrent(i, j));
        runs(cells, &mut out.vertical, &mut out.white_vertical);
    }
    out
}

fn runs(
    cells: impl Iterator<Item = bool>,
    lines: &mut FrequencyDistribution,
    gaps: &mut FrequencyDistribution,
) {
    let (mut run, mut gap) = (0u64, 0u64);
    for recurrent in cells {
        if recurrent {
            gaps.record(gap);
            gap = 0;
            run += 1;
        } else {
            lines.record(run);
            run = 0;
            gap += 1;
        }
    }
    lines.record(run);
    gaps.record(gap);
}

// ---------------------------------------------------------------------------
// Assertions
// ---------------------------------------------------------------------------

/// Assert that an engine output reproduces the reference histograms.
pub fn assert_matches_baseline(output: &RqaOutput, expected: &Baseline, context: &str) {
    assert_eq!(output.diagonal, expected.diagonal, "{context}: diagonal");
    assert_eq!(output.vertical, expected.vertical, "{context}: vertical");
    assert_eq!(
        output.white_vertical, expected.white_vertical,
        "{context}: white vertical"
    );
    assert_eq!(
        output.recurrence_points, expected.recurrence_points,
        "{context}: recurrence points"
    );
}
