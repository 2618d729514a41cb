//! Distance metrics over embedded vectors.

use crate::series::EmbeddedSeries;
use crate::types::DistanceMetric;

impl DistanceMetric {
    /// Distance between embedded vectors `a` and `b`.
    ///
    /// Every metric is exactly symmetric in its arguments, which the
    /// symmetric (upper-triangle) optimisation relies on.
    #[inline]
    pub fn distance(self, series: &EmbeddedSeries<'_>, a: usize, b: usize) -> f64 {
        let pairs = series.pairs(a, b);
        match self {
            Self::Euclidean => pairs
                .map(|(x, y)| {
                    let diff = x - y;
                    diff * diff
                })
                .sum::<f64>()
                .sqrt(),
            Self::Maximum => pairs.map(|(x, y)| (x - y).abs()).fold(0.0, f64::max),
            Self::Taxicab => pairs.map(|(x, y)| (x - y).abs()).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::TimeSeries;
    use approx::assert_relative_eq;

    fn planar() -> TimeSeries {
        // m = 2, tau = 1: v0 = (0, 3), v1 = (3, 4), v2 = (4, 0)
        TimeSeries::new(vec![0.0, 3.0, 4.0, 0.0])
    }

    #[test]
    fn euclidean() {
        let series = planar();
        let e = EmbeddedSeries::new(&series, 2, 1);
        assert_relative_eq!(DistanceMetric::Euclidean.distance(&e, 0, 2), 5.0);
        assert_relative_eq!(DistanceMetric::Euclidean.distance(&e, 1, 1), 0.0);
    }

    #[test]
    fn maximum() {
        let series = planar();
        let e = EmbeddedSeries::new(&series, 2, 1);
        assert_relative_eq!(DistanceMetric::Maximum.distance(&e, 0, 2), 4.0);
        assert_relative_eq!(DistanceMetric::Maximum.distance(&e, 0, 1), 3.0);
    }

    #[test]
    fn taxicab() {
        let series = planar();
        let e = EmbeddedSeries::new(&series, 2, 1);
        assert_relative_eq!(DistanceMetric::Taxicab.distance(&e, 0, 2), 7.0);
        assert_relative_eq!(DistanceMetric::Taxicab.distance(&e, 1, 2), 5.0);
    }

    #[test]
    fn distances_are_bitwise_symmetric() {
        let series = TimeSeries::new(vec![0.1, -2.7, 3.3, 1e-9, 7.25, -0.5]);
        let e = EmbeddedSeries::new(&series, 3, 1);
        for metric in [
            DistanceMetric::Euclidean,
            DistanceMetric::Maximum,
            DistanceMetric::Taxicab,
        ] {
            for a in 0..e.len() {
                for b in 0..e.len() {
                    assert_eq!(
                        metric.distance(&e, a, b).to_bits(),
                        metric.distance(&e, b, a).to_bits(),
                        "{metric} not symmetric for ({a}, {b})"
                    );
                }
            }
        }
    }
}
