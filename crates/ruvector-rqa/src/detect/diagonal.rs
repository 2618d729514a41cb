//! Diagonal line detection.
//!
//! Diagonal `d` holds the cells `(t, t + d)`. Diagonals inside the theiler
//! band are never scanned. In symmetric mode only `d > w` is scanned and
//! every run counts twice, once for its mirror below the main diagonal.

use super::{scan_segment, LinePath, ScanContext, Segment, TileRuns};
use crate::storage::SubMatrix;
use crate::types::Axis;

/// Scan every diagonal crossing the tile core.
pub fn scan(sub: &SubMatrix, ctx: &ScanContext<'_, '_>) -> TileRuns {
    let eval = ctx.evaluator;
    let n = eval.n() as i64;
    let w = eval.theiler_corrector() as i64;
    let symmetric = eval.is_symmetric();
    let tile = &sub.descriptor;
    let (x0, x1) = (tile.start_x as i64, tile.end_x() as i64);
    let (y0, y1) = (tile.start_y as i64, tile.end_y() as i64);

    let mut out = TileRuns::new(Axis::Diagonal);
    let weight = if symmetric { 2 } else { 1 };

    for d in (x0 - (y1 - 1))..=(x1 - 1 - y0) {
        if d.abs() <= w || (symmetric && d < 0) {
            continue;
        }
        let start = y0.max(x0 - d);
        let end = y1.min(x1 - d);
        if start >= end {
            continue;
        }
        let seg = Segment {
            key: d,
            start: start as usize,
            end: end as usize,
            path_start: (-d).max(0) as usize,
            path_end: n.min(n - d) as usize,
        };
        let line = LinePath {
            cell: |t: usize| (t, (t as i64 + d) as usize),
            weight,
            track_gaps: false,
        };
        scan_segment(sub, seg, &line, ctx, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{brute, drive};
    use crate::frequency::FrequencyDistribution;
    use crate::settings::Settings;
    use crate::types::Partitioning;

    const FIXTURE: [f64; 6] = [0.0, 1.0, 0.0, 1.0, 0.0, 5.0];

    fn fixture_settings(symmetric: bool, partitioning: Partitioning) -> Settings {
        Settings {
            radius: 0.5,
            theiler_corrector: 1,
            is_symmetric: symmetric,
            partitioning,
            ..Default::default()
        }
    }

    #[test]
    fn fixture_diagonals() {
        let expected = FrequencyDistribution::from_pairs([(1, 2), (3, 2)]);
        for symmetric in [false, true] {
            for partitioning in [Partitioning::Carryover, Partitioning::Overlap] {
                for extent in 1..=6 {
                    let got = drive(&FIXTURE, &fixture_settings(symmetric, partitioning), extent);
                    assert_eq!(
                        got.diagonal, expected,
                        "symmetric={symmetric} {partitioning:?} extent={extent}"
                    );
                }
            }
        }
    }

    #[test]
    fn constant_series_has_one_line_per_diagonal() {
        let samples = vec![1.5; 50];
        let settings = Settings {
            theiler_corrector: 0,
            ..Default::default()
        };
        let got = drive(&samples, &settings, 7);
        for len in 1..=49 {
            assert_eq!(got.diagonal.get(len), 2, "length {len}");
        }
        assert_eq!(got.diagonal.get(50), 0);
    }

    #[test]
    fn long_runs_cross_many_tiles() {
        let samples: Vec<f64> = (0..40).map(|t| ((t % 5) as f64) * 0.3).collect();
        for symmetric in [false, true] {
            let settings = Settings {
                radius: 0.1,
                theiler_corrector: 2,
                is_symmetric: symmetric,
                ..Default::default()
            };
            let reference = brute(&samples, &settings).diagonal;
            for extent in [1, 2, 3, 9, 40] {
                assert_eq!(drive(&samples, &settings, extent).diagonal, reference);
            }
        }
    }
}
