use thiserror::Error;

use super::endpoints::EndpointPair;
use super::metrics::BandMetrics;
use super::report::BandMetricsRow;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Precondition failures for a continuum-removal run. Everything else the
/// engine can encounter (empty segments, degenerate FWHM, ratios above 1)
/// is encoded in the output data instead of raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemovalError {
    #[error("no wavelength axis selected; load data and select an x-axis before running")]
    MissingAxis,
    #[error("no reflectance series selected; select at least one curve before running")]
    NoCurves,
}

// ---------------------------------------------------------------------------
// Run output
// ---------------------------------------------------------------------------

/// Output of one continuum-removal run.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuumRun {
    /// One continuum-removed curve per input curve, in input order. Each is
    /// truncated to the common length of the curve and the shared axis, all
    /// values are `<= 1.0` (NaN input aside), and samples outside every
    /// segment stay at `1.0`.
    pub removed: Vec<Vec<f64>>,
    /// Band-metrics rows, curve-major / endpoint-pair-minor, one per
    /// (curve, pair) combination whose segment is non-empty.
    pub rows: Vec<BandMetricsRow>,
}

// ---------------------------------------------------------------------------
// Segment mask and straight-line continuum
// ---------------------------------------------------------------------------

/// Indices of the samples whose x lies in `[x_low, x_high]`, both ends
/// inclusive. May be empty; never errors.
pub fn mask_indices(x_axis: &[f64], x_low: f64, x_high: f64) -> Vec<usize> {
    x_axis
        .iter()
        .enumerate()
        .filter(|(_, &x)| x >= x_low && x <= x_high)
        .map(|(i, _)| i)
        .collect()
}

/// `n` evenly spaced values from `y_low` to `y_high`, inclusive of both ends.
pub fn straight_line(y_low: f64, y_high: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![y_low],
        _ => {
            let step = (y_high - y_low) / (n - 1) as f64;
            (0..n).map(|i| y_low + step * i as f64).collect()
        }
    }
}

/// Divide the raw samples under `mask` by the straight-line continuum between
/// `y_low` and `y_high`, writing the ratio into `removed` at the same
/// positions. Ratios above 1 are clamped to exactly 1; the comparison is
/// written so NaN ratios pass through unclamped. An empty mask writes nothing.
fn normalize_segment(raw: &[f64], removed: &mut [f64], mask: &[usize], y_low: f64, y_high: f64) {
    let line = straight_line(y_low, y_high, mask.len());
    for (&i, &continuum) in mask.iter().zip(&line) {
        let ratio = raw[i] / continuum;
        removed[i] = if ratio > 1.0 { 1.0 } else { ratio };
    }
}

// ---------------------------------------------------------------------------
// Multi-curve aggregator
// ---------------------------------------------------------------------------

/// Run continuum removal for every (curve, endpoint pair) combination.
///
/// Each curve and the shared axis are truncated to their common length, and
/// the curve's removed output starts as all 1.0. Pairs are applied in the
/// order supplied; where segments overlap, the later pair's normalization
/// overwrites the earlier one's. A pair whose x-range contains no samples
/// contributes no row and leaves the removed curve untouched.
pub fn remove_continuum(
    x_axis: &[f64],
    curves: &[&[f64]],
    pairs: &[EndpointPair],
) -> Result<ContinuumRun, RemovalError> {
    if x_axis.is_empty() {
        return Err(RemovalError::MissingAxis);
    }
    if curves.is_empty() {
        return Err(RemovalError::NoCurves);
    }

    let mut removed = Vec::with_capacity(curves.len());
    let mut rows = Vec::new();

    for curve in curves {
        let length = x_axis.len().min(curve.len());
        let x = &x_axis[..length];
        let raw = &curve[..length];
        let mut continuum = vec![1.0; length];

        for pair in pairs {
            let pair = pair.ordered();
            let mask = mask_indices(x, pair.start.x, pair.end.x);
            normalize_segment(raw, &mut continuum, &mask, pair.start.y, pair.end.y);

            let seg_x: Vec<f64> = mask.iter().map(|&i| x[i]).collect();
            let seg_y: Vec<f64> = mask.iter().map(|&i| continuum[i]).collect();
            if let Some(metrics) = BandMetrics::compute(&seg_x, &seg_y) {
                rows.push(BandMetricsRow::new(metrics, &pair));
            }
        }

        removed.push(continuum);
    }

    Ok(ContinuumRun { removed, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::endpoints::ContinuumAnchor;
    use crate::analysis::metrics::FWHM_UNDEFINED;

    const EPS: f64 = 1e-12;

    fn pair(x_a: f64, y_a: f64, x_b: f64, y_b: f64) -> EndpointPair {
        EndpointPair::new(ContinuumAnchor::new(x_a, y_a), ContinuumAnchor::new(x_b, y_b))
    }

    #[test]
    fn mask_bounds_are_inclusive() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(mask_indices(&x, 1.0, 3.0), vec![1, 2, 3]);
        assert_eq!(mask_indices(&x, 0.5, 0.9), Vec::<usize>::new());
        assert_eq!(mask_indices(&x, -10.0, 10.0), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn straight_line_endpoints_inclusive() {
        assert!(straight_line(0.0, 1.0, 0).is_empty());
        assert_eq!(straight_line(0.5, 0.9, 1), vec![0.5]);

        let line = straight_line(1.0, 3.0, 5);
        assert_eq!(line.len(), 5);
        assert!((line[0] - 1.0).abs() < EPS);
        assert!((line[2] - 2.0).abs() < EPS);
        assert!((line[4] - 3.0).abs() < EPS);
    }

    #[test]
    fn flat_continuum_reproduces_raw_curve() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 0.8, 0.5, 0.8, 1.0];
        let run = remove_continuum(&x, &[&y], &[pair(0.0, 1.0, 4.0, 1.0)]).unwrap();

        for (out, raw) in run.removed[0].iter().zip(&y) {
            assert!((out - raw).abs() < EPS);
        }

        assert_eq!(run.rows.len(), 1);
        let row = &run.rows[0];
        assert!((row.band_min - 0.5).abs() < EPS);
        assert!((row.band_centre - 2.0).abs() < EPS);
        assert!((row.band_depth - 0.5).abs() < EPS);
        assert!((row.band_fwhm - 2.0).abs() < EPS);
        assert!((row.band_area - 0.9).abs() < EPS);
        assert!((row.x_min - 0.0).abs() < EPS);
        assert!((row.x_max - 4.0).abs() < EPS);
    }

    #[test]
    fn removed_values_never_exceed_one() {
        // Raw values poke above the continuum line; ratios must clamp to 1.
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.2, 0.9, 1.5, 1.1];
        let run = remove_continuum(&x, &[&y], &[pair(0.0, 1.0, 3.0, 1.0)]).unwrap();
        for &v in &run.removed[0] {
            assert!(v <= 1.0);
        }
    }

    #[test]
    fn swapped_endpoints_give_identical_output() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [0.9, 0.7, 0.4, 0.6, 0.95];
        let forward = remove_continuum(&x, &[&y], &[pair(0.5, 0.8, 3.5, 0.9)]).unwrap();
        let backward = remove_continuum(&x, &[&y], &[pair(3.5, 0.9, 0.5, 0.8)]).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn later_pair_wins_on_overlap() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [0.9, 0.8, 0.6, 0.7, 0.85, 0.9];
        let first = pair(0.0, 1.0, 4.0, 1.0);
        let second = pair(2.0, 0.8, 5.0, 0.9);

        let run = remove_continuum(&x, &[&y], &[first, second]).unwrap();
        let second_only = remove_continuum(&x, &[&y], &[second]).unwrap();

        // Overlap region [2, 4] reflects only the second pair.
        for i in 2..=4 {
            assert!((run.removed[0][i] - second_only.removed[0][i]).abs() < EPS);
        }
        // One row per pair, both computed.
        assert_eq!(run.rows.len(), 2);
    }

    #[test]
    fn empty_segment_leaves_curve_untouched_and_emits_no_row() {
        let x = [0.0, 2.0, 4.0, 6.0, 8.0, 10.0];
        let y = [0.9, 0.8, 0.7, 0.8, 0.9, 1.0];
        let run = remove_continuum(&x, &[&y], &[pair(20.0, 1.0, 30.0, 1.0)]).unwrap();
        assert!(run.rows.is_empty());
        for &v in &run.removed[0] {
            assert!((v - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn curves_truncate_to_common_length() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [0.9, 0.8, 0.7];
        let run = remove_continuum(&x, &[&y], &[pair(0.0, 1.0, 4.0, 1.0)]).unwrap();
        assert_eq!(run.removed[0].len(), 3);
        // Segment only covers the truncated range.
        let row = &run.rows[0];
        assert!((row.band_centre - 2.0).abs() < EPS);
    }

    #[test]
    fn degenerate_minimum_on_boundary_reports_sentinel() {
        // Rising curve: the normalized minimum lands on the left boundary.
        let x = [0.0, 1.0, 2.0];
        let y = [0.5, 0.7, 0.9];
        let run = remove_continuum(&x, &[&y], &[pair(0.0, 0.5, 2.0, 0.9)]).unwrap();
        assert_eq!(run.rows.len(), 1);
        assert_eq!(run.rows[0].band_fwhm, FWHM_UNDEFINED);
    }

    #[test]
    fn rows_are_curve_major_pair_minor() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let a = [1.0, 0.8, 0.6, 0.8, 1.0];
        let b = [1.0, 0.9, 0.7, 0.9, 1.0];
        let left = pair(0.0, 1.0, 2.0, 1.0);
        let right = pair(2.0, 1.0, 4.0, 1.0);

        let run = remove_continuum(&x, &[&a, &b], &[left, right]).unwrap();
        assert_eq!(run.rows.len(), 4);
        // Curve a's rows first (both pairs), then curve b's.
        assert!((run.rows[0].x_max - 2.0).abs() < EPS);
        assert!((run.rows[1].x_max - 4.0).abs() < EPS);
        assert!((run.rows[0].band_min - 0.6).abs() < EPS);
        assert!((run.rows[2].band_min - 0.7).abs() < EPS);
    }

    #[test]
    fn missing_axis_is_a_precondition_failure() {
        let y = [1.0, 0.9];
        assert_eq!(
            remove_continuum(&[], &[&y], &[]),
            Err(RemovalError::MissingAxis)
        );
    }

    #[test]
    fn missing_curves_is_a_precondition_failure() {
        let x = [0.0, 1.0];
        assert_eq!(remove_continuum(&x, &[], &[]), Err(RemovalError::NoCurves));
    }

    #[test]
    fn no_pairs_yields_all_ones_and_no_rows() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.5, 0.4, 0.3];
        let run = remove_continuum(&x, &[&y], &[]).unwrap();
        assert!(run.rows.is_empty());
        assert_eq!(run.removed[0], vec![1.0, 1.0, 1.0]);
    }
}
