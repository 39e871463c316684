// ---------------------------------------------------------------------------
// Band metrics on a continuum-removed segment
// ---------------------------------------------------------------------------

/// FWHM value reported when the band minimum sits on a segment boundary and
/// no half-maximum crossing exists on one side.
pub const FWHM_UNDEFINED: f64 = -1.0;

/// Diagnostic metrics for one continuum-removed band segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandMetrics {
    /// Full-width half-maximum, or [`FWHM_UNDEFINED`] when degenerate.
    pub fwhm: f64,
    /// Minimum of the normalized reflectance.
    pub minimum: f64,
    /// Wavelength at the band minimum.
    pub centre: f64,
    /// `1 - minimum`.
    pub depth: f64,
    /// Area between the flat continuum (y = 1) and the normalized curve.
    pub area: f64,
}

impl BandMetrics {
    /// Compute all band metrics for a segment's wavelengths `x` and its
    /// normalized reflectance `y`. Returns `None` for an empty segment.
    pub fn compute(x: &[f64], y: &[f64]) -> Option<Self> {
        let n = x.len().min(y.len());
        if n == 0 {
            return None;
        }
        let (x, y) = (&x[..n], &y[..n]);

        let min_idx = argmin(y);
        let minimum = y[min_idx];
        let centre = x[min_idx];

        Some(BandMetrics {
            fwhm: fwhm(x, y, min_idx),
            minimum,
            centre,
            depth: 1.0 - minimum,
            area: band_area(x, y),
        })
    }
}

/// Index of the smallest value, first occurrence on ties.
fn argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v < values[best] {
            best = i;
        }
    }
    best
}

/// Index of the largest value, first occurrence on ties.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Full-width half-maximum of the band around the minimum at `min_idx`.
///
/// `half` is the midpoint between the segment's extremes. Each side of the
/// minimum contributes the sample whose normalized reflectance lies closest
/// to `half`; the width is the x-distance between those two samples. If the
/// minimum sits on the segment boundary one side has no samples and the
/// width is undefined, reported as [`FWHM_UNDEFINED`].
fn fwhm(x: &[f64], y: &[f64], min_idx: usize) -> f64 {
    let half = (y[argmax(y)] + y[min_idx]) / 2.0;
    let x_mid = x[min_idx];

    let x_lhs = nearest_to_half(x, y, half, |xi| xi < x_mid);
    let x_rhs = nearest_to_half(x, y, half, |xi| xi > x_mid);

    match (x_lhs, x_rhs) {
        (Some(lhs), Some(rhs)) => rhs - lhs,
        _ => FWHM_UNDEFINED,
    }
}

/// The x of the sample closest to `half` among samples whose x passes `side`,
/// first occurrence on ties. `None` when no sample is on that side.
fn nearest_to_half(x: &[f64], y: &[f64], half: f64, side: impl Fn(f64) -> bool) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;
    for (&xi, &yi) in x.iter().zip(y) {
        if !side(xi) {
            continue;
        }
        let dist = (yi - half).abs();
        match best {
            Some((best_dist, _)) if dist >= best_dist => {}
            _ => best = Some((dist, xi)),
        }
    }
    best.map(|(_, xi)| xi)
}

/// Area between the flat continuum at y = 1 and the normalized curve,
/// both integrated with the trapezoidal rule over the segment's x-range.
fn band_area(x: &[f64], y: &[f64]) -> f64 {
    // The trapezoidal integral of the constant 1 telescopes to the x-span.
    let box_area = x[x.len() - 1] - x[0];
    box_area - trapezoid(x, y)
}

/// Trapezoidal integral of `y` over `x`.
fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    let mut area = 0.0;
    for i in 1..x.len().min(y.len()) {
        let dx = x[i] - x[i - 1];
        area += dx * (y[i] + y[i - 1]) / 2.0;
    }
    area
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn symmetric_band() {
        // Constant-1 continuum: the normalized curve is the raw curve.
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 0.8, 0.5, 0.8, 1.0];
        let m = BandMetrics::compute(&x, &y).unwrap();

        assert!((m.minimum - 0.5).abs() < EPS);
        assert!((m.centre - 2.0).abs() < EPS);
        assert!((m.depth - 0.5).abs() < EPS);
        // half = (1.0 + 0.5) / 2 = 0.75; nearest on both sides is y = 0.8,
        // at x = 1 and x = 3.
        assert!((m.fwhm - 2.0).abs() < EPS);
        // box area 4.0, trapezoid under the curve 3.1
        assert!((m.area - 0.9).abs() < EPS);
    }

    #[test]
    fn depth_is_one_minus_minimum() {
        let x = [0.0, 0.5, 1.0, 1.5];
        let y = [0.95, 0.4, 0.6, 0.99];
        let m = BandMetrics::compute(&x, &y).unwrap();
        assert!((m.depth - (1.0 - m.minimum)).abs() < EPS);
    }

    #[test]
    fn fwhm_undefined_when_minimum_on_left_boundary() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.5, 0.7, 0.9];
        let m = BandMetrics::compute(&x, &y).unwrap();
        assert_eq!(m.fwhm, FWHM_UNDEFINED);
        assert!((m.minimum - 0.5).abs() < EPS);
        assert!((m.centre - 0.0).abs() < EPS);
    }

    #[test]
    fn fwhm_undefined_when_minimum_on_right_boundary() {
        let x = [0.0, 1.0, 2.0];
        let y = [0.9, 0.7, 0.5];
        let m = BandMetrics::compute(&x, &y).unwrap();
        assert_eq!(m.fwhm, FWHM_UNDEFINED);
    }

    #[test]
    fn fwhm_undefined_for_single_sample() {
        let m = BandMetrics::compute(&[1.0], &[0.6]).unwrap();
        assert_eq!(m.fwhm, FWHM_UNDEFINED);
        assert!((m.area - 0.0).abs() < EPS);
    }

    #[test]
    fn centre_uses_first_occurrence_of_tied_minimum() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 0.5, 0.8, 0.5, 1.0];
        let m = BandMetrics::compute(&x, &y).unwrap();
        assert!((m.centre - 1.0).abs() < EPS);
    }

    #[test]
    fn area_non_negative_for_clamped_curve() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 1.0, 0.2, 1.0];
        let m = BandMetrics::compute(&x, &y).unwrap();
        assert!(m.area >= 0.0);
    }

    #[test]
    fn empty_segment_yields_none() {
        assert!(BandMetrics::compute(&[], &[]).is_none());
    }
}
