//! Heuristic peak parameter estimation.
//!
//! Given x-sorted data (usually the residual after subtracting the other
//! functions bound to the dataset), estimate a peak's center, height, hwhm
//! and area:
//!
//! - the peak position is the highest interior point
//! - the width comes from a half-maximum crossing search on each side,
//!   tolerating up to 3 points of noise fluctuation before accepting a
//!   crossing
//! - the area is the trapezoid integral between the crossings

use crate::error::SessionError;

/// Minimum hwhm returned by the estimator.
const HWHM_FLOOR: f64 = 1e-12;

/// Number of consecutive below-half-max points required to accept a
/// crossing (noise tolerance).
const CROSSING_RUN: usize = 3;

/// Estimated peak traits, in data units.
#[derive(Debug, Clone, Copy)]
pub struct PeakEstimate {
    pub center: f64,
    pub height: f64,
    pub hwhm: f64,
    pub area: f64,
}

/// Estimate peak parameters from `(xs, ys)`; `xs` must be sorted.
pub fn estimate_peak(xs: &[f64], ys: &[f64]) -> Result<PeakEstimate, SessionError> {
    assert_eq!(xs.len(), ys.len());
    if xs.is_empty() {
        return Err(SessionError::command("guess: empty range"));
    }

    // Find the highest interior point: strictly above its left neighbor and
    // not below its right one, so a monotone edge never counts as a peak.
    let mut pos: Option<usize> = None;
    for i in 1..ys.len().saturating_sub(1) {
        let t = pos.unwrap_or(i - 1);
        if ys[i] > ys[t] && ys[i] >= ys[i + 1] {
            pos = Some(i);
        }
    }
    let Some(pos) = pos else {
        return Err(SessionError::command("guess: peak outside of the range"));
    };

    let (hwhm, area) = find_hwhm(xs, ys, pos);
    Ok(PeakEstimate {
        center: xs[pos],
        height: ys[pos],
        hwhm,
        area,
    })
}

/// Half-max crossing search around `pos`; returns `(hwhm, area)`.
fn find_hwhm(xs: &[f64], ys: &[f64], pos: usize) -> (f64, f64) {
    let hm = 0.5 * ys[pos];

    // Walk left until CROSSING_RUN points in a row sit below half-max; a
    // single point above resets one step of the run (it was a fluctuation).
    let mut left_pos = 0;
    let mut counter = 0usize;
    for i in (1..=pos).rev() {
        if ys[i] > hm {
            counter = counter.saturating_sub(1);
        } else {
            counter += 1;
            if counter == CROSSING_RUN {
                left_pos = i + counter;
                break;
            }
        }
    }

    // Same on the right; the +1 is intentionally asymmetric with the left
    // side.
    let mut right_pos = ys.len() - 1;
    let mut counter = 0usize;
    for i in pos..ys.len() - 1 {
        if ys[i] > hm {
            counter = counter.saturating_sub(1);
        } else {
            counter += 1;
            if counter == CROSSING_RUN {
                right_pos = i - counter + 1;
                break;
            }
        }
    }

    let mut area = 0.0;
    for i in left_pos..right_pos {
        area += (xs[i + 1] - xs[i]) * (ys[i] + ys[i + 1]) / 2.0;
    }

    let hwhm = (xs[right_pos] - xs[left_pos]) / 2.0;
    (hwhm.max(HWHM_FLOOR), area)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ShapeKind;
    use crate::models::value;

    fn gaussian_grid(height: f64, center: f64, hwhm: f64) -> (Vec<f64>, Vec<f64>) {
        let params = [height, center, hwhm];
        let xs: Vec<f64> = (0..500).map(|i| i as f64 / 100.0 + 10.0).collect();
        let ys: Vec<f64> = xs
            .iter()
            .map(|&x| value(ShapeKind::Gaussian, x, &params))
            .collect();
        (xs, ys)
    }

    #[test]
    fn recovers_ideal_gaussian_traits() {
        let (xs, ys) = gaussian_grid(100.0, 12.345, 0.8);
        let est = estimate_peak(&xs, &ys).unwrap();
        assert!((est.center - 12.345).abs() < 0.01);
        assert!((est.height - 100.0).abs() < 0.1);
        // The crossing search lands within a couple of grid steps of the
        // true half width.
        assert!((est.hwhm - 0.8).abs() < 0.1, "hwhm {}", est.hwhm);
        assert!(est.area > 0.0);
    }

    #[test]
    fn flat_data_has_no_peak() {
        let xs: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let ys = vec![1.0; 50];
        let err = estimate_peak(&xs, &ys).unwrap_err();
        assert!(matches!(err, SessionError::Command { .. }));
    }

    #[test]
    fn monotone_edge_is_not_a_peak() {
        let xs: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| x * 2.0).collect();
        assert!(estimate_peak(&xs, &ys).is_err());
    }

    #[test]
    fn empty_range_is_rejected() {
        let err = estimate_peak(&[], &[]).unwrap_err();
        assert!(matches!(err, SessionError::Command { .. }));
    }
}
