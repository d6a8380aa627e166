//! Value, gradient, and derived properties per shape kind.
//!
//! Parameter layout for both shapes is `[height, center, hwhm]`:
//!
//! - Gaussian:   `y = height * exp(-ln2 * ((x-center)/hwhm)^2)`
//! - Lorentzian: `y = height / (1 + ((x-center)/hwhm)^2)`
//!
//! `hwhm` is clamped away from zero before evaluation so a degenerate width
//! never produces a division by zero mid-fit.

use std::f64::consts::{LN_2, PI};

use crate::domain::ShapeKind;

/// Minimum absolute half-width used in evaluation.
const HWHM_EPS: f64 = 1e-12;

fn clamp_hwhm(w: f64) -> f64 {
    // Both shapes depend on the width only through ((x-c)/w)^2, so the sign
    // of a near-zero width is irrelevant.
    if w.abs() < HWHM_EPS { HWHM_EPS } else { w }
}

/// Evaluate `y(x)` for the given shape.
///
/// # Panics
/// Panics if `params` does not have length `shape.param_len()`. Callers
/// should size parameter vectors correctly.
pub fn value(shape: ShapeKind, x: f64, params: &[f64]) -> f64 {
    let height = params[0];
    let center = params[1];
    let hwhm = clamp_hwhm(params[2]);
    let t = (x - center) / hwhm;
    match shape {
        ShapeKind::Gaussian => height * (-LN_2 * t * t).exp(),
        ShapeKind::Lorentzian => height / (1.0 + t * t),
    }
}

/// Evaluate `y(x)` and fill `dy/dparam` into `grad`.
///
/// Returns the value; `grad` must have length `shape.param_len()`.
pub fn value_and_gradient(shape: ShapeKind, x: f64, params: &[f64], grad: &mut [f64]) -> f64 {
    let height = params[0];
    let center = params[1];
    let hwhm = clamp_hwhm(params[2]);
    let t = (x - center) / hwhm;
    match shape {
        ShapeKind::Gaussian => {
            let ex = (-LN_2 * t * t).exp();
            let dcenter = 2.0 * LN_2 * height * ex * t / hwhm;
            grad[0] = ex;
            grad[1] = dcenter;
            grad[2] = dcenter * t;
            height * ex
        }
        ShapeKind::Lorentzian => {
            let inv = 1.0 / (1.0 + t * t);
            let dcenter = 2.0 * height * t / hwhm * inv * inv;
            grad[0] = inv;
            grad[1] = dcenter;
            grad[2] = dcenter * t;
            height * inv
        }
    }
}

/// Analytic area under the peak.
pub fn area(shape: ShapeKind, params: &[f64]) -> f64 {
    let height = params[0];
    let hwhm = params[2];
    match shape {
        ShapeKind::Gaussian => height * hwhm.abs() * (PI / LN_2).sqrt(),
        ShapeKind::Lorentzian => PI * height * hwhm.abs(),
    }
}

/// Full width at half maximum.
pub fn fwhm(_shape: ShapeKind, params: &[f64]) -> f64 {
    2.0 * params[2].abs()
}

/// Render the shape as a plain math formula (for `info formula`).
pub fn formula(shape: ShapeKind, params: &[f64]) -> String {
    let height = params[0];
    let center = params[1];
    let hwhm = params[2];
    match shape {
        ShapeKind::Gaussian => {
            format!("{height}*exp(-ln(2)*((x-{center})/{hwhm})^2)")
        }
        ShapeKind::Lorentzian => {
            format!("{height}/(1+((x-{center})/{hwhm})^2)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAUSS: [f64; 3] = [100.0, 12.0, 0.5];

    #[test]
    fn gaussian_value_identities() {
        // Peak value at the center, half of it one hwhm away.
        assert!((value(ShapeKind::Gaussian, 12.0, &GAUSS) - 100.0).abs() < 1e-12);
        assert!((value(ShapeKind::Gaussian, 12.5, &GAUSS) - 50.0).abs() < 1e-9);
        assert!((value(ShapeKind::Gaussian, 11.5, &GAUSS) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn lorentzian_value_identities() {
        let p = [40.0, -3.0, 2.0];
        assert!((value(ShapeKind::Lorentzian, -3.0, &p) - 40.0).abs() < 1e-12);
        assert!((value(ShapeKind::Lorentzian, -1.0, &p) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn gradients_match_finite_differences() {
        let h = 1e-6;
        for &shape in ShapeKind::all() {
            let params = [80.0, 5.0, 1.5];
            let mut grad = [0.0; 3];
            for &x in &[3.0, 4.9, 5.0, 6.2] {
                let y = value_and_gradient(shape, x, &params, &mut grad);
                assert!((y - value(shape, x, &params)).abs() < 1e-12);
                for j in 0..3 {
                    let mut bumped = params;
                    bumped[j] += h;
                    let fd = (value(shape, x, &bumped) - y) / h;
                    assert!(
                        (grad[j] - fd).abs() < 1e-4,
                        "{shape:?} d/dp[{j}] at x={x}: analytic {} vs fd {fd}",
                        grad[j]
                    );
                }
            }
        }
    }

    #[test]
    fn gaussian_area_matches_numeric_integral() {
        let a = area(ShapeKind::Gaussian, &GAUSS);
        let mut numeric = 0.0;
        let (lo, hi, n) = (2.0, 22.0, 200_000);
        let dx = (hi - lo) / n as f64;
        for i in 0..n {
            let x = lo + (i as f64 + 0.5) * dx;
            numeric += value(ShapeKind::Gaussian, x, &GAUSS) * dx;
        }
        assert!((a - numeric).abs() / a < 1e-6, "analytic {a} vs numeric {numeric}");
    }

    #[test]
    fn fwhm_is_twice_hwhm() {
        assert_eq!(fwhm(ShapeKind::Gaussian, &GAUSS), 1.0);
        assert_eq!(fwhm(ShapeKind::Lorentzian, &[1.0, 0.0, -2.0]), 4.0);
    }

    #[test]
    fn degenerate_width_stays_finite() {
        let p = [10.0, 0.0, 0.0];
        assert!(value(ShapeKind::Gaussian, 1.0, &p).is_finite());
        assert!(value(ShapeKind::Lorentzian, 1.0, &p).is_finite());
    }
}
