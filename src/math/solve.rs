//! Damped weighted normal equations.
//!
//! Each fit iteration solves a small system of the form:
//!
//! ```text
//! (JᵀWJ + λ·diag(JᵀWJ)) δ = JᵀW r
//! ```
//!
//! Implementation choices:
//! - The parameter dimension is tiny (3 per peak), so we build `JᵀWJ`
//!   densely and solve in place.
//! - Cholesky is the fast path; the damped matrix is symmetric and, for
//!   λ > 0, usually positive definite.
//! - When Cholesky fails (collinear gradients at a degenerate parameter
//!   point), we fall back to SVD with progressively looser tolerances
//!   rather than failing the whole iteration.

use nalgebra::{DMatrix, DVector};

/// Floor applied to diagonal entries before damping, so a parameter with a
/// vanishing gradient still gets a finite damping term.
const DIAG_FLOOR: f64 = 1e-30;

/// Solve `(ata + lambda * diag(ata)) delta = atb`.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_damped(ata: &DMatrix<f64>, atb: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let n = ata.nrows();
    let mut damped = ata.clone();
    for i in 0..n {
        let d = ata[(i, i)].abs().max(DIAG_FLOOR);
        damped[(i, i)] += lambda * d;
    }

    if let Some(chol) = damped.clone().cholesky() {
        let delta = chol.solve(atb);
        if delta.iter().all(|v| v.is_finite()) {
            return Some(delta);
        }
    }

    // Try progressively looser tolerances if the strict solve fails.
    let svd = damped.svd(true, true);
    for &tol in &[1e-12, 1e-9, 1e-6] {
        if let Ok(delta) = svd.solve(atb, tol) {
            if delta.iter().all(|v| v.is_finite()) {
                return Some(delta);
            }
        }
    }

    None
}
