//! Levenberg–Marquardt refinement.
//!
//! Given:
//! - one block per dataset: its points and the functions summed into its
//!   model
//! - a flat parameter vector shared by all blocks
//!
//! we minimize the weighted sum of squared residuals:
//!
//! ```text
//! WSSR = Σ ((y_i - model(x_i)) / sigma_i)^2
//! ```
//!
//! Each iteration solves the damped normal equations and either accepts the
//! step (λ shrinks) or rejects it (λ grows). Only improving steps are ever
//! accepted, so WSSR is non-increasing across a fit command and refitting
//! from a converged state is a cheap no-op.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::domain::{Point, ShapeKind};
use crate::error::SessionError;
use crate::math::solve_damped;
use crate::models::{value, value_and_gradient};

/// Options that affect the refinement loop.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub max_iterations: usize,
    /// Initial damping factor.
    pub lambda_start: f64,
    /// Multiplier applied to λ on a rejected step.
    pub lambda_up: f64,
    /// Divisor applied to λ on an accepted step.
    pub lambda_down: f64,
    /// Stop once an accepted step improves relative WSSR by less than this.
    pub stop_rel_change: f64,
    /// Give up when λ grows past this.
    pub lambda_max: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            max_iterations: 100,
            lambda_start: 1e-3,
            lambda_up: 10.0,
            lambda_down: 10.0,
            stop_rel_change: 1e-8,
            lambda_max: 1e12,
        }
    }
}

/// One fitted term: a shape whose parameters live at `offset..offset+len`
/// in the flat parameter vector.
#[derive(Debug, Clone, Copy)]
pub struct Term {
    pub shape: ShapeKind,
    pub offset: usize,
}

/// The points of one dataset and the terms summed into its model.
#[derive(Debug)]
pub struct Block<'a> {
    pub points: &'a [Point],
    pub terms: Vec<Term>,
}

/// A fit problem: blocks plus the flat parameter count.
#[derive(Debug, Default)]
pub struct FitProblem<'a> {
    blocks: Vec<Block<'a>>,
    n_params: usize,
}

/// Result of a refinement run.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub params: Vec<f64>,
    pub initial_wssr: f64,
    pub final_wssr: f64,
    pub iterations: usize,
    /// Objective evaluations, including rejected trial steps.
    pub evaluations: usize,
}

impl<'a> FitProblem<'a> {
    pub fn new(n_params: usize) -> Self {
        FitProblem {
            blocks: Vec::new(),
            n_params,
        }
    }

    pub fn add_block(&mut self, points: &'a [Point], terms: Vec<Term>) {
        self.blocks.push(Block { points, terms });
    }

    pub fn n_params(&self) -> usize {
        self.n_params
    }

    pub fn n_points(&self) -> usize {
        self.blocks.iter().map(|b| b.points.len()).sum()
    }

    /// Model value of one block at `x`.
    fn model_value(terms: &[Term], x: f64, params: &[f64]) -> f64 {
        terms
            .iter()
            .map(|t| value(t.shape, x, &params[t.offset..t.offset + 3]))
            .sum()
    }

    /// WSSR at the given parameters.
    pub fn wssr(&self, params: &[f64]) -> f64 {
        self.blocks
            .iter()
            .map(|block| {
                block
                    .points
                    .par_iter()
                    .map(|p| {
                        let r = (p.y - Self::model_value(&block.terms, p.x, params)) / p.sigma;
                        r * r
                    })
                    .sum::<f64>()
            })
            .sum()
    }

    /// Accumulate `JᵀWJ`, `JᵀWr`, and WSSR at the given parameters.
    ///
    /// Points are folded in parallel per block.
    fn accumulate(&self, params: &[f64]) -> (DMatrix<f64>, DVector<f64>, f64) {
        let n = self.n_params;
        let zero = || (DMatrix::<f64>::zeros(n, n), DVector::<f64>::zeros(n), 0.0f64);

        self.blocks
            .iter()
            .map(|block| {
                block
                    .points
                    .par_iter()
                    .fold(zero, |(mut ata, mut atb, mut wssr), p| {
                        let mut grad = vec![0.0; n];
                        let mut g = [0.0; 3];
                        let mut y = 0.0;
                        for t in &block.terms {
                            y += value_and_gradient(
                                t.shape,
                                p.x,
                                &params[t.offset..t.offset + 3],
                                &mut g,
                            );
                            grad[t.offset..t.offset + 3].copy_from_slice(&g);
                        }
                        let w = 1.0 / (p.sigma * p.sigma);
                        let r = p.y - y;
                        wssr += w * r * r;
                        for i in 0..n {
                            if grad[i] == 0.0 {
                                continue;
                            }
                            atb[i] += w * grad[i] * r;
                            for j in 0..n {
                                ata[(i, j)] += w * grad[i] * grad[j];
                            }
                        }
                        (ata, atb, wssr)
                    })
                    .reduce(zero, |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2))
            })
            .fold(zero(), |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2))
    }
}

/// Run the refinement loop from `params0`.
pub fn run_lm(
    problem: &FitProblem<'_>,
    params0: &[f64],
    opts: &FitOptions,
) -> Result<FitOutcome, SessionError> {
    let n = problem.n_params();
    assert_eq!(params0.len(), n);

    if problem.n_points() < n {
        return Err(SessionError::command(format!(
            "Not enough data points to fit {n} parameters ({} available).",
            problem.n_points()
        )));
    }

    let mut params = params0.to_vec();
    let (mut ata, mut atb, mut wssr) = problem.accumulate(&params);
    let initial_wssr = wssr;
    let mut evaluations = 1usize;
    let mut iterations = 0usize;

    if !wssr.is_finite() {
        return Err(SessionError::command("Initial model value is not finite."));
    }

    let mut lambda = opts.lambda_start;

    while iterations < opts.max_iterations {
        // An exactly-zero objective cannot improve.
        if wssr == 0.0 {
            break;
        }
        iterations += 1;

        let Some(delta) = solve_damped(&ata, &atb, lambda) else {
            lambda *= opts.lambda_up;
            if lambda > opts.lambda_max {
                break;
            }
            continue;
        };

        let trial: Vec<f64> = params.iter().zip(delta.iter()).map(|(p, d)| p + d).collect();
        let trial_wssr = problem.wssr(&trial);
        evaluations += 1;

        if trial_wssr.is_finite() && trial_wssr < wssr {
            let rel = (wssr - trial_wssr) / wssr;
            params = trial;
            let refreshed = problem.accumulate(&params);
            evaluations += 1;
            ata = refreshed.0;
            atb = refreshed.1;
            wssr = trial_wssr;
            lambda /= opts.lambda_down;
            log::debug!("lm iter {iterations}: wssr={wssr:.6e} lambda={lambda:.1e}");
            if rel < opts.stop_rel_change {
                break;
            }
        } else {
            lambda *= opts.lambda_up;
            log::debug!("lm iter {iterations}: rejected step, lambda={lambda:.1e}");
            if lambda > opts.lambda_max {
                break;
            }
        }
    }

    Ok(FitOutcome {
        params,
        initial_wssr,
        final_wssr: wssr,
        iterations,
        evaluations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Point;
    use crate::models::value;

    fn gaussian_points(params: [f64; 3], n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| {
                let x = 10.0 + i as f64 * 5.0 / n as f64;
                Point::new(x, value(ShapeKind::Gaussian, x, &params))
            })
            .collect()
    }

    #[test]
    fn converges_on_clean_gaussian() {
        let truth = [100.0, 12.345, 0.8];
        let points = gaussian_points(truth, 200);
        let mut problem = FitProblem::new(3);
        problem.add_block(
            &points,
            vec![Term {
                shape: ShapeKind::Gaussian,
                offset: 0,
            }],
        );

        // Start from a perturbed guess.
        let start = [80.0, 12.0, 1.2];
        let outcome = run_lm(&problem, &start, &FitOptions::default()).unwrap();

        assert!(outcome.final_wssr <= outcome.initial_wssr);
        assert!(outcome.final_wssr < 1e-8, "wssr {}", outcome.final_wssr);
        assert!((outcome.params[1] - truth[1]).abs() < 1e-4);
        assert!((outcome.params[0] - truth[0]).abs() < 1e-2);
    }

    #[test]
    fn refit_from_converged_state_changes_little() {
        let truth = [50.0, 11.0, 0.5];
        let points = gaussian_points(truth, 100);
        let mut problem = FitProblem::new(3);
        problem.add_block(
            &points,
            vec![Term {
                shape: ShapeKind::Gaussian,
                offset: 0,
            }],
        );

        let first = run_lm(&problem, &[40.0, 11.2, 0.7], &FitOptions::default()).unwrap();
        let second = run_lm(&problem, &first.params, &FitOptions::default()).unwrap();
        assert!(second.final_wssr <= first.final_wssr + 1e-12);
        for (a, b) in first.params.iter().zip(second.params.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn wssr_never_increases() {
        let truth = [100.0, 12.0, 1.0];
        let points = gaussian_points(truth, 50);
        let mut problem = FitProblem::new(3);
        problem.add_block(
            &points,
            vec![Term {
                shape: ShapeKind::Gaussian,
                offset: 0,
            }],
        );

        // A deliberately bad start; even if it cannot fully converge the
        // outcome must not be worse than where it started.
        let start = [1.0, 14.0, 3.0];
        let outcome = run_lm(&problem, &start, &FitOptions::default()).unwrap();
        assert!(outcome.final_wssr <= outcome.initial_wssr);
    }

    #[test]
    fn too_few_points_is_an_error() {
        let points = vec![Point::new(0.0, 1.0), Point::new(1.0, 2.0)];
        let mut problem = FitProblem::new(3);
        problem.add_block(
            &points,
            vec![Term {
                shape: ShapeKind::Gaussian,
                offset: 0,
            }],
        );
        assert!(run_lm(&problem, &[1.0, 0.5, 1.0], &FitOptions::default()).is_err());
    }
}
