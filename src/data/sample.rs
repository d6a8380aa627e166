//! Synthetic noisy-Gaussian sample generation.
//!
//! Used by the `demo` subcommand and by tests: a single Gaussian peak on a
//! uniform x grid, counting-statistics sigmas, and seeded normal noise so
//! runs are reproducible.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::Dataset;
use crate::domain::{Point, ShapeKind};
use crate::error::SessionError;
use crate::models::value;

/// Options for the synthetic sample.
#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub n_points: usize,
    pub seed: u64,
    /// Noise amplitude as a multiple of each point's sigma.
    pub noise: f64,
    pub height: f64,
    pub center: f64,
    pub hwhm: f64,
    pub x_min: f64,
    pub x_max: f64,
}

impl Default for SampleOptions {
    fn default() -> Self {
        // The classic demo peak: 500 points on [10, 15), center 12.345.
        // The hwhm reproduces exp(-(x-c)^2/2): w = sqrt(2*ln2).
        SampleOptions {
            n_points: 500,
            seed: 42,
            noise: 1.0,
            height: 100.0,
            center: 12.345,
            hwhm: (2.0 * std::f64::consts::LN_2).sqrt(),
            x_min: 10.0,
            x_max: 15.0,
        }
    }
}

/// Generate a noisy single-Gaussian dataset.
pub fn generate_gaussian_sample(opts: &SampleOptions) -> Result<Dataset, SessionError> {
    if opts.n_points < 3 {
        return Err(SessionError::command("Sample needs at least 3 points."));
    }
    if !(opts.x_min.is_finite() && opts.x_max.is_finite() && opts.x_max > opts.x_min) {
        return Err(SessionError::command("Invalid x range for sample generation."));
    }
    if !(opts.noise.is_finite() && opts.noise >= 0.0) {
        return Err(SessionError::command("Noise amplitude must be >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| SessionError::command(format!("Noise distribution error: {e}")))?;

    let params = [opts.height, opts.center, opts.hwhm];
    let step = (opts.x_max - opts.x_min) / opts.n_points as f64;

    let mut dataset = Dataset::new();
    dataset.title = "noisy gaussian".to_string();
    let mut points = Vec::with_capacity(opts.n_points);
    for i in 0..opts.n_points {
        let x = opts.x_min + i as f64 * step;
        let clean = value(ShapeKind::Gaussian, x, &params);
        let sigma = clean.abs().sqrt().max(1.0);
        let z: f64 = normal.sample(&mut rng);
        points.push(Point::with_sigma(x, clean + z * sigma * opts.noise, sigma));
    }
    dataset.set_points(points);
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_deterministic_per_seed() {
        let opts = SampleOptions::default();
        let a = generate_gaussian_sample(&opts).unwrap();
        let b = generate_gaussian_sample(&opts).unwrap();
        assert_eq!(a.points.len(), 500);
        for (pa, pb) in a.points.iter().zip(b.points.iter()) {
            assert_eq!(pa.y, pb.y);
        }
    }

    #[test]
    fn noiseless_sample_peaks_at_the_center() {
        let opts = SampleOptions {
            noise: 0.0,
            ..SampleOptions::default()
        };
        let d = generate_gaussian_sample(&opts).unwrap();
        let best = d
            .points
            .iter()
            .max_by(|a, b| a.y.partial_cmp(&b.y).unwrap())
            .unwrap();
        assert!((best.x - 12.345).abs() < 0.02);
    }

    #[test]
    fn degenerate_options_are_rejected() {
        let mut opts = SampleOptions::default();
        opts.n_points = 2;
        assert!(generate_gaussian_sample(&opts).is_err());
        let mut opts = SampleOptions::default();
        opts.x_max = opts.x_min;
        assert!(generate_gaussian_sample(&opts).is_err());
    }
}
