//! Datasets: the container, text-file loading, and synthetic samples.

pub mod load;
pub mod sample;

pub use load::*;
pub use sample::*;

use std::path::PathBuf;

use crate::domain::{DatasetStats, Point};

/// An ordered sequence of observations plus bookkeeping for reports.
///
/// Points are kept sorted by x; the guess heuristic scans neighbors and
/// relies on that ordering.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub title: String,
    /// Path the data came from, if it was loaded from a file.
    pub source: Option<PathBuf>,
    pub points: Vec<Point>,
}

impl Dataset {
    pub fn new() -> Self {
        Dataset::default()
    }

    /// Insert a point, keeping the x-order.
    pub fn add_point(&mut self, point: Point) {
        let at = self
            .points
            .partition_point(|p| p.x <= point.x);
        self.points.insert(at, point);
    }

    /// Replace all points, re-sorting by x.
    pub fn set_points(&mut self, mut points: Vec<Point>) {
        points.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        self.points = points;
    }

    pub fn stats(&self) -> DatasetStats {
        let mut x_min = f64::INFINITY;
        let mut x_max = f64::NEG_INFINITY;
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for p in &self.points {
            x_min = x_min.min(p.x);
            x_max = x_max.max(p.x);
            y_min = y_min.min(p.y);
            y_max = y_max.max(p.y);
        }
        DatasetStats {
            n_points: self.points.len(),
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_point_keeps_x_order() {
        let mut d = Dataset::new();
        for &x in &[3.0, 1.0, 2.0, 2.5] {
            d.add_point(Point::new(x, 0.0));
        }
        let xs: Vec<f64> = d.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 2.5, 3.0]);
    }
}
