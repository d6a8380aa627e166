//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON for downstream tooling
//! - rendered into session state scripts and reloaded later

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One observation: `(x, y, sigma)`.
///
/// `sigma` is the per-point uncertainty; weighted residuals divide by it, so
/// smaller sigma means more influence on the fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub sigma: f64,
}

impl Point {
    /// A point with the default uncertainty `max(sqrt(|y|), 1)`.
    ///
    /// This is the counting-statistics convention used when a data file has
    /// only two columns.
    pub fn new(x: f64, y: f64) -> Self {
        Point {
            x,
            y,
            sigma: y.abs().sqrt().max(1.0),
        }
    }

    pub fn with_sigma(x: f64, y: f64, sigma: f64) -> Self {
        Point { x, y, sigma }
    }
}

/// Peak shapes the session can guess and fit.
///
/// Both shapes use the parameter layout `[height, center, hwhm]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Gaussian,
    Lorentzian,
}

impl ShapeKind {
    /// Shape name as spelled in commands and listings.
    pub fn display_name(self) -> &'static str {
        match self {
            ShapeKind::Gaussian => "Gaussian",
            ShapeKind::Lorentzian => "Lorentzian",
        }
    }

    /// Number of parameters for this shape.
    pub fn param_len(self) -> usize {
        match self {
            ShapeKind::Gaussian | ShapeKind::Lorentzian => 3,
        }
    }

    /// Parameter names, in storage order.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            ShapeKind::Gaussian | ShapeKind::Lorentzian => &["height", "center", "hwhm"],
        }
    }

    /// Parse a shape name as it appears in command text (case-insensitive).
    pub fn parse_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "gaussian" => Some(ShapeKind::Gaussian),
            "lorentzian" => Some(ShapeKind::Lorentzian),
            _ => None,
        }
    }

    /// All shapes, for `info types`.
    pub fn all() -> &'static [ShapeKind] {
        &[ShapeKind::Gaussian, ShapeKind::Lorentzian]
    }
}

/// Lifecycle of a session function.
///
/// `Uninitialized -> (guess) -> Initialized -> (fit) -> Fitted`.
/// Parameter reads are valid from `Initialized` on; a failed fit never
/// changes the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncState {
    /// Declared but without parameter values; only `guess` (or redefinition
    /// with explicit parameters) leaves this state.
    Uninitialized,
    /// Parameters hold heuristic or explicitly supplied values.
    Initialized,
    /// Parameters were refined by at least one successful fit.
    Fitted,
}

impl FuncState {
    pub fn display_name(self) -> &'static str {
        match self {
            FuncState::Uninitialized => "uninitialized",
            FuncState::Initialized => "initialized",
            FuncState::Fitted => "fitted",
        }
    }

    /// Whether parameter values are readable in this state.
    pub fn is_initialized(self) -> bool {
        !matches!(self, FuncState::Uninitialized)
    }
}

/// Summary stats for one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_points: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Fit quality diagnostics for one dataset (or all datasets together).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitQuality {
    /// Weighted sum of squared residuals.
    pub wssr: f64,
    /// Unweighted sum of squared residuals.
    pub ssr: f64,
    /// Coefficient of determination against the weighted mean.
    pub rsquared: f64,
    /// Degrees of freedom: points minus fitted parameters.
    pub dof: i64,
    pub n_points: usize,
}

/// Outcome of the most recent `fit` command, kept for `info fit`.
#[derive(Debug, Clone)]
pub struct FitReport {
    pub iterations: usize,
    /// Objective evaluations, including rejected trial steps.
    pub evaluations: usize,
    pub initial_wssr: f64,
    pub final_wssr: f64,
}

/// A portable session summary (JSON export).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionExport {
    pub tool: String,
    pub created: String,
    pub datasets: Vec<DatasetExport>,
    pub functions: Vec<FunctionExport>,
    /// Present once at least one function is initialized.
    pub quality: Option<FitQuality>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetExport {
    pub title: String,
    pub source: Option<String>,
    pub stats: DatasetStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionExport {
    pub name: String,
    pub shape: ShapeKind,
    pub state: String,
    pub params: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sigma_floors_at_one() {
        assert_eq!(Point::new(0.0, 0.25).sigma, 1.0);
        assert_eq!(Point::new(0.0, 100.0).sigma, 10.0);
        assert_eq!(Point::new(0.0, -100.0).sigma, 10.0);
    }

    #[test]
    fn shape_names_round_trip() {
        for &shape in ShapeKind::all() {
            assert_eq!(ShapeKind::parse_name(shape.display_name()), Some(shape));
        }
        assert_eq!(ShapeKind::parse_name("gaussian"), Some(ShapeKind::Gaussian));
        assert_eq!(ShapeKind::parse_name("Voigt"), None);
    }
}
