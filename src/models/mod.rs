//! Peak-shape evaluation.
//!
//! The fitter relies on two primitive operations:
//! - evaluate `y(x)` given shape parameters (for residuals/reports)
//! - evaluate `y(x)` together with parameter gradients (for the Jacobian)
//!
//! These are implemented here for each shape kind, along with the derived
//! `area` / `fwhm` properties and a formula renderer.

pub mod shape;

pub use shape::*;
