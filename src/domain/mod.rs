//! Domain types used throughout the session.
//!
//! This module defines:
//!
//! - the peak-shape catalog (`ShapeKind`) and function lifecycle (`FuncState`)
//! - data points and per-dataset summary stats (`Point`, `DatasetStats`)
//! - fit outputs (`FitQuality`, `FitReport`)
//! - the portable session export schema (`SessionExport`)

pub mod types;

pub use types::*;
