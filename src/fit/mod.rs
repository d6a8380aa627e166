//! Model fitting.
//!
//! Responsibilities:
//!
//! - heuristic peak parameter estimation from data (`guess`)
//! - Levenberg–Marquardt refinement of all active functions (`lm`)

pub mod guess;
pub mod lm;

pub use guess::*;
pub use lm::*;
