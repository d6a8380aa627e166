//! Mathematical utilities: the damped normal-equations solver.

pub mod solve;

pub use solve::*;
