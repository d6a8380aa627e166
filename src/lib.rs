//! `peakfit` library crate.
//!
//! The binary (`pft`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the session API is reusable (e.g. embedding, notebooks, other front-ends)
//! - code stays easy to navigate as the project grows
//!
//! The central type is [`session::Session`]: it owns datasets and peak
//! functions, executes commands (typed or textual), and answers
//! info/scalar/expression queries.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod expr;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
pub mod session;

/// Tool name used in `info version`, exports, and state script headers.
pub const TOOL_NAME: &str = "peakfit";

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
