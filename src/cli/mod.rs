//! Command-line parsing for the peak-fitting session tool.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the session/fitting code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::ShapeKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pft", version, about = "Peak-fitting sessions (load, guess, fit, dump)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a data file, guess a peak model, fit it, and print a report.
    Fit(FitArgs),
    /// Execute a session script and print any info output it produces.
    Run(RunArgs),
    /// Evaluate an expression in a fresh session and print the value.
    Eval(EvalArgs),
    /// Fit a synthetic noisy-Gaussian dataset end to end (no input file).
    Demo(DemoArgs),
}

/// Options for `pft fit`.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Two/three-column (x, y[, sigma]) data file.
    pub data: PathBuf,

    /// Peak shape to guess and fit.
    #[arg(long, value_enum, default_value = "gaussian")]
    pub shape: ShapeKind,

    /// Number of peaks to guess before fitting.
    #[arg(long, default_value_t = 1)]
    pub peaks: usize,

    /// Iteration cap for the refinement loop.
    #[arg(long, default_value_t = 100)]
    pub max_iter: usize,

    /// Write the session state script here after fitting.
    #[arg(long)]
    pub dump: Option<PathBuf>,

    /// Write a session summary JSON here after fitting.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

/// Options for `pft run`.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Session script to execute (e.g. a previous `dump` output).
    pub script: PathBuf,
}

/// Options for `pft eval`.
#[derive(Debug, Parser, Clone)]
pub struct EvalArgs {
    /// Expression to evaluate, e.g. 'ln(2)' or '2^10 - 1'.
    pub expr: String,
}

/// Options for `pft demo`.
#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    /// Number of synthetic points.
    #[arg(long, default_value_t = 500)]
    pub points: usize,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Noise amplitude as a multiple of each point's sigma.
    #[arg(long, default_value_t = 1.0)]
    pub noise: f64,

    /// Write the session state script here after fitting.
    #[arg(long)]
    pub dump: Option<PathBuf>,

    /// Write a session summary JSON here after fitting.
    #[arg(long)]
    pub export: Option<PathBuf>,
}
