//! Shared "fit pipeline" logic used by the `fit` and `demo` subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> guess -> fit -> report -> optional dump/export.

use std::path::{Path, PathBuf};

use crate::domain::ShapeKind;
use crate::error::SessionError;
use crate::fit::FitOptions;
use crate::io;
use crate::report;
use crate::session::{Command, Session};

/// Configuration of a single fit run.
#[derive(Debug, Clone)]
pub struct FitRunConfig {
    pub shape: ShapeKind,
    pub peaks: usize,
    pub max_iterations: usize,
    pub dump: Option<PathBuf>,
    pub export: Option<PathBuf>,
}

/// All computed outputs of a single fit run.
#[derive(Debug)]
pub struct RunOutput {
    pub session: Session,
    pub wssr_after_guess: f64,
    pub summary: String,
}

/// Load a data file into a fresh session and run the fit pipeline.
pub fn run_fit_file(data: &Path, config: &FitRunConfig) -> Result<RunOutput, SessionError> {
    let mut session = Session::new();
    session.load_file(0, data)?;
    run_fit_with_session(session, config)
}

/// Run the fit pipeline on a session whose default dataset already holds
/// data (used by `demo`, where the data is generated, not loaded).
pub fn run_fit_with_session(
    mut session: Session,
    config: &FitRunConfig,
) -> Result<RunOutput, SessionError> {
    session.set_fit_options(FitOptions {
        max_iterations: config.max_iterations,
        ..FitOptions::default()
    });

    for k in 0..config.peaks.max(1) {
        session.apply(Command::Guess {
            name: format!("peak{k}"),
            shape: config.shape,
            dataset: None,
        })?;
    }
    let wssr_after_guess = session.get_wssr(None)?;

    session.apply(Command::Fit {
        max_iterations: None,
    })?;

    let summary = report::format_run_summary(&session);

    if let Some(path) = &config.dump {
        session.apply(Command::Dump { path: path.clone() })?;
    }
    if let Some(path) = &config.export {
        io::write_session_json(path, &session)?;
    }

    Ok(RunOutput {
        session,
        wssr_after_guess,
        summary,
    })
}
