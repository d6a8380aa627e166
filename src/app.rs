//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds a session and runs the requested workflow
//! - prints reports to stdout

use clap::Parser;

use crate::cli::{Command, DemoArgs, EvalArgs, FitArgs, RunArgs};
use crate::data::{SampleOptions, generate_gaussian_sample};
use crate::error::SessionError;
use crate::session::Session;

pub mod pipeline;

/// Entry point for the `pft` binary.
pub fn run() -> Result<(), SessionError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Run(args) => handle_run(args),
        Command::Eval(args) => handle_eval(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), SessionError> {
    let config = pipeline::FitRunConfig {
        shape: args.shape,
        peaks: args.peaks,
        max_iterations: args.max_iter,
        dump: args.dump,
        export: args.export,
    };
    let run = pipeline::run_fit_file(&args.data, &config)?;
    print!("{}", run.summary);
    Ok(())
}

fn handle_run(args: RunArgs) -> Result<(), SessionError> {
    let text = crate::io::read_script(&args.script)?;
    let mut session = Session::new();
    for output in session.run_script(&text)? {
        println!("{output}");
    }
    Ok(())
}

fn handle_eval(args: EvalArgs) -> Result<(), SessionError> {
    let session = Session::new();
    let value = session.calculate_expr(&args.expr)?;
    println!("{value}");
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), SessionError> {
    let sample = generate_gaussian_sample(&SampleOptions {
        n_points: args.points,
        seed: args.seed,
        noise: args.noise,
        ..SampleOptions::default()
    })?;

    let mut session = Session::new();
    session.load_data(0, sample.points, &sample.title)?;

    let config = pipeline::FitRunConfig {
        shape: crate::domain::ShapeKind::Gaussian,
        peaks: 1,
        max_iterations: 100,
        dump: args.dump,
        export: args.export,
    };
    let run = pipeline::run_fit_with_session(session, &config)?;
    print!("{}", run.summary);
    println!(
        "peak center: {}",
        run.session.calculate_expr("%peak0.center")?
    );
    Ok(())
}
