//! The fitting session: datasets, functions, commands, and queries.
//!
//! A [`Session`] is the explicit, owning replacement for what the classic
//! engines expose as a process-global instance: it holds zero or more
//! datasets and named peak functions, executes commands one at a time, and
//! answers info/scalar/expression queries. Multiple independent sessions
//! can coexist in one process.
//!
//! Command flow is synchronous: `execute` (or the typed `apply`) either
//! fully applies a command or returns a typed error without rolling
//! anything back that it did not touch.

pub mod command;
pub mod state;

pub use command::{Command, Coord, PointAssign, parse_command};

use std::path::Path;

use log::{info, warn};

use crate::data::{Dataset, load_xy_file};
use crate::domain::{FitQuality, FitReport, FuncState, Point, ShapeKind};
use crate::error::SessionError;
use crate::expr::{self, ParamResolver};
use crate::fit::{FitOptions, FitProblem, Term, estimate_peak, run_lm};
use crate::models;

/// A named, shaped function owned by a session.
#[derive(Debug, Clone)]
pub struct PeakFunction {
    pub name: String,
    pub shape: ShapeKind,
    /// `[height, center, hwhm]`; meaningful only once `state` is
    /// initialized.
    pub params: Vec<f64>,
    pub state: FuncState,
    /// Index of the dataset this function is bound to.
    pub dataset: usize,
}

/// A self-contained fitting session.
#[derive(Debug)]
pub struct Session {
    datasets: Vec<Dataset>,
    functions: Vec<PeakFunction>,
    default_dataset: usize,
    last_fit: Option<FitReport>,
    fit_options: FitOptions,
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

impl Session {
    /// A fresh session: one empty default dataset (`@0`), no functions.
    pub fn new() -> Self {
        Session {
            datasets: vec![Dataset::new()],
            functions: Vec::new(),
            default_dataset: 0,
            last_fit: None,
            fit_options: FitOptions::default(),
        }
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn functions(&self) -> &[PeakFunction] {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&PeakFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn default_dataset(&self) -> usize {
        self.default_dataset
    }

    pub fn last_fit(&self) -> Option<&FitReport> {
        self.last_fit.as_ref()
    }

    /// Override the refinement options used by subsequent `fit` commands.
    pub fn set_fit_options(&mut self, options: FitOptions) {
        self.fit_options = options;
    }

    // ---- command execution ------------------------------------------------

    /// Parse and run one command line.
    ///
    /// Returns the command's text output, if it produced any (`info`
    /// without a redirect). Blank lines and comments return `Ok(None)`.
    pub fn execute(&mut self, line: &str) -> Result<Option<String>, SessionError> {
        match parse_command(line)? {
            Some(cmd) => self.apply(cmd),
            None => Ok(None),
        }
    }

    /// Run one typed command.
    pub fn apply(&mut self, cmd: Command) -> Result<Option<String>, SessionError> {
        match cmd {
            Command::Load { dataset, path } => {
                self.load_file(dataset, &path)?;
                Ok(None)
            }
            Command::AppendDataset => {
                self.datasets.push(Dataset::new());
                Ok(None)
            }
            Command::Use { dataset } => {
                self.check_dataset(dataset)?;
                self.default_dataset = dataset;
                Ok(None)
            }
            Command::Title { text } => {
                let d = self.default_dataset;
                self.datasets[d].title = text;
                Ok(None)
            }
            Command::Declare { name, shape } => {
                let dataset = self.default_dataset;
                self.upsert_function(PeakFunction {
                    name,
                    shape,
                    params: vec![0.0; shape.param_len()],
                    state: FuncState::Uninitialized,
                    dataset,
                });
                Ok(None)
            }
            Command::Define {
                name,
                shape,
                params,
            } => {
                let dataset = self.default_dataset;
                self.upsert_function(PeakFunction {
                    name,
                    shape,
                    params,
                    state: FuncState::Initialized,
                    dataset,
                });
                Ok(None)
            }
            Command::Guess {
                name,
                shape,
                dataset,
            } => {
                self.guess(&name, shape, dataset)?;
                Ok(None)
            }
            Command::Fit { max_iterations } => {
                self.fit(max_iterations)?;
                Ok(None)
            }
            Command::Info {
                topic,
                dataset,
                redirect,
            } => {
                let text = self.get_info(&topic, dataset)?;
                match redirect {
                    Some(path) => {
                        crate::io::write_text(&path, &text)?;
                        Ok(None)
                    }
                    None => Ok(Some(text)),
                }
            }
            Command::Dump { path } => {
                crate::io::write_text(&path, &self.save_state())?;
                Ok(None)
            }
            Command::Resize { n } => {
                let d = self.default_dataset;
                self.datasets[d]
                    .points
                    .resize(n, Point::with_sigma(0.0, 0.0, 1.0));
                Ok(None)
            }
            Command::SetPoints { assigns } => {
                let d = self.default_dataset;
                let points = &mut self.datasets[d].points;
                for a in &assigns {
                    let Some(p) = points.get_mut(a.index) else {
                        return Err(SessionError::command(format!(
                            "Point index {} out of range (M = {}).",
                            a.index,
                            points.len()
                        )));
                    };
                    match a.coord {
                        Coord::X => p.x = a.value,
                        Coord::Y => p.y = a.value,
                        Coord::S => p.sigma = a.value,
                    }
                }
                Ok(None)
            }
            Command::Delete { name } => {
                let before = self.functions.len();
                self.functions.retain(|f| f.name != name);
                if self.functions.len() == before {
                    return Err(SessionError::command(format!(
                        "Undefined function: '%{name}'."
                    )));
                }
                Ok(None)
            }
            Command::Reset => {
                let options = self.fit_options.clone();
                *self = Session::new();
                self.fit_options = options;
                Ok(None)
            }
        }
    }

    /// Execute a script: one command per line.
    ///
    /// Stops at the first failing line and reports it with its line
    /// number. Returns the text output the commands produced, in order.
    pub fn run_script(&mut self, text: &str) -> Result<Vec<String>, SessionError> {
        let mut outputs = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let out = self.execute(line).map_err(|e| match e {
                SessionError::Command { message } => {
                    SessionError::command(format!("Line {}: {message}", idx + 1))
                }
                other => other,
            })?;
            if let Some(out) = out {
                outputs.push(out);
            }
        }
        Ok(outputs)
    }

    // ---- data entry -------------------------------------------------------

    /// Load a data file into slot `dataset`.
    ///
    /// The slot must exist or be the next free index (which appends).
    pub fn load_file(&mut self, dataset: usize, path: &Path) -> Result<(), SessionError> {
        if dataset > self.datasets.len() {
            return Err(SessionError::command(format!(
                "No such dataset: '@{dataset}'."
            )));
        }
        let (loaded, summary) = load_xy_file(path)?;
        for e in &summary.row_errors {
            warn!("{}:{}: {}", path.display(), e.line, e.message);
        }
        info!(
            "loaded '{}': {} of {} rows",
            path.display(),
            summary.rows_used,
            summary.rows_read
        );
        if dataset == self.datasets.len() {
            self.datasets.push(loaded);
        } else {
            self.datasets[dataset] = loaded;
        }
        Ok(())
    }

    /// Replace the points of slot `dataset` (appending it if it is the next
    /// free index).
    pub fn load_data(
        &mut self,
        dataset: usize,
        points: Vec<Point>,
        title: &str,
    ) -> Result<(), SessionError> {
        if dataset > self.datasets.len() {
            return Err(SessionError::command(format!(
                "No such dataset: '@{dataset}'."
            )));
        }
        let mut d = Dataset::new();
        d.title = title.to_string();
        d.set_points(points);
        if dataset == self.datasets.len() {
            self.datasets.push(d);
        } else {
            self.datasets[dataset] = d;
        }
        Ok(())
    }

    /// Append one point to the default dataset.
    pub fn add_point(&mut self, x: f64, y: f64, sigma: f64) {
        let d = self.default_dataset;
        self.datasets[d].add_point(Point::with_sigma(x, y, sigma));
    }

    // ---- queries ----------------------------------------------------------

    /// Human-readable info for a topic.
    pub fn get_info(&self, topic: &str, dataset: Option<usize>) -> Result<String, SessionError> {
        match topic {
            "version" => Ok(format!("{} {}", crate::TOOL_NAME, crate::VERSION)),
            "data" => match dataset {
                Some(d) => {
                    self.check_dataset(d)?;
                    Ok(crate::report::format_data_info(d, &self.datasets[d]))
                }
                None => Ok(self
                    .datasets
                    .iter()
                    .enumerate()
                    .map(|(i, ds)| crate::report::format_data_info(i, ds))
                    .collect::<Vec<_>>()
                    .join("\n")),
            },
            "title" => {
                let d = self.resolve_dataset(dataset)?;
                Ok(self.datasets[d].title.clone())
            }
            "filename" => {
                let d = self.resolve_dataset(dataset)?;
                Ok(self.datasets[d]
                    .source
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default())
            }
            "functions" => Ok(crate::report::format_functions(&self.functions)),
            "types" => Ok(ShapeKind::all()
                .iter()
                .map(|s| s.display_name())
                .collect::<Vec<_>>()
                .join(" ")),
            "formula" => {
                let d = self.resolve_dataset(dataset)?;
                Ok(self.formula(d))
            }
            "fit" => {
                let quality = self.quality(dataset)?;
                Ok(crate::report::format_goodness(&quality))
            }
            "dataset_count" => Ok(self.datasets.len().to_string()),
            "state" => Ok(self.save_state()),
            other => Err(SessionError::UnknownTopic {
                topic: other.to_string(),
            }),
        }
    }

    /// A named numeric statistic.
    pub fn get_scalar(&self, name: &str) -> Result<f64, SessionError> {
        match name {
            "wssr" => self.get_wssr(None),
            "ssr" => self.get_ssr(None),
            "rsquared" => self.get_rsquared(None),
            "dof" => self.get_dof(None).map(|v| v as f64),
            "parameter_count" => Ok(self
                .functions
                .iter()
                .filter(|f| f.state.is_initialized())
                .map(|f| f.params.len())
                .sum::<usize>() as f64),
            "dataset_count" => Ok(self.datasets.len() as f64),
            other => Err(SessionError::UnknownTopic {
                topic: other.to_string(),
            }),
        }
    }

    /// Weighted sum of squared residuals for one dataset, or all of them.
    pub fn get_wssr(&self, dataset: Option<usize>) -> Result<f64, SessionError> {
        Ok(self.quality(dataset)?.wssr)
    }

    /// Unweighted sum of squared residuals.
    pub fn get_ssr(&self, dataset: Option<usize>) -> Result<f64, SessionError> {
        Ok(self.quality(dataset)?.ssr)
    }

    /// Coefficient of determination against the weighted mean.
    pub fn get_rsquared(&self, dataset: Option<usize>) -> Result<f64, SessionError> {
        Ok(self.quality(dataset)?.rsquared)
    }

    /// Degrees of freedom: points minus fitted parameters.
    pub fn get_dof(&self, dataset: Option<usize>) -> Result<i64, SessionError> {
        Ok(self.quality(dataset)?.dof)
    }

    /// Fit quality for one dataset, or all datasets together.
    pub fn quality(&self, dataset: Option<usize>) -> Result<FitQuality, SessionError> {
        let targets: Vec<usize> = match dataset {
            Some(d) => {
                self.check_dataset(d)?;
                vec![d]
            }
            None => (0..self.datasets.len()).collect(),
        };
        let active: Vec<usize> = targets
            .into_iter()
            .filter(|&d| self.has_initialized_functions(d))
            .collect();
        if active.is_empty() {
            return Err(SessionError::NoFitYet);
        }

        let mut wssr = 0.0;
        let mut ssr = 0.0;
        let mut n_points = 0usize;
        let mut sw = 0.0;
        let mut swy = 0.0;
        for &d in &active {
            for p in &self.datasets[d].points {
                let r = p.y - self.model_value(d, p.x);
                let w = 1.0 / (p.sigma * p.sigma);
                wssr += w * r * r;
                ssr += r * r;
                sw += w;
                swy += w * p.y;
                n_points += 1;
            }
        }

        // Weighted total sum of squares around the weighted mean.
        let ybar = if sw > 0.0 { swy / sw } else { 0.0 };
        let mut st = 0.0;
        for &d in &active {
            for p in &self.datasets[d].points {
                let dy = p.y - ybar;
                st += dy * dy / (p.sigma * p.sigma);
            }
        }
        let rsquared = if st > 0.0 { 1.0 - wssr / st } else { f64::NAN };

        let n_params: usize = self
            .functions
            .iter()
            .filter(|f| f.state.is_initialized() && active.contains(&f.dataset))
            .map(|f| f.params.len())
            .sum();

        Ok(FitQuality {
            wssr,
            ssr,
            rsquared,
            dof: n_points as i64 - n_params as i64,
            n_points,
        })
    }

    /// Evaluate an arithmetic expression, resolving `%name.param` against
    /// this session's functions.
    pub fn calculate_expr(&self, expression: &str) -> Result<f64, SessionError> {
        expr::evaluate(expression, self)
    }

    /// Render the full state reconstruction script.
    pub fn save_state(&self) -> String {
        state::save_state(self)
    }

    /// Model value of dataset `d` at `x`: the sum of its initialized
    /// functions.
    pub fn model_value(&self, d: usize, x: f64) -> f64 {
        self.functions
            .iter()
            .filter(|f| f.dataset == d && f.state.is_initialized())
            .map(|f| models::value(f.shape, x, &f.params))
            .sum()
    }

    // ---- internals --------------------------------------------------------

    fn check_dataset(&self, d: usize) -> Result<(), SessionError> {
        if d < self.datasets.len() {
            Ok(())
        } else {
            Err(SessionError::command(format!("No such dataset: '@{d}'.")))
        }
    }

    fn resolve_dataset(&self, dataset: Option<usize>) -> Result<usize, SessionError> {
        match dataset {
            Some(d) => {
                self.check_dataset(d)?;
                Ok(d)
            }
            None => Ok(self.default_dataset),
        }
    }

    fn has_initialized_functions(&self, d: usize) -> bool {
        self.functions
            .iter()
            .any(|f| f.dataset == d && f.state.is_initialized())
    }

    fn formula(&self, d: usize) -> String {
        let parts: Vec<String> = self
            .functions
            .iter()
            .filter(|f| f.dataset == d && f.state.is_initialized())
            .map(|f| models::formula(f.shape, &f.params))
            .collect();
        if parts.is_empty() {
            "0".to_string()
        } else {
            parts.join(" + ")
        }
    }

    /// Replace a function with the same name, or add a new one.
    fn upsert_function(&mut self, function: PeakFunction) {
        match self.functions.iter_mut().find(|f| f.name == function.name) {
            Some(slot) => *slot = function,
            None => self.functions.push(function),
        }
    }

    fn guess(
        &mut self,
        name: &str,
        shape: ShapeKind,
        dataset: Option<usize>,
    ) -> Result<(), SessionError> {
        let d = self.resolve_dataset(dataset)?;
        let points = &self.datasets[d].points;
        if points.is_empty() {
            return Err(SessionError::command("guess: empty range"));
        }

        // Estimate against the residual after subtracting the *other*
        // initialized functions on this dataset, so successive guesses pick
        // off successive peaks.
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = points
            .iter()
            .map(|p| {
                let others: f64 = self
                    .functions
                    .iter()
                    .filter(|f| f.dataset == d && f.state.is_initialized() && f.name != name)
                    .map(|f| models::value(f.shape, p.x, &f.params))
                    .sum();
                p.y - others
            })
            .collect();

        let estimate = estimate_peak(&xs, &ys)?;
        info!(
            "guess %{name} = {}: center={:.6} height={:.6} hwhm={:.6}",
            shape.display_name(),
            estimate.center,
            estimate.height,
            estimate.hwhm
        );
        self.upsert_function(PeakFunction {
            name: name.to_string(),
            shape,
            params: vec![estimate.height, estimate.center, estimate.hwhm],
            state: FuncState::Initialized,
            dataset: d,
        });
        Ok(())
    }

    fn fit(&mut self, max_iterations: Option<usize>) -> Result<(), SessionError> {
        // Flatten all initialized functions into one parameter vector; one
        // block per dataset that has any.
        let fitted: Vec<usize> = self
            .functions
            .iter()
            .enumerate()
            .filter(|(_, f)| f.state.is_initialized())
            .map(|(i, _)| i)
            .collect();
        if fitted.is_empty() {
            return Err(SessionError::command("Nothing to fit."));
        }

        let mut params = Vec::new();
        let mut offsets = Vec::with_capacity(fitted.len());
        for &i in &fitted {
            offsets.push(params.len());
            params.extend_from_slice(&self.functions[i].params);
        }

        let mut problem = FitProblem::new(params.len());
        for (d, dataset) in self.datasets.iter().enumerate() {
            let terms: Vec<Term> = fitted
                .iter()
                .zip(offsets.iter())
                .filter(|&(&i, _)| self.functions[i].dataset == d)
                .map(|(&i, &offset)| Term {
                    shape: self.functions[i].shape,
                    offset,
                })
                .collect();
            if !terms.is_empty() {
                problem.add_block(&dataset.points, terms);
            }
        }

        let mut options = self.fit_options.clone();
        if let Some(n) = max_iterations {
            options.max_iterations = n;
        }

        let outcome = run_lm(&problem, &params, &options)?;
        info!(
            "fit: wssr {:.6e} -> {:.6e} in {} iterations ({} evaluations)",
            outcome.initial_wssr, outcome.final_wssr, outcome.iterations, outcome.evaluations
        );

        for (&i, &offset) in fitted.iter().zip(offsets.iter()) {
            let len = self.functions[i].params.len();
            self.functions[i]
                .params
                .copy_from_slice(&outcome.params[offset..offset + len]);
            self.functions[i].state = FuncState::Fitted;
        }
        self.last_fit = Some(FitReport {
            iterations: outcome.iterations,
            evaluations: outcome.evaluations,
            initial_wssr: outcome.initial_wssr,
            final_wssr: outcome.final_wssr,
        });
        Ok(())
    }
}

impl ParamResolver for Session {
    fn resolve(&self, func: &str, param: &str) -> Result<f64, SessionError> {
        let Some(f) = self.function(func) else {
            return Err(SessionError::expression(format!(
                "Undefined function: '%{func}'."
            )));
        };
        if !f.state.is_initialized() {
            return Err(SessionError::NoFitYet);
        }
        let param = param.to_ascii_lowercase();
        if let Some(idx) = f
            .shape
            .param_names()
            .iter()
            .position(|n| *n == param.as_str())
        {
            return Ok(f.params[idx]);
        }
        match param.as_str() {
            "area" => Ok(models::area(f.shape, &f.params)),
            "fwhm" => Ok(models::fwhm(f.shape, &f.params)),
            _ => Err(SessionError::expression(format!(
                "%{func} has no parameter '{param}'."
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SampleOptions, generate_gaussian_sample};

    fn noisy_gaussian_session() -> Session {
        let sample = generate_gaussian_sample(&SampleOptions::default()).unwrap();
        let mut session = Session::new();
        session
            .load_data(0, sample.points, &sample.title)
            .unwrap();
        session
    }

    #[test]
    fn fresh_session_is_empty() {
        let session = Session::new();
        assert_eq!(session.datasets().len(), 1);
        assert!(session.datasets()[0].points.is_empty());
        assert!(session.functions().is_empty());
    }

    #[test]
    fn version_info_is_non_empty() {
        let session = Session::new();
        let version = session.get_info("version", None).unwrap();
        assert!(version.starts_with("peakfit "));
    }

    #[test]
    fn unknown_topic_is_typed() {
        let session = Session::new();
        let err = session.get_info("weather", None).unwrap_err();
        assert!(matches!(err, SessionError::UnknownTopic { .. }));
        let err = session.get_scalar("entropy").unwrap_err();
        assert!(matches!(err, SessionError::UnknownTopic { .. }));
    }

    #[test]
    fn ln_two_through_the_session() {
        let session = Session::new();
        let v = session.calculate_expr("ln(2)").unwrap();
        assert!((v - 0.693147181).abs() < 1e-6);
    }

    #[test]
    fn wssr_before_any_model_is_no_fit_yet() {
        let session = noisy_gaussian_session();
        assert!(matches!(
            session.get_wssr(None),
            Err(SessionError::NoFitYet)
        ));
        assert!(matches!(
            session.get_scalar("wssr"),
            Err(SessionError::NoFitYet)
        ));
    }

    #[test]
    fn uninitialized_function_rejects_parameter_reads() {
        let mut session = noisy_gaussian_session();
        session.execute("%g = Gaussian").unwrap();
        assert!(matches!(
            session.calculate_expr("%g.center"),
            Err(SessionError::NoFitYet)
        ));
        // The declared-but-empty function cannot contribute a model either.
        assert!(matches!(
            session.get_wssr(None),
            Err(SessionError::NoFitYet)
        ));
    }

    #[test]
    fn guess_then_fit_recovers_the_center() {
        let mut session = noisy_gaussian_session();
        session.execute("guess %gauss = Gaussian").unwrap();

        let wssr_after_guess = session.get_wssr(None).unwrap();
        session.execute("fit").unwrap();
        let wssr_after_fit = session.get_wssr(None).unwrap();
        assert!(wssr_after_fit <= wssr_after_guess);

        // Data range is 5 wide; 1% of it.
        let center = session.calculate_expr("%gauss.center").unwrap();
        assert!((center - 12.345).abs() < 0.05, "center {center}");
        // Case-insensitive parameter names, as driver scripts spell both.
        let center2 = session.calculate_expr("%gauss.Center").unwrap();
        assert_eq!(center, center2);
    }

    #[test]
    fn fit_without_functions_is_rejected() {
        let mut session = noisy_gaussian_session();
        let err = session.execute("fit").unwrap_err();
        assert!(matches!(err, SessionError::Command { .. }));
    }

    #[test]
    fn load_missing_file_leaves_session_untouched() {
        let mut session = Session::new();
        let err = session.execute("@0 < '/no/such/file.dat'").unwrap_err();
        assert!(matches!(err, SessionError::ResourceNotFound { .. }));
        assert!(session.datasets()[0].points.is_empty());
    }

    #[test]
    fn data_info_is_non_empty_after_load() {
        let session = noisy_gaussian_session();
        let info = session.get_info("data", Some(0)).unwrap();
        assert!(!info.is_empty());
        assert!(info.contains("500 points"));
    }

    #[test]
    fn second_guess_picks_the_second_peak() {
        let mut session = Session::new();
        let p1 = [100.0, 3.0, 0.4];
        let p2 = [60.0, 7.0, 0.5];
        let points: Vec<Point> = (0..400)
            .map(|i| {
                let x = i as f64 / 40.0;
                let y = models::value(ShapeKind::Gaussian, x, &p1)
                    + models::value(ShapeKind::Gaussian, x, &p2);
                Point::with_sigma(x, y, 1.0)
            })
            .collect();
        session.load_data(0, points, "two peaks").unwrap();

        session.execute("guess %a = Gaussian").unwrap();
        session.execute("guess %b = Gaussian").unwrap();
        session.execute("fit").unwrap();

        let a = session.calculate_expr("%a.center").unwrap();
        let b = session.calculate_expr("%b.center").unwrap();
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        assert!((lo - 3.0).abs() < 0.1, "first center {lo}");
        assert!((hi - 7.0).abs() < 0.1, "second center {hi}");
    }

    #[test]
    fn dump_then_reload_round_trips_wssr() {
        let mut session = noisy_gaussian_session();
        session.execute("guess %gauss = Gaussian").unwrap();
        session.execute("fit").unwrap();
        let wssr_before = session.get_wssr(None).unwrap();

        let script = session.save_state();
        let mut restored = Session::new();
        restored.run_script(&script).unwrap();

        let wssr_after = restored.get_wssr(None).unwrap();
        assert!(
            (wssr_before - wssr_after).abs() <= 1e-9 * wssr_before.abs().max(1.0),
            "wssr {wssr_before} vs {wssr_after}"
        );
        let center = restored.calculate_expr("%gauss.center").unwrap();
        assert!((center - 12.345).abs() < 0.05);
    }

    #[test]
    fn reset_clears_everything() {
        let mut session = noisy_gaussian_session();
        session.execute("guess %g = Gaussian").unwrap();
        session.execute("reset").unwrap();
        assert!(session.functions().is_empty());
        assert_eq!(session.datasets().len(), 1);
        assert!(session.datasets()[0].points.is_empty());
    }

    #[test]
    fn delete_and_redefine_functions() {
        let mut session = noisy_gaussian_session();
        session.execute("%g = Gaussian(100, 12.3, 0.9)").unwrap();
        assert!(session.calculate_expr("%g.height").is_ok());
        session.execute("delete %g").unwrap();
        assert!(session.execute("delete %g").is_err());
        assert!(matches!(
            session.calculate_expr("%g.height"),
            Err(SessionError::Expression { .. })
        ));
    }

    #[test]
    fn failed_fit_command_leaves_state_alone() {
        let mut session = Session::new();
        // Only two points for three parameters.
        session.add_point(0.0, 1.0, 1.0);
        session.add_point(1.0, 2.0, 1.0);
        session.execute("%g = Gaussian(1, 0.5, 1)").unwrap();
        let before = session.function("g").unwrap().params.clone();
        assert!(session.execute("fit").is_err());
        let after = session.function("g").unwrap();
        assert_eq!(after.params, before);
        assert_eq!(after.state, FuncState::Initialized);
    }

    #[test]
    fn derived_parameters_are_available() {
        let mut session = Session::new();
        session.add_point(0.0, 1.0, 1.0);
        session.execute("%g = Gaussian(100, 0, 0.5)").unwrap();
        let fwhm = session.calculate_expr("%g.fwhm").unwrap();
        assert_eq!(fwhm, 1.0);
        let area = session.calculate_expr("%g.area").unwrap();
        let expected = 100.0 * 0.5 * (std::f64::consts::PI / std::f64::consts::LN_2).sqrt();
        assert!((area - expected).abs() < 1e-9);
        assert!(matches!(
            session.calculate_expr("%g.tail"),
            Err(SessionError::Expression { .. })
        ));
    }
}
