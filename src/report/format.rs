//! Plain-text rendering of datasets, functions, and fit statistics.

use crate::data::Dataset;
use crate::domain::FitQuality;
use crate::models;
use crate::session::{PeakFunction, Session};

/// One-line description of a dataset (the `info data` payload).
pub fn format_data_info(index: usize, dataset: &Dataset) -> String {
    let stats = dataset.stats();
    let source = dataset
        .source
        .as_ref()
        .map(|p| format!(" from '{}'", p.display()))
        .unwrap_or_default();
    if stats.n_points == 0 {
        return format!("@{index}: '{}'{source}: empty", dataset.title);
    }
    format!(
        "@{index}: '{}'{source}: {} points, x in [{:.6}, {:.6}], y in [{:.6}, {:.6}]",
        dataset.title, stats.n_points, stats.x_min, stats.x_max, stats.y_min, stats.y_max,
    )
}

/// Listing of all functions with their states (the `info functions` payload).
pub fn format_functions(functions: &[PeakFunction]) -> String {
    if functions.is_empty() {
        return "No functions defined.".to_string();
    }
    functions
        .iter()
        .map(|f| {
            if f.state.is_initialized() {
                let params: Vec<String> = f.params.iter().map(|v| format!("{v:.6}")).collect();
                format!(
                    "%{} = {}({}) on @{} [{}]",
                    f.name,
                    f.shape.display_name(),
                    params.join(", "),
                    f.dataset,
                    f.state.display_name()
                )
            } else {
                format!(
                    "%{} = {} on @{} [{}]",
                    f.name,
                    f.shape.display_name(),
                    f.dataset,
                    f.state.display_name()
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Goodness-of-fit line: `WSSR=... DoF=... WSSR/DoF=... SSR=... R2=...`.
pub fn format_goodness(quality: &FitQuality) -> String {
    let wssr_dof = if quality.dof > 0 {
        quality.wssr / quality.dof as f64
    } else {
        f64::NAN
    };
    format!(
        "WSSR={:.6}  DoF={}  WSSR/DoF={:.6}  SSR={:.6}  R2={:.6}",
        quality.wssr, quality.dof, wssr_dof, quality.ssr, quality.rsquared,
    )
}

/// Full run summary for the CLI: data, functions with derived traits,
/// iteration report, goodness line.
pub fn format_run_summary(session: &Session) -> String {
    let mut out = String::new();

    out.push_str("Data:\n");
    for (i, dataset) in session.datasets().iter().enumerate() {
        out.push_str(&format_data_info(i, dataset));
        out.push('\n');
    }

    out.push_str("\nFunctions:\n");
    out.push_str(&format_functions(session.functions()));
    out.push('\n');
    for f in session.functions() {
        if f.state.is_initialized() {
            out.push_str(&format!(
                "  %{}: center={:.6} fwhm={:.6} area={:.6}\n",
                f.name,
                f.params[1],
                models::fwhm(f.shape, &f.params),
                models::area(f.shape, &f.params),
            ));
        }
    }

    if let Some(fit) = session.last_fit() {
        out.push_str(&format!(
            "\nFit: {} iterations ({} evaluations), WSSR {:.6e} -> {:.6e}\n",
            fit.iterations, fit.evaluations, fit.initial_wssr, fit.final_wssr,
        ));
    }

    if let Ok(quality) = session.quality(None) {
        out.push_str(&format_goodness(&quality));
        out.push('\n');
    }

    out
}
