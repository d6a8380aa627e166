//! Session state as a replayable command script.
//!
//! The script is written in the session's own command language, so feeding
//! it back through `run_script` reconstructs the session: datasets point by
//! point, then function definitions with explicit parameter values.
//!
//! Floats are printed with Rust's shortest round-trip `Display`, which
//! makes dump -> replay reproduce statistics exactly.

use std::fmt::Write;

use crate::session::Session;

/// Render the full reconstruction script.
pub fn save_state(session: &Session) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "# {} {} session script. Created: {}",
        crate::TOOL_NAME,
        crate::VERSION,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    out.push_str("reset\n");

    out.push_str("# ------------ datasets ------------\n");
    for (i, dataset) in session.datasets().iter().enumerate() {
        if i != 0 {
            out.push_str("@+ = 0\n");
        }
        let _ = writeln!(out, "use @{i}");
        let _ = writeln!(out, "title = '{}'", dataset.title);
        let _ = writeln!(out, "M = {}", dataset.points.len());
        for (j, p) in dataset.points.iter().enumerate() {
            let _ = writeln!(out, "X[{j}] = {}, Y[{j}] = {}, S[{j}] = {}", p.x, p.y, p.sigma);
        }
    }

    out.push_str("# ------------ functions ------------\n");
    for f in session.functions() {
        let _ = writeln!(out, "use @{}", f.dataset);
        if f.state.is_initialized() {
            let params: Vec<String> = f.params.iter().map(|v| v.to_string()).collect();
            let _ = writeln!(
                out,
                "%{} = {}({})",
                f.name,
                f.shape.display_name(),
                params.join(", ")
            );
        } else {
            let _ = writeln!(out, "%{} = {}", f.name, f.shape.display_name());
        }
    }

    let _ = writeln!(out, "use @{}", session.default_dataset());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Point;

    #[test]
    fn script_reconstructs_datasets_and_functions() {
        let mut session = Session::new();
        session
            .load_data(
                0,
                vec![
                    Point::with_sigma(1.0, 2.0, 0.5),
                    Point::with_sigma(2.0, 3.0, 0.25),
                ],
                "tiny",
            )
            .unwrap();
        session.execute("@+ = 0").unwrap();
        session.execute("use @1").unwrap();
        session.execute("title = 'second'").unwrap();
        session.execute("use @0").unwrap();
        session.execute("%g = Gaussian(2.5, 1.5, 0.125)").unwrap();
        session.execute("%u = Lorentzian").unwrap();

        let script = session.save_state();
        let mut restored = Session::new();
        restored.run_script(&script).unwrap();

        assert_eq!(restored.datasets().len(), 2);
        assert_eq!(restored.datasets()[0].title, "tiny");
        assert_eq!(restored.datasets()[1].title, "second");
        assert_eq!(restored.datasets()[0].points.len(), 2);
        assert_eq!(restored.datasets()[0].points[1].sigma, 0.25);
        assert_eq!(restored.default_dataset(), 0);

        let g = restored.function("g").unwrap();
        assert_eq!(g.params, vec![2.5, 1.5, 0.125]);
        assert!(g.state.is_initialized());
        let u = restored.function("u").unwrap();
        assert!(!u.state.is_initialized());
    }

    #[test]
    fn header_and_reset_come_first() {
        let session = Session::new();
        let script = session.save_state();
        let mut lines = script.lines();
        assert!(lines.next().unwrap().starts_with("# peakfit"));
        assert_eq!(lines.next().unwrap(), "reset");
    }
}
