//! Text-file dataset loading and normalization.
//!
//! This module turns a two/three-column numeric text file into a clean
//! `Dataset` that is safe to fit.
//!
//! Design goals:
//! - **Checked path** before anything else (missing file -> typed error,
//!   no session mutation)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Separation of concerns**: no fitting logic here

use std::fs;
use std::path::Path;

use crate::data::Dataset;
use crate::domain::Point;
use crate::error::SessionError;

/// A row-level error encountered during load.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Load outcome: the rows that were read, used, and skipped.
#[derive(Debug, Clone)]
pub struct LoadSummary {
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: Vec<RowError>,
}

/// Load a two/three-column `(x, y[, sigma])` text file.
///
/// Whitespace- or comma-separated columns; blank lines and `#` comments are
/// skipped. Two-column rows get the default sigma `max(sqrt(|y|), 1)`.
/// Fails only when the path is missing, unreadable, or no valid rows remain.
pub fn load_xy_file(path: &Path) -> Result<(Dataset, LoadSummary), SessionError> {
    if !path.exists() {
        return Err(SessionError::ResourceNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = fs::read_to_string(path).map_err(|e| {
        SessionError::command(format!("Failed to read '{}': {e}", path.display()))
    })?;

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        rows_read += 1;
        match parse_row(line) {
            Ok(point) => points.push(point),
            Err(message) => row_errors.push(RowError {
                line: idx + 1,
                message,
            }),
        }
    }

    if points.is_empty() {
        return Err(SessionError::command(format!(
            "No valid data rows in '{}'.",
            path.display()
        )));
    }

    let rows_used = points.len();
    let mut dataset = Dataset::new();
    dataset.title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dataset.source = Some(path.to_path_buf());
    dataset.set_points(points);

    Ok((
        dataset,
        LoadSummary {
            rows_read,
            rows_used,
            row_errors,
        },
    ))
}

fn parse_row(line: &str) -> Result<Point, String> {
    let fields: Vec<&str> = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|f| !f.is_empty())
        .collect();

    if fields.len() < 2 || fields.len() > 3 {
        return Err(format!("expected 2 or 3 columns, found {}", fields.len()));
    }

    let mut values = [0.0f64; 3];
    for (j, field) in fields.iter().enumerate() {
        values[j] = field
            .parse::<f64>()
            .map_err(|_| format!("column {} is not a number: '{field}'", j + 1))?;
        if !values[j].is_finite() {
            return Err(format!("column {} is not finite", j + 1));
        }
    }

    if fields.len() == 3 {
        if values[2] <= 0.0 {
            return Err(format!("sigma must be positive, found {}", values[2]));
        }
        Ok(Point::with_sigma(values[0], values[1], values[2]))
    } else {
        Ok(Point::new(values[0], values[1]))
    }
}
