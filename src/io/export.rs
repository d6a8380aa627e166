//! Export a session summary to JSON.
//!
//! The export is the "portable" representation of a fitted session:
//! per-dataset stats, functions with their parameters, and overall fit
//! quality. The schema is defined by `domain::SessionExport`.

use std::fs::File;
use std::path::Path;

use crate::domain::{DatasetExport, FunctionExport, SessionExport};
use crate::error::SessionError;
use crate::session::Session;

/// Build the export schema from live session state.
pub fn session_export(session: &Session) -> SessionExport {
    SessionExport {
        tool: crate::TOOL_NAME.to_string(),
        created: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        datasets: session
            .datasets()
            .iter()
            .map(|d| DatasetExport {
                title: d.title.clone(),
                source: d.source.as_ref().map(|p| p.display().to_string()),
                stats: d.stats(),
            })
            .collect(),
        functions: session
            .functions()
            .iter()
            .map(|f| FunctionExport {
                name: f.name.clone(),
                shape: f.shape,
                state: f.state.display_name().to_string(),
                params: f.params.clone(),
            })
            .collect(),
        quality: session.quality(None).ok(),
    }
}

/// Write the session summary JSON file.
pub fn write_session_json(path: &Path, session: &Session) -> Result<(), SessionError> {
    let file = File::create(path).map_err(|e| {
        SessionError::command(format!(
            "Failed to create export JSON '{}': {e}",
            path.display()
        ))
    })?;
    serde_json::to_writer_pretty(file, &session_export(session))
        .map_err(|e| SessionError::command(format!("Failed to write export JSON: {e}")))?;
    Ok(())
}
