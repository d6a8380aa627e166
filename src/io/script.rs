//! Script file reading.

use std::fs;
use std::path::Path;

use crate::error::SessionError;

/// Read a command script, checking the path first.
pub fn read_script(path: &Path) -> Result<String, SessionError> {
    if !path.exists() {
        return Err(SessionError::ResourceNotFound {
            path: path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(|e| {
        SessionError::command(format!("Failed to read '{}': {e}", path.display()))
    })
}
