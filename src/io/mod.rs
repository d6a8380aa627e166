//! Input/output helpers.
//!
//! - script file reading (`script`)
//! - session summary JSON export (`export`)
//! - shared text writing used by `dump` and info redirects

pub mod export;
pub mod script;

pub use export::*;
pub use script::*;

use std::fs;
use std::path::Path;

use crate::error::SessionError;

/// Write text to a file, mapping failures to a command error.
pub fn write_text(path: &Path, text: &str) -> Result<(), SessionError> {
    fs::write(path, text).map_err(|e| {
        SessionError::command(format!("Failed to write '{}': {e}", path.display()))
    })
}
