//! Error type shared by the session library and the CLI.
//!
//! Every failure a session can report is one of a small set of kinds, so
//! callers (scripts, the CLI) can branch on *what* went wrong without
//! parsing messages. The CLI maps each kind to a stable process exit code.

use std::path::PathBuf;

use thiserror::Error;

/// All errors surfaced by a [`crate::session::Session`].
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// A dataset or script path does not exist.
    ///
    /// Checked before any command touches session state, so a failed load
    /// leaves the session exactly as it was.
    #[error("File '{}' not found.", path.display())]
    ResourceNotFound { path: PathBuf },

    /// A malformed or rejected command (bad syntax, undefined dataset or
    /// function, nothing to fit, command-level I/O failure).
    #[error("{message}")]
    Command { message: String },

    /// An `info` or scalar topic the session does not recognize.
    #[error("Unknown topic: '{topic}'.")]
    UnknownTopic { topic: String },

    /// A model statistic or parameter was read before any successful
    /// `guess` or `fit` produced values to read.
    #[error("No fit has been performed yet.")]
    NoFitYet,

    /// A syntax error or unknown reference inside an expression.
    #[error("{message}")]
    Expression { message: String },
}

impl SessionError {
    pub fn command(message: impl Into<String>) -> Self {
        SessionError::Command {
            message: message.into(),
        }
    }

    pub fn expression(message: impl Into<String>) -> Self {
        SessionError::Expression {
            message: message.into(),
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            SessionError::ResourceNotFound { .. } | SessionError::Command { .. } => 2,
            SessionError::UnknownTopic { .. } => 3,
            SessionError::NoFitYet => 4,
            SessionError::Expression { .. } => 5,
        }
    }
}
