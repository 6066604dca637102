//! CLI error type.

use std::path::PathBuf;

use texture2dstudio::CodecError;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid combination of arguments.
    #[error("Invalid arguments: {0}")]
    Args(String),

    /// Failed to read an input file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Codec failure.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Codec(e) if e.is_fatal() => 2,
            _ => 1,
        }
    }
}
