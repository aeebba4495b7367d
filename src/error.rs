//! Error types for sample generation.
//!
//! Every variant is fatal: the generator is a one-shot batch run and aborts on
//! the first failure.

use std::path::PathBuf;
use thiserror::Error;

pub type GenerateResult<T> = Result<T, GenerateError>;

#[derive(Error, Debug)]
pub enum GenerateError {
    /// Category list file is absent or unreadable
    #[error("cannot read category list {}: {source}", path.display())]
    MissingInputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No usable labels after dropping blank lines
    #[error("no categories found in {origin}")]
    EmptyInput { origin: String },

    #[error("ring increment must be positive, got {increment}")]
    InvalidIncrement { increment: f64 },

    #[error("a ring needs at least 3 boundary segments, got {segments}")]
    InvalidSegments { segments: usize },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Sink rejected a record or failed to persist it
    #[error("failed to write {}: {message}", path.display())]
    OutputWrite { path: PathBuf, message: String },
}

impl GenerateError {
    pub(crate) fn output(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        GenerateError::OutputWrite {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
