//! Error types shared by the parsers, the aggregator and the binaries

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can stop a sample or a whole run.
///
/// Missing or malformed *content* is never an error: parsers return `None`
/// for absent records and drop single bad fields. Only I/O and run-level
/// conditions end up here.
#[derive(Debug, Error)]
pub enum QcError {
    /// Input root does not exist; the run aborts before parsing anything
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Discovery finished without a single matching input
    #[error("No {pattern} files found in {}", .root.display())]
    NoInputs { root: PathBuf, pattern: String },

    /// Reading a source file failed
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exists but holds none of the expected structure
    #[error("{} is not a recognisable {format} file", .path.display())]
    Unrecognized { path: PathBuf, format: &'static str },

    /// Threshold or layout configuration rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
}

impl QcError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, QcError>;
