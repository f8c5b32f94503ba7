//! Error types for omni-source.

use std::path::PathBuf;

use thiserror::Error;

/// Setup-time failures while reading a desired-state file.
///
/// Any of these stops the run before a single user is processed.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file named on the command line does not exist.
    #[error("{role} file not found: {path}")]
    NotFound { role: &'static str, path: PathBuf },

    /// Underlying I/O failure, annotated with the file path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected the file.
    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: ::csv::Error,
    },

    /// The JSON document did not parse.
    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A CSV header row lacks a column the format requires.
    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    /// The JSON document parsed but has no recognizable user list.
    #[error("{path}: {message}")]
    Shape { path: PathBuf, message: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SourceError {
    SourceError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn ensure_exists(role: &'static str, path: &std::path::Path) -> Result<(), SourceError> {
    if path.exists() {
        Ok(())
    } else {
        Err(SourceError::NotFound {
            role,
            path: path.to_path_buf(),
        })
    }
}
