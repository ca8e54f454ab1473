use std::path::{Path, PathBuf};
use thiserror::Error;

/// Structure store failures. Every one of them aborts a run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation on '{}' failed: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse '{}': {details} (at line ~{line})", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        details: String,
    },

    #[error("malformed JSON entry '{}': {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid entry '{}': {details}", .path.display())]
    Invalid { path: PathBuf, details: String },
}

impl Error {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn parse(path: &Path, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            line,
            details: details.into(),
        }
    }

    pub fn invalid(path: &Path, details: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.to_path_buf(),
            details: details.into(),
        }
    }
}
