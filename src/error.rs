//! Error types for stress linearization

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for linearization operations
#[derive(Error, Debug)]
pub enum LinearizationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Triaxiality factor undefined on line {line} at point {point}: von Mises stress is zero")]
    IndeterminateTriaxiality { line: usize, point: usize },

    #[error("Case '{0}' not found")]
    CaseNotFound(String),

    #[error("Parse error in {path:?} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl LinearizationError {
    /// Whether a batch may skip the offending case and keep going.
    ///
    /// Data problems confined to one case are recoverable; I/O and
    /// serialization failures are not.
    pub fn is_case_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::DegenerateGeometry(_)
                | Self::MissingData(_)
                | Self::CaseNotFound(_)
        )
    }
}

/// Result type for linearization operations
pub type LinResult<T> = Result<T, LinearizationError>;
