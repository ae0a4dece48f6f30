// ⚠️ Error types for the harmonization library
//
// Resolution failures are NOT errors (see `Resolution::unresolved`).
// Only I/O, parsing and configuration problems end up here.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The reference dataset is absent, so the registry could not even be attempted.
    #[error("reference dataset not found: {0}")]
    ReferenceNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("{name} must be within 0.0..=1.0, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("column '{column}' not found in {source_name}")]
    MissingColumn { column: String, source_name: String },
}
