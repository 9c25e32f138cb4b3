//! Error types shared across the crate.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Everything that can abort a summary or a dashboard view.
#[derive(Error, Debug)]
pub enum DashError {
    #[error("Failed to fetch {source_name}: {reason}")]
    FetchFailure { source_name: String, reason: String },

    #[error("Column '{column}' not found (available: {})", available.join(", "))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    #[error("Dataset from {source_name} has no rows")]
    EmptyDataset { source_name: String },

    #[error("Non-numeric value '{value}' in column '{column}' (group '{category}')")]
    NonNumericValue {
        column: String,
        category: String,
        value: String,
    },

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] PolarsError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DashError>;
