use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the analytics pipeline and its collaborators.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// The upload could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The upload is neither delimited text nor a workbook.
    #[error("Unsupported file type: {0} (expected .csv, .xlsx, .xls or .ods)")]
    UnsupportedFile(String),

    /// The delimited text could not be tokenized.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The workbook could not be opened or decoded.
    #[error("Failed to read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// The input is not a table (ragged rows, no header, ...).
    #[error("Input is not tabular: {0}")]
    Structure(String),

    /// Top-level failure of one pipeline invocation, carrying the cause.
    #[error("Processing failed: {0}")]
    Processing(#[source] Box<AnalyticsError>),

    /// A single chart could not be derived from the table.
    #[error("Chart '{chart}' failed: {reason}")]
    Chart { chart: String, reason: String },

    /// The renderer could not persist a chart.
    #[error("Render error: {0}")]
    Render(String),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The recommendation service answered with something unusable.
    #[error("Recommendation service error: {0}")]
    Recommendation(String),
}

impl AnalyticsError {
    /// Wrap a structural failure as the single caller-visible processing error.
    pub fn processing(cause: AnalyticsError) -> Self {
        match cause {
            AnalyticsError::Processing(_) => cause,
            other => AnalyticsError::Processing(Box::new(other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
