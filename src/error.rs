use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Request-level errors (rejected before any per-file work)
// ---------------------------------------------------------------------------

/// Axis slot manipulation failures. State is unchanged when one of these is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AxisError {
    #[error("Maximum {max} Y axes supported")]
    Capacity { max: usize },

    #[error("At least one Y axis is required")]
    LastSlot,

    #[error("No axis slot at index {index} ({len} slots)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A summary or export request that is missing a required selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("No files selected")]
    NoFilesSelected,

    #[error("A date/time column must be selected")]
    MissingTimeColumn,

    #[error("At least one data column must be bound to an axis")]
    NoBoundColumns,
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No data to export")]
    NoData,

    #[error("Writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Encoding tabular output: {0}")]
    Csv(#[from] csv::Error),

    #[error("No spreadsheet writer available for {0}")]
    SpreadsheetUnavailable(PathBuf),
}

// ---------------------------------------------------------------------------
// Configuration and settings
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid decimal separator '{0}' (expected '.' or ',')")]
    DecimalSeparator(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path} is not a JSON object: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
