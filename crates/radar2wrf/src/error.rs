//! Error types for the radar2wrf crate.

use std::path::PathBuf;

use cappi_reader::ReaderError;
use thiserror::Error;

/// Errors that can occur before a report starts streaming.
///
/// These are returned synchronously from [`crate::convert`], so a caller never
/// sees a partial report followed by one of them.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Invalid timestamp key '{0}': expected YYYYMMDDHH or YYYYMMDDHHMM")]
    InvalidTimestamp(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read CAPPI data: {0}")]
    Reader(#[from] ReaderError),

    #[error("Missing required data: {0}")]
    NotFound(String),

    #[error("Grid shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to start report writer: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Coarse classification of a [`ConvertError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required data was missing from an otherwise readable input.
    NotFound,
    /// Reading the input failed.
    Io,
    /// The timestamp key did not match a supported format.
    InvalidTimestamp,
    /// A band reader handle was opened or closed out of sequence.
    Reentrancy,
    /// The converter was configured with invalid settings.
    Config,
}

impl ConvertError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::InvalidTimestamp(_) => ErrorKind::InvalidTimestamp,
            ConvertError::Reader(e) if e.is_reentrancy() => ErrorKind::Reentrancy,
            ConvertError::Io { .. } | ConvertError::Reader(_) | ConvertError::Spawn(_) => {
                ErrorKind::Io
            }
            ConvertError::NotFound(_) | ConvertError::ShapeMismatch(_) => ErrorKind::NotFound,
            ConvertError::InvalidConfig(_) => ErrorKind::Config,
        }
    }
}

/// Result type for conversion setup.
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Errors raised while a report is being serialized.
///
/// These happen after the caller has started reading, so they travel through
/// the report stream as its terminal frame.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("{field} value {value} does not fit in {width} columns")]
    FieldOverflow {
        field: &'static str,
        value: f64,
        width: usize,
    },

    #[error("{field} value is not finite")]
    NonFinite { field: &'static str },

    #[error("No {axis} coordinate for grid index {index}")]
    MissingCoordinate { axis: &'static str, index: usize },

    #[error("Grid has observations but no time instants")]
    MissingInstant,

    #[error("Report reader went away")]
    Disconnected,

    #[error("Report stream ended without a terminal frame")]
    Truncated,

    #[error("Report writer panicked: {0}")]
    Panicked(String),
}
