//! Error types for CAPPI band reading.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for band reader operations.
pub type ReaderResult<T> = Result<T, ReaderError>;

/// Error types for band reading.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// The band file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The open file does not carry the requested variable
    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    /// The open file does not carry the requested dimension
    #[error("Dimension not found: {0}")]
    DimensionNotFound(String),

    /// Failure reported by the NetCDF library
    #[error("NetCDF error on {}: {source}", path.display())]
    Netcdf {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data is present but not in the expected shape or encoding
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// `open` was called while another file is still open on the handle
    #[error("Handle already open on {}", .0.display())]
    AlreadyOpen(PathBuf),

    /// An operation needing an open file was called on a closed handle
    #[error("Handle is not open")]
    NotOpen,
}

impl ReaderError {
    /// True when the error means "this band is not available", which callers
    /// recover from by skipping the band.
    pub fn is_absent(&self) -> bool {
        matches!(
            self,
            ReaderError::FileNotFound(_) | ReaderError::VariableNotFound(_)
        )
    }

    /// True for open/close sequencing errors on the handle itself.
    pub fn is_reentrancy(&self) -> bool {
        matches!(self, ReaderError::AlreadyOpen(_) | ReaderError::NotOpen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_classification() {
        assert!(ReaderError::FileNotFound(PathBuf::from("/x/CAPPI2-2020072000.nc")).is_absent());
        assert!(ReaderError::VariableNotFound("CAPPI2".to_string()).is_absent());
        assert!(!ReaderError::DimensionNotFound("lat".to_string()).is_absent());
        assert!(!ReaderError::NotOpen.is_absent());
        assert!(!ReaderError::InvalidFormat("bad".to_string()).is_absent());
    }

    #[test]
    fn test_reentrancy_classification() {
        assert!(ReaderError::NotOpen.is_reentrancy());
        assert!(ReaderError::AlreadyOpen(PathBuf::from("a.nc")).is_reentrancy());
        assert!(!ReaderError::VariableNotFound("time".to_string()).is_reentrancy());
    }
}
