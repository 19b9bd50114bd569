//! Sequential band reader over the native netcdf library.
//!
//! A [`BandReader`] is a reusable handle: open one CAPPI file, read the
//! variables needed from it, close it, then open the next one. Every
//! operation returns a `Result`; nothing is silently skipped after a failure.
//!
//! Opening a handle that is already open, or closing one that is not, is a
//! sequencing bug in the caller and is reported as
//! [`ReaderError::AlreadyOpen`] / [`ReaderError::NotOpen`].

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, trace};

use crate::coords::{to_axis, Axis, CoordinateLayout};
use crate::error::{ReaderError, ReaderResult};
use crate::hdf5::silence_hdf5_errors;

/// Dimension names for grid width, newest convention first.
pub const WIDTH_DIMENSIONS: &[&str] = &["lon", "cols"];

/// Dimension names for grid height, newest convention first.
pub const HEIGHT_DIMENSIONS: &[&str] = &["lat", "rows"];

struct OpenFile {
    path: PathBuf,
    nc: netcdf::File,
}

/// Reusable handle for reading one CAPPI file at a time.
#[derive(Default)]
pub struct BandReader {
    current: Option<OpenFile>,
}

impl BandReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a file is currently open on this handle.
    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// Path of the currently open file.
    pub fn path(&self) -> Option<&Path> {
        self.current.as_ref().map(|f| f.path.as_path())
    }

    /// Open `path` for reading.
    ///
    /// A missing file is reported as [`ReaderError::FileNotFound`] so callers
    /// can tell "band absent" apart from a real read failure.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> ReaderResult<()> {
        let path = path.as_ref();
        if let Some(current) = &self.current {
            return Err(ReaderError::AlreadyOpen(current.path.clone()));
        }

        if !path.try_exists()? {
            return Err(ReaderError::FileNotFound(path.to_path_buf()));
        }

        silence_hdf5_errors();

        let nc = netcdf::open(path).map_err(|source| ReaderError::Netcdf {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "Opened CAPPI file");
        self.current = Some(OpenFile {
            path: path.to_path_buf(),
            nc,
        });
        Ok(())
    }

    /// Close the currently open file.
    pub fn close(&mut self) -> ReaderResult<()> {
        let file = self.current.take().ok_or(ReaderError::NotOpen)?;
        trace!(path = %file.path.display(), "Closing CAPPI file");
        drop(file.nc);
        Ok(())
    }

    /// Length of the named dimension.
    pub fn dimension_len(&self, name: &str) -> ReaderResult<usize> {
        let file = self.file()?;
        file.nc
            .dimension(name)
            .map(|d| d.len())
            .ok_or_else(|| ReaderError::DimensionNotFound(name.to_string()))
    }

    /// Length of the first dimension found among `names`.
    pub fn first_dimension_len(&self, names: &[&str]) -> ReaderResult<usize> {
        for name in names {
            match self.dimension_len(name) {
                Err(ReaderError::DimensionNotFound(_)) => continue,
                other => return other,
            }
        }
        Err(ReaderError::DimensionNotFound(names.join("|")))
    }

    /// Whether the open file carries a variable called `name`.
    pub fn has_variable(&self, name: &str) -> bool {
        self.current
            .as_ref()
            .map(|f| f.nc.variable(name).is_some())
            .unwrap_or(false)
    }

    /// Dimension lengths of the named variable.
    pub fn variable_shape(&self, name: &str) -> ReaderResult<Vec<usize>> {
        let file = self.file()?;
        let var = file
            .nc
            .variable(name)
            .ok_or_else(|| ReaderError::VariableNotFound(name.to_string()))?;
        Ok(var.dimensions().iter().map(|d| d.len()).collect())
    }

    /// Read a whole variable as `f32`, flattened row-major.
    pub fn read_f32(&self, name: &str) -> ReaderResult<Vec<f32>> {
        let file = self.file()?;
        let var = file
            .nc
            .variable(name)
            .ok_or_else(|| ReaderError::VariableNotFound(name.to_string()))?;
        var.get_values::<f32, _>(..)
            .map_err(|source| ReaderError::Netcdf {
                path: file.path.clone(),
                source,
            })
    }

    /// Read a whole variable as `f64`, flattened row-major.
    pub fn read_f64(&self, name: &str) -> ReaderResult<Vec<f64>> {
        let file = self.file()?;
        let var = file
            .nc
            .variable(name)
            .ok_or_else(|| ReaderError::VariableNotFound(name.to_string()))?;
        var.get_values::<f64, _>(..)
            .map_err(|source| ReaderError::Netcdf {
                path: file.path.clone(),
                source,
            })
    }

    /// Read a time variable stored as seconds since the Unix epoch (UTC).
    ///
    /// Integer and floating storage are both accepted; fractional seconds are
    /// truncated.
    pub fn read_times(&self, name: &str) -> ReaderResult<Vec<DateTime<Utc>>> {
        self.read_f64(name)?
            .into_iter()
            .map(|secs| {
                Utc.timestamp_opt(secs as i64, 0).single().ok_or_else(|| {
                    ReaderError::InvalidFormat(format!("{} value {} is not a valid instant", name, secs))
                })
            })
            .collect()
    }

    /// Read a coordinate axis, trying each conventional variable name for it.
    ///
    /// Flattened per-point coordinates are reduced to a 1-D axis, see
    /// [`crate::coords`].
    pub fn read_axis(&self, axis: Axis) -> ReaderResult<Vec<f64>> {
        let name = self.find_variable(axis.variable_names())?;
        let layout = CoordinateLayout::detect(&self.variable_shape(name)?)?;
        let raw = self.read_f64(name)?;
        to_axis(raw, layout, axis)
    }

    /// Whether the open file carries a variable for `axis` under any known name.
    pub fn has_axis(&self, axis: Axis) -> bool {
        self.find_variable(axis.variable_names()).is_ok()
    }

    fn find_variable<'a>(&self, names: &[&'a str]) -> ReaderResult<&'a str> {
        self.file()?;
        names
            .iter()
            .copied()
            .find(|name| self.has_variable(name))
            .ok_or_else(|| ReaderError::VariableNotFound(names.join("|")))
    }

    fn file(&self) -> ReaderResult<&OpenFile> {
        self.current.as_ref().ok_or(ReaderError::NotOpen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_handle_is_closed() {
        let reader = BandReader::new();
        assert!(!reader.is_open());
        assert!(reader.path().is_none());
    }

    #[test]
    fn test_close_without_open_is_reentrancy_error() {
        let mut reader = BandReader::new();
        let err = reader.close().unwrap_err();
        assert!(matches!(err, ReaderError::NotOpen));
        assert!(err.is_reentrancy());
    }

    #[test]
    fn test_reads_on_closed_handle_fail() {
        let reader = BandReader::new();
        assert!(matches!(reader.dimension_len("lat"), Err(ReaderError::NotOpen)));
        assert!(matches!(reader.read_f32("CAPPI2"), Err(ReaderError::NotOpen)));
        assert!(matches!(reader.read_axis(Axis::Latitude), Err(ReaderError::NotOpen)));
        assert!(!reader.has_variable("CAPPI2"));
    }

    #[test]
    fn test_open_missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = BandReader::new();
        let err = reader.open(dir.path().join("CAPPI2-2020072000.nc")).unwrap_err();
        assert!(err.is_absent());
        assert!(!reader.is_open());
    }

    #[test]
    fn test_open_garbage_file_is_netcdf_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CAPPI2-2020072000.nc");
        std::fs::write(&path, b"not a netcdf file").unwrap();

        let mut reader = BandReader::new();
        let err = reader.open(&path).unwrap_err();
        assert!(matches!(err, ReaderError::Netcdf { .. }));
        assert!(!err.is_absent());
    }
}
