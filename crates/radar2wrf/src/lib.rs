//! CAPPI radar to little_r conversion.
//!
//! Converts one timestamp's multi-level CAPPI reflectivity volume (one
//! NetCDF file per level) into the fixed-column little_r observation report
//! read by the WRF data assimilation preprocessor.
//!
//! # Architecture
//!
//! ```text
//! convert(dir, key)
//!      │
//!      ├─► parse_timestamp_key(key)          (fails before any I/O)
//!      │
//!      ├─► assemble(dir, key, bands)         (sequential, one BandReader)
//!      │         │
//!      │         └─► CAPPI2..CAPPI8 → Grid   (absent bands skipped)
//!      │
//!      └─► serialize(grid, instant)          (background writer thread)
//!                │
//!                ▼
//!           ReportStream ── io::Read / futures::Stream ──► caller
//! ```
//!
//! Errors while reading inputs are returned by `convert` itself; errors
//! while writing the report arrive at the end of the [`ReportStream`].
//!
//! # Example
//!
//! ```ignore
//! use std::io::{self, BufWriter};
//!
//! let mut report = radar2wrf::convert("/data/radar", "2020072000")?;
//! let mut out = BufWriter::new(std::fs::File::create("radar.txt")?);
//! io::copy(&mut report, &mut out)?;
//! ```

pub mod assembler;
pub mod band;
pub mod config;
pub mod error;
pub mod format;
pub mod grid;
pub mod report;
pub mod timestamp;
pub mod transport;

use std::path::Path;

use tracing::info;

// Re-exports
pub use assembler::assemble;
pub use band::{all_bands, BandIndex};
pub use config::{AbsentBandPolicy, ConverterConfig};
pub use error::{ConvertError, ErrorKind, ReportError, Result};
pub use grid::{Band, Grid};
pub use report::{body_order, render_report, serialize, write_report};
pub use timestamp::parse_timestamp_key;
pub use transport::ReportStream;

/// Converts radar volumes with a fixed configuration.
#[derive(Debug, Clone)]
pub struct Converter {
    config: ConverterConfig,
}

impl Converter {
    pub fn new(config: ConverterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Convert the volume named `key` in `directory`.
    ///
    /// The timestamp key is checked first and all band files are read before
    /// this returns; the report itself is produced while the caller reads the
    /// returned stream.
    pub fn convert<P: AsRef<Path>>(&self, directory: P, key: &str) -> Result<ReportStream> {
        let directory = directory.as_ref();
        let requested = parse_timestamp_key(key)?;

        info!(
            directory = %directory.display(),
            key = key,
            bands = self.config.bands.len(),
            "Converting radar volume"
        );

        let grid = assemble(directory, key, &self.config.bands)?;
        serialize(grid, requested, &self.config)
    }
}

/// Convert with the default configuration (CAPPI2..CAPPI8).
pub fn convert<P: AsRef<Path>>(directory: P, key: &str) -> Result<ReportStream> {
    Converter::new(ConverterConfig::default())?.convert(directory, key)
}
