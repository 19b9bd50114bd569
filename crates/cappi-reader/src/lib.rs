//! Reader for CAPPI radar reflectivity files.
//!
//! Each file holds one elevation band (CAPPI level) of one radar volume as a
//! NetCDF dataset: the band's value array, the grid's coordinate variables,
//! and a `time` variable in seconds since the Unix epoch.
//!
//! # Example
//!
//! ```ignore
//! use cappi_reader::{Axis, BandReader};
//!
//! let mut reader = BandReader::new();
//! reader.open("data/CAPPI2-2020072000.nc")?;
//! let values = reader.read_f32("CAPPI2")?;
//! let lat = reader.read_axis(Axis::Latitude)?;
//! reader.close()?;
//! ```

pub mod coords;
pub mod error;
mod hdf5;
pub mod reader;

pub use coords::{reduce_latitudes, reduce_longitudes, Axis, CoordinateLayout};
pub use error::{ReaderError, ReaderResult};
pub use hdf5::silence_hdf5_errors;
pub use reader::{BandReader, HEIGHT_DIMENSIONS, WIDTH_DIMENSIONS};
