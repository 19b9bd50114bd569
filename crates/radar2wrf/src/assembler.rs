//! Grid assembler: reads every configured band for one timestamp key and
//! merges them into a single [`Grid`].
//!
//! Bands are read one at a time through a single [`BandReader`] handle, in
//! configured order. A band whose file (or value variable) is missing is
//! recorded as absent and skipped; any other read failure aborts assembly.
//!
//! Width, height, coordinates and time instants are shared by all bands and
//! are read once, from the first present band that carries them.

use std::fs;
use std::io;
use std::path::Path;

use cappi_reader::{Axis, BandReader, ReaderError, HEIGHT_DIMENSIONS, WIDTH_DIMENSIONS};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::band::BandIndex;
use crate::error::{ConvertError, Result};
use crate::grid::{Band, Grid};

/// Name of the time variable in every CAPPI file.
pub const TIME_VARIABLE: &str = "time";

/// Shared grid geometry, read once per assembly.
#[derive(Debug)]
struct Geometry {
    width: usize,
    height: usize,
    lat: Vec<f64>,
    lon: Vec<f64>,
    instants: Vec<DateTime<Utc>>,
}

/// Read and merge the configured bands of `key` found in `directory`.
pub fn assemble(directory: &Path, key: &str, bands: &[BandIndex]) -> Result<Grid> {
    let metadata = fs::metadata(directory).map_err(|e| ConvertError::io(directory, e))?;
    if !metadata.is_dir() {
        return Err(ConvertError::io(
            directory,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let mut assembler = GridAssembler::new();
    for &band in bands {
        let path = band.file_path(directory, key);
        let band = assembler.read_band(band, &path)?;
        assembler.bands.push(band);
    }
    assembler.finish()
}

struct GridAssembler {
    reader: BandReader,
    geometry: Option<Geometry>,
    bands: Vec<Band>,
}

impl GridAssembler {
    fn new() -> Self {
        Self {
            reader: BandReader::new(),
            geometry: None,
            bands: Vec::new(),
        }
    }

    /// Open, read and close one band file.
    fn read_band(&mut self, band: BandIndex, path: &Path) -> Result<Band> {
        match self.reader.open(path) {
            Ok(()) => {}
            Err(e) if e.is_absent() => {
                debug!(band = %band, path = %path.display(), "Band file absent");
                return Ok(Band::absent(band));
            }
            Err(e) => return Err(e.into()),
        }

        let outcome = self.read_open_band(band);
        let closed = self.reader.close();
        let band = outcome?;
        closed?;
        Ok(band)
    }

    fn read_open_band(&mut self, band: BandIndex) -> Result<Band> {
        let values = match self.reader.read_f32(&band.name()) {
            Ok(values) => values,
            Err(e) if e.is_absent() => {
                debug!(band = %band, "Band variable absent");
                return Ok(Band::absent(band));
            }
            Err(e) => return Err(e.into()),
        };

        if self.geometry.is_none() {
            self.geometry = self.read_geometry(band)?;
        }

        debug!(band = %band, values = values.len(), "Read band");
        Ok(Band::present(band, values))
    }

    /// Read shared geometry from the open file, or `None` if the file carries
    /// no coordinate variables.
    fn read_geometry(&self, band: BandIndex) -> Result<Option<Geometry>> {
        if !self.reader.has_axis(Axis::Latitude) {
            debug!(band = %band, "No coordinates in band file, deferring to next band");
            return Ok(None);
        }

        let width = self
            .reader
            .first_dimension_len(WIDTH_DIMENSIONS)
            .map_err(required)?;
        let height = self
            .reader
            .first_dimension_len(HEIGHT_DIMENSIONS)
            .map_err(required)?;
        let lat = self.reader.read_axis(Axis::Latitude).map_err(required)?;
        let lon = self.reader.read_axis(Axis::Longitude).map_err(required)?;
        let instants = self.reader.read_times(TIME_VARIABLE).map_err(required)?;

        debug!(
            band = %band,
            width = width,
            height = height,
            instants = instants.len(),
            "Read grid geometry"
        );

        Ok(Some(Geometry {
            width,
            height,
            lat,
            lon,
            instants,
        }))
    }

    fn finish(self) -> Result<Grid> {
        let present: Vec<String> = self
            .bands
            .iter()
            .filter(|b| b.is_present())
            .map(|b| b.index().to_string())
            .collect();

        let grid = match self.geometry {
            Some(g) => Grid::new(g.width, g.height, g.lat, g.lon, g.instants, self.bands)?,
            None if !present.is_empty() => {
                return Err(ConvertError::NotFound(format!(
                    "coordinate variables in any of {}",
                    present.join(", ")
                )))
            }
            None => {
                let indices: Vec<BandIndex> = self.bands.iter().map(Band::index).collect();
                Grid::without_readings(&indices)
            }
        };

        info!(
            present = ?present,
            width = grid.width(),
            height = grid.height(),
            "Assembled radar grid"
        );
        Ok(grid)
    }
}

/// Missing data is fatal once a band is known to be present.
fn required(e: ReaderError) -> ConvertError {
    match e {
        ReaderError::VariableNotFound(name) | ReaderError::DimensionNotFound(name) => {
            ConvertError::NotFound(name)
        }
        other => other.into(),
    }
}
