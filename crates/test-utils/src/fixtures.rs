//! Synthetic CAPPI NetCDF files.
//!
//! [`CappiFixture`] owns a temporary input directory laid out the way the
//! converter expects (`CAPPI{n}-{key}.nc`), and [`CappiFile`] describes the
//! contents of one band file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::TempDir;

/// How coordinates are stored in a generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateStyle {
    /// `lat(lat)` / `lon(lon)` 1-D axes over `lat`/`lon` dimensions.
    Axes,
    /// `latitude(rows, cols)` / `longitude(rows, cols)` per-point arrays over
    /// `rows`/`cols` dimensions.
    PerPoint,
}

/// Contents of one synthetic band file.
#[derive(Debug, Clone)]
pub struct CappiFile {
    pub width: usize,
    pub height: usize,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub times: Vec<i32>,
    pub values: Vec<f32>,
    pub style: CoordinateStyle,
    pub with_coordinates: bool,
    pub with_values: bool,
}

impl CappiFile {
    /// A `width`×`height` band with evenly spaced axes, one timestamp at
    /// 2020-07-20T00:00:00Z and every value missing (`-1.0`).
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            lat: (0..height).map(|i| 40.0 + i as f64).collect(),
            lon: (0..width).map(|i| 5.0 + i as f64).collect(),
            times: vec![1_595_203_200],
            values: vec![-1.0; width * height],
            style: CoordinateStyle::Axes,
            with_coordinates: true,
            with_values: true,
        }
    }

    pub fn lat(mut self, lat: Vec<f64>) -> Self {
        self.lat = lat;
        self
    }

    pub fn lon(mut self, lon: Vec<f64>) -> Self {
        self.lon = lon;
        self
    }

    pub fn values(mut self, values: Vec<f32>) -> Self {
        self.values = values;
        self
    }

    pub fn times(mut self, times: &[DateTime<Utc>]) -> Self {
        self.times = times.iter().map(|t| t.timestamp() as i32).collect();
        self
    }

    pub fn style(mut self, style: CoordinateStyle) -> Self {
        self.style = style;
        self
    }

    /// Leave out `lat`/`lon`/`time` variables.
    pub fn without_coordinates(mut self) -> Self {
        self.with_coordinates = false;
        self
    }

    /// Leave out the band's own value variable.
    pub fn without_values(mut self) -> Self {
        self.with_values = false;
        self
    }

    /// Write the file to `path`, naming the value variable `variable`.
    pub fn write(&self, path: &Path, variable: &str) -> Result<(), netcdf::Error> {
        let (height_dim, width_dim) = match self.style {
            CoordinateStyle::Axes => ("lat", "lon"),
            CoordinateStyle::PerPoint => ("rows", "cols"),
        };

        let mut file = netcdf::create(path)?;
        file.add_dimension(height_dim, self.height)?;
        file.add_dimension(width_dim, self.width)?;
        file.add_dimension("time", self.times.len())?;

        if self.with_coordinates {
            match self.style {
                CoordinateStyle::Axes => {
                    let mut lat = file.add_variable::<f64>("lat", &["lat"])?;
                    lat.put_values(&self.lat, ..)?;
                    let mut lon = file.add_variable::<f64>("lon", &["lon"])?;
                    lon.put_values(&self.lon, ..)?;
                }
                CoordinateStyle::PerPoint => {
                    let mut lat_points = Vec::with_capacity(self.width * self.height);
                    let mut lon_points = Vec::with_capacity(self.width * self.height);
                    for y in 0..self.height {
                        for x in 0..self.width {
                            lat_points.push(self.lat[y]);
                            lon_points.push(self.lon[x]);
                        }
                    }
                    let mut lat = file.add_variable::<f64>("latitude", &["rows", "cols"])?;
                    lat.put_values(&lat_points, ..)?;
                    let mut lon = file.add_variable::<f64>("longitude", &["rows", "cols"])?;
                    lon.put_values(&lon_points, ..)?;
                }
            }

            let mut time = file.add_variable::<i32>("time", &["time"])?;
            time.put_values(&self.times, ..)?;
        }

        if self.with_values {
            let mut var = file.add_variable::<f32>(variable, &[height_dim, width_dim])?;
            var.put_values(&self.values, ..)?;
        }

        Ok(())
    }
}

/// A temporary input directory of CAPPI band files for one timestamp key.
pub struct CappiFixture {
    dir: TempDir,
    key: String,
}

impl CappiFixture {
    pub fn new(key: &str) -> Self {
        Self {
            dir: crate::temp_test_dir_with_prefix("cappi_"),
            key: key.to_string(),
        }
    }

    /// The input directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The timestamp key files are named with.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Where band `band`'s file lives.
    pub fn band_path(&self, band: u8) -> PathBuf {
        self.dir
            .path()
            .join(format!("CAPPI{}-{}.nc", band, self.key))
    }

    /// Write band `band`'s file.
    pub fn write_band(&self, band: u8, file: &CappiFile) -> PathBuf {
        let path = self.band_path(band);
        file.write(&path, &format!("CAPPI{}", band))
            .expect("Failed to write CAPPI fixture");
        path
    }

    /// Delete band `band`'s file.
    pub fn remove_band(&self, band: u8) {
        std::fs::remove_file(self.band_path(band)).expect("Failed to remove CAPPI fixture");
    }

    /// Consume the fixture, deleting the directory, and return its former path.
    pub fn delete(self) -> PathBuf {
        let path = self.dir.path().to_path_buf();
        self.dir.close().expect("Failed to delete fixture directory");
        path
    }
}
