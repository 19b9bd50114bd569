//! The merged, band-by-band radar grid.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::band::BandIndex;
use crate::error::{ConvertError, Result};

/// One elevation level's readings.
///
/// `values` is `None` when the band's file (or its value variable) was not
/// there at all, which is different from a band whose every value is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    index: BandIndex,
    values: Option<Vec<f32>>,
}

impl Band {
    pub fn present(index: BandIndex, values: Vec<f32>) -> Self {
        Self {
            index,
            values: Some(values),
        }
    }

    pub fn absent(index: BandIndex) -> Self {
        Self {
            index,
            values: None,
        }
    }

    pub fn index(&self) -> BandIndex {
        self.index
    }

    pub fn is_present(&self) -> bool {
        self.values.is_some()
    }

    pub fn values(&self) -> Option<&[f32]> {
        self.values.as_deref()
    }

    /// The band's reading at flattened index `i`, if it is a valid one.
    ///
    /// Negative values mean "no valid reading"; reflectivity is never
    /// legitimately negative.
    pub fn reading(&self, i: usize) -> Option<f32> {
        self.values
            .as_ref()
            .and_then(|v| v.get(i).copied())
            .filter(|v| *v >= 0.0)
    }
}

/// One timestamp's full radar volume, all bands on a shared coordinate system.
///
/// Point `(x, y)` is at flattened index `x + y * width`; `lat` has one entry
/// per row and `lon` one per column. A grid is never modified once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    lat: Vec<f64>,
    lon: Vec<f64>,
    instants: Vec<DateTime<Utc>>,
    bands: BTreeMap<BandIndex, Band>,
}

impl Grid {
    /// Build a grid, checking that every present band agrees with the shared
    /// shape and coordinates.
    pub fn new(
        width: usize,
        height: usize,
        lat: Vec<f64>,
        lon: Vec<f64>,
        instants: Vec<DateTime<Utc>>,
        bands: impl IntoIterator<Item = Band>,
    ) -> Result<Self> {
        let grid = Self {
            width,
            height,
            lat,
            lon,
            instants,
            bands: bands.into_iter().map(|b| (b.index, b)).collect(),
        };
        grid.validate()?;
        Ok(grid)
    }

    /// A grid in which every configured band is absent.
    pub fn without_readings(bands: &[BandIndex]) -> Self {
        Self {
            width: 0,
            height: 0,
            lat: Vec::new(),
            lon: Vec::new(),
            instants: Vec::new(),
            bands: bands.iter().map(|b| (*b, Band::absent(*b))).collect(),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.has_readings() {
            return Ok(());
        }

        let points = self.point_count();
        for band in self.bands.values() {
            if let Some(values) = band.values() {
                if values.len() != points {
                    return Err(ConvertError::ShapeMismatch(format!(
                        "{} has {} values, grid is {}x{}",
                        band.index,
                        values.len(),
                        self.width,
                        self.height
                    )));
                }
            }
        }
        if self.lat.len() != self.height {
            return Err(ConvertError::ShapeMismatch(format!(
                "{} latitudes for {} rows",
                self.lat.len(),
                self.height
            )));
        }
        if self.lon.len() != self.width {
            return Err(ConvertError::ShapeMismatch(format!(
                "{} longitudes for {} columns",
                self.lon.len(),
                self.width
            )));
        }
        if self.instants.is_empty() {
            return Err(ConvertError::NotFound("time instants".to_string()));
        }
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    pub fn instants(&self) -> &[DateTime<Utc>] {
        &self.instants
    }

    /// Bands in ascending index order.
    pub fn bands(&self) -> impl Iterator<Item = &Band> {
        self.bands.values()
    }

    pub fn band(&self, index: BandIndex) -> Option<&Band> {
        self.bands.get(&index)
    }

    pub fn point_count(&self) -> usize {
        self.width * self.height
    }

    /// Whether at least one band was present.
    pub fn has_readings(&self) -> bool {
        self.bands.values().any(Band::is_present)
    }

    /// Flattened index of column `x`, row `y`.
    pub fn index(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    /// A point is an observation when any present band has a valid
    /// (non-negative) reading there.
    pub fn is_observation(&self, i: usize) -> bool {
        self.bands.values().any(|b| b.reading(i).is_some())
    }

    /// Number of points that are observations.
    pub fn observation_count(&self) -> usize {
        (0..self.point_count())
            .filter(|i| self.is_observation(*i))
            .count()
    }

    /// Largest latitude, or `None` when the grid has no readings.
    pub fn max_lat(&self) -> Option<f64> {
        self.has_readings().then(|| max_of(&self.lat)).flatten()
    }

    /// Largest longitude, or `None` when the grid has no readings.
    pub fn max_lon(&self) -> Option<f64> {
        self.has_readings().then(|| max_of(&self.lon)).flatten()
    }
}

fn max_of(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}
