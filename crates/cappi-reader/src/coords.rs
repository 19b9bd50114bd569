//! Coordinate layout adapter.
//!
//! CAPPI files come in two generations. Older files store `lat`/`lon` as 1-D
//! axes (one latitude per row, one longitude per column). Newer files store
//! them per grid point, as a rows×cols array flattened in row-major order.
//!
//! Everything downstream works with 1-D axes, so flattened coordinates are
//! reduced here:
//!
//! ```text
//! lat[i] = raw_lat[i * cols]     (first column of each row)
//! lon[j] = raw_lon[j]            (first row)
//! ```

use crate::error::{ReaderError, ReaderResult};

/// Which grid axis a coordinate variable describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    /// Variable names tried, in order, when looking the axis up in a file.
    pub fn variable_names(self) -> &'static [&'static str] {
        match self {
            Axis::Latitude => &["lat", "latitude"],
            Axis::Longitude => &["lon", "longitude"],
        }
    }
}

/// Storage layout of a coordinate variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateLayout {
    /// One value per row (latitude) or column (longitude).
    Axis,
    /// One value per grid point, rows×cols flattened row-major.
    Flattened { rows: usize, cols: usize },
}

impl CoordinateLayout {
    /// Detect the layout from the variable's dimension lengths.
    pub fn detect(shape: &[usize]) -> ReaderResult<Self> {
        match shape {
            [_] => Ok(CoordinateLayout::Axis),
            [rows, cols] => Ok(CoordinateLayout::Flattened {
                rows: *rows,
                cols: *cols,
            }),
            other => Err(ReaderError::InvalidFormat(format!(
                "coordinate variable has {} dimensions, expected 1 or 2",
                other.len()
            ))),
        }
    }
}

/// Reduce per-point latitudes to one latitude per row.
pub fn reduce_latitudes(raw: &[f64], rows: usize, cols: usize) -> ReaderResult<Vec<f64>> {
    check_flattened(raw, rows, cols, "latitude")?;
    Ok((0..rows).map(|i| raw[i * cols]).collect())
}

/// Reduce per-point longitudes to one longitude per column.
pub fn reduce_longitudes(raw: &[f64], rows: usize, cols: usize) -> ReaderResult<Vec<f64>> {
    check_flattened(raw, rows, cols, "longitude")?;
    Ok(raw[..cols].to_vec())
}

/// Turn a raw coordinate variable into a 1-D axis according to its layout.
pub fn to_axis(raw: Vec<f64>, layout: CoordinateLayout, axis: Axis) -> ReaderResult<Vec<f64>> {
    match layout {
        CoordinateLayout::Axis => Ok(raw),
        CoordinateLayout::Flattened { rows, cols } => match axis {
            Axis::Latitude => reduce_latitudes(&raw, rows, cols),
            Axis::Longitude => reduce_longitudes(&raw, rows, cols),
        },
    }
}

fn check_flattened(raw: &[f64], rows: usize, cols: usize, what: &str) -> ReaderResult<()> {
    if rows == 0 || cols == 0 {
        return Err(ReaderError::InvalidFormat(format!(
            "flattened {} has an empty {}x{} grid",
            what, rows, cols
        )));
    }
    if raw.len() != rows * cols {
        return Err(ReaderError::InvalidFormat(format!(
            "flattened {} has {} values, expected {}x{}",
            what,
            raw.len(),
            rows,
            cols
        )));
    }
    Ok(())
}
