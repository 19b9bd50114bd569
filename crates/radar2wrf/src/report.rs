//! Report serializer: turns an assembled [`Grid`] into a little_r stream.
//!
//! The report is a header block followed by one block per observation
//! point. A point is an observation when any present band has a valid
//! reading there; the header carries the number of such points, so they are
//! counted in a first pass before anything is written.
//!
//! Point blocks are written column by column: `x` ascending, and within each
//! column `y` descending (see [`body_order`]). The downstream preprocessor
//! relies on this order.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{AbsentBandPolicy, ConverterConfig};
use crate::error::{ConvertError, ReportError, Result};
use crate::format::{write_header, write_level, write_point_header, ReportSink};
use crate::grid::Grid;
use crate::timestamp::format_instant;
use crate::transport::{self, ReportStream};

/// Bounding box corner written for a grid with no readings at all.
const EMPTY_GRID_CORNER: f64 = 1.0;

/// Order in which grid points are visited for the report body.
pub fn body_order(width: usize, height: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..width).flat_map(move |x| (0..height).rev().map(move |y| (x, y)))
}

/// Write the full report for `grid` into `sink`.
///
/// `requested` is the instant the conversion was asked for and goes on the
/// RADAR header line; point lines carry the grid's own first instant.
/// Returns the number of observation points written.
pub fn write_report<S: ReportSink + ?Sized>(
    grid: &Grid,
    requested: &DateTime<Utc>,
    config: &ConverterConfig,
    sink: &mut S,
) -> std::result::Result<usize, ReportError> {
    let row_code = config.row_code();
    let observations = grid.observation_count();
    let (max_lon, max_lat) = match (grid.max_lon(), grid.max_lat()) {
        (Some(lon), Some(lat)) => (lon, lat),
        _ => (EMPTY_GRID_CORNER, EMPTY_GRID_CORNER),
    };

    write_header(
        sink,
        max_lon,
        max_lat,
        &format_instant(requested),
        observations,
        row_code,
    )?;

    if observations == 0 {
        return Ok(0);
    }

    let instant = grid
        .instants()
        .first()
        .map(format_instant)
        .ok_or(ReportError::MissingInstant)?;

    let mut written = 0;
    for (x, y) in body_order(grid.width(), grid.height()) {
        let i = grid.index(x, y);
        if !grid.is_observation(i) {
            continue;
        }

        let lat = *grid.lat().get(y).ok_or(ReportError::MissingCoordinate {
            axis: "latitude",
            index: y,
        })?;
        let lon = *grid.lon().get(x).ok_or(ReportError::MissingCoordinate {
            axis: "longitude",
            index: x,
        })?;
        write_point_header(sink, &instant, lat, lon, row_code)?;

        for &index in &config.bands {
            match grid.band(index).filter(|b| b.is_present()) {
                Some(band) => write_level(sink, index.height(), band.reading(i))?,
                None => match config.absent_bands {
                    AbsentBandPolicy::Sentinel => write_level(sink, index.height(), None)?,
                    AbsentBandPolicy::Omit => {}
                },
            }
        }
        written += 1;
    }

    debug_assert_eq!(written, observations);
    Ok(written)
}

/// Render the whole report into memory.
pub fn render_report(
    grid: &Grid,
    requested: &DateTime<Utc>,
    config: &ConverterConfig,
) -> std::result::Result<String, ReportError> {
    let mut out = String::new();
    write_report(grid, requested, config, &mut out)?;
    Ok(out)
}

/// Start writing the report for `grid` on a background thread.
///
/// Returns immediately with the reading end. The grid moves into the writer
/// thread and is dropped once the report has been handed over. Failures
/// while writing (including a panic) arrive as the stream's final error.
pub fn serialize(
    grid: Grid,
    requested: DateTime<Utc>,
    config: &ConverterConfig,
) -> Result<ReportStream> {
    let (mut writer, stream) = transport::channel(config.chunk_size, config.channel_capacity);
    let config = config.clone();

    thread::Builder::new()
        .name("little-r-writer".to_string())
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                write_report(&grid, &requested, &config, &mut writer)
            }))
            .unwrap_or_else(|payload| Err(ReportError::Panicked(panic_message(payload))));

            match &outcome {
                Ok(observations) => info!(
                    observations = observations,
                    bytes = writer.bytes_sent(),
                    "Report serialized"
                ),
                Err(ReportError::Disconnected) => {
                    debug!("Report reader went away, stopping")
                }
                Err(e) => warn!(error = %e, "Report serialization failed"),
            }

            if let Err(e) = writer.finish(outcome.map(|_| ())) {
                debug!(error = %e, "Could not deliver end of report");
            }
        })
        .map_err(ConvertError::Spawn)?;

    Ok(stream)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
