//! Fixed-width little_r line layout.
//!
//! The downstream preprocessor reads these lines by column, so every numeric
//! field has a fixed width and precision. A value that would need more
//! columns than its field has is an error, never a silently shifted line.
//!
//! ```text
//! RADAR              {max_lon:8.3}  {max_lat:8.3}     100.0  {instant}:00{count:9}     {rows}
//! FM-128 RADAR   {instant}:00  {lat:12.3}  {lon:12.3}     100.0       {rows}
//! {height:9.1} -888888.000 -88 -888888.000 {value:11.3} {qc:3} {error:11.3}
//! ```

use std::fmt;

use crate::error::ReportError;

/// Value written in place of a missing measurement.
pub const MISSING_VALUE: f64 = -888888.0;

/// Quality flag of a missing measurement.
pub const MISSING_QC: i32 = -88;

/// Quality flag of a valid reflectivity reading.
pub const VALID_QC: i32 = 0;

/// Error figure attached to every valid reflectivity reading.
pub const READING_ERROR: f64 = 5.0;

pub const TOTAL_LINE: &str = "TOTAL NUMBER =  1";
pub const SHORT_SEPARATOR: &str = "#-----------------#";
pub const LONG_SEPARATOR: &str =
    "#-------------------------------------------------------------------------------#";

/// A fixed-width numeric column.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub width: usize,
    pub precision: usize,
}

pub const MAX_LON: Field = Field::new("max longitude", 8, 3);
pub const MAX_LAT: Field = Field::new("max latitude", 8, 3);
pub const LATITUDE: Field = Field::new("latitude", 12, 3);
pub const LONGITUDE: Field = Field::new("longitude", 12, 3);
pub const HEIGHT: Field = Field::new("height", 9, 1);
pub const REFLECTIVITY: Field = Field::new("reflectivity", 11, 3);
pub const COUNT_WIDTH: usize = 9;

impl Field {
    pub const fn new(name: &'static str, width: usize, precision: usize) -> Self {
        Self {
            name,
            width,
            precision,
        }
    }

    /// Whether `value`, rendered with this field's precision, fits its width.
    pub fn fits(&self, value: f64) -> bool {
        let sign = usize::from(value.is_sign_negative());
        let Some(int_digits) = self.width.checked_sub(self.precision + 1 + sign) else {
            return false;
        };
        let limit = 10f64.powi(int_digits as i32) - 0.5 * 10f64.powi(-(self.precision as i32));
        value.abs() < limit
    }

    /// Pass `value` through if it can be written in this field.
    pub fn check(&self, value: f64) -> Result<f64, ReportError> {
        if !value.is_finite() {
            return Err(ReportError::NonFinite { field: self.name });
        }
        if !self.fits(value) {
            return Err(ReportError::FieldOverflow {
                field: self.name,
                value,
                width: self.width,
            });
        }
        // -0.0 would render as "-0.000"
        Ok(if value == 0.0 { 0.0 } else { value })
    }
}

/// Destination for report lines.
pub trait ReportSink {
    /// Append one line; the sink adds the trailing newline.
    fn write_line(&mut self, line: fmt::Arguments<'_>) -> Result<(), ReportError>;
}

impl ReportSink for String {
    fn write_line(&mut self, line: fmt::Arguments<'_>) -> Result<(), ReportError> {
        use std::fmt::Write;
        // Writing into a String cannot fail.
        let _ = self.write_fmt(line);
        self.push('\n');
        Ok(())
    }
}

/// Header block: record count, RADAR summary and separators.
pub fn write_header<S: ReportSink + ?Sized>(
    sink: &mut S,
    max_lon: f64,
    max_lat: f64,
    instant: &str,
    observations: usize,
    row_code: u8,
) -> Result<(), ReportError> {
    let max_lon = MAX_LON.check(max_lon)?;
    let max_lat = MAX_LAT.check(max_lat)?;

    sink.write_line(format_args!("{}", TOTAL_LINE))?;
    sink.write_line(format_args!("{}", SHORT_SEPARATOR))?;
    sink.write_line(format_args!(""))?;
    sink.write_line(format_args!(
        "RADAR              {:8.3}  {:8.3}     100.0  {}:00{:>width$}     {}",
        max_lon,
        max_lat,
        instant,
        observations,
        row_code,
        width = COUNT_WIDTH,
    ))?;
    sink.write_line(format_args!("{}", LONG_SEPARATOR))?;
    sink.write_line(format_args!(""))
}

/// FM-128 line opening one observation point.
pub fn write_point_header<S: ReportSink + ?Sized>(
    sink: &mut S,
    instant: &str,
    lat: f64,
    lon: f64,
    row_code: u8,
) -> Result<(), ReportError> {
    let lat = LATITUDE.check(lat)?;
    let lon = LONGITUDE.check(lon)?;
    sink.write_line(format_args!(
        "FM-128 RADAR   {}:00  {:12.3}  {:12.3}     100.0       {}",
        instant, lat, lon, row_code
    ))
}

/// One band's data line. `None` writes the sentinel line.
pub fn write_level<S: ReportSink + ?Sized>(
    sink: &mut S,
    height: f64,
    reading: Option<f32>,
) -> Result<(), ReportError> {
    let height = HEIGHT.check(height)?;
    let (value, qc, error) = match reading {
        Some(v) => (REFLECTIVITY.check(f64::from(v))?, VALID_QC, READING_ERROR),
        None => (MISSING_VALUE, MISSING_QC, MISSING_VALUE),
    };
    sink.write_line(format_args!(
        "{:9.1} -888888.000 -88 -888888.000 {:11.3} {:3} {:11.3}",
        height, value, qc, error
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(height: f64, reading: Option<f32>) -> String {
        let mut out = String::new();
        write_level(&mut out, height, reading).unwrap();
        out
    }

    #[test]
    fn test_valid_level_line() {
        assert_eq!(
            level(2000.0, Some(7.0)),
            "   2000.0 -888888.000 -88 -888888.000       7.000   0       5.000\n"
        );
    }

    #[test]
    fn test_sentinel_level_line() {
        assert_eq!(
            level(3000.0, None),
            "   3000.0 -888888.000 -88 -888888.000 -888888.000 -88 -888888.000\n"
        );
    }

    #[test]
    fn test_level_columns_line_up() {
        let valid = level(2000.0, Some(12.25));
        let missing = level(2000.0, None);
        assert_eq!(valid.len(), missing.len());
    }

    #[test]
    fn test_zero_and_negative_zero() {
        assert_eq!(
            level(2000.0, Some(0.0)),
            "   2000.0 -888888.000 -88 -888888.000       0.000   0       5.000\n"
        );
        assert_eq!(level(2000.0, Some(-0.0)), level(2000.0, Some(0.0)));
    }

    #[test]
    fn test_large_reading_fits() {
        assert_eq!(
            level(8000.0, Some(1_000_000.0)),
            "   8000.0 -888888.000 -88 -888888.000 1000000.000   0       5.000\n"
        );
    }

    #[test]
    fn test_reading_overflow() {
        let mut out = String::new();
        let err = write_level(&mut out, 2000.0, Some(10_000_000.0)).unwrap_err();
        assert!(matches!(
            err,
            ReportError::FieldOverflow {
                field: "reflectivity",
                width: 11,
                ..
            }
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_infinite_reading() {
        let mut out = String::new();
        let err = write_level(&mut out, 2000.0, Some(f32::INFINITY)).unwrap_err();
        assert!(matches!(err, ReportError::NonFinite { .. }));
    }

    #[test]
    fn test_field_fits_boundaries() {
        assert!(REFLECTIVITY.fits(9_999_999.999));
        assert!(!REFLECTIVITY.fits(9_999_999.9996));
        assert!(REFLECTIVITY.fits(-999_999.999));
        assert!(!REFLECTIVITY.fits(-1_000_000.0));
        assert!(REFLECTIVITY.fits(MISSING_VALUE));
        assert!(MAX_LAT.fits(9999.999));
        assert!(!MAX_LAT.fits(10000.0));
        assert!(MAX_LAT.fits(-999.999));
        assert!(!MAX_LAT.fits(-1000.0));
    }

    #[test]
    fn test_header_block() {
        let mut out = String::new();
        write_header(&mut out, 17.92, 47.57, "2020-07-20_00:00", 1520289, 3).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "TOTAL NUMBER =  1");
        assert_eq!(lines[1], "#-----------------#");
        assert_eq!(lines[2], "");
        assert_eq!(
            lines[3],
            "RADAR                17.920    47.570     100.0  2020-07-20_00:00:00  1520289     3"
        );
        assert_eq!(lines[4].len(), 81);
        assert_eq!(lines[5], "");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_point_header() {
        let mut out = String::new();
        write_point_header(&mut out, "2020-07-20_00:00", 47.57, 5.6, 4).unwrap();
        assert_eq!(
            out,
            "FM-128 RADAR   2020-07-20_00:00:00        47.570         5.600     100.0       4\n"
        );
    }

    #[test]
    fn test_point_header_negative_coordinates() {
        let mut out = String::new();
        write_point_header(&mut out, "2020-07-20_00:00", -33.5, -70.25, 3).unwrap();
        assert_eq!(
            out,
            "FM-128 RADAR   2020-07-20_00:00:00       -33.500       -70.250     100.0       3\n"
        );
    }
}
