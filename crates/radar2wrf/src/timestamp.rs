//! Timestamp keys naming a radar volume.
//!
//! Input files are named with a key of the form `YYYYMMDDHH` (hourly
//! products) or `YYYYMMDDHHMM` (sub-hourly products), always UTC.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{ConvertError, Result};

/// Parse a timestamp key strictly.
///
/// Only the two exact layouts are accepted: ten or twelve ASCII digits
/// forming a valid calendar date and time.
pub fn parse_timestamp_key(key: &str) -> Result<DateTime<Utc>> {
    let invalid = || ConvertError::InvalidTimestamp(key.to_string());

    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    // chrono needs a minute to build a time, so hourly keys get ":00".
    let full = match key.len() {
        10 => format!("{}00", key),
        12 => key.to_string(),
        _ => return Err(invalid()),
    };

    NaiveDateTime::parse_from_str(&full, "%Y%m%d%H%M")
        .map(|naive| naive.and_utc())
        .map_err(|_| invalid())
}

/// `YYYY-MM-DD_HH:MM`, the instant layout of report headers.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d_%H:%M").to_string()
}
