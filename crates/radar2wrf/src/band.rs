//! CAPPI elevation bands.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};

/// Lowest CAPPI level produced by the radar composite.
pub const MIN_BAND: u8 = 2;

/// Highest CAPPI level produced by the radar composite.
pub const MAX_BAND: u8 = 8;

/// One CAPPI level, identified by its altitude in kilometres (2..=8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct BandIndex(u8);

impl BandIndex {
    pub fn new(index: u8) -> Result<Self> {
        if (MIN_BAND..=MAX_BAND).contains(&index) {
            Ok(Self(index))
        } else {
            Err(ConvertError::InvalidConfig(format!(
                "band index {} outside {}..={}",
                index, MIN_BAND, MAX_BAND
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Canonical name, used both as the file prefix and the value variable.
    pub fn name(self) -> String {
        format!("CAPPI{}", self.0)
    }

    /// Elevation written on the band's data lines, in metres.
    pub fn height(self) -> f64 {
        f64::from(self.0) * 1000.0
    }

    /// `{directory}/CAPPI{n}-{key}.nc`
    pub fn file_path(self, directory: &Path, key: &str) -> PathBuf {
        directory.join(format!("{}-{}.nc", self.name(), key))
    }
}

impl TryFrom<u8> for BandIndex {
    type Error = ConvertError;

    fn try_from(value: u8) -> Result<Self> {
        BandIndex::new(value)
    }
}

impl From<BandIndex> for u8 {
    fn from(band: BandIndex) -> u8 {
        band.0
    }
}

impl fmt::Display for BandIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CAPPI{}", self.0)
    }
}

/// Every band the composite produces, lowest first.
pub fn all_bands() -> Vec<BandIndex> {
    (MIN_BAND..=MAX_BAND).map(BandIndex).collect()
}
