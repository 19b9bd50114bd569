//! Converter configuration.
//!
//! Defaults cover the full CAPPI2..CAPPI8 composite. A deployment can narrow
//! the band set (older radar composites only produced CAPPI2/3/5 or
//! CAPPI2..5) from a YAML file or from the environment:
//!
//! ```yaml
//! bands: [2, 3, 5]
//! absent_bands: omit
//! chunk_size: 65536
//! channel_capacity: 8
//! ```
//!
//! | Variable                      | Example   |
//! |-------------------------------|-----------|
//! | `RADAR2WRF_BANDS`             | `2,3,4,5` |
//! | `RADAR2WRF_ABSENT_BANDS`      | `omit`    |
//! | `RADAR2WRF_CHUNK_SIZE`        | `65536`   |
//! | `RADAR2WRF_CHANNEL_CAPACITY`  | `8`       |

use std::env;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::band::{all_bands, BandIndex};
use crate::error::{ConvertError, Result};

/// What to write for a configured band whose file was absent, at a point
/// that is an observation because of some other band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsentBandPolicy {
    /// Write the band's data line with sentinel values.
    #[default]
    Sentinel,
    /// Leave the band's data line out.
    ///
    /// Point headers still carry [`ConverterConfig::row_code`], so a reader
    /// must not take the row code as the number of data lines that follow.
    Omit,
}

impl FromStr for AbsentBandPolicy {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sentinel" => Ok(AbsentBandPolicy::Sentinel),
            "omit" => Ok(AbsentBandPolicy::Omit),
            other => Err(ConvertError::InvalidConfig(format!(
                "unknown absent band policy '{}'",
                other
            ))),
        }
    }
}

/// Top-level converter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Bands to read and report, ascending
    pub bands: Vec<BandIndex>,

    /// Handling of configured bands whose file is absent
    pub absent_bands: AbsentBandPolicy,

    /// Bytes buffered by the report writer before handing a chunk over
    pub chunk_size: usize,

    /// Chunks in flight between writer and reader
    pub channel_capacity: usize,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            bands: all_bands(),
            absent_bands: AbsentBandPolicy::default(),
            chunk_size: 1_000_000,
            channel_capacity: 4,
        }
    }
}

impl ConverterConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a YAML file; missing keys keep their defaults.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            ConvertError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `RADAR2WRF_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(bands) = env::var("RADAR2WRF_BANDS") {
            self.bands = parse_band_list(&bands)?;
        }
        if let Ok(policy) = env::var("RADAR2WRF_ABSENT_BANDS") {
            self.absent_bands = policy.parse()?;
        }
        if let Ok(size) = env::var("RADAR2WRF_CHUNK_SIZE") {
            self.chunk_size = parse_usize("RADAR2WRF_CHUNK_SIZE", &size)?;
        }
        if let Ok(capacity) = env::var("RADAR2WRF_CHANNEL_CAPACITY") {
            self.channel_capacity = parse_usize("RADAR2WRF_CHANNEL_CAPACITY", &capacity)?;
        }
        debug!(config = ?self, "Applied environment overrides");
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.bands.is_empty() {
            return Err(ConvertError::InvalidConfig("no bands configured".into()));
        }
        if !self.bands.windows(2).all(|w| w[0] < w[1]) {
            return Err(ConvertError::InvalidConfig(format!(
                "bands must be strictly ascending, got {:?}",
                self.bands.iter().map(|b| b.get()).collect::<Vec<_>>()
            )));
        }
        if self.chunk_size == 0 {
            return Err(ConvertError::InvalidConfig("chunk_size must be > 0".into()));
        }
        if self.channel_capacity == 0 {
            return Err(ConvertError::InvalidConfig(
                "channel_capacity must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Level count written on RADAR and FM-128 header lines.
    ///
    /// Three-band composites use 3; anything larger has always used 4.
    pub fn row_code(&self) -> u8 {
        if self.bands.len() <= 3 {
            3
        } else {
            4
        }
    }
}

/// Parse a comma separated band list such as `2,3,5`.
pub fn parse_band_list(list: &str) -> Result<Vec<BandIndex>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u8>()
                .map_err(|_| ConvertError::InvalidConfig(format!("invalid band '{}'", s)))
                .and_then(BandIndex::new)
        })
        .collect()
}

fn parse_usize(name: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| ConvertError::InvalidConfig(format!("{}={} is not a number", name, value)))
}
