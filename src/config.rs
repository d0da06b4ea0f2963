use std::{fs, path::Path};

use serde::Deserialize;
use tracing::debug;

use crate::{error::EstimateError, estimator::Calibration, unit::Unit};

pub const DEFAULT_CHART_WIDTH: usize = 72;
pub const DEFAULT_CHART_HEIGHT: usize = 18;

/// Optional settings file. Anything given on the command line wins.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub calibration: Option<Calibration>,
    pub unit: Option<Unit>,
    #[serde(default)]
    pub chart: ChartConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartConfig {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
}

fn default_width() -> usize {
    DEFAULT_CHART_WIDTH
}

fn default_height() -> usize {
    DEFAULT_CHART_HEIGHT
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            width: DEFAULT_CHART_WIDTH,
            height: DEFAULT_CHART_HEIGHT,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, EstimateError> {
        let contents = fs::read_to_string(path).map_err(|source| EstimateError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents).map_err(|source| EstimateError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}
