use crate::error::{GenerateError, GenerateResult};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Geographic center of the contiguous U.S. (longitude, latitude)
pub const CONUS_CENTROID: [f64; 2] = [-98.5833, 39.8333];

pub const DEFAULT_INCREMENT: f64 = 0.1;

// 16 per quadrant
pub const DEFAULT_SEGMENTS: usize = 64;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub geometry: GeometryConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    /// One category per line, highest priority first
    pub categories: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeometryConfig {
    pub centroid: [f64; 2], // [lon, lat]
    pub increment: f64,
    pub segments: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    /// .shp, .json or .geojson
    pub path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            categories: PathBuf::from("data/wwa-types-by-priority.csv"),
        }
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            centroid: CONUS_CENTROID,
            increment: DEFAULT_INCREMENT,
            segments: DEFAULT_SEGMENTS,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("wwa_priority_sample.shp"),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }

    /// Built-in defaults when no config file is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> GenerateResult<()> {
        let [lon, lat] = self.geometry.centroid;
        if !lon.is_finite() || !lat.is_finite() {
            return Err(GenerateError::InvalidConfig {
                message: format!("centroid must be finite, got [{}, {}]", lon, lat),
            });
        }
        if !self.geometry.increment.is_finite() || self.geometry.increment <= 0.0 {
            return Err(GenerateError::InvalidIncrement {
                increment: self.geometry.increment,
            });
        }
        if self.geometry.segments < 3 {
            return Err(GenerateError::InvalidSegments {
                segments: self.geometry.segments,
            });
        }
        Ok(())
    }
}
