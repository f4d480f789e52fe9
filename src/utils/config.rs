//! Optional `bandtrace.toml` configuration
//!
//! Every key is optional; command-line flags override whatever is loaded
//! here.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, LevelFilter};
use serde::Deserialize;

use crate::errors::{BandTraceError, BandResult};

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "bandtrace.toml";

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// EPSG code of the GeoJSON side
    pub epsg: u32,
    /// Noise filter size in metres for band extraction
    pub noise_filter_size: f64,
    /// Noise kernel size in pixels for heightmaps
    pub kernel_size: i64,
    /// Default output path
    pub output: PathBuf,
    /// EPSG code of imported label polygons
    pub label_source_epsg: u32,
    pub log_level: String,
    /// Log to this file instead of the console-only logger
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            epsg: 4326,
            noise_filter_size: 2.0,
            kernel_size: 5,
            output: PathBuf::from("output.json"),
            label_source_epsg: 4326,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Parses a TOML document
    pub fn from_toml(text: &str) -> BandResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads a configuration file
    pub fn from_file(path: &Path) -> BandResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            BandTraceError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Loads `explicit` if given, else `bandtrace.toml` when present, else defaults
    pub fn load(explicit: Option<&Path>) -> BandResult<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    debug!("Using configuration from {}", path.display());
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            },
        }
    }

    /// Level filter for `log_level`
    pub fn level_filter(&self) -> BandResult<LevelFilter> {
        self.log_level
            .parse::<LevelFilter>()
            .map_err(|_| BandTraceError::Config(format!("unknown log level '{}'", self.log_level)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_document_overrides_fields() {
        let config = Config::from_toml("epsg = 3857\nnoise_filter_size = 0.0\nlog_file = \"run.log\"").unwrap();
        assert_eq!(config.epsg, 3857);
        assert_eq!(config.noise_filter_size, 0.0);
        assert_eq!(config.kernel_size, 5);
        assert_eq!(config.log_file, Some(PathBuf::from("run.log")));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(Config::from_toml("epsgg = 1"), Err(BandTraceError::Config(_))));
    }

    #[test]
    fn test_level_filter() {
        assert_eq!(Config::default().level_filter().unwrap(), LevelFilter::Info);
        let config = Config { log_level: "loud".to_string(), ..Config::default() };
        assert!(config.level_filter().is_err());
    }
}
