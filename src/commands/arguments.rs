//! Typed access to string arguments

use std::path::PathBuf;

use clap::ArgMatches;
use log::debug;

use crate::coordinate::CoordinateSystemFactory;
use crate::errors::{BandTraceError, BandResult};

/// Required path argument
pub fn required_path(args: &ArgMatches, name: &str) -> BandResult<PathBuf> {
    optional_path(args, name)
        .ok_or_else(|| BandTraceError::GenericError(format!("Missing argument '{}'", name)))
}

pub fn optional_path(args: &ArgMatches, name: &str) -> Option<PathBuf> {
    args.get_one::<String>(name).map(PathBuf::from)
}

/// Required string argument
pub fn required_string(args: &ArgMatches, name: &str) -> BandResult<String> {
    args.get_one::<String>(name)
        .cloned()
        .ok_or_else(|| BandTraceError::GenericError(format!("Missing argument '{}'", name)))
}

/// Parses an optional numeric argument
pub fn parse_number<T: std::str::FromStr>(args: &ArgMatches, name: &str) -> BandResult<Option<T>> {
    match args.get_one::<String>(name) {
        None => Ok(None),
        Some(text) => text
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| BandTraceError::GenericError(format!("Invalid value for '{}': {}", name, text))),
    }
}

/// Parses an optional CRS argument such as `EPSG:32633` or `4326`
///
/// Codes missing from the registry are rejected.
pub fn parse_epsg(args: &ArgMatches, name: &str) -> BandResult<Option<u32>> {
    let Some(text) = args.get_one::<String>(name) else {
        return Ok(None);
    };

    let crs = CoordinateSystemFactory::from_string(text)?;
    debug!("--{}: {}", name, crs.description());
    Ok(Some(crs.epsg_code()))
}
