//! Preview rendering command

use std::path::PathBuf;

use clap::ArgMatches;

use crate::api::BandTrace;
use crate::commands::arguments;
use crate::commands::command_traits::Command;
use crate::errors::BandResult;
use crate::utils::config::Config;

/// Command for rendering a raster to PNG
pub struct PreviewCommand {
    raster: PathBuf,
    output_file: PathBuf,
    config: Config,
}

impl PreviewCommand {
    pub fn new(args: &ArgMatches, config: &Config) -> BandResult<Self> {
        Ok(PreviewCommand {
            raster: arguments::required_path(args, "raster")?,
            output_file: arguments::required_path(args, "output")?,
            config: config.clone(),
        })
    }
}

impl Command for PreviewCommand {
    fn execute(&self) -> BandResult<()> {
        BandTrace::new(self.config.clone()).preview(&self.raster, &self.output_file)?;
        println!("{}", self.output_file.display());
        Ok(())
    }
}
