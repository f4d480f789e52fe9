//! Label export command

use std::path::PathBuf;

use clap::ArgMatches;

use crate::api::BandTrace;
use crate::commands::arguments;
use crate::commands::command_traits::Command;
use crate::errors::BandResult;
use crate::utils::config::Config;

/// Command for writing verified labels as GeoJSON
pub struct ExportLabelsCommand {
    raster: PathBuf,
    store: PathBuf,
    output_file: Option<PathBuf>,
    config: Config,
}

impl ExportLabelsCommand {
    pub fn new(args: &ArgMatches, config: &Config) -> BandResult<Self> {
        let mut config = config.clone();
        if let Some(epsg) = arguments::parse_epsg(args, "epsg")? {
            config.epsg = epsg;
        }

        Ok(ExportLabelsCommand {
            raster: arguments::required_path(args, "raster")?,
            store: arguments::required_path(args, "store")?,
            output_file: arguments::optional_path(args, "output"),
            config,
        })
    }
}

impl Command for ExportLabelsCommand {
    fn execute(&self) -> BandResult<()> {
        let api = BandTrace::new(self.config.clone());
        let count = api.export_labels(&self.raster, &self.store, self.output_file.as_deref())?;
        println!("{} features", count);
        Ok(())
    }
}
