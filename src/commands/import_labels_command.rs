//! Label import command

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::api::BandTrace;
use crate::commands::arguments;
use crate::commands::command_traits::Command;
use crate::errors::BandResult;
use crate::utils::config::Config;

/// Command for appending GeoJSON polygons to an annotation store
pub struct ImportLabelsCommand {
    /// Raster the labels are drawn on
    raster: PathBuf,
    features: PathBuf,
    store: PathBuf,
    config: Config,
}

impl ImportLabelsCommand {
    pub fn new(args: &ArgMatches, config: &Config) -> BandResult<Self> {
        let mut config = config.clone();
        if let Some(epsg) = arguments::parse_epsg(args, "source-epsg")? {
            config.label_source_epsg = epsg;
        }

        Ok(ImportLabelsCommand {
            raster: arguments::required_path(args, "raster")?,
            features: arguments::required_path(args, "features")?,
            store: arguments::required_path(args, "store")?,
            config,
        })
    }
}

impl Command for ImportLabelsCommand {
    fn execute(&self) -> BandResult<()> {
        let api = BandTrace::new(self.config.clone());
        let objects = api.import_labels(&self.raster, &self.features, &self.store)?;

        info!("Imported {} labels into {}", objects.len(), self.store.display());
        println!("{}", self.store.display());
        Ok(())
    }
}
