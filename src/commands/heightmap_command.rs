//! Heightmap extraction command

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::api::BandTrace;
use crate::commands::arguments;
use crate::commands::command_traits::Command;
use crate::errors::BandResult;
use crate::utils::config::Config;

/// Command for extracting `{level}` features with a uniform step
pub struct HeightmapCommand {
    input_file: PathBuf,
    interval: String,
    output_file: Option<PathBuf>,
    show_progress: bool,
    config: Config,
}

impl HeightmapCommand {
    /// Create a new heightmap command
    ///
    /// `--epsg` and `--kernel-size` override the configuration.
    pub fn new(args: &ArgMatches, config: &Config) -> BandResult<Self> {
        let input_file = arguments::required_path(args, "input")?;
        let interval = arguments::required_string(args, "interval")?;
        info!("Input file: {}, interval: {}", input_file.display(), interval);

        let mut config = config.clone();
        if let Some(epsg) = arguments::parse_epsg(args, "epsg")? {
            config.epsg = epsg;
        }
        if let Some(kernel_size) = arguments::parse_number::<i64>(args, "kernel-size")? {
            config.kernel_size = kernel_size;
        }

        Ok(HeightmapCommand {
            input_file,
            interval,
            output_file: arguments::optional_path(args, "output"),
            show_progress: args.get_flag("progress"),
            config,
        })
    }
}

impl Command for HeightmapCommand {
    fn execute(&self) -> BandResult<()> {
        let api = BandTrace::new(self.config.clone()).with_progress(self.show_progress);
        let output = api.extract_heightmap(&self.input_file, &self.interval, self.output_file.as_deref())?;
        println!("{}", output.display());
        Ok(())
    }
}
