//! Elevation band extraction command
//!
//! Cuts `{bottom, top}` band features from a surface model, optionally
//! relative to a terrain model.

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::api::BandTrace;
use crate::commands::arguments;
use crate::commands::command_traits::Command;
use crate::errors::BandResult;
use crate::utils::config::Config;

/// Command for extracting elevation bands
pub struct ExtractCommand {
    /// Path to the surface model
    input_file: PathBuf,
    /// Step or range list
    bands: String,
    /// Terrain model for difference mode
    dtm: Option<PathBuf>,
    output_file: Option<PathBuf>,
    show_progress: bool,
    config: Config,
}

impl ExtractCommand {
    /// Create a new extract command
    ///
    /// # Arguments
    /// * `args` - Matches of the `extract` subcommand
    /// * `config` - Loaded configuration; `--epsg` and `--noise-filter-size` override it
    ///
    /// # Returns
    /// A new ExtractCommand instance or an error
    pub fn new(args: &ArgMatches, config: &Config) -> BandResult<Self> {
        let input_file = arguments::required_path(args, "input")?;
        let bands = arguments::required_string(args, "bands")?;
        let dtm = arguments::optional_path(args, "dtm");
        info!("Input file: {}, bands: {}, dtm: {:?}", input_file.display(), bands, dtm);

        let mut config = config.clone();
        if let Some(epsg) = arguments::parse_epsg(args, "epsg")? {
            config.epsg = epsg;
        }
        if let Some(size) = arguments::parse_number::<f64>(args, "noise-filter-size")? {
            config.noise_filter_size = size;
        }

        Ok(ExtractCommand {
            input_file,
            bands,
            dtm,
            output_file: arguments::optional_path(args, "output"),
            show_progress: args.get_flag("progress"),
            config,
        })
    }
}

impl Command for ExtractCommand {
    fn execute(&self) -> BandResult<()> {
        let api = BandTrace::new(self.config.clone()).with_progress(self.show_progress);
        let output = api.extract_bands(
            &self.input_file,
            &self.bands,
            self.dtm.as_deref(),
            self.output_file.as_deref(),
        )?;

        println!("{}", output.display());
        Ok(())
    }
}
