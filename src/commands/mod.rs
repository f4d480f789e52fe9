//! CLI command implementations
//!
//! This module contains the subcommands of the `bandtrace` binary,
//! implemented with the Command pattern.

mod arguments;
pub mod command_traits;
pub mod export_labels_command;
pub mod extract_command;
pub mod heightmap_command;
pub mod import_labels_command;
pub mod preview_command;

pub use command_traits::{Command, CommandFactory};
pub use export_labels_command::ExportLabelsCommand;
pub use extract_command::ExtractCommand;
pub use heightmap_command::HeightmapCommand;
pub use import_labels_command::ImportLabelsCommand;
pub use preview_command::PreviewCommand;

use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};

use crate::errors::{BandTraceError, BandResult};
use crate::utils::config::Config;

fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .help("Output GeoJSON file (defaults to the configured output)")
        .value_name("FILE")
}

fn epsg_arg() -> Arg {
    Arg::new("epsg")
        .long("epsg")
        .help("EPSG code of the output coordinates, e.g. 4326 or EPSG:3857")
        .value_name("CODE")
}

fn progress_arg() -> Arg {
    Arg::new("progress")
        .long("progress")
        .help("Show a progress bar over the bands")
        .action(ArgAction::SetTrue)
}

/// Command-line definition of the binary
pub fn cli() -> ClapCommand {
    ClapCommand::new("bandtrace")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Trace elevation bands of GeoTIFF rasters into GeoJSON and exchange them as labels")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .help("Configuration file (defaults to ./bandtrace.toml when present)")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Also write log records to this file")
                .value_name("FILE"),
        )
        .subcommand(
            ClapCommand::new("extract")
                .about("Extract elevation band features")
                .arg(Arg::new("input").help("Surface model GeoTIFF").required(true).index(1))
                .arg(
                    Arg::new("bands")
                        .short('b')
                        .long("bands")
                        .help("Uniform step (e.g. '2.5') or ranges (e.g. '0-10,10-20')")
                        .value_name("BANDS")
                        .required(true),
                )
                .arg(
                    Arg::new("dtm")
                        .long("dtm")
                        .help("Terrain model; bands are cut from the height above it")
                        .value_name("FILE"),
                )
                .arg(
                    Arg::new("noise-filter-size")
                        .long("noise-filter-size")
                        .help("Closing element size in metres, 0 disables filtering")
                        .value_name("METRES"),
                )
                .arg(epsg_arg())
                .arg(output_arg())
                .arg(progress_arg()),
        )
        .subcommand(
            ClapCommand::new("heightmap")
                .about("Extract level features with a uniform step")
                .arg(Arg::new("input").help("Elevation GeoTIFF").required(true).index(1))
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .help("Uniform step between levels")
                        .value_name("STEP")
                        .required(true),
                )
                .arg(
                    Arg::new("kernel-size")
                        .long("kernel-size")
                        .help("Closing kernel size in pixels, 0 or less disables filtering")
                        .value_name("PIXELS")
                        .allow_negative_numbers(true),
                )
                .arg(epsg_arg())
                .arg(output_arg())
                .arg(progress_arg()),
        )
        .subcommand(
            ClapCommand::new("import-labels")
                .about("Append GeoJSON polygons to a raster's annotation store")
                .arg(Arg::new("raster").help("Raster the labels are drawn on").required(true).index(1))
                .arg(
                    Arg::new("features")
                        .long("features")
                        .help("GeoJSON feature collection to import")
                        .value_name("FILE")
                        .required(true),
                )
                .arg(
                    Arg::new("store")
                        .long("store")
                        .help("LabelMe annotation file, created if missing")
                        .value_name("FILE")
                        .required(true),
                )
                .arg(
                    Arg::new("source-epsg")
                        .long("source-epsg")
                        .help("EPSG code of the imported coordinates")
                        .value_name("CODE"),
                ),
        )
        .subcommand(
            ClapCommand::new("export-labels")
                .about("Export verified labels as GeoJSON")
                .arg(Arg::new("raster").help("Raster the labels are drawn on").required(true).index(1))
                .arg(
                    Arg::new("store")
                        .long("store")
                        .help("LabelMe annotation file")
                        .value_name("FILE")
                        .required(true),
                )
                .arg(epsg_arg())
                .arg(output_arg()),
        )
        .subcommand(
            ClapCommand::new("preview")
                .about("Render a raster to a grayscale PNG")
                .arg(Arg::new("raster").help("Raster to render").required(true).index(1))
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Output PNG file")
                        .value_name("FILE")
                        .required(true),
                ),
        )
}

/// Factory for creating command instances based on CLI arguments
pub struct BandTraceCommandFactory;

impl BandTraceCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        BandTraceCommandFactory
    }
}

impl Default for BandTraceCommandFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandFactory for BandTraceCommandFactory {
    fn create_command(&self, args: &ArgMatches, config: &Config) -> BandResult<Box<dyn Command>> {
        match args.subcommand() {
            Some(("extract", sub)) => Ok(Box::new(ExtractCommand::new(sub, config)?)),
            Some(("heightmap", sub)) => Ok(Box::new(HeightmapCommand::new(sub, config)?)),
            Some(("import-labels", sub)) => Ok(Box::new(ImportLabelsCommand::new(sub, config)?)),
            Some(("export-labels", sub)) => Ok(Box::new(ExportLabelsCommand::new(sub, config)?)),
            Some(("preview", sub)) => Ok(Box::new(PreviewCommand::new(sub, config)?)),
            Some((name, _)) => Err(BandTraceError::GenericError(format!("Unknown command: {}", name))),
            None => Err(BandTraceError::GenericError("No command given".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn test_factory_builds_every_subcommand() {
        let factory = BandTraceCommandFactory::new();
        let config = Config::default();
        let invocations: [&[&str]; 5] = [
            &["bandtrace", "extract", "dsm.tif", "--bands", "0-10,10-20", "--dtm", "dtm.tif"],
            &["bandtrace", "heightmap", "dsm.tif", "--interval", "2", "--kernel-size", "-1"],
            &["bandtrace", "import-labels", "dsm.tif", "--features", "in.json", "--store", "dsm.xml"],
            &["bandtrace", "export-labels", "dsm.tif", "--store", "dsm.xml", "--epsg", "EPSG:3857"],
            &["bandtrace", "preview", "dsm.tif", "-o", "dsm.png"],
        ];

        for argv in invocations {
            let matches = cli().try_get_matches_from(argv).unwrap();
            assert!(factory.create_command(&matches, &config).is_ok(), "{:?}", argv);
        }
    }

    #[test]
    fn test_unknown_epsg_fails_at_construction() {
        let matches = cli()
            .try_get_matches_from(["bandtrace", "extract", "dsm.tif", "-b", "2", "--epsg", "99999"])
            .unwrap();
        let result = BandTraceCommandFactory::new().create_command(&matches, &Config::default());
        assert!(matches!(result, Err(BandTraceError::UnsupportedCrs(99999))));
    }
}
