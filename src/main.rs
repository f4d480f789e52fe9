use std::path::Path;
use std::process;

use log::{error, LevelFilter};

use bandtrace::commands::{cli, BandTraceCommandFactory, CommandFactory};
use bandtrace::utils::config::Config;
use bandtrace::utils::logger::Logger;

fn main() {
    let matches = cli().get_matches();

    let config = match Config::load(matches.get_one::<String>("config").map(Path::new)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        match config.level_filter() {
            Ok(level) => level,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    };

    let log_file = matches
        .get_one::<String>("log-file")
        .map(Path::new)
        .or(config.log_file.as_deref());

    match log_file {
        Some(path) => {
            if let Err(e) = Logger::init_global_logger(path, level) {
                eprintln!("Error setting up logger: {}", e);
                process::exit(1);
            }
        },
        None => {
            env_logger::Builder::new().filter_level(level).init();
        },
    }

    let factory = BandTraceCommandFactory::new();
    match factory.create_command(&matches, &config) {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
}
