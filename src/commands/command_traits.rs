//! Command pattern interfaces
//!
//! This module defines the core Command pattern interfaces
//! for the CLI application.

use crate::errors::BandResult;
use crate::utils::config::Config;

/// Represents an executable command in the application
///
/// Command objects hold everything parsed from the command line, so
/// `execute` only does the work.
pub trait Command {
    /// Execute the command
    ///
    /// # Returns
    /// Result indicating success or an error
    fn execute(&self) -> BandResult<()>;
}

/// Factory for creating commands from CLI arguments
pub trait CommandFactory {
    /// Create a new Command instance based on CLI arguments
    ///
    /// # Arguments
    /// * `args` - Top-level argument matches from clap
    /// * `config` - Loaded configuration the flags override
    ///
    /// # Returns
    /// A command that implements the Command trait, or an error
    fn create_command(&self, args: &clap::ArgMatches, config: &Config) -> BandResult<Box<dyn Command>>;
}
