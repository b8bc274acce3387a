//! Command pattern interfaces
//!
//! Each CLI subcommand is a `Command` built from parsed arguments by a
//! `CommandFactory`, which keeps argument handling out of `main`.

use crate::config::Settings;
use crate::errors::CarbonResult;

/// Represents an executable command in the application
pub trait Command {
    /// Execute the command
    ///
    /// # Returns
    /// Result indicating success or an error
    fn execute(&self) -> CarbonResult<()>;
}

/// Factory for creating commands from CLI arguments
pub trait CommandFactory<'a> {
    /// Create a new Command instance based on CLI arguments
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `settings` - Configuration loaded once at startup
    ///
    /// # Returns
    /// A command that implements the Command trait, or an error
    fn create_command(&self, args: &clap::ArgMatches, settings: &'a Settings) -> CarbonResult<Box<dyn Command + 'a>>;
}
