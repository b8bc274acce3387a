//! CLI command implementations
//!
//! Subcommands are implemented with the Command pattern and selected by
//! `CarbonkitCommandFactory`.

pub mod command_traits;
pub mod input;
pub mod estimate_command;
pub mod inspect_command;

pub use command_traits::{Command, CommandFactory};
pub use estimate_command::EstimateCommand;
pub use inspect_command::InspectCommand;

use clap::ArgMatches;
use crate::config::Settings;
use crate::errors::{CarbonError, CarbonResult};

/// Factory for creating command instances from parsed subcommands
pub struct CarbonkitCommandFactory;

impl CarbonkitCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        CarbonkitCommandFactory
    }
}

impl Default for CarbonkitCommandFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CommandFactory<'a> for CarbonkitCommandFactory {
    fn create_command(&self, args: &ArgMatches, settings: &'a Settings) -> CarbonResult<Box<dyn Command + 'a>> {
        match args.subcommand() {
            Some(("estimate", sub_args)) => Ok(Box::new(EstimateCommand::new(sub_args, settings)?)),
            Some(("inspect", sub_args)) => Ok(Box::new(InspectCommand::new(sub_args, settings)?)),
            Some((name, _)) => Err(CarbonError::internal(format!("Unknown command: {}", name))),
            None => Err(CarbonError::internal("No command given; try 'carbonkit estimate <INPUT>'")),
        }
    }
}
