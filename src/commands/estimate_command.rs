//! Sequestration estimate command

use clap::ArgMatches;
use log::info;

use crate::api::CarbonKit;
use crate::commands::command_traits::Command;
use crate::commands::input::{self, InputSpec};
use crate::config::Settings;
use crate::errors::CarbonResult;

/// Estimates CO2 sequestration for one raster and prints the result as JSON
pub struct EstimateCommand<'a> {
    input: InputSpec,
    /// Where to write the JSON result, stdout when absent
    output: Option<String>,
    verbose: bool,
    settings: &'a Settings,
}

impl<'a> EstimateCommand<'a> {
    /// Create a new estimate command
    ///
    /// # Arguments
    /// * `args` - Matches of the `estimate` subcommand
    /// * `settings` - Loaded configuration
    pub fn new(args: &ArgMatches, settings: &'a Settings) -> CarbonResult<Self> {
        Ok(EstimateCommand {
            input: InputSpec::from_args(args)?,
            output: args.get_one::<String>("output").cloned(),
            verbose: args.get_flag("verbose"),
            settings,
        })
    }
}

impl<'a> Command for EstimateCommand<'a> {
    fn execute(&self) -> CarbonResult<()> {
        let kit = CarbonKit::from_settings(self.settings)?.with_progress(self.verbose);
        let payload = self.input.load()?;
        info!("Estimating sequestration for '{}' ({})", payload.filename(), payload.media_type());

        let result = kit.assess(&payload)?;
        let json = serde_json::to_string_pretty(&result)?;
        input::write_output(&json, self.output.as_deref())
    }
}
