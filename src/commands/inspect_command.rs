//! Raster inspection command

use clap::ArgMatches;
use log::info;

use crate::api::CarbonKit;
use crate::commands::command_traits::Command;
use crate::commands::input::{self, InputSpec};
use crate::config::Settings;
use crate::errors::CarbonResult;

/// Reports how a raster normalizes: shape, georeferencing, no-data and
/// value statistics
pub struct InspectCommand<'a> {
    input: InputSpec,
    output: Option<String>,
    settings: &'a Settings,
}

impl<'a> InspectCommand<'a> {
    pub fn new(args: &ArgMatches, settings: &'a Settings) -> CarbonResult<Self> {
        Ok(InspectCommand {
            input: InputSpec::from_args(args)?,
            output: args.get_one::<String>("output").cloned(),
            settings,
        })
    }
}

impl<'a> Command for InspectCommand<'a> {
    fn execute(&self) -> CarbonResult<()> {
        let kit = CarbonKit::from_settings(self.settings)?;
        let payload = self.input.load()?;

        let report = kit.inspect(&payload)?;
        info!("'{}': {}x{} {:?} grid, georeference {}",
              report.filename, report.stats.rows, report.stats.cols, report.source, report.georeference);

        let json = serde_json::to_string_pretty(&report)?;
        input::write_output(&json, self.output.as_deref())
    }
}
