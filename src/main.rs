use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};
use std::process;
use log::{debug, error, warn};

use carbonkit::commands::{CarbonkitCommandFactory, CommandFactory};
use carbonkit::config::Settings;
use carbonkit::errors::CarbonError;
use carbonkit::utils::logger::Logger;

const DEFAULT_LOG_FILE: &str = "carbonkit.log";

/// Arguments shared by the raster subcommands
fn input_args(command: ClapCommand) -> ClapCommand {
    command
        .arg(
            Arg::new("input")
                .help("Raster file (GeoTIFF, JPEG or PNG), or '-' for stdin")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("media-type")
                .short('t')
                .long("media-type")
                .help("Declared media type, e.g. image/tiff; the file extension decides when omitted")
                .value_name("TYPE")
                .required(false),
        )
        .arg(
            Arg::new("filename")
                .long("filename")
                .help("File name used for extension-based type resolution (useful with stdin)")
                .value_name("NAME")
                .required(false),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Also write the JSON result to this file")
                .value_name("FILE")
                .required(false),
        )
}

fn cli() -> ClapCommand {
    ClapCommand::new("carbonkit")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Maurice Schilpp")
        .about("Estimate biomass, carbon stock and CO2 sequestration from vegetation heatmaps")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("TOML file overriding the built-in model parameters")
                .value_name("FILE")
                .global(true)
                .required(false),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging and progress bars")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Log file path, or 'none' to log to stderr only")
                .value_name("FILE")
                .default_value(DEFAULT_LOG_FILE)
                .global(true),
        )
        .subcommand(input_args(
            ClapCommand::new("estimate")
                .about("Estimate total CO2 sequestered and carbon credits for a raster"),
        ))
        .subcommand(input_args(
            ClapCommand::new("inspect")
                .about("Show how a raster normalizes: shape, georeferencing and value statistics"),
        ))
}

/// Flags of the selected subcommand, where global arguments are propagated
fn subcommand_matches(matches: &ArgMatches) -> &ArgMatches {
    matches.subcommand().map(|(_, sub)| sub).unwrap_or(matches)
}

fn exit_with(e: &CarbonError) -> ! {
    if e.is_user_error() {
        warn!("Rejected input ({}): {}", e.kind(), e);
    } else {
        error!("{} error: {}", e.kind(), e);
    }
    eprintln!("Error: {}", e);
    process::exit(e.exit_code());
}

fn main() {
    let matches = cli().get_matches();
    let args = subcommand_matches(&matches);

    let verbose = args.get_flag("verbose");
    let log_file = args.get_one::<String>("log-file")
        .map(String::as_str)
        .filter(|path| !path.eq_ignore_ascii_case("none"));

    if let Err(e) = Logger::init_global_logger(log_file, verbose) {
        eprintln!("Error setting up logger: {}", e);
        process::exit(1);
    }

    let config_path = args.get_one::<String>("config").map(String::as_str);
    let settings = match Settings::load(config_path) {
        Ok(settings) => settings,
        Err(e) => exit_with(&CarbonError::from(e)),
    };
    debug!("Model parameters: {:?}", settings.model);

    let factory = CarbonkitCommandFactory::new();
    let command = match factory.create_command(&matches, &settings) {
        Ok(command) => command,
        Err(e) => exit_with(&e),
    };

    if let Err(e) = command.execute() {
        exit_with(&e);
    }
}
