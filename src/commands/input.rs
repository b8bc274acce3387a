//! Input arguments shared by the raster subcommands

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use clap::ArgMatches;
use log::debug;

use crate::errors::{CarbonError, CarbonResult};
use crate::raster::RasterPayload;

/// Name used for stdin input when `--filename` is not given
const STDIN_NAME: &str = "stdin";

/// Where the raster comes from and how it is declared
#[derive(Debug, Clone)]
pub struct InputSpec {
    /// File path, or `-` for stdin
    pub path: String,
    pub media_type: Option<String>,
    /// Overrides the name used for extension-based resolution
    pub filename: Option<String>,
}

impl InputSpec {
    /// Reads `input`, `--media-type` and `--filename`
    pub fn from_args(args: &ArgMatches) -> CarbonResult<Self> {
        let path = args.get_one::<String>("input")
            .ok_or_else(|| CarbonError::internal("Missing input file"))?
            .clone();

        Ok(InputSpec {
            path,
            media_type: args.get_one::<String>("media-type").cloned(),
            filename: args.get_one::<String>("filename").cloned(),
        })
    }

    pub fn is_stdin(&self) -> bool {
        self.path == "-"
    }

    /// File name used for media type resolution and messages
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.filename {
            return name.clone();
        }
        if self.is_stdin() {
            return STDIN_NAME.to_string();
        }
        Path::new(&self.path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(self.path.as_str())
            .to_string()
    }

    /// Reads the raster bytes into a payload
    ///
    /// The media type is checked before anything is read.
    pub fn load(&self) -> CarbonResult<RasterPayload> {
        let filename = self.display_name();
        let declared = self.media_type.as_deref();
        crate::raster::MediaType::resolve(declared, &filename)?;

        let bytes = if self.is_stdin() {
            let mut buffer = Vec::new();
            io::stdin().lock().read_to_end(&mut buffer)
                .map_err(|e| CarbonError::internal(format!("Failed to read stdin: {}", e)))?;
            buffer
        } else {
            fs::read(&self.path)
                .map_err(|e| CarbonError::internal(format!("Failed to read {}: {}", self.path, e)))?
        };
        debug!("Read {} bytes from {}", bytes.len(), if self.is_stdin() { STDIN_NAME } else { self.path.as_str() });

        RasterPayload::new(bytes, declared, &filename)
    }
}

/// Prints command output to stdout, and also writes it to `path` when given
pub fn write_output(text: &str, path: Option<&str>) -> CarbonResult<()> {
    if let Some(path) = path {
        fs::write(path, format!("{}\n", text))
            .map_err(|e| CarbonError::internal(format!("Failed to write {}: {}", path, e)))?;
        debug!("Wrote output to {}", path);
    }

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", text)?;
    Ok(())
}
