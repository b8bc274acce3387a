//! Logger utility for application-wide logging
//!
//! A `log::Log` implementation that writes every record to a log file and
//! mirrors it to stderr. Stdout stays reserved for command output.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use log::{Log, Record, Level, Metadata, LevelFilter};

/// File-backed logger
pub struct Logger {
    /// File handle for log output
    file: Mutex<Option<File>>,
    /// Most verbose level recorded
    level: Level,
    /// Whether records are echoed to stderr
    mirror_to_stderr: bool,
}

impl Logger {
    /// Creates a new logger instance
    ///
    /// # Arguments
    ///
    /// * `log_file` - Path to the log file, truncated if it exists
    /// * `level` - Most verbose level recorded
    ///
    /// # Returns
    ///
    /// A new Logger instance or an error if the file cannot be created
    pub fn new(log_file: &str, level: Level) -> io::Result<Self> {
        let file = File::create(Path::new(log_file))?;
        Ok(Logger {
            file: Mutex::new(Some(file)),
            level,
            mirror_to_stderr: true,
        })
    }

    /// Disables the stderr echo
    pub fn quiet(mut self) -> Self {
        self.mirror_to_stderr = false;
        self
    }

    /// Appends a line to the log file
    pub fn write_line(&self, message: &str) -> io::Result<()> {
        let mut guard = self.file.lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        if let Some(file) = guard.as_mut() {
            writeln!(file, "{}", message)?;
            file.flush()?;
        }
        Ok(())
    }

    /// Installs the process-wide logger
    ///
    /// With a log file, records go to that file and to stderr. Without one,
    /// `env_logger` handles stderr output and honours `RUST_LOG`.
    ///
    /// # Arguments
    ///
    /// * `log_file` - Path of the log file, or `None` for stderr only
    /// * `verbose` - Record debug messages instead of info and above
    pub fn init_global_logger(log_file: Option<&str>, verbose: bool) -> io::Result<()> {
        let level = if verbose { Level::Debug } else { Level::Info };

        match log_file {
            Some(path) => {
                let global_logger = Logger::new(path, level)?;
                if log::set_boxed_logger(Box::new(global_logger)).is_err() {
                    eprintln!("Warning: Global logger was already initialized");
                }
                log::set_max_level(level_filter(verbose));
            },
            None => {
                let default_filter = if verbose { "debug" } else { "info" };
                let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
                    .target(env_logger::Target::Stderr)
                    .try_init();
            },
        }

        Ok(())
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("[{}] {}", record.level(), record.args());
            let _ = self.write_line(&message);

            if self.mirror_to_stderr {
                eprintln!("{}", message);
            }
        }
    }

    fn flush(&self) {}
}

/// Maps a verbosity flag to a level filter
pub fn level_filter(verbose: bool) -> LevelFilter {
    if verbose { LevelFilter::Debug } else { LevelFilter::Info }
}
