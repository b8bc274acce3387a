//! Process configuration
//!
//! Model parameters and ingestion options, built from compiled-in
//! defaults optionally overlaid by a TOML file.

pub mod defaults;
mod settings;

pub use settings::{ConfigError, ModelParameters, NormalizerOptions, Settings};
