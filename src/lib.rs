pub mod io;
pub mod tiff;
pub mod utils;
pub mod compression;
pub mod raster;
pub mod estimator;
pub mod config;
pub mod errors;
pub mod commands;
pub mod api;

pub use crate::api::{CarbonKit, RasterReport};

pub use config::{ModelParameters, NormalizerOptions, Settings};
pub use errors::{CarbonError, CarbonResult};
pub use estimator::{estimate, SequestrationResult};
pub use raster::{GeoTransform, Georeference, MediaType, NormalizedGrid, RasterNormalizer, RasterPayload};
