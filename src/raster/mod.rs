//! Raster normalization
//!
//! Media type resolution, first-band decoding of geo-rasters, promotion of
//! plain images and the `NormalizedGrid` handed to the estimator.

pub mod media_type;
pub mod payload;
pub mod georef;
pub mod grid;
pub mod sample;
pub mod band_reader;
pub mod image_promoter;
pub mod normalizer;

pub use band_reader::{BandReader, ContainerInfo, DecodedBand};
pub use georef::{Bounds, GeoTransform, Georeference};
pub use grid::{clamp_sample, GridSource, GridStats, NormalizedGrid};
pub use media_type::MediaType;
pub use normalizer::RasterNormalizer;
pub use payload::RasterPayload;
