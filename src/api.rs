//! Library entry point
//!
//! `CarbonKit` ties the normalizer and the estimator together behind the
//! operations the CLI exposes, for callers embedding the pipeline.

use std::fs;
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::config::{ModelParameters, NormalizerOptions, Settings};
use crate::errors::{CarbonError, CarbonResult};
use crate::estimator::{self, SequestrationResult};
use crate::raster::{
    Bounds, GeoTransform, GridSource, GridStats, MediaType, NormalizedGrid, RasterNormalizer, RasterPayload,
};

/// Description of a normalized raster, without the estimate
#[derive(Debug, Clone, Serialize)]
pub struct RasterReport {
    pub filename: String,
    pub media_type: String,
    pub source: GridSource,
    /// `"embedded"` or `"placeholder"`
    pub georeference: String,
    pub transform: Option<GeoTransform>,
    pub bounds: Option<Bounds>,
    pub nodata: Option<f64>,
    pub cell_area_ha: f64,
    pub stats: GridStats,
}

/// Main interface to the carbonkit library
pub struct CarbonKit {
    params: ModelParameters,
    normalizer: RasterNormalizer,
}

impl CarbonKit {
    /// Creates an instance from validated model parameters
    ///
    /// # Arguments
    /// * `params` - Model constants, checked with `ModelParameters::validate`
    /// * `options` - Ingestion options
    ///
    /// # Returns
    /// A CarbonKit instance, or `InternalFault` for invalid parameters
    pub fn new(params: ModelParameters, options: NormalizerOptions) -> CarbonResult<Self> {
        params.validate()?;
        Ok(CarbonKit {
            params,
            normalizer: RasterNormalizer::from_parameters(&params, options),
        })
    }

    /// Creates an instance from loaded settings
    pub fn from_settings(settings: &Settings) -> CarbonResult<Self> {
        Self::new(settings.model, settings.ingest)
    }

    /// Draws a progress bar while decoding large geo-rasters
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.normalizer = self.normalizer.with_progress(show_progress);
        self
    }

    /// Normalizes a payload into a grid
    pub fn normalize(&self, payload: &RasterPayload) -> CarbonResult<NormalizedGrid> {
        self.normalizer.normalize_payload(payload)
    }

    /// Estimates sequestration for a payload
    ///
    /// A total that overflows to infinity is reported as `InternalFault`.
    pub fn assess(&self, payload: &RasterPayload) -> CarbonResult<SequestrationResult> {
        let grid = self.normalize(payload)?;
        let result = estimator::estimate(&grid, &self.params);
        if !result.total_co2_sequestered_tonnes.is_finite() || !result.carbon_credits.is_finite() {
            return Err(CarbonError::internal(format!(
                "Estimate for '{}' is not a finite number ({} t CO2)",
                payload.filename(), result.total_co2_sequestered_tonnes)));
        }

        info!("'{}': {}x{} cells, {} t CO2, {} credits",
              payload.filename(), grid.rows(), grid.cols(),
              result.total_co2_sequestered_tonnes, result.carbon_credits);
        Ok(result)
    }

    /// Estimates sequestration for raw bytes
    pub fn assess_bytes(&self, bytes: Vec<u8>, declared: Option<&str>, filename: &str) -> CarbonResult<SequestrationResult> {
        let payload = RasterPayload::new(bytes, declared, filename)?;
        self.assess(&payload)
    }

    /// Estimates sequestration for a file on disk
    ///
    /// The file name is used for media type resolution when `declared` is
    /// missing or ambiguous.
    pub fn assess_file<P: AsRef<Path>>(&self, path: P, declared: Option<&str>) -> CarbonResult<SequestrationResult> {
        let payload = Self::load_payload(path.as_ref(), declared)?;
        self.assess(&payload)
    }

    /// Describes the grid a payload normalizes to
    pub fn inspect(&self, payload: &RasterPayload) -> CarbonResult<RasterReport> {
        let grid = self.normalize(payload)?;
        let transform = grid.georeference().transform().copied();

        Ok(RasterReport {
            filename: payload.filename().to_string(),
            media_type: payload.media_type().to_string(),
            source: grid.source(),
            georeference: grid.georeference().kind().to_string(),
            transform,
            bounds: transform.map(|t| t.bounds(grid.cols(), grid.rows())),
            nodata: grid.nodata(),
            cell_area_ha: self.params.pixel_area_ha,
            stats: grid.stats(),
        })
    }

    /// Reads a file into a payload named after its file name
    pub fn load_payload(path: &Path, declared: Option<&str>) -> CarbonResult<RasterPayload> {
        let filename = path.file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| CarbonError::internal(format!("Invalid input path: {}", path.display())))?;
        MediaType::resolve(declared, filename)?;
        let bytes = fs::read(path)
            .map_err(|e| CarbonError::internal(format!("Failed to read {}: {}", path.display(), e)))?;

        RasterPayload::new(bytes, declared, filename)
    }
}
