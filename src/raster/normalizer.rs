//! Raster normalization
//!
//! Turns an uploaded payload into a `NormalizedGrid`: the first band of a
//! geo-raster, or the luminance of a plain image, clamped to non-negative
//! finite values.

use log::{debug, info, warn};

use crate::config::{ModelParameters, NormalizerOptions};
use crate::errors::{CarbonError, CarbonResult};
use crate::utils::format_utils;

use super::band_reader::{BandReader, ContainerInfo};
use super::georef::Georeference;
use super::grid::{GridSource, NormalizedGrid, MAX_GRID_CELLS};
use super::image_promoter::{self, PromotedImage};
use super::media_type::MediaType;
use super::payload::RasterPayload;

/// Decodes payloads into normalized grids
#[derive(Debug, Clone)]
pub struct RasterNormalizer {
    cell_area_ha: f64,
    options: NormalizerOptions,
    show_progress: bool,
}

impl RasterNormalizer {
    /// Creates a normalizer
    ///
    /// # Arguments
    /// * `cell_area_ha` - Ground area attached to every produced grid cell
    /// * `options` - Ingestion options
    pub fn new(cell_area_ha: f64, options: NormalizerOptions) -> Self {
        RasterNormalizer { cell_area_ha, options, show_progress: false }
    }

    /// Normalizer using the model's pixel area
    pub fn from_parameters(params: &ModelParameters, options: NormalizerOptions) -> Self {
        Self::new(params.pixel_area_ha, options)
    }

    /// Draws a progress bar while decoding geo-raster segments
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Normalizes raw bytes
    ///
    /// # Arguments
    /// * `bytes` - Encoded raster
    /// * `declared` - Declared content type, if any
    /// * `filename` - Original file name
    ///
    /// # Returns
    /// The grid, `UnsupportedFormat` when the media type is not accepted,
    /// or `CorruptInput` when no decoder can read the bytes
    pub fn normalize(&self, bytes: &[u8], declared: Option<&str>, filename: &str) -> CarbonResult<NormalizedGrid> {
        let media_type = MediaType::resolve(declared, filename)?;
        self.decode(bytes, media_type, filename)
    }

    /// Normalizes a payload whose media type was already resolved
    pub fn normalize_payload(&self, payload: &RasterPayload) -> CarbonResult<NormalizedGrid> {
        self.decode(payload.bytes(), payload.media_type(), payload.filename())
    }

    fn decode(&self, bytes: &[u8], media_type: MediaType, filename: &str) -> CarbonResult<NormalizedGrid> {
        let grid = self.decode_grid(bytes, media_type, filename)?;
        info!("'{}': {}x{} {:?} grid, {} clamped cell(s), {} georeference",
              filename, grid.rows(), grid.cols(), grid.source(),
              grid.clamped_cells(), grid.georeference().kind());
        Ok(grid)
    }

    fn decode_grid(&self, bytes: &[u8], media_type: MediaType, filename: &str) -> CarbonResult<NormalizedGrid> {
        if bytes.is_empty() {
            return Err(CarbonError::corrupt(format!("'{}' is empty", filename)));
        }
        debug!("Normalizing '{}' ({} bytes, declared {})", filename, bytes.len(), media_type);

        if format_utils::looks_like_tiff(bytes) {
            return self.decode_container(bytes, filename);
        }

        if media_type == MediaType::GeoRaster {
            info!("'{}' has no TIFF signature, decoding as a plain image", filename);
        }
        match image_promoter::promote(bytes) {
            Ok(image) => self.grid_from_image(image, None),
            Err(e) => Err(CarbonError::corrupt(format!("'{}' could not be decoded: {}", filename, e))),
        }
    }

    /// Decodes a TIFF container, falling back to the image decoder for
    /// layouts the band reader does not handle
    ///
    /// Damaged containers are `CorruptInput` without a fallback.
    fn decode_container(&self, bytes: &[u8], filename: &str) -> CarbonResult<NormalizedGrid> {
        let reader = BandReader::new(bytes).with_progress(self.show_progress);

        let band_error = match reader.read_band() {
            Ok(band) => {
                let georeference = match band.info.transform {
                    Some(transform) => Georeference::embedded(transform),
                    None => Georeference::placeholder(),
                };
                let samples = self.mask_nodata(band.samples, band.info.nodata);
                let grid = NormalizedGrid::from_samples(
                    band.info.height, band.info.width, samples,
                    self.cell_area_ha, georeference, GridSource::GeoRaster)?;
                return Ok(grid.with_nodata(band.info.nodata));
            },
            Err(e) => e,
        };

        if !band_error.is_unsupported() {
            warn!("Band reader failed on '{}': {}", filename, band_error);
            return Err(CarbonError::corrupt(format!("'{}' could not be decoded: {}", filename, band_error)));
        }
        info!("Band reader cannot decode '{}' ({}), trying image decoder", filename, band_error);

        match image_promoter::promote(bytes) {
            Ok(image) => {
                let info = reader.read_info().ok()
                    .filter(|info| info.width == image.width && info.height == image.height);
                self.grid_from_image(image, info)
            },
            Err(image_error) => Err(CarbonError::corrupt(format!(
                "'{}' could not be decoded: {}; image decoder: {}", filename, band_error, image_error))),
        }
    }

    /// Builds a grid from promoted samples, keeping container metadata
    /// when the TIFF structure itself was readable
    fn grid_from_image(&self, image: PromotedImage, info: Option<ContainerInfo>) -> CarbonResult<NormalizedGrid> {
        if image.width.saturating_mul(image.height) > MAX_GRID_CELLS {
            return Err(CarbonError::corrupt(format!(
                "Image of {}x{} exceeds {} cells", image.width, image.height, MAX_GRID_CELLS)));
        }

        let (georeference, nodata, source) = match info {
            Some(info) => (
                info.transform.map(Georeference::embedded).unwrap_or_else(Georeference::placeholder),
                info.nodata,
                GridSource::GeoRaster,
            ),
            None => (Georeference::placeholder(), None, GridSource::Image),
        };

        let samples = self.mask_nodata(image.samples, nodata);
        let grid = NormalizedGrid::from_samples(
            image.height, image.width, samples, self.cell_area_ha, georeference, source)?;
        Ok(grid.with_nodata(nodata))
    }

    /// Zeroes cells equal to the no-data value when masking is enabled
    fn mask_nodata(&self, mut samples: Vec<f64>, nodata: Option<f64>) -> Vec<f64> {
        let nodata = match nodata {
            Some(value) if self.options.mask_nodata => value,
            _ => return samples,
        };

        let mut masked = 0usize;
        for value in samples.iter_mut() {
            if *value == nodata || (nodata.is_nan() && value.is_nan()) {
                *value = 0.0;
                masked += 1;
            }
        }
        debug!("Masked {} no-data cell(s) equal to {}", masked, nodata);
        samples
    }
}
