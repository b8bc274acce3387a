//! Normalized single-band grids

use serde::Serialize;

use crate::errors::{CarbonError, CarbonResult};
use super::georef::Georeference;

/// Upper bound on cells in one grid, about 2 GiB of samples
pub const MAX_GRID_CELLS: usize = 1 << 28;

/// Clamps a raw sample into the estimator's domain
///
/// Positive finite values pass through; zero, negatives, NaN and
/// infinities become `0.0`.
pub fn clamp_sample(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Which decoder produced a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GridSource {
    /// First band of a TIFF/GeoTIFF container
    GeoRaster,
    /// Plain image promoted to one channel
    Image,
}

/// Two-dimensional grid of non-negative finite samples
///
/// Samples are stored row-major and are clamped on construction, so every
/// grid handed to the estimator already satisfies the non-negativity and
/// finiteness rules.
#[derive(Debug, Clone)]
pub struct NormalizedGrid {
    rows: usize,
    cols: usize,
    samples: Vec<f64>,
    cell_area_ha: f64,
    georeference: Georeference,
    source: GridSource,
    nodata: Option<f64>,
    clamped_cells: usize,
}

impl NormalizedGrid {
    /// Builds a grid from raw samples, clamping each one
    ///
    /// # Arguments
    /// * `rows`, `cols` - Grid shape
    /// * `raw` - Row-major samples, `rows * cols` of them
    /// * `cell_area_ha` - Ground area of one cell
    /// * `georeference` - Embedded transform or placeholder
    /// * `source` - Decoder that produced the samples
    pub fn from_samples(rows: usize, cols: usize, mut raw: Vec<f64>, cell_area_ha: f64,
                        georeference: Georeference, source: GridSource) -> CarbonResult<Self> {
        let expected = rows.checked_mul(cols)
            .ok_or_else(|| CarbonError::internal(format!("Grid shape {}x{} overflows", rows, cols)))?;
        if raw.len() != expected {
            return Err(CarbonError::internal(format!(
                "Grid {}x{} needs {} samples, got {}", rows, cols, expected, raw.len())));
        }

        let mut clamped_cells = 0;
        for value in raw.iter_mut() {
            let clamped = clamp_sample(*value);
            if clamped != *value || *value == 0.0 {
                clamped_cells += 1;
            }
            *value = clamped;
        }

        Ok(NormalizedGrid {
            rows,
            cols,
            samples: raw,
            cell_area_ha,
            georeference,
            source,
            nodata: None,
            clamped_cells,
        })
    }

    /// Records the declared no-data value of the source raster
    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Row-major samples
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Sample at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.samples.get(row * self.cols + col).copied()
    }

    pub fn cell_area_ha(&self) -> f64 {
        self.cell_area_ha
    }

    pub fn georeference(&self) -> &Georeference {
        &self.georeference
    }

    pub fn source(&self) -> GridSource {
        self.source
    }

    /// No-data value declared by the source raster, if any
    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Cells whose raw value was zero, negative or not finite
    pub fn clamped_cells(&self) -> usize {
        self.clamped_cells
    }

    /// Summary statistics of the clamped samples
    pub fn stats(&self) -> GridStats {
        let cells = self.samples.len();
        let (min, max, sum) = self.samples.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), &v| (min.min(v), max.max(v), sum + v),
        );

        GridStats {
            rows: self.rows,
            cols: self.cols,
            cells,
            clamped_cells: self.clamped_cells,
            min: if cells > 0 { min } else { 0.0 },
            max: if cells > 0 { max } else { 0.0 },
            mean: if cells > 0 { sum / cells as f64 } else { 0.0 },
        }
    }
}

/// Shape and value summary of a grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridStats {
    pub rows: usize,
    pub cols: usize,
    pub cells: usize,
    pub clamped_cells: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}
