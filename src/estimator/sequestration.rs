use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::ModelParameters;
use crate::raster::NormalizedGrid;

/// Rounded outcome of an estimate, as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequestrationResult {
    /// Total CO2-equivalent over all cells [t], two decimals
    #[serde(rename = "total_CO2_sequestered_tonnes")]
    pub total_co2_sequestered_tonnes: f64,
    /// Credits for that total, two decimals
    pub carbon_credits: f64,
}

/// Full-precision sums, before rounding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequestrationTotals {
    pub biomass_tonnes: f64,
    pub carbon_tonnes: f64,
    pub co2_tonnes: f64,
    pub carbon_credits: f64,
    /// Cells that contributed a finite value
    pub counted_cells: usize,
}

/// Biomass density of one sample [t/ha]
pub fn biomass_per_ha(sample: f64, params: &ModelParameters) -> f64 {
    params.biomass_coef_a * sample + params.biomass_coef_b
}

/// CO2-equivalent stored in one cell [t]
pub fn co2_per_cell(sample: f64, params: &ModelParameters) -> f64 {
    let biomass = biomass_per_ha(sample, params) * params.pixel_area_ha;
    let carbon = biomass * params.carbon_fraction;
    carbon * params.co2_conversion
}

/// Compensated running sum
///
/// Once the sum overflows it stays infinite; the compensation term is no
/// longer updated, so the total never becomes NaN.
#[derive(Default)]
struct Accumulator {
    sum: f64,
    compensation: f64,
}

impl Accumulator {
    fn add(&mut self, value: f64) {
        let t = self.sum + value;
        if !t.is_finite() {
            self.sum = t;
            return;
        }
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    fn total(&self) -> f64 {
        if !self.sum.is_finite() {
            return self.sum;
        }
        self.sum + self.compensation
    }
}

/// Sums the conversion chain over every cell at full precision
///
/// Non-finite per-cell values are skipped. The grid's own cell area is
/// not used; `params.pixel_area_ha` is authoritative.
pub fn accumulate(grid: &NormalizedGrid, params: &ModelParameters) -> SequestrationTotals {
    if grid.cell_area_ha() != params.pixel_area_ha {
        warn!("Grid cell area {} ha differs from model pixel area {} ha; using the model value",
              grid.cell_area_ha(), params.pixel_area_ha);
    }

    let mut biomass = Accumulator::default();
    let mut carbon = Accumulator::default();
    let mut co2 = Accumulator::default();
    let mut counted_cells = 0usize;

    for &sample in grid.samples() {
        let cell_biomass = biomass_per_ha(sample, params) * params.pixel_area_ha;
        let cell_carbon = cell_biomass * params.carbon_fraction;
        let cell_co2 = cell_carbon * params.co2_conversion;
        if cell_co2.is_finite() {
            biomass.add(cell_biomass);
            carbon.add(cell_carbon);
            co2.add(cell_co2);
            counted_cells += 1;
        }
    }

    let (biomass_tonnes, carbon_tonnes, co2_tonnes) = (biomass.total(), carbon.total(), co2.total());

    debug!("Accumulated {} of {} cells: biomass {} t, carbon {} t, CO2 {} t",
           counted_cells, grid.len(), biomass_tonnes, carbon_tonnes, co2_tonnes);

    SequestrationTotals {
        biomass_tonnes,
        carbon_tonnes,
        co2_tonnes,
        carbon_credits: co2_tonnes / params.credits_per_tonne_co2,
        counted_cells,
    }
}

/// Estimates sequestration for a grid, rounded to two decimals
pub fn estimate(grid: &NormalizedGrid, params: &ModelParameters) -> SequestrationResult {
    let totals = accumulate(grid, params);
    SequestrationResult {
        total_co2_sequestered_tonnes: round_to_hundredths(totals.co2_tonnes),
        carbon_credits: round_to_hundredths(totals.carbon_credits),
    }
}

/// Rounds to two decimals, ties to even on the exact binary value
pub fn round_to_hundredths(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.2}", value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{Georeference, GridSource};

    fn grid(rows: usize, cols: usize, samples: Vec<f64>) -> NormalizedGrid {
        NormalizedGrid::from_samples(rows, cols, samples, 0.09, Georeference::placeholder(), GridSource::Image)
            .unwrap()
    }

    #[test]
    fn test_single_cell_chain() {
        let params = ModelParameters::default();
        // (25 * 10 + 5) * 0.09 * 0.475 * 3.67
        assert!((co2_per_cell(10.0, &params) - 40.0075875).abs() < 1e-9);
        assert_eq!(biomass_per_ha(0.0, &params), 5.0);
    }

    #[test]
    fn test_uniform_grid() {
        let result = estimate(&grid(3, 4, vec![10.0; 12]), &ModelParameters::default());
        assert_eq!(result.total_co2_sequestered_tonnes, 480.09);
        assert_eq!(result.carbon_credits, 480.09);
    }

    #[test]
    fn test_zero_grid_still_counts_intercept() {
        let result = estimate(&grid(2, 2, vec![0.0; 4]), &ModelParameters::default());
        // 4 * 5 * 0.09 * 0.475 * 3.67 = 3.137850
        assert_eq!(result.total_co2_sequestered_tonnes, 3.14);
    }

    #[test]
    fn test_empty_grid() {
        let result = estimate(&grid(0, 0, Vec::new()), &ModelParameters::default());
        assert_eq!(result.total_co2_sequestered_tonnes, 0.0);
        assert_eq!(result.carbon_credits, 0.0);
    }

    #[test]
    fn test_credit_ratio() {
        let params = ModelParameters { credits_per_tonne_co2: 2.0, ..ModelParameters::default() };
        let totals = accumulate(&grid(1, 1, vec![10.0]), &params);
        assert!((totals.carbon_credits * 2.0 - totals.co2_tonnes).abs() < 1e-12);
        assert_eq!(totals.counted_cells, 1);
    }

    #[test]
    fn test_non_finite_cells_are_skipped() {
        let params = ModelParameters { biomass_coef_a: f64::MAX, ..ModelParameters::default() };
        let totals = accumulate(&grid(1, 2, vec![f64::MAX, 0.0]), &params);
        assert_eq!(totals.counted_cells, 1);
        assert!(totals.co2_tonnes.is_finite());
    }

    #[test]
    fn test_overflowing_sum_is_infinite_not_nan() {
        let totals = accumulate(&grid(1, 100, vec![1e306; 100]), &ModelParameters::default());
        assert_eq!(totals.counted_cells, 100);
        assert_eq!(totals.co2_tonnes, f64::INFINITY);
        assert_eq!(totals.carbon_credits, f64::INFINITY);

        let result = estimate(&grid(1, 100, vec![1e306; 100]), &ModelParameters::default());
        assert!(!result.total_co2_sequestered_tonnes.is_nan());
        assert!(!result.carbon_credits.is_nan());
    }

    #[test]
    fn test_model_area_is_authoritative() {
        let g = NormalizedGrid::from_samples(1, 1, vec![10.0], 1.0, Georeference::placeholder(), GridSource::Image)
            .unwrap();
        let result = estimate(&g, &ModelParameters::default());
        assert_eq!(result.total_co2_sequestered_tonnes, 40.01);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_to_hundredths(3.13785), 3.14);
        assert_eq!(round_to_hundredths(480.0910500000001), 480.09);
        assert_eq!(round_to_hundredths(2.675), 2.67);
        assert_eq!(round_to_hundredths(0.0), 0.0);
        assert_eq!(round_to_hundredths(-1.005), -1.0);
    }

    #[test]
    fn test_serialized_field_names() {
        let result = SequestrationResult { total_co2_sequestered_tonnes: 480.09, carbon_credits: 480.09 };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"total_CO2_sequestered_tonnes":480.09,"carbon_credits":480.09}"#);
    }
}
