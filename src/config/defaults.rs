//! Built-in model constants.
//!
//! Linear biomass regression and mass conversion factors applied to
//! 30 m x 30 m heatmap cells.

/// Biomass regression slope [t/ha per unit of pixel intensity].
pub const BIOMASS_COEF_A: f64 = 25.0;

/// Biomass regression intercept [t/ha].
pub const BIOMASS_COEF_B: f64 = 5.0;

/// Fraction of dry biomass mass that is carbon [-].
pub const CARBON_FRACTION: f64 = 0.475;

/// CO2 to carbon molecular weight ratio (44/12, rounded) [-].
pub const CO2_CONVERSION: f64 = 3.67;

/// Ground area of one 30 m x 30 m cell [ha].
pub const PIXEL_AREA_HA: f64 = 0.09;

/// Tonnes of CO2-equivalent per carbon credit [t].
pub const CREDITS_PER_TONNE_CO2: f64 = 1.0;

/// Whether declared no-data values are zeroed before clamping.
pub const MASK_NODATA: bool = false;
