use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::defaults;

/// Errors raised while loading or validating configuration
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    Io { path: String, source: io::Error },
    /// The configuration text is not valid TOML for the expected layout
    Parse(toml::de::Error),
    /// A value is outside its permitted range
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read configuration '{}': {}", path, source)
            },
            ConfigError::Parse(e) => write!(f, "Invalid configuration: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid model parameter: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::Parse(error)
    }
}

/// Conversion constants of the biomass and carbon model
///
/// Read-only once built. Missing keys in a configuration file keep their
/// default values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelParameters {
    /// Regression slope applied to the pixel intensity [t/ha]
    pub biomass_coef_a: f64,
    /// Regression intercept [t/ha]
    pub biomass_coef_b: f64,
    /// Carbon share of dry biomass
    pub carbon_fraction: f64,
    /// CO2 to carbon mass ratio
    pub co2_conversion: f64,
    /// Ground area represented by one cell [ha]
    pub pixel_area_ha: f64,
    /// Tonnes of CO2 per credit
    pub credits_per_tonne_co2: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        ModelParameters {
            biomass_coef_a: defaults::BIOMASS_COEF_A,
            biomass_coef_b: defaults::BIOMASS_COEF_B,
            carbon_fraction: defaults::CARBON_FRACTION,
            co2_conversion: defaults::CO2_CONVERSION,
            pixel_area_ha: defaults::PIXEL_AREA_HA,
            credits_per_tonne_co2: defaults::CREDITS_PER_TONNE_CO2,
        }
    }
}

impl ModelParameters {
    /// Checks that every constant is usable by the estimator
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("biomass_coef_a", self.biomass_coef_a),
            ("biomass_coef_b", self.biomass_coef_b),
            ("carbon_fraction", self.carbon_fraction),
            ("co2_conversion", self.co2_conversion),
            ("pixel_area_ha", self.pixel_area_ha),
            ("credits_per_tonne_co2", self.credits_per_tonne_co2),
        ];

        for (name, value) in named {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{} must be finite, got {}", name, value)));
            }
        }

        if self.pixel_area_ha <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "pixel_area_ha must be positive, got {}", self.pixel_area_ha)));
        }
        if self.credits_per_tonne_co2 <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "credits_per_tonne_co2 must be positive, got {}", self.credits_per_tonne_co2)));
        }
        if self.carbon_fraction <= 0.0 || self.carbon_fraction > 1.0 {
            return Err(ConfigError::Invalid(format!(
                "carbon_fraction must lie in (0, 1], got {}", self.carbon_fraction)));
        }

        Ok(())
    }
}

/// Options controlling how rasters are turned into grids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizerOptions {
    /// Zero cells equal to the declared no-data value before clamping
    pub mask_nodata: bool,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        NormalizerOptions { mask_nodata: defaults::MASK_NODATA }
    }
}

/// Complete process configuration
///
/// Mirrors the layout of `model_parameters.toml`:
///
/// ```toml
/// [model]
/// biomass_coef_a = 25.0
///
/// [ingest]
/// mask_nodata = false
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Model constants
    pub model: ModelParameters,
    /// Ingestion options
    pub ingest: NormalizerOptions,
}

impl Settings {
    /// Parses and validates settings from TOML text
    ///
    /// # Arguments
    /// * `text` - TOML document with optional `[model]` and `[ingest]` tables
    ///
    /// # Returns
    /// Validated settings, defaults filling any missing key
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(text)?;
        settings.model.validate()?;
        Ok(settings)
    }

    /// Loads and validates settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&text)
    }

    /// Loads settings from `path` when given, otherwise returns the defaults
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Settings::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_constants() {
        let params = ModelParameters::default();
        assert_eq!(params.biomass_coef_a, 25.0);
        assert_eq!(params.biomass_coef_b, 5.0);
        assert_eq!(params.carbon_fraction, 0.475);
        assert_eq!(params.co2_conversion, 3.67);
        assert_eq!(params.pixel_area_ha, 0.09);
        assert_eq!(params.credits_per_tonne_co2, 1.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_partial_overlay_keeps_defaults() {
        let settings = Settings::from_toml_str("[model]\nbiomass_coef_a = 30.0\n").unwrap();
        assert_eq!(settings.model.biomass_coef_a, 30.0);
        assert_eq!(settings.model.biomass_coef_b, 5.0);
        assert!(!settings.ingest.mask_nodata);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn test_ingest_table() {
        let settings = Settings::from_toml_str("[ingest]\nmask_nodata = true\n").unwrap();
        assert!(settings.ingest.mask_nodata);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let result = Settings::from_toml_str("[model]\nbiomass_coef_z = 1.0\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        for text in [
            "[model]\npixel_area_ha = 0.0\n",
            "[model]\ncredits_per_tonne_co2 = -1.0\n",
            "[model]\ncarbon_fraction = 1.5\n",
            "[model]\nco2_conversion = nan\n",
        ] {
            let result = Settings::from_toml_str(text);
            assert!(matches!(result, Err(ConfigError::Invalid(_))), "accepted: {}", text);
        }
    }

    #[test]
    fn test_shipped_reference_file_matches_defaults() {
        let text = include_str!("../../model_parameters.toml");
        assert_eq!(Settings::from_toml_str(text).unwrap(), Settings::default());
    }
}
