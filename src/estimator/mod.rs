//! Sequestration estimation
//!
//! Converts a normalized grid into total CO2-equivalent tonnes and carbon
//! credits through the biomass regression and the mass conversion chain.

pub mod sequestration;

pub use sequestration::{
    accumulate, biomass_per_ha, co2_per_cell, estimate, round_to_hundredths,
    SequestrationResult, SequestrationTotals,
};
