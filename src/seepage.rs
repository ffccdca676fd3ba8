//! Empirical seepage loss through the channel bed and walls.
//!
//! `S = 10 · A · L · sqrt(Qin / 1000)` with `Qin` in l/s, `L` in km and `A`
//! the filtration coefficient of the soil. Returns 0 when there is no flow or
//! no length, so the result is never negative or NaN.

use crate::calendar::Season;
use crate::coefficients::{Coefficient, Condition, Coverage, SoilType, Vegetation, groundwater_coefficient};
use serde::{Deserialize, Serialize};

/// Mean filtration coefficient for medium soils (range 1.87-2.30).
pub const AVERAGE_FILTRATION_COEFFICIENT: f64 = 2.08;

pub fn base_loss(q_in: f64, length_km: f64, filtration_coefficient: f64) -> f64 {
    // NaN fails every comparison and falls through to zero as well
    let positive = |x: f64| x > 0.0;
    if !(positive(q_in) && positive(length_km) && positive(filtration_coefficient)) {
        return 0.0;
    }
    10.0 * filtration_coefficient * length_km * (q_in / 1000.0).sqrt()
}

/// Channel attributes that scale the base loss. Absent attributes are neutral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LossFactors {
    pub condition: Option<Condition>,
    pub vegetation: Option<Vegetation>,
    pub groundwater_depth: Option<f64>,
    pub season: Option<Season>,
    pub soil_type: Option<SoilType>,
    pub coverage: Option<Coverage>,
}

/// The coefficient each factor contributed to an enhanced estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedFactors {
    pub condition: f64,
    pub vegetation: f64,
    pub groundwater: f64,
    pub season: f64,
    pub soil_type: f64,
    pub coverage: f64,
}

impl AppliedFactors {
    pub fn product(&self) -> f64 {
        self.condition * self.vegetation * self.groundwater * self.season * self.soil_type * self.coverage
    }
}

impl LossFactors {
    pub fn applied(&self) -> AppliedFactors {
        AppliedFactors {
            condition: self.condition.coefficient(),
            vegetation: self.vegetation.coefficient(),
            groundwater: groundwater_coefficient(self.groundwater_depth),
            season: self.season.coefficient(),
            soil_type: self.soil_type.coefficient(),
            coverage: self.coverage.coefficient(),
        }
    }
}

pub fn enhanced_loss(base: f64, factors: &LossFactors) -> f64 {
    base * factors.applied().product()
}

/// Reference evapotranspiration over open water in mm/day from air
/// temperature (°C), relative humidity (%) and wind speed (m/s).
pub fn evaporation_rate(temperature_c: f64, humidity_pct: f64, wind_m_s: f64) -> f64 {
    let saturation = 0.6108 * ((17.27 * temperature_c) / (temperature_c + 237.3)).exp();
    let deficit = saturation * (1.0 - humidity_pct / 100.0);
    let et0 = 0.0023 * (temperature_c + 17.8) * 5f64.sqrt() * (deficit / 10.0) * (0.5 + 0.54 * wind_m_s);
    if et0.is_finite() { et0.max(0.0) } else { 0.0 }
}

/// Evaporation from the free surface of a channel in m³/s, or `None` when the
/// estimate is not positive.
pub fn evaporation_loss(length_km: f64, width_m: f64, rate_mm_day: f64) -> Option<f64> {
    let surface_m2 = length_km * 1000.0 * width_m;
    let loss = rate_mm_day * surface_m2 / (1000.0 * 86400.0);
    (loss > 0.0).then_some(loss)
}
