//! CO₂ estimate for a single reading
//!
//! Stationary readings are charged at the idle rate for the idle time they
//! report (capped per reading); moving readings are charged a distance-based
//! rate scaled by cargo load and a speed-band multiplier.

use contracts::EmissionModelConfig;

/// Emission attributed to one reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionEstimate {
    /// Grams of CO₂ for this reading
    pub co2_grams: f64,
    /// g/km; 0 while stationary
    pub co2_rate_g_per_km: f64,
}

/// Speed-band efficiency multiplier (1.0 inside the optimal band, inclusive)
pub fn speed_multiplier(speed_kmh: f64, config: &EmissionModelConfig) -> f64 {
    let speed = sanitize(speed_kmh);
    if speed < config.optimal_speed_min {
        1.0 + (config.optimal_speed_min - speed) * config.low_speed_slope
    } else if speed > config.optimal_speed_max {
        1.0 + (speed - config.optimal_speed_max) * config.high_speed_slope
    } else {
        1.0
    }
}

/// Extra g/km contributed by cargo
pub fn load_penalty(load_kg: f64, config: &EmissionModelConfig) -> f64 {
    sanitize(load_kg) / 1000.0 * config.load_penalty_per_1000kg
}

/// Estimate CO₂ for one reading
///
/// Total over its domain: negative or non-finite speed and load are treated as 0,
/// and the result is never negative.
pub fn estimate(
    speed_kmh: f64,
    load_kg: f64,
    idle_seconds: u32,
    config: &EmissionModelConfig,
) -> EmissionEstimate {
    let speed = sanitize(speed_kmh);

    if speed < config.stationary_speed_kmh {
        let charged = idle_seconds.min(config.idle_cap_seconds);
        return EmissionEstimate {
            co2_grams: config.idle_emission_rate_g_per_s * f64::from(charged),
            co2_rate_g_per_km: 0.0,
        };
    }

    let rate =
        (config.base_emission_factor + load_penalty(load_kg, config)) * speed_multiplier(speed, config);
    EmissionEstimate {
        co2_grams: rate * config.reading_distance_km,
        co2_rate_g_per_km: rate,
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
