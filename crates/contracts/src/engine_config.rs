//! Engine tunables shared by the emission model, fusion and aggregation stages.
//!
//! Defaults reproduce the BS-VI reference constants. Every section is optional
//! in the blueprint; a missing section falls back to its `Default`.

use serde::{Deserialize, Serialize};

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub model: EmissionModelConfig,

    #[serde(default)]
    pub alerts: AlertThresholds,

    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub fusion: FusionConfig,
}

/// Emission model coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionModelConfig {
    /// Baseline heavy-duty diesel emission factor (g/km)
    pub base_emission_factor: f64,
    /// Extra g/km per 1000 kg of cargo
    pub load_penalty_per_1000kg: f64,
    /// Lower bound of the optimal speed band (km/h, inclusive)
    pub optimal_speed_min: f64,
    /// Upper bound of the optimal speed band (km/h, inclusive)
    pub optimal_speed_max: f64,
    /// Multiplier increase per km/h below the band
    pub low_speed_slope: f64,
    /// Multiplier increase per km/h above the band
    pub high_speed_slope: f64,
    /// Idling emission rate (g/s)
    pub idle_emission_rate_g_per_s: f64,
    /// Idle seconds attributed to a single stationary reading
    pub idle_cap_seconds: u32,
    /// Below this speed the vehicle counts as stationary (km/h)
    pub stationary_speed_kmh: f64,
    /// Distance assumed per moving reading (km)
    pub reading_distance_km: f64,
}

impl Default for EmissionModelConfig {
    fn default() -> Self {
        Self {
            base_emission_factor: 650.0,
            load_penalty_per_1000kg: 25.0,
            optimal_speed_min: 40.0,
            optimal_speed_max: 70.0,
            low_speed_slope: 2.5 / 40.0,
            high_speed_slope: 2.5 / 50.0,
            idle_emission_rate_g_per_s: 8.5,
            idle_cap_seconds: 10,
            stationary_speed_kmh: 1.0,
            reading_distance_km: 0.1,
        }
    }
}

/// Alert classification thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub idle_warning_seconds: u32,
    pub idle_critical_seconds: u32,
    /// Rate above which a moving vehicle raises an emission spike (g/km)
    pub emission_spike_g_per_km: f64,
    /// Spikes are only raised above this speed (km/h)
    pub spike_min_speed_kmh: f64,
    /// Rate used to quantify wasted CO₂ in critical idle messages (g/s)
    pub idle_waste_rate_g_per_s: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            idle_warning_seconds: 60,
            idle_critical_seconds: 120,
            emission_spike_g_per_km: 35.0,
            spike_min_speed_kmh: 5.0,
            idle_waste_rate_g_per_s: 8.5,
        }
    }
}

/// Tumbling window configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Bucket length in milliseconds
    pub duration_ms: u64,
    /// How long past a bucket's end records are still folded in
    pub lateness_ms: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            duration_ms: 5 * 60 * 1000,
            lateness_ms: 30 * 1000,
        }
    }
}

/// Stream fusion configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Telemetry readings retained per vehicle
    pub telemetry_history: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            telemetry_history: 32,
        }
    }
}
