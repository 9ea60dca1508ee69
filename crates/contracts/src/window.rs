//! WindowSummary - Rolling Window Aggregator output

use serde::{Deserialize, Serialize};

use crate::{TimestampMs, VehicleId};

/// Reduced statistics for one vehicle over one tumbling bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub vehicle_id: VehicleId,
    /// Bucket start (inclusive, epoch-aligned)
    pub window_start: TimestampMs,
    /// Bucket end (exclusive)
    pub window_end: TimestampMs,
    pub avg_co2_rate_g_per_km: f64,
    pub total_co2_grams: f64,
    pub avg_speed_kmh: f64,
    pub max_idle_seconds: u32,
    pub reading_count: u64,
}
