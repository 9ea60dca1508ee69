//! VehicleState - Stream Fusion output
//!
//! One record per position event, enriched with the telemetry known at or
//! before that position's timestamp.

use serde::{Deserialize, Serialize};

use crate::{PositionEvent, TelemetryEvent, TimestampMs, VehicleId};

/// Fuel level assumed before any telemetry arrives (percent)
pub const DEFAULT_FUEL_LEVEL_PCT: f64 = 100.0;
/// Engine temperature assumed before any telemetry arrives (°C)
pub const DEFAULT_ENGINE_TEMP_C: f64 = 85.0;

/// Unified per-reading vehicle state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub vehicle_id: VehicleId,
    /// Timestamp of the position event this state was built from
    pub timestamp: TimestampMs,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: f64,
    pub heading: f64,

    pub fuel_level_pct: f64,
    pub engine_temp_c: f64,
    pub load_kg: f64,
    pub idle_seconds: u32,

    /// Timestamp of the telemetry reading used; `None` means neutral defaults
    pub telemetry_timestamp: Option<TimestampMs>,
}

impl VehicleState {
    /// Join a position with the matched telemetry, or neutral defaults
    pub fn from_parts(position: &PositionEvent, telemetry: Option<&TelemetryEvent>) -> Self {
        let (fuel_level_pct, engine_temp_c, load_kg, idle_seconds, telemetry_timestamp) =
            match telemetry {
                Some(t) => (
                    t.fuel_level_pct,
                    t.engine_temp_c,
                    t.load_kg,
                    t.idle_seconds,
                    Some(t.timestamp),
                ),
                None => (DEFAULT_FUEL_LEVEL_PCT, DEFAULT_ENGINE_TEMP_C, 0.0, 0, None),
            };

        Self {
            vehicle_id: position.vehicle_id.clone(),
            timestamp: position.timestamp,
            latitude: position.latitude,
            longitude: position.longitude,
            speed_kmh: position.speed_kmh,
            heading: position.heading,
            fuel_level_pct,
            engine_temp_c,
            load_kg,
            idle_seconds,
            telemetry_timestamp,
        }
    }

    /// Whether neutral defaults stand in for telemetry
    pub fn uses_default_telemetry(&self) -> bool {
        self.telemetry_timestamp.is_none()
    }
}
