//! Raw input events - Ingestion output
//!
//! The two source streams the pipeline consumes. Both are produced outside the
//! core (device feed, replay file) and are immutable once emitted.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{ContractError, TimestampMs, VehicleId};

/// GPS fix from a vehicle tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PositionEvent {
    /// Vehicle identifier
    #[validate(length(min = 1))]
    pub vehicle_id: VehicleId,

    /// Event time (ms since epoch), non-decreasing per vehicle
    pub timestamp: TimestampMs,

    /// Latitude (degrees, [-90, 90])
    pub latitude: f64,

    /// Longitude (degrees, [-180, 180])
    pub longitude: f64,

    /// Ground speed (km/h)
    #[validate(range(min = 0.0))]
    pub speed_kmh: f64,

    /// Heading from north (degrees)
    #[validate(range(min = 0.0, exclusive_max = 360.0))]
    pub heading: f64,
}

/// Engine and load telemetry from the vehicle's IoT unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TelemetryEvent {
    /// Vehicle identifier
    #[validate(length(min = 1))]
    pub vehicle_id: VehicleId,

    /// Event time (ms since epoch); same clock as positions, may lag
    pub timestamp: TimestampMs,

    /// Fuel level (percent)
    #[validate(range(min = 0.0, max = 100.0))]
    pub fuel_level_pct: f64,

    /// Engine temperature (°C)
    pub engine_temp_c: f64,

    /// Cargo load (kg)
    #[validate(range(min = 0.0))]
    pub load_kg: f64,

    /// Continuous idle duration; resets to 0 once the vehicle moves
    pub idle_seconds: u32,
}

impl PositionEvent {
    pub const STREAM: &'static str = "position";

    /// Stateless range and finiteness check
    pub fn check(&self) -> Result<(), ContractError> {
        ensure_finite(
            Self::STREAM,
            &self.vehicle_id,
            &[
                ("latitude", self.latitude),
                ("longitude", self.longitude),
                ("speed_kmh", self.speed_kmh),
                ("heading", self.heading),
            ],
        )?;
        if self.latitude.abs() > 90.0 || self.longitude.abs() > 180.0 {
            return Err(ContractError::invalid_event(
                Self::STREAM,
                &self.vehicle_id,
                format!(
                    "coordinates out of range: ({}, {})",
                    self.latitude, self.longitude
                ),
            ));
        }
        self.validate()
            .map_err(|e| ContractError::invalid_event(Self::STREAM, &self.vehicle_id, e.to_string()))
    }
}

impl TelemetryEvent {
    pub const STREAM: &'static str = "telemetry";

    /// Stateless range and finiteness check
    pub fn check(&self) -> Result<(), ContractError> {
        ensure_finite(
            Self::STREAM,
            &self.vehicle_id,
            &[
                ("fuel_level_pct", self.fuel_level_pct),
                ("engine_temp_c", self.engine_temp_c),
                ("load_kg", self.load_kg),
            ],
        )?;
        self.validate()
            .map_err(|e| ContractError::invalid_event(Self::STREAM, &self.vehicle_id, e.to_string()))
    }
}

// Range validation lets NaN through, so finiteness is checked separately.
fn ensure_finite(
    stream: &'static str,
    vehicle_id: &str,
    fields: &[(&str, f64)],
) -> Result<(), ContractError> {
    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some((name, value)) => Err(ContractError::invalid_event(
            stream,
            vehicle_id,
            format!("{name} must be finite, got {value}"),
        )),
        None => Ok(()),
    }
}

/// Either input event, as carried on the ingestion channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundEvent {
    Position(PositionEvent),
    Telemetry(TelemetryEvent),
}

impl InboundEvent {
    pub fn vehicle_id(&self) -> &str {
        match self {
            Self::Position(p) => &p.vehicle_id,
            Self::Telemetry(t) => &t.vehicle_id,
        }
    }

    pub fn timestamp(&self) -> TimestampMs {
        match self {
            Self::Position(p) => p.timestamp,
            Self::Telemetry(t) => t.timestamp,
        }
    }

    pub fn stream(&self) -> &'static str {
        match self {
            Self::Position(_) => PositionEvent::STREAM,
            Self::Telemetry(_) => TelemetryEvent::STREAM,
        }
    }

    pub fn check(&self) -> Result<(), ContractError> {
        match self {
            Self::Position(p) => p.check(),
            Self::Telemetry(t) => t.check(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position() -> PositionEvent {
        PositionEvent {
            vehicle_id: "TRK-101".into(),
            timestamp: 1_000,
            latitude: 12.84,
            longitude: 77.68,
            speed_kmh: 42.0,
            heading: 359.9,
        }
    }

    #[test]
    fn test_valid_position_passes() {
        assert!(position().check().is_ok());
    }

    #[test]
    fn test_negative_speed_rejected() {
        let mut p = position();
        p.speed_kmh = -3.0;
        let err = p.check().unwrap_err();
        assert!(matches!(err, ContractError::InvalidEvent { .. }));
        assert!(err.to_string().contains("speed_kmh"), "got: {err}");
    }

    #[test]
    fn test_heading_360_rejected() {
        let mut p = position();
        p.heading = 360.0;
        assert!(p.check().is_err());
    }

    #[test]
    fn test_latitude_out_of_range_rejected() {
        let mut p = position();
        p.latitude = -91.0;
        let err = p.check().unwrap_err();
        assert!(err.to_string().contains("coordinates"), "got: {err}");
    }

    #[test]
    fn test_nan_rejected() {
        let mut p = position();
        p.latitude = f64::NAN;
        let err = p.check().unwrap_err();
        assert!(err.to_string().contains("finite"), "got: {err}");
    }

    #[test]
    fn test_empty_vehicle_id_rejected() {
        let mut p = position();
        p.vehicle_id.clear();
        assert!(p.check().is_err());
    }

    #[test]
    fn test_telemetry_negative_load_rejected() {
        let t = TelemetryEvent {
            vehicle_id: "TRK-101".into(),
            timestamp: 1_000,
            fuel_level_pct: 80.0,
            engine_temp_c: 88.0,
            load_kg: -1.0,
            idle_seconds: 0,
        };
        assert!(t.check().is_err());
    }

    #[test]
    fn test_negative_idle_fails_to_decode() {
        let line = r#"{"vehicle_id":"V","timestamp":1,"fuel_level_pct":50.0,
            "engine_temp_c":80.0,"load_kg":0.0,"idle_seconds":-5}"#;
        assert!(serde_json::from_str::<TelemetryEvent>(line).is_err());
    }

    #[test]
    fn test_inbound_event_tagging() {
        let json = serde_json::to_string(&InboundEvent::Position(position())).unwrap();
        assert!(json.contains(r#""kind":"position""#));
        let back: InboundEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.vehicle_id(), "TRK-101");
        assert_eq!(back.stream(), "position");
    }
}
