//! Per-record mapping from fused vehicle state to emission record

use contracts::{AlertThresholds, EmissionModelConfig, EmissionRecord, EngineConfig, VehicleState};
use tracing::debug;

use crate::{classify, estimate};

/// Stateless one-in, one-out emission stage
#[derive(Debug, Clone, Default)]
pub struct EmissionTransform {
    model: EmissionModelConfig,
    alerts: AlertThresholds,
}

impl EmissionTransform {
    pub fn new(model: EmissionModelConfig, alerts: AlertThresholds) -> Self {
        Self { model, alerts }
    }

    pub fn from_engine_config(config: &EngineConfig) -> Self {
        Self::new(config.model.clone(), config.alerts.clone())
    }

    pub fn model(&self) -> &EmissionModelConfig {
        &self.model
    }

    pub fn alerts(&self) -> &AlertThresholds {
        &self.alerts
    }

    /// Estimate emissions, then classify the reading
    pub fn apply(&self, state: &VehicleState) -> EmissionRecord {
        let est = estimate(
            state.speed_kmh,
            state.load_kg,
            state.idle_seconds,
            &self.model,
        );
        let decision = classify(
            state.speed_kmh,
            state.idle_seconds,
            est.co2_rate_g_per_km,
            &state.vehicle_id,
            &self.alerts,
        );

        if let Some(kind) = decision.kind {
            debug!(
                vehicle_id = %state.vehicle_id,
                timestamp = state.timestamp,
                alert_kind = %kind,
                severity = %decision.severity,
                "alert raised"
            );
        }

        EmissionRecord {
            vehicle_id: state.vehicle_id.clone(),
            timestamp: state.timestamp,
            latitude: state.latitude,
            longitude: state.longitude,
            speed_kmh: state.speed_kmh,
            load_kg: state.load_kg,
            idle_seconds: state.idle_seconds,
            co2_grams: est.co2_grams,
            co2_rate_g_per_km: est.co2_rate_g_per_km,
            alert_kind: decision.kind,
            severity: decision.severity,
            alert_message: decision.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{AlertKind, PositionEvent, Severity, TelemetryEvent};

    fn position(vehicle_id: &str, speed_kmh: f64) -> PositionEvent {
        PositionEvent {
            vehicle_id: vehicle_id.into(),
            timestamp: 10_000,
            latitude: 12.97,
            longitude: 77.59,
            speed_kmh,
            heading: 90.0,
        }
    }

    fn telemetry(vehicle_id: &str, load_kg: f64, idle_seconds: u32) -> TelemetryEvent {
        TelemetryEvent {
            vehicle_id: vehicle_id.into(),
            timestamp: 9_000,
            fuel_level_pct: 60.0,
            engine_temp_c: 90.0,
            load_kg,
            idle_seconds,
        }
    }

    #[test]
    fn long_idle_is_critical() {
        let state = VehicleState::from_parts(
            &position("TRK-104", 0.0),
            Some(&telemetry("TRK-104", 2000.0, 150)),
        );
        let record = EmissionTransform::default().apply(&state);

        assert_eq!(record.alert_kind, Some(AlertKind::HighIdle));
        assert_eq!(record.severity, Severity::Critical);
        assert_eq!(record.co2_rate_g_per_km, 0.0);
        assert!((record.co2_grams - 85.0).abs() < 1e-9);
        let message = record.alert_message.unwrap_or_default();
        assert!(message.contains("1275.0g"), "got: {message}");
    }

    #[test]
    fn unloaded_cruise_has_base_rate() {
        let state = VehicleState::from_parts(
            &position("TRK-101", 45.0),
            Some(&telemetry("TRK-101", 0.0, 0)),
        );
        let record = EmissionTransform::default().apply(&state);
        assert_eq!(record.co2_rate_g_per_km, 650.0);
        assert!((record.co2_grams - 65.0).abs() < 1e-9);
        // 650 g/km is above the default spike threshold
        assert_eq!(record.alert_kind, Some(AlertKind::EmissionSpike));
        assert_eq!(record.severity, Severity::Warning);
    }

    #[test]
    fn defaults_without_telemetry() {
        let state = VehicleState::from_parts(&position("TRK-109", 45.0), None);
        let record = EmissionTransform::default().apply(&state);
        assert_eq!(record.load_kg, 0.0);
        assert_eq!(record.idle_seconds, 0);
        assert_eq!(record.co2_rate_g_per_km, 650.0);
    }

    #[test]
    fn alert_kind_present_iff_above_info() {
        let mut alerts = AlertThresholds::default();
        alerts.emission_spike_g_per_km = 10_000.0;
        let transform = EmissionTransform::new(EmissionModelConfig::default(), alerts);

        for (speed, idle) in [(45.0, 0), (0.0, 30), (0.0, 60), (0.0, 200), (80.0, 5)] {
            let state = VehicleState::from_parts(
                &position("V", speed),
                Some(&telemetry("V", 500.0, idle)),
            );
            let record = transform.apply(&state);
            assert_eq!(record.alert_kind.is_some(), record.severity > Severity::Info);
            assert_eq!(record.alert_message.is_some(), record.alert_kind.is_some());
        }
    }

    #[test]
    fn apply_is_idempotent() {
        let state = VehicleState::from_parts(
            &position("TRK-103", 82.0),
            Some(&telemetry("TRK-103", 7500.0, 0)),
        );
        let transform = EmissionTransform::default();
        assert_eq!(transform.apply(&state), transform.apply(&state));
    }
}
