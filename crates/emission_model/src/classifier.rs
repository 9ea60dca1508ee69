//! Compliance alert rules
//!
//! First match wins: critical idle, warning idle, emission spike, none.

use contracts::{AlertKind, AlertThresholds, Severity};

/// Outcome of classifying one reading
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlertDecision {
    pub kind: Option<AlertKind>,
    pub severity: Severity,
    pub message: Option<String>,
}

impl AlertDecision {
    fn raise(kind: AlertKind, severity: Severity, message: String) -> Self {
        Self {
            kind: Some(kind),
            severity,
            message: Some(message),
        }
    }
}

/// Classify a reading against the alert thresholds
pub fn classify(
    speed_kmh: f64,
    idle_seconds: u32,
    co2_rate_g_per_km: f64,
    vehicle_id: &str,
    thresholds: &AlertThresholds,
) -> AlertDecision {
    if idle_seconds >= thresholds.idle_critical_seconds {
        let waste = f64::from(idle_seconds) * thresholds.idle_waste_rate_g_per_s;
        return AlertDecision::raise(
            AlertKind::HighIdle,
            Severity::Critical,
            format!(
                "{vehicle_id} has been idling for {idle_seconds}s. \
                 BS-VI Section 4.2.1 limits metro zone idling to 90s. \
                 Estimated waste: {waste:.1}g CO₂"
            ),
        );
    }

    if idle_seconds >= thresholds.idle_warning_seconds {
        return AlertDecision::raise(
            AlertKind::HighIdle,
            Severity::Warning,
            format!("{vehicle_id} idling for {idle_seconds}s. Approaching BS-VI idle limit."),
        );
    }

    if co2_rate_g_per_km > thresholds.emission_spike_g_per_km
        && speed_kmh > thresholds.spike_min_speed_kmh
    {
        return AlertDecision::raise(
            AlertKind::EmissionSpike,
            Severity::Warning,
            format!(
                "{vehicle_id} emission rate {co2_rate_g_per_km:.1}g/km exceeds optimal threshold. \
                 Consider reducing speed or load."
            ),
        );
    }

    AlertDecision::default()
}
