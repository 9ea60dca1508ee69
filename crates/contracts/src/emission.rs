//! EmissionRecord / AlertEvent - Emission Transform output

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{TimestampMs, VehicleId};

/// Compliance alert category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    HighIdle,
    EmissionSpike,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighIdle => "HIGH_IDLE",
            Self::EmissionSpike => "EMISSION_SPIKE",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert severity, ordered `Info < Warning < Critical`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-reading emission metrics with optional alert
///
/// `alert_kind` is present exactly when `severity` is above `Info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionRecord {
    pub vehicle_id: VehicleId,
    pub timestamp: TimestampMs,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: f64,
    pub load_kg: f64,
    pub idle_seconds: u32,

    /// CO₂ attributed to this reading (g)
    pub co2_grams: f64,
    /// Distance-based emission rate (g/km); 0 while stationary
    pub co2_rate_g_per_km: f64,

    pub alert_kind: Option<AlertKind>,
    #[serde(default)]
    pub severity: Severity,
    pub alert_message: Option<String>,
}

impl EmissionRecord {
    pub fn has_alert(&self) -> bool {
        self.alert_kind.is_some()
    }

    /// Standalone alert for the alert feed, if this reading raised one
    pub fn alert_event(&self) -> Option<AlertEvent> {
        let kind = self.alert_kind?;
        Some(AlertEvent {
            alert_id: format!("{}-{}-{}", self.vehicle_id, self.timestamp, kind),
            vehicle_id: self.vehicle_id.clone(),
            timestamp: self.timestamp,
            alert_kind: kind,
            severity: self.severity,
            message: self.alert_message.clone().unwrap_or_default(),
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

/// Alert feed entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Deterministic id: `{vehicle_id}-{timestamp}-{KIND}`
    pub alert_id: String,
    pub vehicle_id: VehicleId,
    pub timestamp: TimestampMs,
    pub alert_kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub latitude: f64,
    pub longitude: f64,
}
