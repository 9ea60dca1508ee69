//! Emission pipeline metrics
//!
//! Recording helpers for the `metrics` facade plus an in-memory aggregator
//! used for the end-of-run summary.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{AlertEvent, EmissionRecord, Severity, WindowSummary};
use metrics::{counter, gauge, histogram};

/// Record one emission record
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_emission_metrics;
///
/// let output = pipeline.push_position(event);
/// record_emission_metrics(&output.record);
/// ```
pub fn record_emission_metrics(record: &EmissionRecord) {
    counter!("fleet_emissions_records_total").increment(1);
    histogram!("fleet_emissions_co2_grams").record(record.co2_grams);
    histogram!("fleet_emissions_co2_rate_g_per_km").record(record.co2_rate_g_per_km);
    histogram!("fleet_emissions_speed_kmh").record(record.speed_kmh);
    gauge!("fleet_emissions_last_timestamp_ms").set(record.timestamp as f64);

    if record.idle_seconds > 0 {
        histogram!("fleet_emissions_idle_seconds").record(f64::from(record.idle_seconds));
    }
}

/// Record one raised alert
pub fn record_alert(alert: &AlertEvent) {
    counter!(
        "fleet_emissions_alerts_total",
        "kind" => alert.alert_kind.as_str(),
        "severity" => alert.severity.as_str()
    )
    .increment(1);
}

/// Record one closed window
pub fn record_window_summary(summary: &WindowSummary) {
    counter!("fleet_emissions_window_summaries_total").increment(1);
    histogram!("fleet_emissions_window_co2_grams").record(summary.total_co2_grams);
    histogram!("fleet_emissions_window_readings").record(summary.reading_count as f64);
}

/// Record one decoded input event
pub fn record_input_received(stream: &'static str) {
    counter!("fleet_emissions_inputs_received_total", "stream" => stream).increment(1);
}

/// Fleet-wide gauges taken from the ledger
pub fn record_fleet_size(vehicles: usize, total_co2_grams: f64) {
    gauge!("fleet_emissions_tracked_vehicles").set(vehicles as f64);
    gauge!("fleet_emissions_fleet_co2_grams").set(total_co2_grams);
}

/// In-memory aggregation of a run's outputs
#[derive(Debug, Clone, Default)]
pub struct EmissionStatsAggregator {
    pub total_records: u64,
    pub total_alerts: u64,
    pub critical_alerts: u64,
    pub total_summaries: u64,
    pub total_co2_grams: f64,

    /// CO₂ rate per record (g/km)
    pub rate_stats: RunningStats,

    /// Speed per record (km/h)
    pub speed_stats: RunningStats,

    /// Window totals (g)
    pub window_stats: RunningStats,

    pub alerts_by_kind: BTreeMap<&'static str, u64>,
    pub co2_by_vehicle: BTreeMap<String, f64>,
}

impl EmissionStatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_record(&mut self, record: &EmissionRecord) {
        self.total_records += 1;
        self.total_co2_grams += record.co2_grams;
        self.rate_stats.push(record.co2_rate_g_per_km);
        self.speed_stats.push(record.speed_kmh);
        *self
            .co2_by_vehicle
            .entry(record.vehicle_id.clone())
            .or_insert(0.0) += record.co2_grams;

        if let Some(kind) = record.alert_kind {
            self.total_alerts += 1;
            *self.alerts_by_kind.entry(kind.as_str()).or_insert(0) += 1;
            if record.severity == Severity::Critical {
                self.critical_alerts += 1;
            }
        }
    }

    pub fn update_summary(&mut self, summary: &WindowSummary) {
        self.total_summaries += 1;
        self.window_stats.push(summary.total_co2_grams);
    }

    pub fn summary(&self) -> EmissionSummary {
        let top_emitter = self
            .co2_by_vehicle
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(vehicle_id, grams)| (vehicle_id.clone(), *grams));

        EmissionSummary {
            total_records: self.total_records,
            total_alerts: self.total_alerts,
            critical_alerts: self.critical_alerts,
            total_summaries: self.total_summaries,
            vehicles: self.co2_by_vehicle.len(),
            total_co2_grams: self.total_co2_grams,
            alert_rate: if self.total_records > 0 {
                self.total_alerts as f64 / self.total_records as f64 * 100.0
            } else {
                0.0
            },
            co2_rate_g_per_km: StatsSummary::from(&self.rate_stats),
            speed_kmh: StatsSummary::from(&self.speed_stats),
            window_co2_grams: StatsSummary::from(&self.window_stats),
            alerts_by_kind: self.alerts_by_kind.clone(),
            top_emitter,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// End-of-run summary
#[derive(Debug, Clone, Default)]
pub struct EmissionSummary {
    pub total_records: u64,
    pub total_alerts: u64,
    pub critical_alerts: u64,
    pub total_summaries: u64,
    pub vehicles: usize,
    pub total_co2_grams: f64,
    /// Percentage of records carrying an alert
    pub alert_rate: f64,
    pub co2_rate_g_per_km: StatsSummary,
    pub speed_kmh: StatsSummary,
    pub window_co2_grams: StatsSummary,
    pub alerts_by_kind: BTreeMap<&'static str, u64>,
    pub top_emitter: Option<(String, f64)>,
}

impl fmt::Display for EmissionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Emission Summary ===")?;
        writeln!(f, "Records: {} ({} vehicles)", self.total_records, self.vehicles)?;
        writeln!(f, "Total CO2: {:.1} g", self.total_co2_grams)?;
        writeln!(
            f,
            "Alerts: {} ({:.2}%), critical: {}",
            self.total_alerts, self.alert_rate, self.critical_alerts
        )?;
        writeln!(f, "Window summaries: {}", self.total_summaries)?;
        writeln!(f, "CO2 rate (g/km): {}", self.co2_rate_g_per_km)?;
        writeln!(f, "Speed (km/h): {}", self.speed_kmh)?;
        writeln!(f, "Window CO2 (g): {}", self.window_co2_grams)?;

        if !self.alerts_by_kind.is_empty() {
            writeln!(f, "Alerts by kind:")?;
            for (kind, count) in &self.alerts_by_kind {
                writeln!(f, "  {}: {}", kind, count)?;
            }
        }
        if let Some((vehicle_id, grams)) = &self.top_emitter {
            writeln!(f, "Top emitter: {} ({:.1} g)", vehicle_id, grams)?;
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::AlertKind;

    fn record(vehicle_id: &str, co2_grams: f64, alert: Option<(AlertKind, Severity)>) -> EmissionRecord {
        let (alert_kind, severity) = match alert {
            Some((kind, severity)) => (Some(kind), severity),
            None => (None, Severity::Info),
        };
        EmissionRecord {
            vehicle_id: vehicle_id.to_string(),
            timestamp: 1_000,
            latitude: 28.61,
            longitude: 77.21,
            speed_kmh: 50.0,
            load_kg: 0.0,
            idle_seconds: 0,
            co2_grams,
            co2_rate_g_per_km: co2_grams * 10.0,
            alert_kind,
            severity,
            alert_message: alert.map(|_| "alert".to_string()),
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = EmissionStatsAggregator::new();
        aggregator.update_record(&record("TRK-101", 65.0, None));
        aggregator.update_record(&record(
            "TRK-101",
            85.0,
            Some((AlertKind::HighIdle, Severity::Critical)),
        ));
        aggregator.update_record(&record(
            "TRK-102",
            10.0,
            Some((AlertKind::EmissionSpike, Severity::Warning)),
        ));

        let summary = aggregator.summary();
        assert_eq!(summary.total_records, 3);
        assert_eq!(summary.total_alerts, 2);
        assert_eq!(summary.critical_alerts, 1);
        assert_eq!(summary.vehicles, 2);
        assert!((summary.total_co2_grams - 160.0).abs() < 1e-9);
        assert_eq!(summary.alerts_by_kind.get("HIGH_IDLE"), Some(&1));
        assert_eq!(summary.top_emitter.as_ref().map(|t| t.0.as_str()), Some("TRK-101"));
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = EmissionStatsAggregator::new();
        aggregator.update_record(&record("TRK-101", 65.0, None));

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Records: 1 (1 vehicles)"));
        assert!(output.contains("Total CO2: 65.0 g"));
        assert!(output.contains("Window CO2 (g): N/A"));
    }

    #[test]
    fn test_empty_summary() {
        let summary = EmissionStatsAggregator::new().summary();
        assert_eq!(summary.alert_rate, 0.0);
        assert!(summary.top_emitter.is_none());
    }
}
