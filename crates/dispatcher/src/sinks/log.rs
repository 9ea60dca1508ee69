//! LogSink - logs output events via tracing

use contracts::{ContractError, DataSink, OutputEvent};
use tracing::{info, instrument, warn};

/// Sink that logs every event it receives
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_event(&self, event: &OutputEvent) {
        match event {
            OutputEvent::Emission(record) => info!(
                sink = %self.name,
                vehicle_id = %record.vehicle_id,
                timestamp = record.timestamp,
                speed_kmh = record.speed_kmh,
                co2_grams = record.co2_grams,
                co2_rate_g_per_km = record.co2_rate_g_per_km,
                severity = %record.severity,
                "Emission record"
            ),
            OutputEvent::Alert(alert) => warn!(
                sink = %self.name,
                alert_id = %alert.alert_id,
                vehicle_id = %alert.vehicle_id,
                timestamp = alert.timestamp,
                kind = %alert.alert_kind,
                severity = %alert.severity,
                "{}",
                alert.message
            ),
            OutputEvent::Summary(summary) => info!(
                sink = %self.name,
                vehicle_id = %summary.vehicle_id,
                window_start = summary.window_start,
                window_end = summary.window_end,
                readings = summary.reading_count,
                total_co2_grams = summary.total_co2_grams,
                avg_co2_rate_g_per_km = summary.avg_co2_rate_g_per_km,
                "Window summary"
            ),
        }
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, event),
        fields(sink = %self.name, topic = %event.topic())
    )]
    async fn write(&mut self, event: &OutputEvent) -> Result<(), ContractError> {
        self.log_event(event);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
