//! Pipeline orchestrator - wires replay, engine and dispatcher together.

use std::future::Future;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{InboundEvent, OutputEvent, PipelineBlueprint, Topic};
use ingestion::{IngestionPipeline, ReplayConfig};
use observability::{
    record_alert, record_emission_metrics, record_fleet_size, record_input_received,
    record_window_summary, EmissionStatsAggregator,
};
use stream_engine::EmissionPipeline;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::{PipelineStats, StopReason};
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated blueprint, CLI overrides applied
    pub blueprint: PipelineBlueprint,

    /// Stop after this many emission records (None = unlimited)
    pub max_records: Option<u64>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until input is exhausted, the record limit is hit, or `shutdown`
    /// resolves
    ///
    /// Open windows are discarded on every stop path.
    #[instrument(name = "pipeline_run", skip_all)]
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!(port, "Metrics endpoint available");
        }

        // Setup Dispatcher
        let (output_tx, output_rx) =
            mpsc::channel::<OutputEvent>(blueprint.ingestion.channel_capacity.max(1));

        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - outputs will only be counted");
        }
        for topic in Topic::ALL {
            if !blueprint.sinks.is_empty() && !blueprint.routes_topic(topic) {
                debug!(topic = %topic, "Topic has no subscribed sink");
            }
        }

        let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone(), output_rx)
            .await
            .context("Failed to create dispatcher")?;
        let dispatcher_handle = dispatcher.spawn();
        info!(sinks = blueprint.sinks.len(), "Dispatcher started");

        // Setup Ingestion
        let mut ingestion = IngestionPipeline::new(ReplayConfig::from(&blueprint.ingestion));
        let input_rx = ingestion
            .take_receiver()
            .ok_or_else(|| CliError::pipeline_execution("ingestion receiver already taken"))?;
        let replay_handle = ingestion.start();

        info!(
            max_records = ?self.config.max_records,
            window_ms = blueprint.engine.window.duration_ms,
            lateness_ms = blueprint.engine.window.lateness_ms,
            "Pipeline running"
        );

        let mut engine = EmissionPipeline::new(&blueprint.engine);
        let mut emissions = EmissionStatsAggregator::new();
        let max_records = self.config.max_records;

        tokio::pin!(shutdown);
        let stop_reason = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping pipeline");
                    break StopReason::Signal;
                }
                next = input_rx.recv() => {
                    let Ok(event) = next else {
                        break StopReason::InputExhausted;
                    };
                    let outputs = process_event(&mut engine, event, &mut emissions);
                    if !forward(&output_tx, outputs).await {
                        warn!("Dispatcher channel closed");
                        break StopReason::DispatcherClosed;
                    }
                    if max_records.is_some_and(|max| engine.stats().records >= max) {
                        info!(records = engine.stats().records, "Reached max records limit");
                        break StopReason::MaxRecords;
                    }
                }
            }
        };

        // Shutdown: stop the replay, discard open windows, drain the sinks
        info!(reason = %stop_reason, "Shutting down pipeline");
        drop(input_rx);

        let fleet = engine.fleet_snapshot();
        record_fleet_size(fleet.vehicles.len(), fleet.total_co2_grams());
        let counters = engine.shutdown();

        drop(output_tx);
        let sink_metrics = dispatcher_handle
            .await
            .context("Dispatcher task panicked")?;

        let replay = replay_handle
            .await
            .context("Replay task panicked")?
            .context("Input replay failed")?;

        let stats = PipelineStats {
            stop_reason,
            counters,
            replay,
            sinks: sink_metrics
                .into_iter()
                .map(|(name, m)| (name, m.write_count, m.failure_count, m.dropped_count))
                .collect(),
            emissions,
            fleet,
            duration: start_time.elapsed(),
        };

        info!(
            records = stats.counters.records,
            alerts = stats.counters.alerts,
            summaries = stats.counters.summaries,
            duration_secs = stats.duration.as_secs_f64(),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

/// Feed one inbound event through the engine and collect what it produced
fn process_event(
    engine: &mut EmissionPipeline,
    event: InboundEvent,
    emissions: &mut EmissionStatsAggregator,
) -> Vec<OutputEvent> {
    record_input_received(event.stream());
    match event {
        InboundEvent::Telemetry(reading) => {
            engine.push_telemetry(reading);
            Vec::new()
        }
        InboundEvent::Position(position) => {
            let output = engine.push_position(position);

            record_emission_metrics(&output.record);
            emissions.update_record(&output.record);

            let mut events = Vec::with_capacity(2 + output.summaries.len());
            events.push(OutputEvent::Emission(output.record));
            if let Some(alert) = output.alert {
                record_alert(&alert);
                events.push(OutputEvent::Alert(alert));
            }
            for summary in output.summaries {
                record_window_summary(&summary);
                emissions.update_summary(&summary);
                events.push(OutputEvent::Summary(summary));
            }
            events
        }
    }
}

/// Returns false once the dispatcher is gone
async fn forward(tx: &mpsc::Sender<OutputEvent>, events: Vec<OutputEvent>) -> bool {
    for event in events {
        if tx.send(event).await.is_err() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{PositionEvent, SinkConfig, SinkType, TelemetryEvent};
    use std::collections::HashMap;
    use std::io::Write;

    fn position(vehicle_id: &str, timestamp: u64, speed_kmh: f64) -> PositionEvent {
        PositionEvent {
            vehicle_id: vehicle_id.to_string(),
            timestamp,
            latitude: 19.07,
            longitude: 72.87,
            speed_kmh,
            heading: 180.0,
        }
    }

    #[test]
    fn test_process_event_outputs() {
        let mut engine = EmissionPipeline::default();
        let mut emissions = EmissionStatsAggregator::new();

        let telemetry = InboundEvent::Telemetry(TelemetryEvent {
            vehicle_id: "TRK-101".to_string(),
            timestamp: 1_000,
            fuel_level_pct: 50.0,
            engine_temp_c: 90.0,
            load_kg: 0.0,
            idle_seconds: 150,
        });
        assert!(process_event(&mut engine, telemetry, &mut emissions).is_empty());

        let outputs = process_event(
            &mut engine,
            InboundEvent::Position(position("TRK-101", 2_000, 0.0)),
            &mut emissions,
        );
        let topics: Vec<_> = outputs.iter().map(OutputEvent::topic).collect();
        assert_eq!(topics, vec![Topic::Emissions, Topic::Alerts]);
        assert_eq!(emissions.total_alerts, 1);
    }

    fn write_positions(count: u64) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 0..count {
            let line = serde_json::to_string(&position("VAN-7", 1_000 + i * 1_000, 50.0)).unwrap();
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    fn config(positions: &tempfile::NamedTempFile, out: &std::path::Path) -> PipelineConfig {
        let mut blueprint = PipelineBlueprint::default();
        blueprint.ingestion.positions_path = Some(positions.path().display().to_string());
        blueprint.sinks.push(SinkConfig {
            name: "records".to_string(),
            sink_type: SinkType::File,
            queue_capacity: 64,
            topics: vec![Topic::Emissions],
            params: HashMap::from([("path".to_string(), out.display().to_string())]),
        });
        PipelineConfig {
            blueprint,
            max_records: None,
            metrics_port: None,
        }
    }

    #[tokio::test]
    async fn test_run_to_exhaustion() {
        let positions = write_positions(5);
        let out = tempfile::tempdir().unwrap();

        let stats = Pipeline::new(config(&positions, out.path()))
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::InputExhausted);
        assert_eq!(stats.counters.records, 5);
        assert_eq!(stats.replay.positions, 5);
        assert_eq!(stats.sinks, vec![("records".to_string(), 5, 0, 0)]);

        let written = std::fs::read_to_string(out.path().join("emissions.ndjson")).unwrap();
        assert_eq!(written.lines().count(), 5);
    }

    #[tokio::test]
    async fn test_max_records_stops_early() {
        let positions = write_positions(20);
        let out = tempfile::tempdir().unwrap();
        let mut config = config(&positions, out.path());
        config.max_records = Some(3);

        let stats = Pipeline::new(config)
            .run(std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::MaxRecords);
        assert_eq!(stats.counters.records, 3);
    }

    #[tokio::test]
    async fn test_shutdown_signal_stops() {
        let positions = write_positions(5);
        let out = tempfile::tempdir().unwrap();

        let stats = Pipeline::new(config(&positions, out.path()))
            .run(std::future::ready(()))
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::Signal);
        assert_eq!(stats.counters.records, 0);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_paced_replay() {
        let positions = write_positions(3);
        let out = tempfile::tempdir().unwrap();
        let mut config = config(&positions, out.path());
        // one second of event time becomes a 1000 s sleep
        config.blueprint.ingestion.replay_speed = 0.001;

        let shutdown = tokio::time::sleep(std::time::Duration::from_millis(200));
        let stats = tokio::time::timeout(
            std::time::Duration::from_secs(3),
            Pipeline::new(config).run(shutdown),
        )
        .await
        .expect("pipeline did not stop while the replay was pacing")
        .unwrap();

        assert_eq!(stats.stop_reason, StopReason::Signal);
        assert_eq!(stats.counters.records, 1);
        assert!(stats.replay.interrupted);
    }

    #[tokio::test]
    async fn test_missing_input_file_fails() {
        let out = tempfile::tempdir().unwrap();
        let positions = write_positions(0);
        let mut config = config(&positions, out.path());
        config.blueprint.ingestion.positions_path = Some("/nonexistent/positions.ndjson".into());

        let result = Pipeline::new(config).run(std::future::pending()).await;
        assert!(result.is_err());
    }
}
