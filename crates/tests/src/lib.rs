//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Contract snapshots (wire format of the public records)
//! - NDJSON replay -> emission pipeline -> dispatcher -> file sink
//! - Fleet-level scenarios (idle, load, fusion causality, windows)

#[cfg(test)]
mod contract_tests {
    use contracts::{
        AlertKind, EmissionRecord, OutputEvent, PipelineBlueprint, Severity, Topic,
    };

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_output_event_wire_format() {
        let record = EmissionRecord {
            vehicle_id: "TRK-101".to_string(),
            timestamp: 1_000,
            latitude: 12.97,
            longitude: 77.59,
            speed_kmh: 0.0,
            load_kg: 0.0,
            idle_seconds: 150,
            co2_grams: 85.0,
            co2_rate_g_per_km: 0.0,
            alert_kind: Some(AlertKind::HighIdle),
            severity: Severity::Critical,
            alert_message: Some("idle".to_string()),
        };
        let json = serde_json::to_value(OutputEvent::Emission(record)).unwrap();

        assert_eq!(json["topic"], "emission");
        assert_eq!(json["payload"]["alert_kind"], "HIGH_IDLE");
        assert_eq!(json["payload"]["severity"], "CRITICAL");
    }

    #[test]
    fn test_blueprint_toml_round_trip() {
        let toml = r#"
            [engine.window]
            duration_ms = 60000
            lateness_ms = 5000

            [ingestion]
            positions_path = "positions.ndjson"

            [[sinks]]
            name = "alerts"
            sink_type = "log"
            topics = ["alerts"]
        "#;
        let blueprint =
            config_loader::ConfigLoader::load_from_str(toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert!(blueprint.routes_topic(Topic::Alerts));
        assert!(!blueprint.routes_topic(Topic::Emissions));

        let rendered = config_loader::ConfigLoader::to_toml(&blueprint).unwrap();
        let reparsed: PipelineBlueprint = config_loader::ConfigLoader::load_from_str(
            &rendered,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(reparsed.engine, blueprint.engine);
        assert_eq!(reparsed.ingestion, blueprint.ingestion);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::Path;

    use contracts::{
        AlertEvent, AlertKind, EmissionRecord, EngineConfig, InboundEvent, OutputEvent,
        PositionEvent, Severity, SinkConfig, SinkType, TelemetryEvent, WindowConfig,
        WindowSummary,
    };
    use dispatcher::create_dispatcher;
    use ingestion::{IngestionPipeline, ReplayConfig, ReplayReport};
    use observability::EmissionStatsAggregator;
    use serde::de::DeserializeOwned;
    use stream_engine::{EmissionPipeline, PipelineCounters};
    use tempfile::{tempdir, NamedTempFile};
    use tokio::sync::mpsc;

    fn position(vehicle_id: &str, timestamp: u64, speed_kmh: f64) -> PositionEvent {
        PositionEvent {
            vehicle_id: vehicle_id.to_string(),
            timestamp,
            latitude: 22.57,
            longitude: 88.36,
            speed_kmh,
            heading: 90.0,
        }
    }

    fn telemetry(vehicle_id: &str, timestamp: u64, load_kg: f64, idle_seconds: u32) -> TelemetryEvent {
        TelemetryEvent {
            vehicle_id: vehicle_id.to_string(),
            timestamp,
            fuel_level_pct: 70.0,
            engine_temp_c: 88.0,
            load_kg,
            idle_seconds,
        }
    }

    fn ndjson<T: serde::Serialize>(events: &[T]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for event in events {
            writeln!(file, "{}", serde_json::to_string(event).unwrap()).unwrap();
        }
        file
    }

    fn read_ndjson<T: DeserializeOwned>(path: &Path) -> Vec<T> {
        match std::fs::read_to_string(path) {
            Ok(content) => content
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    struct RunOutput {
        counters: PipelineCounters,
        replay: ReplayReport,
        stats: EmissionStatsAggregator,
    }

    /// NDJSON replay -> EmissionPipeline -> Dispatcher -> FileSink
    async fn replay_to_files(
        positions: &NamedTempFile,
        telemetry: Option<&NamedTempFile>,
        engine: &EngineConfig,
        out: &Path,
    ) -> RunOutput {
        let mut ingestion = IngestionPipeline::new(ReplayConfig {
            positions_path: Some(positions.path().to_path_buf()),
            telemetry_path: telemetry.map(|f| f.path().to_path_buf()),
            channel_capacity: 8,
            replay_speed: 0.0,
        });
        let input_rx = ingestion.take_receiver().unwrap();
        let replay = ingestion.start();

        let (output_tx, output_rx) = mpsc::channel(8);
        let sink = SinkConfig {
            name: "ndjson".to_string(),
            sink_type: SinkType::File,
            queue_capacity: 1024,
            topics: vec![],
            params: HashMap::from([("path".to_string(), out.display().to_string())]),
        };
        let dispatcher = create_dispatcher(vec![sink], output_rx).await.unwrap();
        let dispatcher_handle = dispatcher.spawn();

        let mut pipeline = EmissionPipeline::new(engine);
        let mut stats = EmissionStatsAggregator::new();
        while let Ok(event) = input_rx.recv().await {
            match event {
                InboundEvent::Telemetry(reading) => pipeline.push_telemetry(reading),
                InboundEvent::Position(position) => {
                    let output = pipeline.push_position(position);
                    stats.update_record(&output.record);
                    output_tx
                        .send(OutputEvent::Emission(output.record))
                        .await
                        .unwrap();
                    if let Some(alert) = output.alert {
                        output_tx.send(OutputEvent::Alert(alert)).await.unwrap();
                    }
                    for summary in output.summaries {
                        stats.update_summary(&summary);
                        output_tx.send(OutputEvent::Summary(summary)).await.unwrap();
                    }
                }
            }
        }

        let counters = pipeline.shutdown();
        drop(output_tx);
        let sinks = dispatcher_handle.await.unwrap();
        assert_eq!(sinks[0].1.dropped_count, 0);

        RunOutput {
            counters,
            replay: replay.await.unwrap().unwrap(),
            stats,
        }
    }

    #[tokio::test]
    async fn test_e2e_replay_pipeline() {
        let positions = ndjson(&[
            position("TRK-101", 1_000, 45.0),
            position("TRK-102", 2_000, 0.0),
            position("TRK-101", 4_000, 90.0),
        ]);
        let telemetry = ndjson(&[
            telemetry("TRK-102", 1_500, 0.0, 150),
            telemetry("TRK-101", 3_000, 2_000.0, 0),
        ]);
        let out = tempdir().unwrap();

        let run = replay_to_files(
            &positions,
            Some(&telemetry),
            &EngineConfig::default(),
            out.path(),
        )
        .await;

        assert_eq!(run.replay.positions, 3);
        assert_eq!(run.replay.telemetry, 2);
        assert_eq!(run.counters.records, 3);

        let records: Vec<EmissionRecord> = read_ndjson(&out.path().join("emissions.ndjson"));
        assert_eq!(records.len(), 3);
        // per-vehicle order preserved
        let trk101: Vec<_> = records
            .iter()
            .filter(|r| r.vehicle_id == "TRK-101")
            .map(|r| r.timestamp)
            .collect();
        assert_eq!(trk101, vec![1_000, 4_000]);

        let idle = records.iter().find(|r| r.vehicle_id == "TRK-102").unwrap();
        assert_eq!(idle.severity, Severity::Critical);
        assert!((idle.co2_grams - 85.0).abs() < 1e-9);

        let alerts: Vec<AlertEvent> = read_ndjson(&out.path().join("alerts.ndjson"));
        assert_eq!(alerts.len() as u64, run.counters.alerts);
        assert!(alerts
            .iter()
            .any(|a| a.alert_kind == AlertKind::HighIdle && a.message.contains("1275.0g")));

        // 5-minute windows stay open; discarded at shutdown
        assert!(!out.path().join("summaries.ndjson").exists());
        assert_eq!(run.counters.open_windows_discarded, 2);
        assert_eq!(run.stats.summary().total_records, 3);
    }

    #[tokio::test]
    async fn test_e2e_fusion_split_around_telemetry() {
        let positions = ndjson(&[position("VAN-1", 3_000, 45.0), position("VAN-1", 8_000, 45.0)]);
        let telemetry = ndjson(&[telemetry("VAN-1", 5_000, 4_000.0, 0)]);
        let out = tempdir().unwrap();

        replay_to_files(&positions, Some(&telemetry), &EngineConfig::default(), out.path()).await;

        let records: Vec<EmissionRecord> = read_ndjson(&out.path().join("emissions.ndjson"));
        assert_eq!(records.len(), 2);
        // t=3 precedes the telemetry: unloaded defaults
        assert_eq!(records[0].load_kg, 0.0);
        assert_eq!(records[0].co2_rate_g_per_km, 650.0);
        // t=8 joins telemetry t=5: 650 + 4 * 25
        assert_eq!(records[1].load_kg, 4_000.0);
        assert_eq!(records[1].co2_rate_g_per_km, 750.0);
    }

    #[test]
    fn test_fusion_ignores_future_telemetry() {
        let mut pipeline = EmissionPipeline::default();
        pipeline.push_telemetry(telemetry("VAN-1", 5_000, 4_000.0, 0));

        let early = pipeline.push_position(position("VAN-1", 3_000, 45.0));
        assert_eq!(early.record.load_kg, 0.0);

        let late = pipeline.push_position(position("VAN-1", 8_000, 45.0));
        assert_eq!(late.record.load_kg, 4_000.0);
    }

    #[tokio::test]
    async fn test_e2e_windows_and_late_records() {
        let engine = EngineConfig {
            window: WindowConfig {
                duration_ms: 60_000,
                lateness_ms: 5_000,
            },
            ..Default::default()
        };
        let positions = ndjson(&[
            position("V", 10_000, 50.0),
            position("V", 20_000, 50.0),
            position("V", 50_000, 50.0),
            position("V", 70_000, 50.0),
            // W's first bucket closed when V reached 70s
            position("W", 30_000, 50.0),
            position("W", 80_000, 50.0),
            position("V", 130_000, 50.0),
        ]);
        let out = tempdir().unwrap();

        let run = replay_to_files(&positions, None, &engine, out.path()).await;

        assert_eq!(run.counters.records, 7);
        assert_eq!(run.counters.late_dropped, 1);

        let summaries: Vec<WindowSummary> = read_ndjson(&out.path().join("summaries.ndjson"));
        let keys: Vec<_> = summaries
            .iter()
            .map(|s| (s.window_start, s.vehicle_id.as_str(), s.reading_count))
            .collect();
        assert_eq!(
            keys,
            vec![(0, "V", 3), (60_000, "V", 1), (60_000, "W", 1)]
        );
        assert!(summaries.iter().all(|s| s.window_end == s.window_start + 60_000));

        // the late record is still emitted, only excluded from its window
        let records: Vec<EmissionRecord> = read_ndjson(&out.path().join("emissions.ndjson"));
        assert!(records.iter().any(|r| r.vehicle_id == "W" && r.timestamp == 30_000));
        assert_eq!(run.counters.open_windows_discarded, 1);
    }

    #[tokio::test]
    async fn test_e2e_replay_is_deterministic() {
        let positions = ndjson(&[
            position("A", 1_000, 30.0),
            position("B", 1_000, 0.0),
            position("A", 2_000, 75.0),
        ]);
        let telemetry = ndjson(&[
            telemetry("B", 1_000, 500.0, 70),
            telemetry("A", 1_500, 1_200.0, 0),
        ]);

        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        replay_to_files(&positions, Some(&telemetry), &EngineConfig::default(), first.path()).await;
        replay_to_files(&positions, Some(&telemetry), &EngineConfig::default(), second.path())
            .await;

        for file in ["emissions.ndjson", "alerts.ndjson"] {
            let a = std::fs::read_to_string(first.path().join(file)).unwrap();
            let b = std::fs::read_to_string(second.path().join(file)).unwrap();
            assert_eq!(a, b, "{file} differs between runs");
        }
    }

    #[tokio::test]
    async fn test_e2e_malformed_input_skipped() {
        let mut positions = ndjson(&[position("A", 1_000, 30.0)]);
        writeln!(positions, "not json").unwrap();
        writeln!(
            positions,
            "{}",
            serde_json::to_string(&position("A", 2_000, -10.0)).unwrap()
        )
        .unwrap();
        writeln!(
            positions,
            "{}",
            serde_json::to_string(&position("A", 3_000, 30.0)).unwrap()
        )
        .unwrap();
        let out = tempdir().unwrap();

        let run = replay_to_files(&positions, None, &EngineConfig::default(), out.path()).await;

        assert_eq!(run.replay.decode_errors, 1);
        assert_eq!(run.replay.rejected, 1);
        assert_eq!(run.counters.records, 2);
    }

    #[test]
    fn test_pipeline_records_match_model() {
        let engine = EngineConfig::default();
        let mut pipeline = EmissionPipeline::new(&engine);
        pipeline.push_telemetry(telemetry("BUS-9", 1_000, 3_500.0, 0));

        for (timestamp, speed) in [(2_000, 18.0), (3_000, 62.0), (4_000, 104.0)] {
            let output = pipeline.push_position(position("BUS-9", timestamp, speed));
            let expected = emission_model::estimate(speed, 3_500.0, 0, &engine.model);
            assert_eq!(output.record.co2_grams, expected.co2_grams);
            assert_eq!(output.record.co2_rate_g_per_km, expected.co2_rate_g_per_km);
        }
    }

    #[test]
    fn test_fleet_snapshot_after_run() {
        let mut pipeline = EmissionPipeline::default();
        pipeline.push_telemetry(telemetry("TRK-104", 500, 0.0, 130));
        pipeline.push_position(position("TRK-104", 1_000, 0.0));
        pipeline.push_position(position("TRK-105", 1_000, 55.0));

        let fleet = pipeline.fleet_snapshot();
        let ids: Vec<_> = fleet.vehicles.iter().map(|v| v.vehicle_id.as_str()).collect();
        assert_eq!(ids, vec!["TRK-104", "TRK-105"]);
        assert_eq!(
            fleet.get("TRK-104").map(|v| v.status),
            Some(contracts::VehicleStatus::Critical)
        );
        assert!(fleet.total_co2_grams() > 0.0);
    }
}
