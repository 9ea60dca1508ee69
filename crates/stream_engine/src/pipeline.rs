//! Single-threaded composition of fusion, emission transform, window
//! aggregation and the fleet ledger.

use contracts::{
    AlertEvent, EmissionRecord, EngineConfig, FleetSnapshot, PositionEvent, TelemetryEvent,
    TimestampMs, WindowSummary,
};
use emission_model::EmissionTransform;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{FleetLedger, Ingested, StreamFusion, WindowAggregator};

/// Everything produced by one position event
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub record: EmissionRecord,
    pub alert: Option<AlertEvent>,
    /// Windows closed by this record's advance of the watermark
    pub summaries: Vec<WindowSummary>,
}

/// Running totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineCounters {
    pub positions: u64,
    pub telemetry: u64,
    pub records: u64,
    pub alerts: u64,
    pub summaries: u64,
    pub late_dropped: u64,
    pub telemetry_evicted: u64,
    pub open_windows_discarded: u64,
}

/// Emission pipeline instance
///
/// Per-vehicle order is preserved: every position yields exactly one record,
/// in arrival order.
#[derive(Debug)]
pub struct EmissionPipeline {
    fusion: StreamFusion,
    transform: EmissionTransform,
    aggregator: WindowAggregator,
    ledger: FleetLedger,
    counters: PipelineCounters,
}

impl Default for EmissionPipeline {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl EmissionPipeline {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            fusion: StreamFusion::new(config.fusion.clone()),
            transform: EmissionTransform::from_engine_config(config),
            aggregator: WindowAggregator::new(config.window.clone()),
            ledger: FleetLedger::new(config.model.stationary_speed_kmh),
            counters: PipelineCounters::default(),
        }
    }

    pub fn push_telemetry(&mut self, reading: TelemetryEvent) {
        self.counters.telemetry += 1;
        if self.fusion.ingest_telemetry(reading) {
            self.counters.telemetry_evicted += 1;
        }
    }

    #[instrument(
        level = "trace",
        name = "pipeline_push_position",
        skip(self, position),
        fields(vehicle_id = %position.vehicle_id, timestamp = position.timestamp)
    )]
    pub fn push_position(&mut self, position: PositionEvent) -> PipelineOutput {
        self.counters.positions += 1;

        let state = self.fusion.fuse(&position);
        let record = self.transform.apply(&state);
        self.counters.records += 1;

        let alert = record.alert_event();
        if alert.is_some() {
            self.counters.alerts += 1;
        }

        self.ledger.observe(&record);

        if self.aggregator.ingest(&record) == Ingested::Late {
            self.counters.late_dropped += 1;
            metrics::counter!("fleet_emissions_late_dropped_total").increment(1);
        }
        let summaries = self.take_closed();

        PipelineOutput {
            record,
            alert,
            summaries,
        }
    }

    /// Advance event time without a record (e.g. an idle source heartbeat)
    pub fn advance_watermark(&mut self, to: TimestampMs) -> Vec<WindowSummary> {
        self.aggregator.advance_watermark(to);
        self.take_closed()
    }

    pub fn fleet_snapshot(&self) -> FleetSnapshot {
        self.ledger.snapshot()
    }

    pub fn stats(&self) -> PipelineCounters {
        self.counters
    }

    pub fn watermark(&self) -> Option<TimestampMs> {
        self.aggregator.watermark()
    }

    /// Stop the pipeline; open windows are discarded, not flushed
    pub fn shutdown(mut self) -> PipelineCounters {
        let discarded = self.aggregator.shutdown();
        self.counters.open_windows_discarded += discarded as u64;
        debug!(
            discarded,
            records = self.counters.records,
            summaries = self.counters.summaries,
            "pipeline shut down"
        );
        self.counters
    }

    fn take_closed(&mut self) -> Vec<WindowSummary> {
        let summaries = self.aggregator.drain_closed();
        self.counters.summaries += summaries.len() as u64;
        metrics::gauge!("fleet_emissions_open_windows").set(self.aggregator.open_buckets() as f64);
        summaries
    }
}
