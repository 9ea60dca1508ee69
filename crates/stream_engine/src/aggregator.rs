//! Tumbling-window aggregation of emission records in event time.
//!
//! Buckets are epoch-aligned `[start, start + duration)` per vehicle. The
//! watermark is the largest event time seen; a bucket closes once the
//! watermark passes `end + lateness`, and any record for a closed bucket is
//! dropped and counted.

use std::collections::BTreeMap;

use contracts::{EmissionRecord, TimestampMs, VehicleId, WindowConfig, WindowSummary};
use tracing::{debug, instrument};

/// Outcome of offering a record to the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    /// Folded into an open bucket
    Accepted,
    /// Its bucket had already closed; dropped
    Late,
}

#[derive(Debug, Clone, Default)]
struct Accumulator {
    sum_rate: f64,
    sum_grams: f64,
    sum_speed: f64,
    max_idle: u32,
    count: u64,
}

impl Accumulator {
    fn fold(&mut self, record: &EmissionRecord) {
        self.sum_rate += record.co2_rate_g_per_km;
        self.sum_grams += record.co2_grams;
        self.sum_speed += record.speed_kmh;
        self.max_idle = self.max_idle.max(record.idle_seconds);
        self.count += 1;
    }

    fn reduce(self, vehicle_id: VehicleId, start: TimestampMs, end: TimestampMs) -> WindowSummary {
        let n = self.count.max(1) as f64;
        WindowSummary {
            vehicle_id,
            window_start: start,
            window_end: end,
            avg_co2_rate_g_per_km: self.sum_rate / n,
            total_co2_grams: self.sum_grams,
            avg_speed_kmh: self.sum_speed / n,
            max_idle_seconds: self.max_idle,
            reading_count: self.count,
        }
    }
}

/// Per-vehicle tumbling window aggregator
#[derive(Debug, Default)]
pub struct WindowAggregator {
    config: WindowConfig,
    /// Keyed by `(window_start, vehicle_id)` so closing walks buckets in output order
    open: BTreeMap<(TimestampMs, VehicleId), Accumulator>,
    closed: Vec<WindowSummary>,
    watermark: Option<TimestampMs>,
    late_dropped: u64,
}

impl WindowAggregator {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Offer one record
    #[instrument(
        level = "trace",
        name = "aggregator_ingest",
        skip(self, record),
        fields(vehicle_id = %record.vehicle_id, timestamp = record.timestamp)
    )]
    pub fn ingest(&mut self, record: &EmissionRecord) -> Ingested {
        let start = self.bucket_start(record.timestamp);
        let end = self.bucket_end(start);

        if self.is_closed(end) {
            self.late_dropped += 1;
            debug!(
                vehicle_id = %record.vehicle_id,
                timestamp = record.timestamp,
                window_start = start,
                watermark = self.watermark,
                "late record dropped"
            );
            return Ingested::Late;
        }

        self.open
            .entry((start, record.vehicle_id.clone()))
            .or_default()
            .fold(record);

        self.advance_watermark(record.timestamp);
        Ingested::Accepted
    }

    /// Move the watermark forward (never backwards) and close due buckets
    pub fn advance_watermark(&mut self, to: TimestampMs) {
        if self.watermark.is_some_and(|w| w >= to) {
            return;
        }
        self.watermark = Some(to);
        self.close_due();
    }

    /// Take the summaries closed so far, ordered by `(window_start, vehicle_id)`
    pub fn drain_closed(&mut self) -> Vec<WindowSummary> {
        std::mem::take(&mut self.closed)
    }

    /// Discard open buckets without emitting them; returns how many were dropped
    pub fn shutdown(&mut self) -> usize {
        let discarded = self.open.len();
        self.open.clear();
        if discarded > 0 {
            debug!(discarded, "open windows discarded at shutdown");
        }
        discarded
    }

    pub fn watermark(&self) -> Option<TimestampMs> {
        self.watermark
    }

    pub fn open_buckets(&self) -> usize {
        self.open.len()
    }

    pub fn late_dropped(&self) -> u64 {
        self.late_dropped
    }

    fn close_due(&mut self) {
        while let Some(start) = self.open.keys().next().map(|(start, _)| *start) {
            let end = self.bucket_end(start);
            if !self.is_closed(end) {
                break;
            }
            if let Some(((start, vehicle_id), acc)) = self.open.pop_first() {
                self.closed.push(acc.reduce(vehicle_id, start, end));
            }
        }
    }

    fn duration(&self) -> TimestampMs {
        self.config.duration_ms.max(1)
    }

    fn bucket_start(&self, ts: TimestampMs) -> TimestampMs {
        ts - ts % self.duration()
    }

    fn bucket_end(&self, start: TimestampMs) -> TimestampMs {
        start.saturating_add(self.duration())
    }

    fn is_closed(&self, end: TimestampMs) -> bool {
        self.watermark
            .is_some_and(|w| w > end.saturating_add(self.config.lateness_ms))
    }
}
