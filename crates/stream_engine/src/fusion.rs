//! Backward as-of join of positions with telemetry.

use std::collections::HashMap;

use contracts::{FusionConfig, PositionEvent, TelemetryEvent, VehicleId, VehicleState};
use tracing::{instrument, trace};

use crate::history::TelemetryHistory;

/// Per-vehicle temporal join state
#[derive(Debug, Default)]
pub struct StreamFusion {
    config: FusionConfig,
    histories: HashMap<VehicleId, TelemetryHistory>,
    evicted_count: u64,
}

impl StreamFusion {
    pub fn new(config: FusionConfig) -> Self {
        Self {
            config,
            histories: HashMap::new(),
            evicted_count: 0,
        }
    }

    /// Record a telemetry reading; returns `true` if an older reading was evicted
    #[instrument(
        level = "trace",
        name = "fusion_ingest_telemetry",
        skip(self, reading),
        fields(vehicle_id = %reading.vehicle_id, timestamp = reading.timestamp)
    )]
    pub fn ingest_telemetry(&mut self, reading: TelemetryEvent) -> bool {
        let capacity = self.config.telemetry_history;
        let history = self
            .histories
            .entry(reading.vehicle_id.clone())
            .or_insert_with(|| TelemetryHistory::new(capacity));

        let evicted = history.push(reading);
        if evicted {
            self.evicted_count += 1;
            metrics::counter!("fleet_emissions_telemetry_evicted_total").increment(1);
        }
        evicted
    }

    /// Join one position with the latest telemetry at or before it
    ///
    /// Always yields exactly one state; neutral defaults stand in when the
    /// vehicle has no eligible telemetry yet.
    #[instrument(
        level = "trace",
        name = "fusion_fuse",
        skip(self, position),
        fields(vehicle_id = %position.vehicle_id, timestamp = position.timestamp)
    )]
    pub fn fuse(&mut self, position: &PositionEvent) -> VehicleState {
        let Some(history) = self.histories.get_mut(&position.vehicle_id) else {
            return VehicleState::from_parts(position, None);
        };

        let state = VehicleState::from_parts(position, history.as_of(position.timestamp));
        if state.telemetry_timestamp.is_some() {
            let pruned = history.settle(position.timestamp);
            if pruned > 0 {
                trace!(pruned, "superseded telemetry pruned");
            }
        }
        state
    }

    /// Vehicles with telemetry history
    pub fn tracked_vehicles(&self) -> usize {
        self.histories.len()
    }

    /// Telemetry readings currently retained across all vehicles
    pub fn buffered_readings(&self) -> usize {
        self.histories.values().map(TelemetryHistory::len).sum()
    }

    pub fn evicted_count(&self) -> u64 {
        self.evicted_count
    }
}
