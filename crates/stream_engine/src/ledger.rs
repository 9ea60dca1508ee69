//! Live fleet view folded from the emission stream.

use std::collections::HashMap;

use contracts::{
    EmissionRecord, FleetSnapshot, Severity, VehicleId, VehicleSnapshot, VehicleStatus,
};

/// Speed below which a vehicle without alerts is shown as idle (km/h)
pub const DEFAULT_IDLE_SPEED_KMH: f64 = 1.0;

/// Cumulative per-vehicle emission ledger
#[derive(Debug)]
pub struct FleetLedger {
    idle_speed_kmh: f64,
    vehicles: HashMap<VehicleId, VehicleSnapshot>,
}

impl Default for FleetLedger {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_SPEED_KMH)
    }
}

impl FleetLedger {
    pub fn new(idle_speed_kmh: f64) -> Self {
        Self {
            idle_speed_kmh,
            vehicles: HashMap::new(),
        }
    }

    pub fn observe(&mut self, record: &EmissionRecord) {
        let status = self.status_of(record);
        let entry = self
            .vehicles
            .entry(record.vehicle_id.clone())
            .or_insert_with(|| VehicleSnapshot {
                vehicle_id: record.vehicle_id.clone(),
                last_timestamp: record.timestamp,
                latitude: record.latitude,
                longitude: record.longitude,
                speed_kmh: record.speed_kmh,
                status,
                total_co2_grams: 0.0,
                readings: 0,
                alerts: 0,
            });

        entry.last_timestamp = record.timestamp;
        entry.latitude = record.latitude;
        entry.longitude = record.longitude;
        entry.speed_kmh = record.speed_kmh;
        entry.status = status;
        entry.total_co2_grams += record.co2_grams;
        entry.readings += 1;
        if record.has_alert() {
            entry.alerts += 1;
        }
    }

    pub fn snapshot(&self) -> FleetSnapshot {
        let mut vehicles: Vec<VehicleSnapshot> = self.vehicles.values().cloned().collect();
        vehicles.sort_by(|a, b| a.vehicle_id.cmp(&b.vehicle_id));
        FleetSnapshot { vehicles }
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    fn status_of(&self, record: &EmissionRecord) -> VehicleStatus {
        match record.severity {
            Severity::Critical => VehicleStatus::Critical,
            Severity::Warning => VehicleStatus::Warning,
            Severity::Info if record.speed_kmh < self.idle_speed_kmh => VehicleStatus::Idle,
            Severity::Info => VehicleStatus::Moving,
        }
    }
}
