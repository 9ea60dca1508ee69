//! FleetSnapshot - live per-vehicle view derived from the emission stream

use serde::{Deserialize, Serialize};

use crate::{TimestampMs, VehicleId};

/// Operating status shown for a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Moving,
    Idle,
    Warning,
    Critical,
}

/// Latest known state of one vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    pub vehicle_id: VehicleId,
    pub last_timestamp: TimestampMs,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: f64,
    pub status: VehicleStatus,
    /// CO₂ accumulated since the vehicle was first seen (g)
    pub total_co2_grams: f64,
    pub readings: u64,
    pub alerts: u64,
}

/// Fleet-wide view, vehicles sorted by id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    pub vehicles: Vec<VehicleSnapshot>,
}

impl FleetSnapshot {
    pub fn total_co2_grams(&self) -> f64 {
        self.vehicles.iter().map(|v| v.total_co2_grams).sum()
    }

    pub fn count_with_status(&self, status: VehicleStatus) -> usize {
        self.vehicles.iter().filter(|v| v.status == status).count()
    }

    pub fn get(&self, vehicle_id: &str) -> Option<&VehicleSnapshot> {
        self.vehicles.iter().find(|v| v.vehicle_id == vehicle_id)
    }
}
