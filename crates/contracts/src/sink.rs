//! DataSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for Sinks and the events they receive.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AlertEvent, ContractError, EmissionRecord, TimestampMs, WindowSummary};

/// Output feed an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Emissions,
    Alerts,
    Summaries,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Emissions, Topic::Alerts, Topic::Summaries];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emissions => "emissions",
            Self::Alerts => "alerts",
            Self::Summaries => "summaries",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything the pipeline publishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload", rename_all = "snake_case")]
pub enum OutputEvent {
    Emission(EmissionRecord),
    Alert(AlertEvent),
    Summary(WindowSummary),
}

impl OutputEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::Emission(_) => Topic::Emissions,
            Self::Alert(_) => Topic::Alerts,
            Self::Summary(_) => Topic::Summaries,
        }
    }

    pub fn vehicle_id(&self) -> &str {
        match self {
            Self::Emission(r) => &r.vehicle_id,
            Self::Alert(a) => &a.vehicle_id,
            Self::Summary(s) => &s.vehicle_id,
        }
    }

    /// Event time; window summaries report their bucket start
    pub fn timestamp(&self) -> TimestampMs {
        match self {
            Self::Emission(r) => r.timestamp,
            Self::Alert(a) => a.timestamp,
            Self::Summary(s) => s.window_start,
        }
    }
}

/// Data output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(DataSink: Send)]
pub trait LocalDataSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one output event
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, event: &OutputEvent) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
