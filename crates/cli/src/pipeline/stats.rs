//! Pipeline statistics and end-of-run report.

use std::fmt;
use std::time::Duration;

use contracts::{FleetSnapshot, VehicleStatus};
use ingestion::ReplayReport;
use observability::EmissionStatsAggregator;
use stream_engine::PipelineCounters;

/// Why the pipeline loop stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopReason {
    /// Both input streams were exhausted
    #[default]
    InputExhausted,
    /// `--max-records` was reached
    MaxRecords,
    /// Ctrl-C or SIGTERM
    Signal,
    /// The dispatcher went away
    DispatcherClosed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InputExhausted => "input exhausted",
            Self::MaxRecords => "max records reached",
            Self::Signal => "shutdown signal",
            Self::DispatcherClosed => "dispatcher closed",
        })
    }
}

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub stop_reason: StopReason,

    /// Emission pipeline totals
    pub counters: PipelineCounters,

    /// Replay totals
    pub replay: ReplayReport,

    /// Per-sink (name, written, failed, dropped)
    pub sinks: Vec<(String, u64, u64, u64)>,

    /// Output aggregation
    pub emissions: EmissionStatsAggregator,

    /// Fleet view at shutdown
    pub fleet: FleetSnapshot,

    /// Total duration of the pipeline run
    pub duration: Duration,
}

impl PipelineStats {
    /// Emission records per second of wall time
    pub fn records_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.counters.records as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");

        println!("Overview");
        println!("  Stopped: {}", self.stop_reason);
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Records/s: {:.2}", self.records_per_sec());

        println!("\nInput");
        println!("  Positions: {}", self.counters.positions);
        println!("  Telemetry: {}", self.counters.telemetry);
        println!("  Rejected: {}", self.replay.rejected);
        println!("  Undecodable: {}", self.replay.decode_errors);

        println!("\nEngine");
        println!("  Records: {}", self.counters.records);
        println!("  Alerts: {}", self.counters.alerts);
        println!("  Window summaries: {}", self.counters.summaries);
        println!("  Late records dropped: {}", self.counters.late_dropped);
        println!("  Telemetry evicted: {}", self.counters.telemetry_evicted);
        println!(
            "  Open windows discarded: {}",
            self.counters.open_windows_discarded
        );

        println!("\nFleet");
        println!("  Vehicles: {}", self.fleet.vehicles.len());
        println!("  Total CO2: {:.1} g", self.fleet.total_co2_grams());
        println!(
            "  Moving/Idle/Warning/Critical: {}/{}/{}/{}",
            self.fleet.count_with_status(VehicleStatus::Moving),
            self.fleet.count_with_status(VehicleStatus::Idle),
            self.fleet.count_with_status(VehicleStatus::Warning),
            self.fleet.count_with_status(VehicleStatus::Critical),
        );

        if !self.sinks.is_empty() {
            println!("\nSinks");
            for (name, written, failed, dropped) in &self.sinks {
                println!("  {name}: written={written}, failed={failed}, dropped={dropped}");
            }
        }

        println!("\n{}", self.emissions.summary());
    }
}
