//! # Stream Engine
//!
//! Stateful stages of the emission pipeline.
//!
//! Responsible for:
//! - Backward as-of join of positions with telemetry (`StreamFusion`)
//! - Event-time tumbling windows with a lateness cutoff (`WindowAggregator`)
//! - Cumulative fleet view (`FleetLedger`)
//! - Composing them with the emission transform (`EmissionPipeline`)
//!
//! ## Usage
//!
//! ```ignore
//! use stream_engine::EmissionPipeline;
//!
//! let mut pipeline = EmissionPipeline::new(&engine_config);
//!
//! pipeline.push_telemetry(telemetry);
//! let output = pipeline.push_position(position);
//! for summary in output.summaries {
//!     // Handle closed window
//! }
//! ```

mod aggregator;
mod fusion;
mod history;
mod ledger;
mod pipeline;

pub use aggregator::{Ingested, WindowAggregator};
pub use fusion::StreamFusion;
pub use history::TelemetryHistory;
pub use ledger::{FleetLedger, DEFAULT_IDLE_SPEED_KMH};
pub use pipeline::{EmissionPipeline, PipelineCounters, PipelineOutput};

// Re-export contracts types
pub use contracts::{EngineConfig, FusionConfig, VehicleState, WindowConfig, WindowSummary};
