//! # Ingestion Pipeline
//!
//! Input boundary of the emission pipeline.
//!
//! Responsibilities:
//! - Replay position and telemetry NDJSON files, merged in timestamp order
//! - Reject malformed events (`StreamGuard`) before they reach the core
//! - Backpressure through a bounded async-channel
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{IngestionPipeline, ReplayConfig};
//!
//! let mut pipeline = IngestionPipeline::new(ReplayConfig::from(&blueprint.ingestion));
//! let rx = pipeline.take_receiver().unwrap();
//! let replay = pipeline.start();
//!
//! while let Ok(event) = rx.recv().await {
//!     // Feed the emission pipeline
//! }
//! let report = replay.await??;
//! ```

mod config;
mod error;
mod guard;
mod pipeline;
mod replay;

// Re-exports
pub use config::{IngestionMetrics, MetricsSnapshot, ReplayConfig};
pub use contracts::InboundEvent;
pub use error::{IngestionError, Result};
pub use guard::StreamGuard;
pub use pipeline::IngestionPipeline;
pub use replay::{NdjsonReplay, ReplayReport};
