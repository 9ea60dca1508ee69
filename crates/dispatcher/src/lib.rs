//! # Dispatcher
//!
//! Output fan-out for the emission pipeline.
//!
//! Responsibilities:
//! - Consume `OutputEvent`s (emission records, alerts, window summaries)
//! - Route each event to the sinks subscribed to its topic
//! - Isolate slow sinks so they never stall the pipeline

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{DataSink, OutputEvent, Topic};
pub use dispatcher::{Dispatcher, DispatcherBuilder, DispatcherConfig, create_dispatcher};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics, TopicCounts};
pub use sinks::{FileSink, LogSink};
