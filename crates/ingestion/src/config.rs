//! Replay configuration and metrics

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use contracts::IngestionConfig;

/// NDJSON replay configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    /// Position events, one JSON object per line
    pub positions_path: Option<PathBuf>,

    /// Telemetry events, one JSON object per line
    pub telemetry_path: Option<PathBuf>,

    /// Channel capacity
    pub channel_capacity: usize,

    /// Event-time pacing multiplier; 0 disables pacing
    pub replay_speed: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            positions_path: None,
            telemetry_path: None,
            channel_capacity: 256,
            replay_speed: 0.0,
        }
    }
}

impl From<&IngestionConfig> for ReplayConfig {
    fn from(config: &IngestionConfig) -> Self {
        Self {
            positions_path: config.positions_path.as_ref().map(PathBuf::from),
            telemetry_path: config.telemetry_path.as_ref().map(PathBuf::from),
            channel_capacity: config.channel_capacity,
            replay_speed: config.replay_speed,
        }
    }
}

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Lines successfully decoded
    pub events_received: AtomicU64,

    /// Events forwarded downstream
    pub events_sent: AtomicU64,

    /// Events rejected by the stream guard
    pub events_rejected: AtomicU64,

    /// Lines that failed to decode
    pub decode_errors: AtomicU64,

    /// Current queue length
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self) {
        self.events_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.events_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_sent: self.events_sent.load(Ordering::Relaxed),
            events_rejected: self.events_rejected.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_received: u64,
    pub events_sent: u64,
    pub events_rejected: u64,
    pub decode_errors: u64,
    pub queue_len: usize,
}
