//! Ingestion Pipeline main entry

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::InboundEvent;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

use crate::config::{IngestionMetrics, ReplayConfig};
use crate::error::Result;
use crate::replay::{NdjsonReplay, ReplayReport};

/// Ingestion Pipeline
///
/// Owns the bounded channel between the input sources and the emission
/// pipeline, and spawns the replay task feeding it.
pub struct IngestionPipeline {
    config: ReplayConfig,

    /// Shared metrics
    metrics: Arc<IngestionMetrics>,

    /// Event sender
    tx: Sender<InboundEvent>,

    /// Event receiver
    rx: Option<Receiver<InboundEvent>>,
}

impl IngestionPipeline {
    pub fn new(config: ReplayConfig) -> Self {
        let (tx, rx) = bounded(config.channel_capacity.max(1));

        Self {
            config,
            metrics: Arc::new(IngestionMetrics::new()),
            tx,
            rx: Some(rx),
        }
    }

    /// Spawn the NDJSON replay onto the current runtime
    ///
    /// The pipeline keeps no sender of its own once started, so the channel
    /// closes when the replay finishes.
    #[instrument(name = "ingestion_start", skip(self))]
    pub fn start(self) -> JoinHandle<Result<ReplayReport>> {
        info!(
            channel_capacity = self.config.channel_capacity,
            "starting replay source"
        );
        let replay = NdjsonReplay::new(self.config, self.metrics);
        tokio::spawn(replay.run(self.tx))
    }

    /// Get event receiver
    ///
    /// Note: Can only be called once, subsequent calls return None
    pub fn take_receiver(&mut self) -> Option<Receiver<InboundEvent>> {
        self.rx.take()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_take_receiver_once() {
        let mut pipeline = IngestionPipeline::new(ReplayConfig::default());
        assert!(pipeline.take_receiver().is_some());
        assert!(pipeline.take_receiver().is_none());
    }

    #[tokio::test]
    async fn test_channel_closes_after_replay() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"vehicle_id":"TRK-101","timestamp":1000,"latitude":12.9,"longitude":77.6,"speed_kmh":45.0,"heading":0.0}}"#
        )
        .unwrap();

        let mut pipeline = IngestionPipeline::new(ReplayConfig {
            positions_path: Some(file.path().to_path_buf()),
            ..Default::default()
        });
        let rx = pipeline.take_receiver().unwrap();
        let metrics = pipeline.metrics();
        let handle = pipeline.start();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.vehicle_id(), "TRK-101");
        assert!(rx.recv().await.is_err());

        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.positions, 1);
        assert_eq!(metrics.snapshot().events_sent, 1);
    }
}
