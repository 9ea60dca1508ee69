//! SinkHandle - manages a sink with isolated queue and worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{DataSink, OutputEvent, Topic};

use crate::error::DispatcherError;
use crate::metrics::SinkMetrics;

/// Handle to a running sink worker
pub struct SinkHandle {
    /// Sink name
    name: String,
    /// Subscribed topics; empty means all
    topics: Vec<Topic>,
    /// Channel to send events to worker
    tx: mpsc::Sender<OutputEvent>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Create a new SinkHandle subscribed to every topic and spawn the worker task
    pub fn spawn<S: DataSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        Self::spawn_with_topics(sink, queue_capacity, Vec::new())
    }

    /// Create a new SinkHandle restricted to `topics` (empty means all)
    pub fn spawn_with_topics<S: DataSink + Send + 'static>(
        sink: S,
        queue_capacity: usize,
        topics: Vec<Topic>,
    ) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();

        let worker_handle = tokio::spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            topics,
            tx,
            metrics,
            worker_handle,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether events on `topic` go to this sink
    pub fn accepts(&self, topic: Topic) -> bool {
        self.topics.is_empty() || self.topics.contains(&topic)
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Send an event to the sink (non-blocking)
    ///
    /// A full queue drops the event for this sink only.
    pub fn try_send(&self, event: OutputEvent) -> Result<(), DispatcherError> {
        let topic = event.topic();
        match self.tx.try_send(event) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                record_dispatch(&self.name, topic, "queued");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.metrics.record_dropped(topic);
                record_dispatch(&self.name, topic, "dropped");
                warn!(
                    sink = %self.name,
                    topic = %topic,
                    vehicle_id = %event.vehicle_id(),
                    timestamp = event.timestamp(),
                    "Queue full, event dropped"
                );
                Err(DispatcherError::QueueFull {
                    sink_name: self.name.clone(),
                    topic,
                    vehicle_id: event.vehicle_id().to_string(),
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                record_dispatch(&self.name, topic, "closed");
                error!(sink = %self.name, "Sink worker closed unexpectedly");
                Err(DispatcherError::SinkClosed {
                    sink_name: self.name.clone(),
                })
            }
        }
    }

    /// Shutdown the sink worker gracefully
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        // Drop sender to signal worker to stop
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        debug!(sink = %self.name, "SinkHandle shutdown complete");
    }
}

fn record_dispatch(sink: &str, topic: Topic, result: &'static str) {
    metrics::counter!(
        "fleet_emissions_sink_dispatch_total",
        "sink" => sink.to_string(),
        "topic" => topic.as_str(),
        "result" => result
    )
    .increment(1);
}

/// Worker task that consumes events and writes to sink
#[instrument(
    name = "sink_worker_loop",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn sink_worker<S: DataSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<OutputEvent>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(event) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.write(&event).await {
            Ok(()) => {
                metrics.record_written(event.topic());
            }
            Err(e) => {
                metrics.record_failed(event.topic());
                error!(
                    sink = %name,
                    topic = %event.topic(),
                    vehicle_id = %event.vehicle_id(),
                    error = %e,
                    "Write failed"
                );
                // Continue processing - don't crash on single failure
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}
