//! Dispatcher - main loop for topic-routed fan-out to sinks

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use contracts::{OutputEvent, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Sink configurations
    pub sinks: Vec<SinkConfig>,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<OutputEvent>,
}

impl DispatcherBuilder {
    /// Create a new DispatcherBuilder
    pub fn new(config: DispatcherConfig, input_rx: mpsc::Receiver<OutputEvent>) -> Self {
        Self { config, input_rx }
    }

    /// Build and start the dispatcher
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub async fn build(self) -> Result<Dispatcher, DispatcherError> {
        let handles = Self::initialize_handles(&self.config).await?;

        Ok(Dispatcher {
            handles,
            input_rx: self.input_rx,
        })
    }

    #[instrument(
        name = "dispatcher_initialize_handles",
        skip(config),
        fields(sink_count = config.sinks.len())
    )]
    async fn initialize_handles(
        config: &DispatcherConfig,
    ) -> Result<Vec<SinkHandle>, DispatcherError> {
        let mut handles = Vec::with_capacity(config.sinks.len());
        for sink_config in &config.sinks {
            match create_sink_handle(sink_config).await {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Stop the workers already spawned
                    Dispatcher::shutdown_handles(handles).await;
                    return Err(e);
                }
            }
        }
        Ok(handles)
    }
}

/// Create a SinkHandle from configuration
#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
async fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    let topics = config.topics.clone();
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn_with_topics(
                sink,
                config.queue_capacity,
                topics,
            ))
        }
        SinkType::File => {
            if !config.params.contains_key("path") {
                return Err(DispatcherError::sink_creation(
                    &config.name,
                    "file sink requires a 'path' param",
                ));
            }
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn_with_topics(
                sink,
                config.queue_capacity,
                topics,
            ))
        }
    }
}

/// The main Dispatcher that fans out events to sinks
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<OutputEvent>,
}

impl Dispatcher {
    /// Create a dispatcher with custom sink handles (for testing)
    pub fn with_handles(handles: Vec<SinkHandle>, input_rx: mpsc::Receiver<OutputEvent>) -> Self {
        Self { handles, input_rx }
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Run the dispatcher main loop
    ///
    /// Consumes events from input and routes each to the sinks subscribed to
    /// its topic. Returns per-sink metrics once the input channel is closed
    /// and every sink has been flushed and closed.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> Vec<(String, MetricsSnapshot)> {
        info!(sinks = self.handles.len(), "Dispatcher started");

        let mut event_count: u64 = 0;

        while let Some(event) = self.input_rx.recv().await {
            event_count += 1;
            self.dispatch_event(&event);

            if event_count.is_multiple_of(1000) {
                debug!(events = event_count, "Dispatcher progress");
            }
        }

        info!(
            events = event_count,
            "Dispatcher input closed, shutting down"
        );

        let handles = std::mem::take(&mut self.handles);
        let mut metrics = Vec::with_capacity(handles.len());
        for handle in handles {
            let name = handle.name().to_string();
            let sink_metrics = handle.metrics().clone();
            handle.shutdown().await;
            metrics.push((name, sink_metrics.snapshot()));
        }

        info!("Dispatcher shutdown complete");
        metrics
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<Vec<(String, MetricsSnapshot)>> {
        tokio::spawn(self.run())
    }

    fn dispatch_event(&self, event: &OutputEvent) {
        let topic = event.topic();
        for handle in self.handles.iter().filter(|h| h.accepts(topic)) {
            // Drops are logged and counted by the handle
            let _ = handle.try_send(event.clone());
        }
    }

    async fn shutdown_handles(handles: Vec<SinkHandle>) {
        for handle in handles {
            handle.shutdown().await;
        }
    }
}

/// Convenience function to create a dispatcher from sink configs
#[instrument(name = "dispatcher_create", skip(sink_configs, input_rx))]
pub async fn create_dispatcher(
    sink_configs: Vec<SinkConfig>,
    input_rx: mpsc::Receiver<OutputEvent>,
) -> Result<Dispatcher, DispatcherError> {
    let config = DispatcherConfig {
        sinks: sink_configs,
    };
    DispatcherBuilder::new(config, input_rx).build().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::tests::{summary, MockSink};
    use contracts::{Topic, WindowSummary};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_dispatcher_fanout() {
        let (input_tx, input_rx) = mpsc::channel(10);

        let handles = vec![
            SinkHandle::spawn(LogSink::new("sink1"), 10),
            SinkHandle::spawn(LogSink::new("sink2"), 10),
        ];

        let dispatcher = Dispatcher::with_handles(handles, input_rx);
        let handle = dispatcher.spawn();

        for i in 0..5 {
            input_tx.send(summary("TRK-101", i * 300_000)).await.unwrap();
        }
        drop(input_tx);

        let metrics = handle.await.unwrap();
        assert_eq!(metrics.len(), 2);
        for (_, snapshot) in metrics {
            assert_eq!(snapshot.write_count, 5);
            assert_eq!(snapshot.dropped_count, 0);
        }
    }

    #[tokio::test]
    async fn test_dispatcher_routes_by_topic() {
        let (input_tx, input_rx) = mpsc::channel(10);
        let all_count = Arc::new(AtomicU64::new(0));
        let alert_count = Arc::new(AtomicU64::new(0));

        let handles = vec![
            SinkHandle::spawn(MockSink::counting("all", Arc::clone(&all_count)), 10),
            SinkHandle::spawn_with_topics(
                MockSink::counting("alerts_only", Arc::clone(&alert_count)),
                10,
                vec![Topic::Alerts],
            ),
        ];

        let handle = Dispatcher::with_handles(handles, input_rx).spawn();
        input_tx.send(summary("TRK-101", 0)).await.unwrap();
        input_tx.send(summary("TRK-102", 0)).await.unwrap();
        drop(input_tx);
        handle.await.unwrap();

        assert_eq!(all_count.load(Ordering::Relaxed), 2);
        assert_eq!(alert_count.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_create_dispatcher_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let (input_tx, input_rx) = mpsc::channel(10);

        let mut params = HashMap::new();
        params.insert(
            "path".to_string(),
            dir.path().to_string_lossy().into_owned(),
        );
        let configs = vec![
            SinkConfig {
                name: "test_log".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 50,
                topics: vec![],
                params: HashMap::new(),
            },
            SinkConfig {
                name: "summaries_file".to_string(),
                sink_type: SinkType::File,
                queue_capacity: 50,
                topics: vec![Topic::Summaries],
                params,
            },
        ];

        let dispatcher = create_dispatcher(configs, input_rx).await.unwrap();
        let handle = dispatcher.spawn();

        input_tx.send(summary("TRK-101", 0)).await.unwrap();
        drop(input_tx);
        handle.await.unwrap();

        let content = std::fs::read_to_string(dir.path().join("summaries.ndjson")).unwrap();
        let written: WindowSummary = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(written.vehicle_id, "TRK-101");
    }

    #[tokio::test]
    async fn test_file_sink_without_path_is_rejected() {
        let (_input_tx, input_rx) = mpsc::channel(1);
        let configs = vec![SinkConfig {
            name: "broken".to_string(),
            sink_type: SinkType::File,
            queue_capacity: 8,
            topics: vec![],
            params: HashMap::new(),
        }];

        let result = create_dispatcher(configs, input_rx).await;
        assert!(matches!(
            result,
            Err(DispatcherError::SinkCreation { ref name, .. }) if name == "broken"
        ));
    }
}
