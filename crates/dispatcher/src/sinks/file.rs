//! FileSink - appends events to one NDJSON file per topic

use contracts::{ContractError, DataSink, OutputEvent, Topic};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output directory; each topic goes to `<path>/<topic>.ndjson`
    pub path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        Self { path }
    }
}

/// Sink that writes events to disk as newline-delimited JSON
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writers: HashMap<Topic, BufWriter<File>>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.path)?;

        Ok(Self {
            name: name.into(),
            config,
            writers: HashMap::new(),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    /// File backing `topic`
    pub fn topic_path(&self, topic: Topic) -> PathBuf {
        self.config.path.join(format!("{}.ndjson", topic.as_str()))
    }

    fn writer(&mut self, topic: Topic) -> std::io::Result<&mut BufWriter<File>> {
        if !self.writers.contains_key(&topic) {
            let path = self.topic_path(topic);
            debug!(sink = %self.name, path = %path.display(), "Opening topic file");
            self.writers
                .insert(topic, BufWriter::new(File::create(path)?));
        }
        self.writers
            .get_mut(&topic)
            .ok_or_else(|| std::io::Error::other("topic writer missing"))
    }

    fn write_line(&mut self, event: &OutputEvent) -> std::io::Result<()> {
        let writer = self.writer(event.topic())?;
        let encoded = match event {
            OutputEvent::Emission(record) => serde_json::to_writer(&mut *writer, record),
            OutputEvent::Alert(alert) => serde_json::to_writer(&mut *writer, alert),
            OutputEvent::Summary(summary) => serde_json::to_writer(&mut *writer, summary),
        };
        encoded.map_err(std::io::Error::other)?;
        writer.write_all(b"\n")
    }

    fn persist_event(&mut self, event: &OutputEvent) -> Result<(), ContractError> {
        self.write_line(event).map_err(|e| {
            error!(
                sink = %self.name,
                topic = %event.topic(),
                vehicle_id = %event.vehicle_id(),
                error = %e,
                "Write failed"
            );
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    fn flush_all(&mut self) -> Result<(), ContractError> {
        for (topic, writer) in &mut self.writers {
            writer.flush().map_err(|e| {
                ContractError::sink_write(&self.name, format!("flush {topic}: {e}"))
            })?;
        }
        Ok(())
    }
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, event),
        fields(sink = %self.name, topic = %event.topic())
    )]
    async fn write(&mut self, event: &OutputEvent) -> Result<(), ContractError> {
        self.persist_event(event)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.flush_all()
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush_all()?;
        self.writers.clear();
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}
