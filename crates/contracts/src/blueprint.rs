//! PipelineBlueprint - Config Loader output
//!
//! Describes a complete pipeline run: engine tunables, input sources and output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{EngineConfig, Topic};

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete pipeline configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Emission model, alert, window and fusion tunables
    #[serde(default)]
    pub engine: EngineConfig,

    /// Input sources
    #[serde(default)]
    pub ingestion: IngestionConfig,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Input source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// NDJSON file of position events
    #[serde(default)]
    pub positions_path: Option<String>,

    /// NDJSON file of telemetry events
    #[serde(default)]
    pub telemetry_path: Option<String>,

    /// Capacity of the ingestion -> pipeline channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Replay pacing multiplier; 0 replays as fast as possible
    #[serde(default)]
    pub replay_speed: f64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            positions_path: None,
            telemetry_path: None,
            channel_capacity: default_channel_capacity(),
            replay_speed: 0.0,
        }
    }
}

fn default_channel_capacity() -> usize {
    256
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Topics routed to this sink; empty means all
    #[serde(default)]
    pub topics: Vec<Topic>,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SinkConfig {
    /// Whether events on `topic` are routed to this sink
    pub fn accepts(&self, topic: Topic) -> bool {
        self.topics.is_empty() || self.topics.contains(&topic)
    }
}

fn default_queue_capacity() -> usize {
    256
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    Log,
    /// NDJSON file output
    File,
}

impl PipelineBlueprint {
    /// Whether any sink receives events on `topic`
    pub fn routes_topic(&self, topic: Topic) -> bool {
        self.sinks.iter().any(|sink| sink.accepts(topic))
    }
}
