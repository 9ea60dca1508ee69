//! Layered error definitions
//!
//! Categorized by source: config / input / sink

use thiserror::Error;

use crate::TimestampMs;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Input Errors =====
    /// Structurally decoded event with out-of-range or non-finite values
    #[error("invalid {stream} event for vehicle '{vehicle_id}': {message}")]
    InvalidEvent {
        stream: &'static str,
        vehicle_id: String,
        message: String,
    },

    /// Timestamp went backwards within one vehicle's own stream
    #[error(
        "timestamp regression on {stream} stream for vehicle '{vehicle_id}': {timestamp} < {last}"
    )]
    TimestampRegression {
        stream: &'static str,
        vehicle_id: String,
        timestamp: TimestampMs,
        last: TimestampMs,
    },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create invalid event error
    pub fn invalid_event(
        stream: &'static str,
        vehicle_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidEvent {
            stream,
            vehicle_id: vehicle_id.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Short, stable label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigParse { .. } => "config_parse",
            Self::ConfigValidation { .. } => "config_validation",
            Self::InvalidEvent { .. } => "invalid_event",
            Self::TimestampRegression { .. } => "timestamp_regression",
            Self::SinkWrite { .. } => "sink_write",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}
