//! NDJSON replay of the position and telemetry streams.
//!
//! Both files are read line by line and merged in timestamp order, telemetry
//! first on ties, so that a replay is deterministic. Undecodable lines and
//! events rejected by the guard are skipped and counted.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_channel::Sender;
use contracts::{InboundEvent, PositionEvent, TelemetryEvent, TimestampMs};
use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tracing::{debug, info, instrument, warn};

use crate::config::{IngestionMetrics, ReplayConfig};
use crate::error::{IngestionError, Result};
use crate::guard::StreamGuard;

/// Outcome of one replay run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub positions: u64,
    pub telemetry: u64,
    pub rejected: u64,
    pub decode_errors: u64,
    /// The receiver went away before the inputs were exhausted
    pub interrupted: bool,
}

/// Line-oriented decoder for one input file
struct EventLines<T> {
    stream: &'static str,
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: u64,
    _event: PhantomData<T>,
}

impl<T: DeserializeOwned> EventLines<T> {
    async fn open(stream: &'static str, path: &Path) -> Result<Self> {
        let file = File::open(path)
            .await
            .map_err(|source| IngestionError::Open {
                stream,
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            stream,
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line_no: 0,
            _event: PhantomData,
        })
    }

    /// Next decodable event, or `None` at end of file
    async fn next_event(&mut self, metrics: &IngestionMetrics) -> Result<Option<T>> {
        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|source| IngestionError::Read {
                    stream: self.stream,
                    path: self.path.clone(),
                    line: self.line_no + 1,
                    source,
                })?;
            let Some(line) = line else {
                return Ok(None);
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<T>(trimmed) {
                Ok(event) => {
                    metrics.record_received();
                    return Ok(Some(event));
                }
                Err(e) => {
                    metrics.record_decode_error();
                    metrics::counter!(
                        "fleet_emissions_rejected_inputs_total",
                        "stream" => self.stream,
                        "reason" => "decode"
                    )
                    .increment(1);
                    warn!(
                        stream = self.stream,
                        line = self.line_no,
                        error = %e,
                        "undecodable input line skipped"
                    );
                }
            }
        }
    }
}

async fn read_next<T: DeserializeOwned>(
    reader: &mut Option<EventLines<T>>,
    metrics: &IngestionMetrics,
) -> Result<Option<T>> {
    match reader {
        Some(r) => r.next_event(metrics).await,
        None => Ok(None),
    }
}

/// Replays two NDJSON files into the ingestion channel
pub struct NdjsonReplay {
    config: ReplayConfig,
    metrics: Arc<IngestionMetrics>,
}

impl NdjsonReplay {
    pub fn new(config: ReplayConfig, metrics: Arc<IngestionMetrics>) -> Self {
        Self { config, metrics }
    }

    /// Run to exhaustion of both inputs or until the receiver is dropped
    ///
    /// # Errors
    /// Fails if no input is configured or an input cannot be opened or read.
    /// Malformed lines are not errors.
    #[instrument(name = "ingestion_replay", skip_all)]
    pub async fn run(self, tx: Sender<InboundEvent>) -> Result<ReplayReport> {
        let metrics = self.metrics.as_ref();
        if self.config.positions_path.is_none() && self.config.telemetry_path.is_none() {
            return Err(IngestionError::NoInput);
        }

        let mut positions: Option<EventLines<PositionEvent>> = match &self.config.positions_path {
            Some(path) => Some(EventLines::open(PositionEvent::STREAM, path).await?),
            None => None,
        };
        let mut telemetry: Option<EventLines<TelemetryEvent>> =
            match &self.config.telemetry_path {
                Some(path) => Some(EventLines::open(TelemetryEvent::STREAM, path).await?),
                None => None,
            };

        info!(
            positions = ?self.config.positions_path,
            telemetry = ?self.config.telemetry_path,
            replay_speed = self.config.replay_speed,
            "replay started"
        );

        let mut guard = StreamGuard::new();
        let mut report = ReplayReport::default();
        let mut last_ts: Option<TimestampMs> = None;

        let mut next_pos = read_next(&mut positions, metrics).await?;
        let mut next_tel = read_next(&mut telemetry, metrics).await?;

        loop {
            let event = match (next_pos.take(), next_tel.take()) {
                (None, None) => break,
                (Some(p), Some(t)) if t.timestamp <= p.timestamp => {
                    next_pos = Some(p);
                    next_tel = read_next(&mut telemetry, metrics).await?;
                    InboundEvent::Telemetry(t)
                }
                (Some(p), t) => {
                    next_tel = t;
                    next_pos = read_next(&mut positions, metrics).await?;
                    InboundEvent::Position(p)
                }
                (None, Some(t)) => {
                    next_tel = read_next(&mut telemetry, metrics).await?;
                    InboundEvent::Telemetry(t)
                }
            };

            if guard.check(&event).is_err() {
                metrics.record_rejected();
                report.rejected += 1;
                continue;
            }

            if !self.pace(&tx, &mut last_ts, event.timestamp()).await {
                debug!("receiver dropped while pacing, stopping replay");
                report.interrupted = true;
                break;
            }

            let is_position = matches!(event, InboundEvent::Position(_));
            if tx.send(event).await.is_err() {
                debug!("receiver dropped, stopping replay");
                report.interrupted = true;
                break;
            }
            metrics.record_sent();
            metrics.update_queue_len(tx.len());
            if is_position {
                report.positions += 1;
            } else {
                report.telemetry += 1;
            }
        }

        report.decode_errors = metrics.snapshot().decode_errors;
        info!(
            positions = report.positions,
            telemetry = report.telemetry,
            rejected = report.rejected,
            decode_errors = report.decode_errors,
            interrupted = report.interrupted,
            "replay finished"
        );
        Ok(report)
    }

    /// Sleep for the event-time gap scaled by the replay speed
    ///
    /// Returns `false` if the receiver went away before the sleep finished.
    async fn pace(
        &self,
        tx: &Sender<InboundEvent>,
        last_ts: &mut Option<TimestampMs>,
        ts: TimestampMs,
    ) -> bool {
        let speed = self.config.replay_speed;
        let prev = *last_ts;
        *last_ts = Some(prev.map_or(ts, |prev| prev.max(ts)));
        let Some(prev) = prev else {
            return true;
        };
        if speed <= 0.0 || ts <= prev {
            return true;
        }

        let gap = Duration::from_millis(ts - prev).as_secs_f64() / speed;
        let delay = Duration::try_from_secs_f64(gap).unwrap_or(Duration::MAX);
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = tx.closed() => false,
        }
    }
}
