//! Input guard at the ingestion boundary
//!
//! Stateless range/finiteness checks plus a per-vehicle, per-stream
//! timestamp regression check. Cross-stream order is not checked.

use std::collections::HashMap;

use contracts::{ContractError, InboundEvent, TimestampMs, VehicleId};
use tracing::warn;

/// Validates inbound events before they reach the pipeline
#[derive(Debug, Default)]
pub struct StreamGuard {
    last_seen: HashMap<(&'static str, VehicleId), TimestampMs>,
    rejected: u64,
}

impl StreamGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept or reject one event
    ///
    /// Rejections are logged, counted and returned; the caller skips the event.
    pub fn check(&mut self, event: &InboundEvent) -> Result<(), ContractError> {
        let result = self.evaluate(event);
        if let Err(err) = &result {
            self.rejected += 1;
            warn!(
                stream = event.stream(),
                vehicle_id = %event.vehicle_id(),
                timestamp = event.timestamp(),
                error = %err,
                "input event rejected"
            );
            metrics::counter!(
                "fleet_emissions_rejected_inputs_total",
                "stream" => event.stream(),
                "reason" => err.kind()
            )
            .increment(1);
        }
        result
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }

    fn evaluate(&mut self, event: &InboundEvent) -> Result<(), ContractError> {
        event.check()?;

        let key = (event.stream(), event.vehicle_id().to_string());
        let timestamp = event.timestamp();
        if let Some(&last) = self.last_seen.get(&key) {
            if timestamp < last {
                return Err(ContractError::TimestampRegression {
                    stream: event.stream(),
                    vehicle_id: key.1,
                    timestamp,
                    last,
                });
            }
        }
        self.last_seen.insert(key, timestamp);
        Ok(())
    }
}
