//! Bounded per-vehicle telemetry history.
//!
//! Readings not yet reached by a position are kept in arrival order in a
//! fixed-capacity ring. The reading matched by the last fused position lives
//! in a separate anchor slot, so overflow from readings far ahead of the
//! position stream can never evict the current match. Lookups scan for the
//! latest reading at or before a given time; the ring is small, so a linear
//! scan is cheaper than maintaining a sorted index.

use std::fmt;

use contracts::{TelemetryEvent, TimestampMs};
use ringbuf::{traits::*, HeapRb};

/// Telemetry readings for one vehicle
pub struct TelemetryHistory {
    readings: HeapRb<TelemetryEvent>,
    anchor: Option<TelemetryEvent>,
    capacity: usize,
    evicted_count: u64,
}

impl fmt::Debug for TelemetryHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryHistory")
            .field("len", &self.len())
            .field("anchor", &self.anchor.as_ref().map(|r| r.timestamp))
            .field("capacity", &self.capacity)
            .field("evicted", &self.evicted_count)
            .finish()
    }
}

impl TelemetryHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            readings: HeapRb::new(capacity),
            anchor: None,
            capacity,
            evicted_count: 0,
        }
    }

    /// Append a reading; returns `true` if the oldest one had to be evicted
    #[inline]
    pub fn push(&mut self, reading: TelemetryEvent) -> bool {
        let evicted = if self.readings.is_full() {
            let _ = self.readings.try_pop();
            self.evicted_count += 1;
            true
        } else {
            false
        };
        let _ = self.readings.try_push(reading);
        evicted
    }

    /// Latest reading with `timestamp <= at`; on equal timestamps the later arrival wins
    #[inline]
    pub fn as_of(&self, at: TimestampMs) -> Option<&TelemetryEvent> {
        self.anchor
            .iter()
            .chain(self.readings.iter())
            .filter(|r| r.timestamp <= at)
            .max_by_key(|r| r.timestamp)
    }

    /// Move the as-of match for `at` into the anchor slot
    ///
    /// Every ring reading at or before `at` is either promoted or dropped as
    /// superseded. Returns how many readings were dropped.
    pub fn settle(&mut self, at: TimestampMs) -> usize {
        let drained: Vec<TelemetryEvent> = self.readings.pop_iter().collect();
        let mut removed = 0;
        for r in drained {
            if r.timestamp > at {
                let _ = self.readings.try_push(r);
                continue;
            }
            // Drain order is arrival order, so `>=` lets the later arrival win ties
            let supersedes = self
                .anchor
                .as_ref()
                .map_or(true, |current| r.timestamp >= current.timestamp);
            if !supersedes || self.anchor.replace(r).is_some() {
                removed += 1;
            }
        }
        removed
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.readings.occupied_len() + usize::from(self.anchor.is_some())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty() && self.anchor.is_none()
    }

    #[inline]
    pub fn evicted_count(&self) -> u64 {
        self.evicted_count
    }
}
