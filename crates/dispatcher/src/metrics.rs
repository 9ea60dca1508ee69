//! Per-sink delivery counters, broken down by topic

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use contracts::Topic;

fn slot(topic: Topic) -> usize {
    match topic {
        Topic::Emissions => 0,
        Topic::Alerts => 1,
        Topic::Summaries => 2,
    }
}

#[derive(Debug, Default)]
struct TopicCounters {
    written: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl TopicCounters {
    fn counts(&self) -> TopicCounts {
        TopicCounts {
            written: self.written.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Delivery counters for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    queue_len: AtomicUsize,
    topics: [TopicCounters; 3],
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn record_written(&self, topic: Topic) {
        self.topics[slot(topic)]
            .written
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self, topic: Topic) {
        self.topics[slot(topic)].failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Event dropped because the sink queue was full
    pub fn record_dropped(&self, topic: Topic) {
        self.topics[slot(topic)]
            .dropped
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Counters for one topic
    pub fn topic(&self, topic: Topic) -> TopicCounts {
        self.topics[slot(topic)].counts()
    }

    pub fn write_count(&self) -> u64 {
        self.totals().written
    }

    pub fn failure_count(&self) -> u64 {
        self.totals().failed
    }

    pub fn dropped_count(&self) -> u64 {
        self.totals().dropped
    }

    fn totals(&self) -> TopicCounts {
        self.topics
            .iter()
            .map(TopicCounters::counts)
            .fold(TopicCounts::default(), |acc, c| acc + c)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let totals = self.totals();
        MetricsSnapshot {
            queue_len: self.queue_len(),
            write_count: totals.written,
            failure_count: totals.failed,
            dropped_count: totals.dropped,
            by_topic: Topic::ALL.map(|t| (t, self.topic(t))),
        }
    }
}

/// Written, failed and dropped counts for one topic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopicCounts {
    pub written: u64,
    pub failed: u64,
    pub dropped: u64,
}

impl std::ops::Add for TopicCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            written: self.written + rhs.written,
            failed: self.failed + rhs.failed,
            dropped: self.dropped + rhs.dropped,
        }
    }
}

/// Point-in-time copy of a sink's counters
#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub write_count: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
    pub by_topic: [(Topic, TopicCounts); 3],
}

impl MetricsSnapshot {
    pub fn topic(&self, topic: Topic) -> TopicCounts {
        self.by_topic[slot(topic)].1
    }
}
