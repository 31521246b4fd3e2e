//! Decode counters
//!
//! - Counters only, monotonic
//! - Relaxed atomics; totals are exact once callers quiesce

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    decodes_attempted: AtomicU64,
    decodes_succeeded: AtomicU64,
    decodes_failed: AtomicU64,
    /// Partial decodes that stopped before the last field
    decodes_partial: AtomicU64,
    bytes_consumed: AtomicU64,
    chars_consumed: AtomicU64,
    schemas_compiled: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_attempted(&self) {
        self.decodes_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_succeeded(&self) {
        self.decodes_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed(&self) {
        self.decodes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_partial(&self) {
        self.decodes_partial.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_bytes(&self, count: u64) {
        self.bytes_consumed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_chars(&self, count: u64) {
        self.chars_consumed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_schemas(&self, count: u64) {
        self.schemas_compiled.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            decodes_attempted: self.decodes_attempted.load(Ordering::Relaxed),
            decodes_succeeded: self.decodes_succeeded.load(Ordering::Relaxed),
            decodes_failed: self.decodes_failed.load(Ordering::Relaxed),
            decodes_partial: self.decodes_partial.load(Ordering::Relaxed),
            bytes_consumed: self.bytes_consumed.load(Ordering::Relaxed),
            chars_consumed: self.chars_consumed.load(Ordering::Relaxed),
            schemas_compiled: self.schemas_compiled.load(Ordering::Relaxed),
        }
    }

    /// Current values as a JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Point-in-time copy of every counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub decodes_attempted: u64,
    pub decodes_succeeded: u64,
    pub decodes_failed: u64,
    pub decodes_partial: u64,
    pub bytes_consumed: u64,
    pub chars_consumed: u64,
    pub schemas_compiled: u64,
}
