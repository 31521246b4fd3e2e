//! Observability subsystem
//!
//! Structured JSON line logging, typed events, begin/complete scopes and
//! decode counters.
//!
//! # Principles
//!
//! 1. Observability is read-only and never changes decode results
//! 2. No background threads or buffering
//! 3. Deterministic output ordering

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

/// Logs an event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_does_not_panic() {
        log_event(Event::SchemasLoaded, &[("files", "1")]);
        log_event(Event::DecodeFailed, &[]);
    }
}
