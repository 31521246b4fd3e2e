//! Begin/complete logging around a unit of work
//!
//! - `{name}_BEGIN` at creation
//! - `{name}_COMPLETE` on [`ObservationScope::complete`]
//! - `{name}_FAILED` on [`ObservationScope::fail`]
//! - `{name}_INCOMPLETE` when dropped without either

use std::time::Instant;

use super::logger::Logger;

pub struct ObservationScope {
    name: &'static str,
    finished: bool,
    timer: Timer,
}

impl ObservationScope {
    pub fn new(name: &'static str) -> Self {
        Logger::info(&format!("{}_BEGIN", name), &[]);
        Self {
            name,
            finished: false,
            timer: Timer::new(),
        }
    }

    /// Logs completion with `duration_us` plus the given fields
    pub fn complete(mut self, fields: &[(&str, &str)]) {
        self.finished = true;
        let duration = self.timer.elapsed_us();
        let mut all: Vec<(&str, &str)> = vec![("duration_us", duration.as_str())];
        all.extend_from_slice(fields);
        Logger::info(&format!("{}_COMPLETE", self.name), &all);
    }

    pub fn fail(mut self, reason: &str) {
        self.finished = true;
        Logger::error(&format!("{}_FAILED", self.name), &[("reason", reason)]);
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished {
            Logger::warn(
                &format!("{}_INCOMPLETE", self.name),
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}

/// Elapsed-time helper for log fields
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_us(&self) -> String {
        self.start.elapsed().as_micros().to_string()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
