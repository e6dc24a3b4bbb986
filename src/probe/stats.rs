//! Self-statistics of the probe dispatcher

use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Counters shared between the dispatcher and the `DIAG` component
pub type SharedStats = Arc<Mutex<ProbeStats>>;

/// Create an empty shared statistics cell
pub fn shared_stats() -> SharedStats {
    Arc::new(Mutex::new(ProbeStats::default()))
}

/// Request and command counters with handle-time tracking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeStats {
    /// Number of `handle` calls
    pub requests: u64,
    /// Commands that completed without error
    pub commands_handled: u64,
    /// Commands that failed and were skipped
    pub commands_failed: u64,
    /// Total handle time in microseconds
    pub total_handle_time_us: u64,
    /// Handle time of the most recent request in microseconds
    pub last_handle_time_us: u64,
    /// Minimum handle time observed (microseconds)
    pub min_handle_time_us: u64,
    /// Maximum handle time observed (microseconds)
    pub max_handle_time_us: u64,
}

impl Default for ProbeStats {
    fn default() -> Self {
        Self {
            requests: 0,
            commands_handled: 0,
            commands_failed: 0,
            total_handle_time_us: 0,
            last_handle_time_us: 0,
            min_handle_time_us: u64::MAX,
            max_handle_time_us: 0,
        }
    }
}

impl ProbeStats {
    /// Record one finished request
    pub fn record_request(&mut self, time_us: u64, handled: u64, failed: u64) {
        self.requests += 1;
        self.commands_handled += handled;
        self.commands_failed += failed;
        self.total_handle_time_us += time_us;
        self.last_handle_time_us = time_us;
        self.min_handle_time_us = self.min_handle_time_us.min(time_us);
        self.max_handle_time_us = self.max_handle_time_us.max(time_us);
    }

    /// Calculate average handle time in microseconds
    pub fn avg_handle_time_us(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.total_handle_time_us as f64 / self.requests as f64
        }
    }

    /// Minimum handle time, `None` before the first request
    pub fn min_handle_time(&self) -> Option<u64> {
        (self.requests > 0).then_some(self.min_handle_time_us)
    }

    /// Calculate command success rate as percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.commands_handled + self.commands_failed;
        if total == 0 {
            100.0
        } else {
            (self.commands_handled as f64 / total as f64) * 100.0
        }
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "requests={} commands={} failed={} success={:.1}% avg={:.1}us max={}us",
            self.requests,
            self.commands_handled + self.commands_failed,
            self.commands_failed,
            self.success_rate(),
            self.avg_handle_time_us(),
            self.max_handle_time_us
        )
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
