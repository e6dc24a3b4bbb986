//! DIAG component: the probe's own statistics
//!
//! Exposes the dispatcher counters as read-only attributes and a `summary()`
//! operation. `reset-stats` clears them.

use crate::probe::{ProbeStats, SharedStats};
use crate::stack::{Capabilities, Members, Operation, Protocol};
use crate::types::{Value, ValueType};

/// Instance name of the diagnostics component
pub const DIAG_NAME: &str = "DIAG";

/// Class name of the diagnostics component
pub const DIAG_CLASS: &str = "Diagnostics";

fn stat<F>(stats: &SharedStats, read: F) -> impl Fn() -> Option<Value> + Send + Sync + 'static
where
    F: Fn(&ProbeStats) -> Option<Value> + Send + Sync + 'static,
{
    let stats = stats.clone();
    move || stats.lock().ok().and_then(|s| read(&*s))
}

/// Probe self-statistics component
pub struct Diagnostics {
    stats: SharedStats,
    caps: Capabilities,
}

impl Diagnostics {
    pub fn new(stats: SharedStats) -> Self {
        let summary_stats = stats.clone();
        let members = Members::new()
            .read_only(
                "requests",
                ValueType::U64,
                stat(&stats, |s| Some(s.requests.into())),
            )
            .describe("Number of probe requests handled")
            .read_only(
                "commands_handled",
                ValueType::U64,
                stat(&stats, |s| Some(s.commands_handled.into())),
            )
            .read_only(
                "commands_failed",
                ValueType::U64,
                stat(&stats, |s| Some(s.commands_failed.into())),
            )
            .describe("Commands that failed and were skipped")
            .read_only(
                "last_handle_time_us",
                ValueType::U64,
                stat(&stats, |s| Some(s.last_handle_time_us.into())),
            )
            .read_only(
                "min_handle_time_us",
                ValueType::U64,
                stat(&stats, |s| s.min_handle_time().map(Value::from)),
            )
            .read_only(
                "max_handle_time_us",
                ValueType::U64,
                stat(&stats, |s| Some(s.max_handle_time_us.into())),
            )
            .read_only(
                "avg_handle_time_us",
                ValueType::F64,
                stat(&stats, |s| Some(s.avg_handle_time_us().into())),
            )
            .read_only(
                "success_rate",
                ValueType::F64,
                stat(&stats, |s| Some(s.success_rate().into())),
            )
            .operation(
                Operation::new("summary", vec![], move |_| {
                    Ok(summary_stats
                        .lock()
                        .ok()
                        .map(|s| Value::Text(s.summary())))
                })
                .returning(ValueType::String)
                .with_description("One-line summary of the probe counters"),
            );

        Self {
            stats,
            caps: Capabilities::new(members),
        }
    }
}

impl Protocol for Diagnostics {
    fn name(&self) -> &str {
        DIAG_NAME
    }

    fn class_name(&self) -> &str {
        DIAG_CLASS
    }

    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn reset_stats(&self) {
        if let Ok(mut stats) = self.stats.lock() {
            stats.reset();
        }
    }
}
