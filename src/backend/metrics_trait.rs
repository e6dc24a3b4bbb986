//! ThreadMetrics trait for the platform thread-statistics capability
//!
//! This module provides a common trait for sources of per-thread scheduling
//! statistics, so the `threads` report can run against `/proc` on Linux or
//! against a fixed table in tests and benchmarks.

use std::fmt;

/// Scheduling state of a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadState {
    Running,
    Sleeping,
    /// Uninterruptible sleep, usually I/O
    DiskSleep,
    Stopped,
    Zombie,
    Dead,
    Idle,
    Unknown,
}

impl ThreadState {
    /// Parse from the `/proc/<tid>/stat` state character
    pub fn from_char(c: char) -> Self {
        match c {
            'R' => ThreadState::Running,
            'S' => ThreadState::Sleeping,
            'D' => ThreadState::DiskSleep,
            'T' | 't' => ThreadState::Stopped,
            'Z' => ThreadState::Zombie,
            'X' | 'x' => ThreadState::Dead,
            'I' => ThreadState::Idle,
            _ => ThreadState::Unknown,
        }
    }

    /// Name shown in the report and used for `threads=state` ordering
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreadState::Running => "RUNNING",
            ThreadState::Sleeping => "SLEEPING",
            ThreadState::DiskSleep => "DISK_SLEEP",
            ThreadState::Stopped => "STOPPED",
            ThreadState::Zombie => "ZOMBIE",
            ThreadState::Dead => "DEAD",
            ThreadState::Idle => "IDLE",
            ThreadState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics of one thread as reported by the platform
///
/// Times are reported whether or not monitoring is enabled; the reporter
/// masks them according to the monitoring flags.
#[derive(Debug, Clone, PartialEq)]
pub struct RawThreadInfo {
    pub name: String,
    pub state: ThreadState,
    /// Times the thread was kept off the CPU while runnable
    pub blocked_count: u64,
    /// Total time spent blocked, milliseconds
    pub blocked_time_ms: f64,
    /// Times the thread gave up the CPU to wait
    pub waited_count: u64,
    /// Total time spent waiting, milliseconds
    pub waited_time_ms: f64,
    /// User + system CPU time, nanoseconds
    pub cpu_time_ns: u64,
    /// User CPU time, nanoseconds
    pub user_time_ns: u64,
}

impl RawThreadInfo {
    /// A thread with the given name and state and all counters at zero
    pub fn new(name: impl Into<String>, state: ThreadState) -> Self {
        Self {
            name: name.into(),
            state,
            blocked_count: 0,
            blocked_time_ms: 0.0,
            waited_count: 0,
            waited_time_ms: 0.0,
            cpu_time_ns: 0,
            user_time_ns: 0,
        }
    }
}

/// Source of per-thread statistics for the current process
///
/// Implementations must be `Send + Sync`; the dispatcher samples threads
/// from whichever thread handles the probe request.
#[cfg_attr(test, mockall::automock)]
pub trait ThreadMetrics: Send + Sync {
    /// Whether per-thread CPU time can be measured at all
    fn cpu_time_supported(&self) -> bool;

    /// Whether blocked/waited times can be measured at all
    fn contention_supported(&self) -> bool;

    /// Ids of all live threads
    fn thread_ids(&self) -> Vec<u64>;

    /// Statistics of one thread, `None` if it exited since enumeration
    fn thread_info(&self, id: u64) -> Option<RawThreadInfo>;
}
