//! Fixed thread table for tests, benchmarks and non-Linux hosts
//!
//! [`StaticThreadMetrics`] answers every query from an in-memory list of
//! threads, which makes `threads` output deterministic.

use super::metrics_trait::{RawThreadInfo, ThreadMetrics};

/// Thread metrics backed by a fixed list
#[derive(Debug, Clone)]
pub struct StaticThreadMetrics {
    cpu_supported: bool,
    contention_supported: bool,
    threads: Vec<(u64, RawThreadInfo)>,
}

impl Default for StaticThreadMetrics {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl StaticThreadMetrics {
    /// Create an empty table with the given capability support
    pub fn new(cpu_supported: bool, contention_supported: bool) -> Self {
        Self {
            cpu_supported,
            contention_supported,
            threads: Vec::new(),
        }
    }

    /// Add a thread; ids are assigned in insertion order starting at 1
    pub fn with_thread(mut self, info: RawThreadInfo) -> Self {
        let id = self.threads.len() as u64 + 1;
        self.threads.push((id, info));
        self
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

impl ThreadMetrics for StaticThreadMetrics {
    fn cpu_time_supported(&self) -> bool {
        self.cpu_supported
    }

    fn contention_supported(&self) -> bool {
        self.contention_supported
    }

    fn thread_ids(&self) -> Vec<u64> {
        self.threads.iter().map(|(id, _)| *id).collect()
    }

    fn thread_info(&self, id: u64) -> Option<RawThreadInfo> {
        self.threads
            .iter()
            .find(|(tid, _)| *tid == id)
            .map(|(_, info)| info.clone())
    }
}
