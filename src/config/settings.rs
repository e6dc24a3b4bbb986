//! Runtime settings that can be modified while the node is running
//!
//! These settings are separate from the persistent configuration: they start
//! from [`MonitoringConfig`](super::MonitoringConfig) and are then toggled by
//! `enable-cpu` / `disable-cpu` / `enable-contention` / `disable-contention`
//! probe commands. The cell is shared by `Arc` between the dispatcher and
//! anything else that samples threads; concurrent toggles are last-writer-wins.

use super::MonitoringConfig;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Which kind of thread instrumentation a toggle refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitoringKind {
    /// Per-thread CPU and user time
    Cpu,
    /// Blocked / waited times
    Contention,
}

impl fmt::Display for MonitoringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitoringKind::Cpu => write!(f, "CPU"),
            MonitoringKind::Contention => write!(f, "contention"),
        }
    }
}

/// Process-wide monitoring switches
#[derive(Debug)]
pub struct MonitoringFlags {
    cpu: AtomicBool,
    contention: AtomicBool,
}

impl Default for MonitoringFlags {
    fn default() -> Self {
        Self::from_config(&MonitoringConfig::default())
    }
}

impl MonitoringFlags {
    pub fn new(cpu: bool, contention: bool) -> Self {
        Self {
            cpu: AtomicBool::new(cpu),
            contention: AtomicBool::new(contention),
        }
    }

    pub fn from_config(config: &MonitoringConfig) -> Self {
        Self::new(config.cpu, config.contention)
    }

    fn cell(&self, kind: MonitoringKind) -> &AtomicBool {
        match kind {
            MonitoringKind::Cpu => &self.cpu,
            MonitoringKind::Contention => &self.contention,
        }
    }

    pub fn is_enabled(&self, kind: MonitoringKind) -> bool {
        self.cell(kind).load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, kind: MonitoringKind, enabled: bool) {
        self.cell(kind).store(enabled, Ordering::SeqCst);
    }
}
