//! Linux thread statistics from `/proc/self/task`
//!
//! Each live thread of the process appears as `/proc/self/task/<tid>/`.
//! The fields used for the `threads` report are:
//!
//! | Report column | Source                                        |
//! |---------------|-----------------------------------------------|
//! | name          | `comm`                                        |
//! | state         | `stat` field 3                                |
//! | cpu / user    | `stat` fields 14 + 15 / field 14 (clock ticks) |
//! | block         | `status` `nonvoluntary_ctxt_switches`         |
//! | btime         | `schedstat` run-queue wait (ns)               |
//! | wait          | `status` `voluntary_ctxt_switches`            |
//! | wtime         | `stat` field 42 `delayacct_blkio_ticks`       |
//!
//! On platforms without procfs the root does not exist, so both capabilities
//! report unsupported and no threads are listed.

use super::metrics_trait::{RawThreadInfo, ThreadMetrics, ThreadState};
use std::fs;
use std::path::{Path, PathBuf};

const NANOS_PER_SEC: u64 = 1_000_000_000;

// Offsets into the fields following the `(comm)` part of `stat`,
// which starts at field 3 (state).
const STAT_STATE: usize = 0;
const STAT_UTIME: usize = 11;
const STAT_STIME: usize = 12;
const STAT_BLKIO_TICKS: usize = 39;

#[cfg(target_os = "linux")]
fn clock_ticks_per_second() -> u64 {
    // SAFETY: sysconf has no preconditions and only reads a constant
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 {
        ticks as u64
    } else {
        100
    }
}

#[cfg(not(target_os = "linux"))]
fn clock_ticks_per_second() -> u64 {
    100
}

fn is_task_id(name: &str) -> bool {
    name.parse::<u64>().is_ok()
}

/// Fields of `/proc/<tid>/stat` used by the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatFields {
    pub state: ThreadState,
    pub utime_ticks: u64,
    pub stime_ticks: u64,
    pub blkio_ticks: u64,
}

/// Parse `/proc/<tid>/stat`. The command name may contain spaces and
/// parentheses, so fields are counted from the last `)`.
pub fn parse_stat(content: &str) -> Option<StatFields> {
    let rest = &content[content.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    let number = |idx: usize| fields.get(idx).and_then(|f| f.parse::<u64>().ok());
    Some(StatFields {
        state: ThreadState::from_char(fields.get(STAT_STATE)?.chars().next()?),
        utime_ticks: number(STAT_UTIME)?,
        stime_ticks: number(STAT_STIME)?,
        // older kernels stop before field 42
        blkio_ticks: number(STAT_BLKIO_TICKS).unwrap_or(0),
    })
}

/// Parse `(voluntary, nonvoluntary)` context switches from `/proc/<tid>/status`
pub fn parse_context_switches(content: &str) -> (u64, u64) {
    let mut voluntary = 0;
    let mut nonvoluntary = 0;
    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().parse().unwrap_or(0);
        match key {
            "voluntary_ctxt_switches" => voluntary = value,
            "nonvoluntary_ctxt_switches" => nonvoluntary = value,
            _ => {}
        }
    }
    (voluntary, nonvoluntary)
}

/// Parse `(run_ns, wait_ns)` from `/proc/<tid>/schedstat`
pub fn parse_schedstat(content: &str) -> Option<(u64, u64)> {
    let mut fields = content.split_whitespace();
    let run = fields.next()?.parse().ok()?;
    let wait = fields.next()?.parse().ok()?;
    Some((run, wait))
}

/// Thread statistics read from a procfs task directory
#[derive(Debug, Clone)]
pub struct ProcfsThreadMetrics {
    root: PathBuf,
    clock_ticks: u64,
    cpu_supported: bool,
    contention_supported: bool,
}

impl ProcfsThreadMetrics {
    /// Read threads from `root`, normally `/proc/self/task`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_clock_ticks(root, clock_ticks_per_second())
    }

    /// Like [`new`](Self::new) with an explicit clock tick rate
    pub fn with_clock_ticks(root: impl Into<PathBuf>, clock_ticks: u64) -> Self {
        let root = root.into();
        let first_task = fs::read_dir(&root).ok().and_then(|entries| {
            entries
                .flatten()
                .find(|e| e.file_name().to_str().is_some_and(is_task_id))
                .map(|e| e.path())
        });
        let cpu_supported = first_task.is_some();
        let contention_supported = first_task
            .map(|task| task.join("schedstat").is_file())
            .unwrap_or(false);

        tracing::debug!(
            "procfs thread metrics at {:?}: cpu={}, contention={}",
            root,
            cpu_supported,
            contention_supported
        );

        Self {
            root,
            clock_ticks: clock_ticks.max(1),
            cpu_supported,
            contention_supported,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ticks_to_nanos(&self, ticks: u64) -> u64 {
        ticks.saturating_mul(NANOS_PER_SEC) / self.clock_ticks
    }

    fn ticks_to_millis(&self, ticks: u64) -> f64 {
        ticks as f64 * 1000.0 / self.clock_ticks as f64
    }
}

impl Default for ProcfsThreadMetrics {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TASK_ROOT)
    }
}

impl ThreadMetrics for ProcfsThreadMetrics {
    fn cpu_time_supported(&self) -> bool {
        self.cpu_supported
    }

    fn contention_supported(&self) -> bool {
        self.contention_supported
    }

    fn thread_ids(&self) -> Vec<u64> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Cannot list threads in {:?}: {}", self.root, e);
                return Vec::new();
            }
        };
        let mut ids: Vec<u64> = entries
            .flatten()
            .filter_map(|entry| entry.file_name().to_str()?.parse().ok())
            .collect();
        ids.sort_unstable();
        ids
    }

    fn thread_info(&self, id: u64) -> Option<RawThreadInfo> {
        let dir = self.root.join(id.to_string());
        // a missing stat file means the thread has exited
        let stat = parse_stat(&fs::read_to_string(dir.join("stat")).ok()?)?;
        let name = fs::read_to_string(dir.join("comm"))
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default();
        let (voluntary, nonvoluntary) = fs::read_to_string(dir.join("status"))
            .map(|s| parse_context_switches(&s))
            .unwrap_or((0, 0));
        let run_queue_wait_ns = fs::read_to_string(dir.join("schedstat"))
            .ok()
            .and_then(|s| parse_schedstat(&s))
            .map(|(_, wait)| wait)
            .unwrap_or(0);

        Some(RawThreadInfo {
            name,
            state: stat.state,
            blocked_count: nonvoluntary,
            blocked_time_ms: run_queue_wait_ns as f64 / 1_000_000.0,
            waited_count: voluntary,
            waited_time_ms: self.ticks_to_millis(stat.blkio_ticks),
            cpu_time_ns: self.ticks_to_nanos(stat.utime_ticks + stat.stime_ticks),
            user_time_ns: self.ticks_to_nanos(stat.utime_ticks),
        })
    }
}
