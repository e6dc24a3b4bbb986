//! Thread snapshot report (`threads[=<sortKey>[=<limit>]]`)
//!
//! Samples every live thread through a [`ThreadMetrics`] source, sorts and
//! truncates the entries, and renders them as a fixed-width table:
//!
//! ```text
//! [state]   	thread-name  :   cpu (ms)  user (ms)  block btime (ms)       wait wtime (ms)
//! [RUNNING]	main         :      120      100          3         1         12          0
//! ```
//!
//! Times are shown in whole milliseconds with `,` thousands grouping. A time
//! whose monitoring is disabled or unsupported is shown as `-1`.

use crate::backend::{ThreadMetrics, ThreadState};
use crate::config::{MonitoringFlags, MonitoringKind};
use crate::error::{ProbeError, Result};
use std::cmp::Ordering;

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Immutable per-thread record captured at sampling time
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadSnapshot {
    pub id: u64,
    pub name: String,
    pub state: ThreadState,
    pub blocks: u64,
    /// Blocked time in ms, `-1` when contention monitoring is off
    pub block_time_ms: f64,
    pub waits: u64,
    /// Waited time in ms, `-1` when contention monitoring is off
    pub wait_time_ms: f64,
    /// CPU time in ms, `-1` when CPU-time monitoring is off
    pub cpu_time_ms: f64,
    /// User time in ms, `-1` when CPU-time monitoring is off
    pub user_time_ms: f64,
}

/// Row ordering of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Ascending by thread name
    #[default]
    Name,
    /// Ascending by state name
    State,
    /// Descending by CPU time
    Cpu,
    /// Descending by user time
    User,
    /// Descending by blocked count
    Blocks,
    /// Descending by blocked time
    BlockTime,
    /// Descending by waited count
    Waits,
    /// Descending by waited time
    WaitTime,
}

impl SortKey {
    /// Prefix match; anything unrecognised sorts by name
    pub fn parse(text: &str) -> Self {
        const KEYS: [(&str, SortKey); 7] = [
            ("state", SortKey::State),
            ("cpu", SortKey::Cpu),
            ("user", SortKey::User),
            ("block", SortKey::Blocks),
            ("btime", SortKey::BlockTime),
            ("wait", SortKey::Waits),
            ("wtime", SortKey::WaitTime),
        ];
        KEYS.iter()
            .find(|(prefix, _)| text.starts_with(prefix))
            .map(|(_, key)| *key)
            .unwrap_or_default()
    }

    fn compare(&self, a: &ThreadSnapshot, b: &ThreadSnapshot) -> Ordering {
        match self {
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::State => a.state.as_str().cmp(b.state.as_str()),
            SortKey::Cpu => b.cpu_time_ms.total_cmp(&a.cpu_time_ms),
            SortKey::User => b.user_time_ms.total_cmp(&a.user_time_ms),
            SortKey::Blocks => b.blocks.cmp(&a.blocks),
            SortKey::BlockTime => b.block_time_ms.total_cmp(&a.block_time_ms),
            SortKey::Waits => b.waits.cmp(&a.waits),
            SortKey::WaitTime => b.wait_time_ms.total_cmp(&a.wait_time_ms),
        }
    }
}

/// Parsed arguments of a `threads` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThreadQuery {
    pub sort: SortKey,
    /// Row limit; `None` when the command gives none
    pub limit: Option<i64>,
}

impl ThreadQuery {
    /// Parse the part after `threads=`, e.g. `cpu=10`
    pub fn parse(argument: Option<&str>) -> Result<Self> {
        let Some(argument) = argument else {
            return Ok(Self::default());
        };
        let (sort, limit) = match argument.split_once('=') {
            Some((sort, limit)) => (sort, Some(limit)),
            None => (argument, None),
        };
        let limit = limit
            .map(|raw| {
                raw.trim().parse::<i64>().map_err(|e| {
                    ProbeError::malformed(
                        format!("threads={}", argument),
                        format!("invalid limit {:?}: {}", raw, e),
                    )
                })
            })
            .transpose()?;
        Ok(Self {
            sort: SortKey::parse(sort),
            limit,
        })
    }
}

/// Sample all live threads
///
/// Threads that exit between enumeration and inspection are skipped.
pub fn snapshot(metrics: &dyn ThreadMetrics, flags: &MonitoringFlags) -> Vec<ThreadSnapshot> {
    let cpu = metrics.cpu_time_supported() && flags.is_enabled(MonitoringKind::Cpu);
    let contention =
        metrics.contention_supported() && flags.is_enabled(MonitoringKind::Contention);

    metrics
        .thread_ids()
        .into_iter()
        .filter_map(|id| {
            let info = metrics.thread_info(id)?;
            Some(ThreadSnapshot {
                id,
                name: info.name,
                state: info.state,
                blocks: info.blocked_count,
                block_time_ms: if contention { info.blocked_time_ms } else { -1.0 },
                waits: info.waited_count,
                wait_time_ms: if contention { info.waited_time_ms } else { -1.0 },
                cpu_time_ms: if cpu {
                    info.cpu_time_ns as f64 / NANOS_PER_MILLI
                } else {
                    -1.0
                },
                user_time_ms: if cpu {
                    info.user_time_ns as f64 / NANOS_PER_MILLI
                } else {
                    -1.0
                },
            })
        })
        .collect()
}

/// Width of the name column: longest name capped at `cap`, plus one
pub fn name_column_width(entries: &[ThreadSnapshot], cap: usize) -> usize {
    let longest = entries
        .iter()
        .map(|e| e.name.chars().count())
        .max()
        .unwrap_or(0);
    longest.min(cap) + 1
}

/// Format an integer with `,` thousands separators
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn millis(value: f64) -> String {
    group_thousands(value.round() as i64)
}

/// Render the table header followed by one row per entry
pub fn render(entries: &[ThreadSnapshot], name_width: usize) -> String {
    let mut out = format!(
        "\n[{}]   \t{:<w$}: {:>10} {:>10} {:>6} {:>9} {:>10} {:>10}\n",
        "state",
        "thread-name",
        "cpu (ms)",
        "user (ms)",
        "block",
        "btime (ms)",
        "wait",
        "wtime (ms)",
        w = name_width
    );
    for e in entries {
        out.push_str(&format!(
            "[{}]\t{:<w$}: {:>8} {:>8} {:>10} {:>9} {:>10} {:>10}\n",
            e.state,
            e.name,
            millis(e.cpu_time_ms),
            millis(e.user_time_ms),
            group_thousands(e.blocks as i64),
            millis(e.block_time_ms),
            group_thousands(e.waits as i64),
            millis(e.wait_time_ms),
            w = name_width
        ));
    }
    out
}

/// Snapshot, sort, truncate and render in one step
///
/// `default_limit` applies when the query has no limit of its own; a limit
/// of zero or less keeps every row.
pub fn report(
    metrics: &dyn ThreadMetrics,
    flags: &MonitoringFlags,
    query: ThreadQuery,
    max_name_width: usize,
    default_limit: usize,
) -> String {
    let mut entries = snapshot(metrics, flags);
    // width covers every thread, not just the rows shown
    let width = name_column_width(&entries, max_name_width);
    entries.sort_by(|a, b| query.sort.compare(a, b));

    let limit = query.limit.unwrap_or(default_limit as i64);
    if limit > 0 {
        entries.truncate(limit as usize);
    }
    render(&entries, width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::metrics_trait::{MockThreadMetrics, RawThreadInfo};

    fn info(name: &str, state: ThreadState, cpu_ms: u64, blocks: u64) -> RawThreadInfo {
        let mut info = RawThreadInfo::new(name, state);
        info.cpu_time_ns = cpu_ms * 1_000_000;
        info.user_time_ns = cpu_ms * 500_000;
        info.blocked_count = blocks;
        info.blocked_time_ms = blocks as f64 * 1.5;
        info
    }

    fn mock_with(threads: Vec<RawThreadInfo>, cpu: bool, contention: bool) -> MockThreadMetrics {
        let mut mock = MockThreadMetrics::new();
        let count = threads.len() as u64;
        mock.expect_cpu_time_supported().return_const(cpu);
        mock.expect_contention_supported().return_const(contention);
        mock.expect_thread_ids()
            .returning(move || (1..=count).collect());
        mock.expect_thread_info()
            .returning(move |id| threads.get(id as usize - 1).cloned());
        mock
    }

    fn data_rows(table: &str) -> Vec<&str> {
        table.lines().skip(2).collect()
    }

    #[test]
    fn test_sort_key_prefixes() {
        assert_eq!(SortKey::parse("state"), SortKey::State);
        assert_eq!(SortKey::parse("cpu"), SortKey::Cpu);
        assert_eq!(SortKey::parse("userx"), SortKey::User);
        assert_eq!(SortKey::parse("blocks"), SortKey::Blocks);
        assert_eq!(SortKey::parse("btime"), SortKey::BlockTime);
        assert_eq!(SortKey::parse("waits"), SortKey::Waits);
        assert_eq!(SortKey::parse("wtime"), SortKey::WaitTime);
        assert_eq!(SortKey::parse("bogus"), SortKey::Name);
        assert_eq!(SortKey::parse(""), SortKey::Name);
    }

    #[test]
    fn test_query_parse() {
        assert_eq!(ThreadQuery::parse(None).unwrap(), ThreadQuery::default());
        let q = ThreadQuery::parse(Some("cpu=2")).unwrap();
        assert_eq!(q.sort, SortKey::Cpu);
        assert_eq!(q.limit, Some(2));
        assert_eq!(ThreadQuery::parse(Some("wait")).unwrap().limit, None);
        assert!(matches!(
            ThreadQuery::parse(Some("cpu=many")),
            Err(ProbeError::MalformedCommand { .. })
        ));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(group_thousands(-1), "-1");
        assert_eq!(group_thousands(-12345), "-12,345");
    }

    #[test]
    fn test_default_sort_is_by_name() {
        let mock = mock_with(
            vec![
                info("worker-2", ThreadState::Sleeping, 5, 0),
                info("main", ThreadState::Running, 50, 0),
                info("gc", ThreadState::Sleeping, 7, 0),
            ],
            true,
            true,
        );
        let flags = MonitoringFlags::new(true, true);
        let table = report(&mock, &flags, ThreadQuery::default(), 50, 0);
        let rows = data_rows(&table);
        assert_eq!(rows.len(), 3);
        assert!(rows[0].contains("gc"));
        assert!(rows[1].contains("main"));
        assert!(rows[2].contains("worker-2"));
    }

    #[test]
    fn test_cpu_sort_and_limit() {
        let mock = mock_with(
            vec![
                info("a", ThreadState::Sleeping, 5, 0),
                info("b", ThreadState::Running, 1500, 0),
                info("c", ThreadState::Sleeping, 70, 0),
            ],
            true,
            false,
        );
        let flags = MonitoringFlags::new(true, false);
        let query = ThreadQuery::parse(Some("cpu=2")).unwrap();
        let table = report(&mock, &flags, query, 50, 0);
        let rows = data_rows(&table);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], "[RUNNING]\tb :    1,500      750          0        -1          0         -1");
        assert!(rows[1].starts_with("[SLEEPING]\tc :"));
    }

    #[test]
    fn test_disabled_cpu_renders_minus_one() {
        let mock = mock_with(vec![info("main", ThreadState::Running, 42, 3)], true, true);
        let flags = MonitoringFlags::new(false, true);
        let entries = snapshot(&mock, &flags);
        assert_eq!(entries[0].cpu_time_ms, -1.0);
        assert_eq!(entries[0].user_time_ms, -1.0);
        assert_eq!(entries[0].block_time_ms, 4.5);
    }

    #[test]
    fn test_unsupported_contention_ignores_flag() {
        let mock = mock_with(vec![info("main", ThreadState::Running, 1, 2)], true, false);
        let flags = MonitoringFlags::new(true, true);
        let entries = snapshot(&mock, &flags);
        assert_eq!(entries[0].block_time_ms, -1.0);
        assert_eq!(entries[0].wait_time_ms, -1.0);
        assert_eq!(entries[0].blocks, 2);
    }

    #[test]
    fn test_vanished_threads_are_skipped() {
        let mut mock = MockThreadMetrics::new();
        mock.expect_cpu_time_supported().return_const(true);
        mock.expect_contention_supported().return_const(true);
        mock.expect_thread_ids().returning(|| vec![1, 2]);
        mock.expect_thread_info().returning(|id| {
            (id == 1).then(|| RawThreadInfo::new("alive", ThreadState::Running))
        });
        let entries = snapshot(&mock, &MonitoringFlags::default());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "alive");
    }

    #[test]
    fn test_name_width_is_capped() {
        let long = "x".repeat(80);
        let entries = vec![ThreadSnapshot {
            id: 1,
            name: long,
            state: ThreadState::Running,
            blocks: 0,
            block_time_ms: 0.0,
            waits: 0,
            wait_time_ms: 0.0,
            cpu_time_ms: 0.0,
            user_time_ms: 0.0,
        }];
        assert_eq!(name_column_width(&entries, 50), 51);
        assert_eq!(name_column_width(&[], 50), 1);
    }

    #[test]
    fn test_header_layout() {
        let header = render(&[], 12);
        assert_eq!(
            header,
            "\n[state]   \tthread-name :   cpu (ms)  user (ms)  block btime (ms)       wait wtime (ms)\n"
        );
    }

    #[test]
    fn test_default_limit_applies_without_explicit_limit() {
        let mock = mock_with(
            vec![
                info("a", ThreadState::Running, 1, 0),
                info("b", ThreadState::Running, 1, 0),
                info("c", ThreadState::Running, 1, 0),
            ],
            true,
            true,
        );
        let flags = MonitoringFlags::default();
        let table = report(&mock, &flags, ThreadQuery::default(), 50, 2);
        assert_eq!(data_rows(&table).len(), 2);

        let query = ThreadQuery::parse(Some("name=0")).unwrap();
        let table = report(&mock, &flags, query, 50, 2);
        assert_eq!(data_rows(&table).len(), 3);
    }
}
