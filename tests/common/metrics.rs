//! Thread table fixtures

use stack_probe::backend::{RawThreadInfo, StaticThreadMetrics, ThreadState};

/// Build one thread entry with CPU time in milliseconds
pub fn thread(name: &str, state: ThreadState, cpu_ms: u64, user_ms: u64) -> RawThreadInfo {
    let mut info = RawThreadInfo::new(name, state);
    info.cpu_time_ns = cpu_ms * 1_000_000;
    info.user_time_ns = user_ms * 1_000_000;
    info
}

/// Five threads with distinct names, states and CPU times
pub fn sample_threads() -> StaticThreadMetrics {
    let mut gc = thread("gc", ThreadState::Sleeping, 2_500, 2_000);
    gc.blocked_count = 40;
    gc.blocked_time_ms = 120.0;
    gc.waited_count = 7;
    gc.waited_time_ms = 3.0;

    let mut io = thread("io-reader", ThreadState::DiskSleep, 800, 100);
    io.waited_count = 900;
    io.waited_time_ms = 15_000.0;

    StaticThreadMetrics::default()
        .with_thread(thread("main", ThreadState::Running, 12_345, 10_000))
        .with_thread(gc)
        .with_thread(thread("timer", ThreadState::Sleeping, 10, 5))
        .with_thread(io)
        .with_thread(thread("probe-handler", ThreadState::Running, 1, 1))
}
