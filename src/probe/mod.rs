//! Probe command dispatcher
//!
//! [`ProbeDispatcher::handle`] takes a batch of textual commands and answers
//! with one key-sorted map of results. Each command is routed by its verb:
//!
//! ```text
//! jmx[=Component[.attr1,attr2,...|attr=val,...]]
//! reset-stats
//! ops[=ClassName]
//! (op|invoke)=Component.method[arg1,arg2,...]
//! threads[=sortKey[=limit]]
//! enable-cpu | disable-cpu | enable-contention | disable-contention
//! Component.rest
//! ```
//!
//! Anything else whose first segment names a component in the stack is
//! retried as an operation (when it carries `[...]`) or as an attribute
//! query. A failing command is logged and skipped; the rest of the batch
//! still runs.
//!
//! # Example
//!
//! ```ignore
//! use stack_probe::probe::ProbeDispatcher;
//!
//! let dispatcher = ProbeDispatcher::new(Arc::new(stack), Arc::new(metrics));
//! let result = dispatcher.handle(&["jmx=UDP.port", "op=UDP.flush[]", "ops"]);
//! for (key, value) in &result {
//!     println!("{}={}", key, value);
//! }
//! ```

pub mod attributes;
pub mod operations;
pub mod stats;
pub mod threads;

pub use operations::OperationCall;
pub use stats::{shared_stats, ProbeStats, SharedStats};
pub use threads::{SortKey, ThreadQuery, ThreadSnapshot};

use crate::backend::ThreadMetrics;
use crate::config::{MonitoringFlags, MonitoringKind, ThreadReportConfig};
use crate::error::{ProbeError, Result};
use crate::stack::ComponentRegistry;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

/// Command templates advertised to probe clients
pub const SUPPORTED_KEYS: [&str; 9] = [
    "reset-stats",
    "jmx",
    "op=<operation>[<args>]",
    "ops",
    "threads[=<filter>[=<limit>]]",
    "enable-cpu",
    "enable-contention",
    "disable-cpu",
    "disable-contention",
];

/// Match `verb` or `verb=argument`
///
/// Returns `Some(None)` for the bare verb and `Some(Some(arg))` for the
/// assignment form.
fn verb_argument<'a>(token: &'a str, verb: &str) -> Option<Option<&'a str>> {
    let rest = token.strip_prefix(verb)?;
    if rest.is_empty() {
        Some(None)
    } else {
        rest.strip_prefix('=').map(Some)
    }
}

/// Routes probe commands to attribute, operation and thread handlers
pub struct ProbeDispatcher {
    registry: Arc<dyn ComponentRegistry>,
    metrics: Arc<dyn ThreadMetrics>,
    flags: Arc<MonitoringFlags>,
    report: ThreadReportConfig,
    stats: SharedStats,
}

impl ProbeDispatcher {
    /// Create a dispatcher with default monitoring flags and report layout
    pub fn new(registry: Arc<dyn ComponentRegistry>, metrics: Arc<dyn ThreadMetrics>) -> Self {
        Self {
            registry,
            metrics,
            flags: Arc::new(MonitoringFlags::default()),
            report: ThreadReportConfig::default(),
            stats: shared_stats(),
        }
    }

    /// Share a monitoring cell with other samplers
    pub fn with_flags(mut self, flags: Arc<MonitoringFlags>) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_report_config(mut self, report: ThreadReportConfig) -> Self {
        self.report = report;
        self
    }

    /// Record statistics into an existing cell, e.g. one read by `DIAG`
    pub fn with_stats(mut self, stats: SharedStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn registry(&self) -> &Arc<dyn ComponentRegistry> {
        &self.registry
    }

    pub fn flags(&self) -> &Arc<MonitoringFlags> {
        &self.flags
    }

    /// Snapshot of the dispatcher's own counters
    pub fn stats(&self) -> ProbeStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Command templates this dispatcher understands
    pub fn supported_keys(&self) -> &'static [&'static str] {
        &SUPPORTED_KEYS
    }

    /// Run a batch of commands in order and collect their results
    ///
    /// Never fails: a command that errors is logged, counted and skipped.
    pub fn handle<S: AsRef<str>>(&self, commands: &[S]) -> BTreeMap<String, String> {
        let start = Instant::now();
        let mut map = BTreeMap::new();
        let mut handled = 0;
        let mut failed = 0;

        for command in commands {
            let token = command.as_ref();
            tracing::debug!("Probe command: {}", token);
            match self.dispatch(token, &mut map) {
                Ok(()) => handled += 1,
                Err(e) => {
                    failed += 1;
                    match e {
                        ProbeError::ComponentNotFound(_) => {
                            tracing::warn!("{}: {}", token, e)
                        }
                        _ => tracing::error!("{}: {}", token, e),
                    }
                }
            }
        }

        let elapsed_us = start.elapsed().as_micros() as u64;
        if let Ok(mut stats) = self.stats.lock() {
            stats.record_request(elapsed_us, handled, failed);
        }
        map
    }

    fn dispatch(&self, token: &str, map: &mut BTreeMap<String, String>) -> Result<()> {
        let registry = self.registry.as_ref();

        if let Some(argument) = verb_argument(token, "jmx") {
            return match argument {
                None => {
                    attributes::dump_all(registry, map);
                    Ok(())
                }
                Some(argument) => attributes::handle(registry, argument, map),
            };
        }

        if token == "reset-stats" {
            for component in registry.components() {
                component.reset_stats();
            }
            return Ok(());
        }

        if let Some(argument) = verb_argument(token, "ops") {
            let listing = match argument {
                None => operations::list_all(registry),
                Some(class_name) => operations::list_class(registry, class_name.trim())?,
            };
            map.insert("ops".to_string(), listing);
            return Ok(());
        }

        if let Some(argument) =
            verb_argument(token, "op").or_else(|| verb_argument(token, "invoke"))
        {
            let call = argument.ok_or_else(|| ProbeError::malformed(token, "missing operation"))?;
            if let Some((key, value)) = operations::invoke(registry, call)? {
                map.insert(key, value);
            }
            return Ok(());
        }

        if let Some(argument) = verb_argument(token, "threads") {
            let query = ThreadQuery::parse(argument)?;
            let table = threads::report(
                self.metrics.as_ref(),
                &self.flags,
                query,
                self.report.max_name_width,
                self.report.default_limit,
            );
            map.insert(token.to_string(), table);
            return Ok(());
        }

        if let Some((kind, enabled)) = toggle_command(token) {
            map.insert(token.to_string(), self.toggle(kind, enabled));
            return Ok(());
        }

        self.dispatch_component(token, map)
    }

    /// `Component.rest` without a verb
    fn dispatch_component(&self, token: &str, map: &mut BTreeMap<String, String>) -> Result<()> {
        let (name, rest) = token.split_once('.').unwrap_or((token, ""));
        if self.registry.find_by_name(name).is_none() {
            tracing::debug!("Ignoring unknown probe command {}", token);
            return Ok(());
        }

        let is_operation = rest
            .find('[')
            .is_some_and(|left| rest[left..].contains(']'));
        if is_operation {
            self.dispatch(&format!("op={}", token), map)
        } else {
            self.dispatch(&format!("jmx={}", token), map)
        }
    }

    /// Switch CPU or contention monitoring and describe the outcome
    ///
    /// The flag only changes when the platform supports the capability.
    pub fn toggle(&self, kind: MonitoringKind, enabled: bool) -> String {
        let supported = match kind {
            MonitoringKind::Cpu => self.metrics.cpu_time_supported(),
            MonitoringKind::Contention => self.metrics.contention_supported(),
        };
        if supported {
            self.flags.set_enabled(kind, enabled);
        } else {
            tracing::warn!(
                "{}",
                ProbeError::UnsupportedPlatformCapability(format!("{} monitoring", kind))
            );
        }
        format!(
            "{kind} monitoring supported: {supported}, {kind} monitoring enabled: {}",
            supported && self.flags.is_enabled(kind)
        )
    }
}

fn toggle_command(token: &str) -> Option<(MonitoringKind, bool)> {
    match token {
        "enable-cpu" => Some((MonitoringKind::Cpu, true)),
        "disable-cpu" => Some((MonitoringKind::Cpu, false)),
        t if t.starts_with("enable-cont") => Some((MonitoringKind::Contention, true)),
        t if t.starts_with("disable-cont") => Some((MonitoringKind::Contention, false)),
        _ => None,
    }
}

impl std::fmt::Debug for ProbeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeDispatcher")
            .field("components", &self.registry.components().len())
            .field("flags", &self.flags)
            .field("report", &self.report)
            .finish()
    }
}
