//! # stack-probe: runtime diagnostic probe for component stacks
//!
//! A node is an ordered stack of named components ("protocols"). The probe
//! lets an operator inspect and change that stack while it runs, using short
//! textual commands batched into one request and answered with a flat,
//! key-sorted map of strings.
//!
//! ## Architecture
//!
//! - **Stack**: components register their attributes and operations in an
//!   explicit capability table ([`stack`])
//! - **Probe**: the command dispatcher, attribute access, operation
//!   invocation and the thread report ([`probe`])
//! - **Backend**: per-thread statistics from `/proc` and the handler thread
//!   serving requests over crossbeam channels ([`backend`])
//! - **Config**: TOML configuration and the runtime monitoring flags ([`config`])
//!
//! ## Example
//!
//! ```ignore
//! use stack_probe::{
//!     backend::ProcfsThreadMetrics,
//!     probe::ProbeDispatcher,
//!     protocols::Counter,
//!     stack::ProtocolStack,
//! };
//! use std::sync::Arc;
//!
//! let stack = ProtocolStack::new(vec![Arc::new(Counter::new())])?;
//! let dispatcher = ProbeDispatcher::new(Arc::new(stack), Arc::new(ProcfsThreadMetrics::default()));
//!
//! let result = dispatcher.handle(&["COUNTER.step=5", "op=Counter.increment[]", "threads=cpu=5"]);
//! assert_eq!(result["COUNTER.increment"], "5");
//! ```

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod logging;
pub mod probe;
pub mod protocols;
pub mod stack;
pub mod types;

// Re-export commonly used types
pub use backend::{ProbeBackend, ProbeClient, ProcfsThreadMetrics, ThreadMetrics};
pub use config::{MonitoringFlags, ProbeConfig};
pub use error::{ProbeError, Result};
pub use probe::ProbeDispatcher;
pub use stack::{Capabilities, ComponentRegistry, Members, Operation, Protocol, ProtocolStack};
pub use types::{Value, ValueType};
