//! Built-in components
//!
//! - [`Diagnostics`] (`DIAG`) - the probe's own request and command counters
//! - [`Counter`] (`COUNTER`) - a small stateful component for trying out the probe

pub mod counter;
pub mod diag;

pub use counter::{Counter, CounterMode, COUNTER_NAME};
pub use diag::{Diagnostics, DIAG_CLASS, DIAG_NAME};
