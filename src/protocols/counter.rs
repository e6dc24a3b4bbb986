//! Counter component used by the `stack-probe` binary
//!
//! A small stateful component that exercises every kind of probe surface:
//! writable fields, a validated accessor, an enum, operations with and
//! without return values, and a `history` sub-component.

use crate::error::{ProbeError, Result};
use crate::stack::{Capabilities, Members, Operation, Protocol};
use crate::types::{Value, ValueType};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Instance name of the counter component
pub const COUNTER_NAME: &str = "COUNTER";

const DEFAULT_HISTORY: usize = 8;

/// Overflow behaviour of [`Counter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterMode {
    Saturating,
    Wrapping,
}

impl CounterMode {
    const VARIANTS: [&'static str; 2] = ["Saturating", "Wrapping"];

    fn value_type() -> ValueType {
        ValueType::enumeration("CounterMode", &Self::VARIANTS)
    }

    fn as_str(&self) -> &'static str {
        match self {
            CounterMode::Saturating => "Saturating",
            CounterMode::Wrapping => "Wrapping",
        }
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value.as_str()? {
            "Saturating" => Ok(CounterMode::Saturating),
            "Wrapping" => Ok(CounterMode::Wrapping),
            other => Err(ProbeError::Operation(format!("unknown mode {}", other))),
        }
    }
}

#[derive(Debug)]
struct History {
    capacity: usize,
    values: VecDeque<i64>,
}

#[derive(Debug)]
struct CounterState {
    count: AtomicI64,
    step: AtomicU64,
    mode: Mutex<CounterMode>,
    label: Mutex<String>,
    history: Mutex<History>,
}

impl CounterState {
    fn history(&self) -> Result<MutexGuard<'_, History>> {
        self.history
            .lock()
            .map_err(|_| ProbeError::Operation("history lock poisoned".to_string()))
    }

    fn mode(&self) -> CounterMode {
        self.mode
            .lock()
            .map(|m| *m)
            .unwrap_or(CounterMode::Saturating)
    }

    fn set_mode(&self, mode: CounterMode) -> Result<()> {
        let mut current = self
            .mode
            .lock()
            .map_err(|_| ProbeError::Operation("mode lock poisoned".to_string()))?;
        *current = mode;
        Ok(())
    }

    fn set_label(&self, label: &str) -> Result<()> {
        let mut current = self
            .label
            .lock()
            .map_err(|_| ProbeError::Operation("label lock poisoned".to_string()))?;
        *current = label.to_string();
        Ok(())
    }

    fn add(&self, delta: i64) -> Result<i64> {
        let mode = self.mode();
        let apply = |current: i64| match mode {
            CounterMode::Saturating => current.saturating_add(delta),
            CounterMode::Wrapping => current.wrapping_add(delta),
        };

        // history order must follow count order
        let mut history = self.history()?;
        let previous = match self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| Some(apply(current)))
        {
            Ok(previous) | Err(previous) => previous,
        };
        let next = apply(previous);

        history.values.push_back(next);
        while history.values.len() > history.capacity {
            history.values.pop_front();
        }
        Ok(next)
    }
}

/// Demo component with a counter, its settings and a value history
pub struct Counter {
    state: Arc<CounterState>,
    caps: Capabilities,
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter {
    pub fn new() -> Self {
        let state = Arc::new(CounterState {
            count: AtomicI64::new(0),
            step: AtomicU64::new(1),
            mode: Mutex::new(CounterMode::Saturating),
            label: Mutex::new(String::new()),
            history: Mutex::new(History {
                capacity: DEFAULT_HISTORY,
                values: VecDeque::new(),
            }),
        });
        let caps = Capabilities::new(Self::members(&state))
            .with_component("history", Self::history_members(&state));
        Self { state, caps }
    }

    /// Current counter value
    pub fn count(&self) -> i64 {
        self.state.count.load(Ordering::SeqCst)
    }

    fn members(state: &Arc<CounterState>) -> Members {
        let s = state.clone();
        let members = Members::new().field(
            "count",
            ValueType::I64,
            {
                let s = s.clone();
                move || Some(Value::from(s.count.load(Ordering::SeqCst)))
            },
            {
                let s = s.clone();
                move |v: Value| {
                    s.count.store(v.as_i64()?, Ordering::SeqCst);
                    Ok(())
                }
            },
        );

        let members = members
            .accessor(
                "step",
                ValueType::U32,
                {
                    let s = s.clone();
                    move || Some(Value::from(s.step.load(Ordering::SeqCst)))
                },
                {
                    let s = s.clone();
                    move |v: Value| {
                        let step = v.as_u64()?;
                        if step == 0 {
                            return Err(ProbeError::Operation("step must be positive".to_string()));
                        }
                        s.step.store(step, Ordering::SeqCst);
                        Ok(())
                    }
                },
            )
            .describe("Amount added by increment()")
            .field(
                "mode",
                CounterMode::value_type(),
                {
                    let s = s.clone();
                    move || Some(Value::Enum(s.mode().as_str().to_string()))
                },
                {
                    let s = s.clone();
                    move |v: Value| s.set_mode(CounterMode::from_value(&v)?)
                },
            )
            .field(
                "label",
                ValueType::String,
                {
                    let s = s.clone();
                    // empty label reads as absent
                    move || {
                        let label = s.label.lock().ok()?.clone();
                        if label.is_empty() {
                            None
                        } else {
                            Some(Value::Text(label))
                        }
                    }
                },
                {
                    let s = s.clone();
                    move |v: Value| s.set_label(v.as_str()?)
                },
            );

        members
            .operation(
                Operation::new("increment", vec![], {
                    let s = s.clone();
                    move |_: &[Value]| {
                        let step = s.step.load(Ordering::SeqCst) as i64;
                        Ok(Some(Value::from(s.add(step)?)))
                    }
                })
                .returning(ValueType::I64),
            )
            .operation(
                Operation::new("add", vec![ValueType::I64], {
                    let s = s.clone();
                    move |args: &[Value]| Ok(Some(Value::from(s.add(args[0].as_i64()?)?)))
                })
                .returning(ValueType::I64),
            )
            .operation(Operation::new("reset", vec![], move |_| {
                s.count.store(0, Ordering::SeqCst);
                Ok(None)
            }))
    }

    fn history_members(state: &Arc<CounterState>) -> Members {
        let (cap_get, cap_set) = (state.clone(), state.clone());
        let (recent, clear) = (state.clone(), state.clone());
        Members::new()
            .field(
                "capacity",
                ValueType::Usize,
                move || cap_get.history().ok().map(|h| h.capacity.into()),
                move |v| {
                    let capacity = v.as_u64()? as usize;
                    let mut history = cap_set.history()?;
                    history.capacity = capacity;
                    while history.values.len() > capacity {
                        history.values.pop_front();
                    }
                    Ok(())
                },
            )
            .read_only("recent", ValueType::list_of(ValueType::I64), move || {
                let values = recent
                    .history()
                    .ok()?
                    .values
                    .iter()
                    .map(|v| Value::from(*v))
                    .collect();
                Some(Value::List(values))
            })
            .operation(Operation::new("clear", vec![], move |_| {
                clear.history()?.values.clear();
                Ok(None)
            }))
    }
}

impl Protocol for Counter {
    fn name(&self) -> &str {
        COUNTER_NAME
    }

    fn class_name(&self) -> &str {
        "Counter"
    }

    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn reset_stats(&self) {
        self.state.count.store(0, Ordering::SeqCst);
        if let Ok(mut history) = self.state.history() {
            history.values.clear();
        }
    }
}
