//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod metrics;

use builders::{int_field, ComponentBuilder, TestComponent};
use stack_probe::backend::{StaticThreadMetrics, ThreadMetrics};
use stack_probe::probe::ProbeDispatcher;
use stack_probe::stack::{Operation, Protocol, ProtocolStack};
use stack_probe::types::ValueType;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_millis(500)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Component `A` with field `x: i32 = 5` and `double() -> i32`
pub fn component_a() -> (Arc<TestComponent>, Arc<AtomicI64>) {
    let x = Arc::new(AtomicI64::new(5));
    let double = x.clone();
    let component = ComponentBuilder::new("A")
        .members(|m| {
            int_field(m, "x", ValueType::I32, x.clone()).operation(
                Operation::new("double", vec![], move |_| {
                    Ok(Some((double.load(Ordering::SeqCst) * 2).into()))
                })
                .returning(ValueType::I32),
            )
        })
        .build();
    (component, x)
}

/// The two-component stack `[A, B]`
pub fn example_stack() -> (ProtocolStack, Arc<TestComponent>, Arc<TestComponent>) {
    let (a, _) = component_a();
    let b = ComponentBuilder::new("B").build();
    let components: Vec<Arc<dyn Protocol>> = vec![a.clone(), b.clone()];
    (ProtocolStack::new(components).unwrap(), a, b)
}

/// Dispatcher over `stack` with an empty static thread table
pub fn dispatcher_for(stack: ProtocolStack) -> ProbeDispatcher {
    dispatcher_with(stack, StaticThreadMetrics::default())
}

pub fn dispatcher_with(stack: ProtocolStack, metrics: impl ThreadMetrics + 'static) -> ProbeDispatcher {
    ProbeDispatcher::new(Arc::new(stack), Arc::new(metrics))
}
