//! Test data builders for creating test components

use stack_probe::stack::{Capabilities, Members, Protocol};
use stack_probe::types::ValueType;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

/// A component assembled from a [`ComponentBuilder`]
pub struct TestComponent {
    name: String,
    class: String,
    caps: Capabilities,
    resets: AtomicUsize,
}

impl TestComponent {
    /// How many times `reset_stats` was called
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl Protocol for TestComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn class_name(&self) -> &str {
        &self.class
    }

    fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    fn reset_stats(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// Builder for creating test components
pub struct ComponentBuilder {
    name: String,
    class: Option<String>,
    members: Members,
    subs: Vec<(String, Members)>,
}

impl ComponentBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            class: None,
            members: Members::new(),
            subs: Vec::new(),
        }
    }

    /// Class name; defaults to the instance name
    pub fn class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    /// Extend the component's own members
    pub fn members(mut self, f: impl FnOnce(Members) -> Members) -> Self {
        self.members = f(self.members);
        self
    }

    /// Add a sub-component
    pub fn sub(mut self, name: &str, members: Members) -> Self {
        self.subs.push((name.to_string(), members));
        self
    }

    pub fn build(self) -> Arc<TestComponent> {
        let mut caps = Capabilities::new(self.members);
        for (name, members) in self.subs {
            caps = caps.with_component(name, members);
        }
        Arc::new(TestComponent {
            class: self.class.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            caps,
            resets: AtomicUsize::new(0),
        })
    }
}

/// Register a writable integer field backed by `cell`
pub fn int_field(members: Members, name: &str, value_type: ValueType, cell: Arc<AtomicI64>) -> Members {
    let get = cell.clone();
    members.field(
        name,
        value_type,
        move || Some(get.load(Ordering::SeqCst).into()),
        move |v| {
            cell.store(v.as_i64()?, Ordering::SeqCst);
            Ok(())
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_builder() {
        let component = ComponentBuilder::new("udp")
            .class("UDP")
            .members(|m| int_field(m, "port", ValueType::U16, Arc::new(AtomicI64::new(7800))))
            .sub("bundler", Members::new())
            .build();

        assert_eq!(component.name(), "udp");
        assert_eq!(component.class_name(), "UDP");
        assert!(component.capabilities().members().attribute("port").is_some());
        assert!(component.capabilities().component("bundler").is_some());
    }
}
