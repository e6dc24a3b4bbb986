//! Component stack
//!
//! A running node is an ordered stack of named components ("protocols").
//! Each component implements [`Protocol`] and hands out a [`Capabilities`]
//! table that the probe consults instead of runtime reflection.
//!
//! # Components
//!
//! - [`Protocol`] - A named unit of node behaviour with attributes and operations
//! - [`ComponentRegistry`] - Lookup of components by instance or class name
//! - [`ProtocolStack`] - The ordered, name-unique stack used by a node
//! - [`Members`] / [`Capabilities`] - Attribute and operation tables

pub mod members;

pub use members::{
    Attribute, AttributeKind, Capabilities, Members, Operation, SetterRef, SubComponent,
};

use crate::error::{ProbeError, Result};
use std::collections::HashSet;
use std::sync::Arc;

/// A named, pluggable unit of node behaviour
///
/// Implementations guard their own mutable state; every method takes
/// `&self` and may be called from concurrent probe requests.
pub trait Protocol: Send + Sync {
    /// Instance name, unique within the stack
    fn name(&self) -> &str;

    /// Class name used by `ops=<ClassName>` and class-first operation lookup
    fn class_name(&self) -> &str {
        self.name()
    }

    /// Attributes, operations and sub-components exposed to the probe
    fn capabilities(&self) -> &Capabilities;

    /// Clear accumulated statistics
    fn reset_stats(&self) {}
}

/// Lookup of the components that make up a node
pub trait ComponentRegistry: Send + Sync {
    /// All components in stack order
    fn components(&self) -> Vec<Arc<dyn Protocol>>;

    /// Find a component by its instance name
    fn find_by_name(&self, name: &str) -> Option<Arc<dyn Protocol>> {
        self.components().into_iter().find(|p| p.name() == name)
    }

    /// Find the first component whose class name matches
    fn find_by_class(&self, class_name: &str) -> Option<Arc<dyn Protocol>> {
        self.components()
            .into_iter()
            .find(|p| p.class_name() == class_name)
    }
}

/// Ordered stack of components with unique instance names
#[derive(Clone, Default)]
pub struct ProtocolStack {
    protocols: Vec<Arc<dyn Protocol>>,
}

impl ProtocolStack {
    /// Build a stack, rejecting duplicate instance names
    pub fn new(protocols: Vec<Arc<dyn Protocol>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for protocol in &protocols {
            if !seen.insert(protocol.name().to_string()) {
                return Err(ProbeError::DuplicateComponent(protocol.name().to_string()));
            }
        }
        Ok(Self { protocols })
    }

    /// Builder-style append; fails on a duplicate name
    pub fn with(mut self, protocol: Arc<dyn Protocol>) -> Result<Self> {
        if self.protocols.iter().any(|p| p.name() == protocol.name()) {
            return Err(ProbeError::DuplicateComponent(protocol.name().to_string()));
        }
        self.protocols.push(protocol);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Protocol>> {
        self.protocols.iter()
    }
}

impl ComponentRegistry for ProtocolStack {
    fn components(&self) -> Vec<Arc<dyn Protocol>> {
        self.protocols.clone()
    }

    fn find_by_name(&self, name: &str) -> Option<Arc<dyn Protocol>> {
        self.protocols.iter().find(|p| p.name() == name).cloned()
    }

    fn find_by_class(&self, class_name: &str) -> Option<Arc<dyn Protocol>> {
        self.protocols
            .iter()
            .find(|p| p.class_name() == class_name)
            .cloned()
    }
}

impl std::fmt::Debug for ProtocolStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.protocols.iter().map(|p| p.name()))
            .finish()
    }
}
