//! Attribute dump, read and write (`jmx`)
//!
//! Result keys are `<component>.<attribute>` for a component's own
//! attributes and `<component>.<sub>.<attribute>` for attributes of a
//! sub-component.

use crate::convert::convert;
use crate::error::{ProbeError, Result};
use crate::stack::{ComponentRegistry, Members, Protocol};
use std::collections::BTreeMap;

/// Dump every attribute of every component
pub fn dump_all(registry: &dyn ComponentRegistry, out: &mut BTreeMap<String, String>) {
    for component in registry.components() {
        dump_component(component.as_ref(), out);
    }
}

/// Dump every attribute of one component and its sub-components
pub fn dump_component(component: &dyn Protocol, out: &mut BTreeMap<String, String>) {
    let caps = component.capabilities();
    dump_members(caps.members(), component.name(), out);
    for sub in caps.components() {
        let prefix = format!("{}.{}", component.name(), sub.name());
        dump_members(sub.members(), &prefix, out);
    }
}

fn dump_members(members: &Members, prefix: &str, out: &mut BTreeMap<String, String>) {
    for attr in members.attributes() {
        if let Some(value) = attr.get() {
            out.insert(format!("{}.{}", prefix, attr.name()), value.to_string());
        }
    }
}

/// Read the named attributes; `sub.attr` names reach into a sub-component.
/// Unknown names and absent values produce no entry.
pub fn read_attributes(
    component: &dyn Protocol,
    names: &[&str],
    out: &mut BTreeMap<String, String>,
) {
    let caps = component.capabilities();
    for name in names {
        let attr = caps.members().attribute(name).or_else(|| {
            caps.split_prefixed(name)
                .and_then(|(sub, rest)| sub.members().attribute(rest))
        });
        match attr.and_then(|a| a.get()) {
            Some(value) => {
                out.insert(format!("{}.{}", component.name(), name), value.to_string());
            }
            None => tracing::debug!("{}: no value for attribute {}", component.name(), name),
        }
    }
}

/// Try the field, then the setter of `name` on one member table
fn try_write(members: &Members, name: &str, raw: &str, failures: &mut Vec<String>) -> bool {
    if let Some(field) = members.find_field(name) {
        match convert(raw, field.value_type()).and_then(|v| field.set(v)) {
            Ok(true) => return true,
            Ok(false) => failures.push(format!("field {} is read-only", name)),
            Err(e) => failures.push(e.to_string()),
        }
    }
    if let Some(setter) = members.find_setter(name) {
        match convert(raw, setter.value_type()).and_then(|v| setter.apply(v)) {
            Ok(()) => return true,
            Err(e) => failures.push(e.to_string()),
        }
    }
    false
}

/// Write `raw` to attribute `name` of `component`
///
/// Resolution order: field, setter, then the same two on the sub-component
/// named by a `sub.` prefix.
pub fn write_attribute(component: &dyn Protocol, name: &str, raw: &str) -> Result<()> {
    let caps = component.capabilities();
    let mut failures = Vec::new();

    if try_write(caps.members(), name, raw, &mut failures) {
        return Ok(());
    }
    if let Some((sub, rest)) = caps.split_prefixed(name) {
        if try_write(sub.members(), rest, raw, &mut failures) {
            return Ok(());
        }
    }

    Err(ProbeError::AttributeNotWritable {
        name: name.to_string(),
        value: raw.to_string(),
        reason: if failures.is_empty() {
            "field or setter not found".to_string()
        } else {
            failures.join(" ")
        },
    })
}

/// Handle the argument of `jmx=`: `C`, or `C.a1,a2,name=value,...`
///
/// Writes are applied before reads. A failed write is logged and does not
/// stop the reads.
pub fn handle(
    registry: &dyn ComponentRegistry,
    argument: &str,
    out: &mut BTreeMap<String, String>,
) -> Result<()> {
    let (name, list) = match argument.split_once('.') {
        Some((name, list)) => (name, Some(list)),
        None => (argument, None),
    };
    let component = registry
        .find_by_name(name)
        .ok_or_else(|| ProbeError::ComponentNotFound(name.to_string()))?;

    let Some(list) = list else {
        dump_component(component.as_ref(), out);
        return Ok(());
    };

    let mut reads = Vec::new();
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match item.split_once('=') {
            Some((attr, value)) => {
                if let Err(e) = write_attribute(component.as_ref(), attr.trim(), value) {
                    tracing::error!("{}: failed writing: {}", component.name(), e);
                } else {
                    tracing::debug!("{}: set {} to {}", component.name(), attr.trim(), value);
                }
            }
            None => reads.push(item),
        }
    }

    if !reads.is_empty() {
        read_attributes(component.as_ref(), &reads, out);
    }
    Ok(())
}
