//! Attribute and operation tables
//!
//! A component registers its probe-visible surface once, at construction
//! time, by filling a [`Members`] table with attributes (name, type, getter,
//! optional setter) and operations (name, parameter types, invoke closure).
//! Closures capture whatever shared state the component uses, so the table
//! can be consulted through `&self` from any thread.
//!
//! [`Capabilities`] adds one level of named sub-components. Sub-components
//! hold plain [`Members`], so nesting never goes deeper than two levels.

use crate::error::Result;
use crate::types::{Value, ValueType};

type Getter = Box<dyn Fn() -> Option<Value> + Send + Sync>;
type Setter = Box<dyn Fn(Value) -> Result<()> + Send + Sync>;
type Invoker = Box<dyn Fn(&[Value]) -> Result<Option<Value>> + Send + Sync>;

/// How an attribute is backed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Directly addressable state
    Field,
    /// Getter/setter pair computed by the component
    Accessor,
}

/// A named, typed property of a component
pub struct Attribute {
    name: String,
    value_type: ValueType,
    kind: AttributeKind,
    description: Option<String>,
    getter: Getter,
    setter: Option<Setter>,
}

impl Attribute {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Current value; `None` when the component has nothing to report
    pub fn get(&self) -> Option<Value> {
        (self.getter)()
    }

    /// Store an already converted value. Returns `Ok(false)` for read-only
    /// attributes.
    pub fn set(&self, value: Value) -> Result<bool> {
        match &self.setter {
            Some(setter) => setter(value).map(|_| true),
            None => Ok(false),
        }
    }
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("kind", &self.kind)
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// An explicitly exposed, invokable action of a component
pub struct Operation {
    name: String,
    params: Vec<ValueType>,
    returns: Option<ValueType>,
    description: Option<String>,
    invoker: Invoker,
}

impl Operation {
    /// Create an operation; `invoker` receives arguments already converted
    /// to `params`, in declaration order
    pub fn new<F>(name: impl Into<String>, params: Vec<ValueType>, invoker: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            params,
            returns: None,
            description: None,
            invoker: Box::new(invoker),
        }
    }

    /// Declare the return type (informational)
    pub fn returning(mut self, value_type: ValueType) -> Self {
        self.returns = Some(value_type);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    pub fn returns(&self) -> Option<&ValueType> {
        self.returns.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// `name(type1,type2)` as shown by the `ops` listing
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(|p| p.to_string()).collect();
        format!("{}({})", self.name, params.join(","))
    }

    pub fn invoke(&self, args: &[Value]) -> Result<Option<Value>> {
        (self.invoker)(args)
    }
}

impl std::fmt::Debug for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation")
            .field("signature", &self.signature())
            .field("returns", &self.returns)
            .finish()
    }
}

/// A setter found for an attribute name
pub enum SetterRef<'a> {
    Attribute(&'a Attribute),
    /// One-parameter operation such as `set_x`
    Operation(&'a Operation),
}

impl SetterRef<'_> {
    pub fn value_type(&self) -> &ValueType {
        match self {
            SetterRef::Attribute(attr) => attr.value_type(),
            SetterRef::Operation(op) => &op.params()[0],
        }
    }

    pub fn apply(&self, value: Value) -> Result<()> {
        match self {
            SetterRef::Attribute(attr) => attr.set(value).map(|_| ()),
            SetterRef::Operation(op) => op.invoke(&[value]).map(|_| ()),
        }
    }
}

/// Attributes and operations of one component or sub-component
#[derive(Debug, Default)]
pub struct Members {
    attributes: Vec<Attribute>,
    operations: Vec<Operation>,
}

impl Members {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_attribute(&mut self, attr: Attribute) {
        // later registrations replace earlier ones with the same name
        self.attributes.retain(|a| a.name != attr.name);
        self.attributes.push(attr);
    }

    /// Register a writable field
    pub fn field<G, S>(mut self, name: impl Into<String>, value_type: ValueType, get: G, set: S) -> Self
    where
        G: Fn() -> Option<Value> + Send + Sync + 'static,
        S: Fn(Value) -> Result<()> + Send + Sync + 'static,
    {
        self.push_attribute(Attribute {
            name: name.into(),
            value_type,
            kind: AttributeKind::Field,
            description: None,
            getter: Box::new(get),
            setter: Some(Box::new(set)),
        });
        self
    }

    /// Register a read-only field
    pub fn read_only<G>(mut self, name: impl Into<String>, value_type: ValueType, get: G) -> Self
    where
        G: Fn() -> Option<Value> + Send + Sync + 'static,
    {
        self.push_attribute(Attribute {
            name: name.into(),
            value_type,
            kind: AttributeKind::Field,
            description: None,
            getter: Box::new(get),
            setter: None,
        });
        self
    }

    /// Register a getter/setter pair
    pub fn accessor<G, S>(
        mut self,
        name: impl Into<String>,
        value_type: ValueType,
        get: G,
        set: S,
    ) -> Self
    where
        G: Fn() -> Option<Value> + Send + Sync + 'static,
        S: Fn(Value) -> Result<()> + Send + Sync + 'static,
    {
        self.push_attribute(Attribute {
            name: name.into(),
            value_type,
            kind: AttributeKind::Accessor,
            description: None,
            getter: Box::new(get),
            setter: Some(Box::new(set)),
        });
        self
    }

    /// Attach a description to the most recently registered attribute
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        if let Some(last) = self.attributes.last_mut() {
            last.description = Some(description.into());
        }
        self
    }

    pub fn operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// The directly addressable field called `name`
    pub fn find_field(&self, name: &str) -> Option<&Attribute> {
        self.attribute(name).filter(|a| a.kind == AttributeKind::Field)
    }

    /// A setter for attribute `name`: an accessor named `name`, or a
    /// one-parameter operation named `name`, `set_name` or `setName`
    pub fn find_setter(&self, name: &str) -> Option<SetterRef<'_>> {
        if let Some(attr) = self
            .attribute(name)
            .filter(|a| a.kind == AttributeKind::Accessor && a.is_writable())
        {
            return Some(SetterRef::Attribute(attr));
        }
        let snake = format!("set_{}", name);
        let camel = setter_camel_case(name);
        [name, snake.as_str(), camel.as_str()]
            .iter()
            .find_map(|candidate| self.find_operation(candidate, 1))
            .map(SetterRef::Operation)
    }

    /// Operation called `name` taking exactly `arity` parameters
    pub fn find_operation(&self, name: &str, arity: usize) -> Option<&Operation> {
        self.operations
            .iter()
            .find(|op| op.name == name && op.arity() == arity)
    }
}

fn setter_camel_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
        None => "set".to_string(),
    }
}

/// A named nested component
#[derive(Debug)]
pub struct SubComponent {
    name: String,
    members: Members,
}

impl SubComponent {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &Members {
        &self.members
    }
}

/// Everything a component exposes to the probe
#[derive(Debug, Default)]
pub struct Capabilities {
    members: Members,
    components: Vec<SubComponent>,
}

impl Capabilities {
    pub fn new(members: Members) -> Self {
        Self {
            members,
            components: Vec::new(),
        }
    }

    /// Add a named sub-component; a later one with the same name replaces
    /// the earlier one
    pub fn with_component(mut self, name: impl Into<String>, members: Members) -> Self {
        let name = name.into();
        self.components.retain(|c| c.name != name);
        self.components.push(SubComponent { name, members });
        self
    }

    pub fn members(&self) -> &Members {
        &self.members
    }

    pub fn components(&self) -> &[SubComponent] {
        &self.components
    }

    pub fn component(&self, name: &str) -> Option<&SubComponent> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Split `sub.member` into the sub-component and the unprefixed member
    /// name, if `sub` is one of ours
    pub fn split_prefixed<'a>(&self, name: &'a str) -> Option<(&SubComponent, &'a str)> {
        self.components.iter().find_map(|c| {
            name.strip_prefix(c.name.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .map(|rest| (c, rest))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    fn counter_members(counter: Arc<AtomicI64>) -> Members {
        let get = counter.clone();
        let set = counter.clone();
        let double = counter.clone();
        Members::new()
            .field(
                "count",
                ValueType::I64,
                move || Some(get.load(Ordering::SeqCst).into()),
                move |v| {
                    set.store(v.as_i64()?, Ordering::SeqCst);
                    Ok(())
                },
            )
            .describe("number of things counted")
            .operation(
                Operation::new("double", vec![], move |_| {
                    Ok(Some((double.load(Ordering::SeqCst) * 2).into()))
                })
                .returning(ValueType::I64),
            )
    }

    #[test]
    fn test_field_round_trip() {
        let counter = Arc::new(AtomicI64::new(3));
        let members = counter_members(counter.clone());
        let field = members.find_field("count").unwrap();
        assert_eq!(field.description(), Some("number of things counted"));
        assert!(field.set(Value::Signed(9)).unwrap());
        assert_eq!(field.get(), Some(Value::Signed(9)));
        assert_eq!(counter.load(Ordering::SeqCst), 9);
    }

    #[test]
    fn test_read_only_field_rejects_set() {
        let members = Members::new().read_only("id", ValueType::U32, || Some(7u32.into()));
        let field = members.find_field("id").unwrap();
        assert!(!field.is_writable());
        assert!(!field.set(Value::Unsigned(1)).unwrap());
    }

    #[test]
    fn test_operation_lookup_by_arity() {
        let members = counter_members(Arc::new(AtomicI64::new(5)))
            .operation(Operation::new("double", vec![ValueType::I64], |args| {
                Ok(Some((args[0].as_i64()? * 2).into()))
            }));
        assert_eq!(members.find_operation("double", 0).unwrap().arity(), 0);
        assert_eq!(members.find_operation("double", 1).unwrap().arity(), 1);
        assert!(members.find_operation("double", 2).is_none());
        let result = members.find_operation("double", 0).unwrap().invoke(&[]).unwrap();
        assert_eq!(result, Some(Value::Signed(10)));
    }

    #[test]
    fn test_signature() {
        let op = Operation::new(
            "connect",
            vec![ValueType::String, ValueType::U16],
            |_| Ok(None),
        );
        assert_eq!(op.signature(), "connect(String,u16)");
    }

    #[test]
    fn test_find_setter_variants() {
        let members = Members::new()
            .operation(Operation::new("set_timeout", vec![ValueType::Duration], |_| Ok(None)))
            .operation(Operation::new("setMaxSize", vec![ValueType::U32], |_| Ok(None)))
            .accessor("level", ValueType::String, || None, |_| Ok(()));
        assert!(matches!(members.find_setter("timeout"), Some(SetterRef::Operation(_))));
        assert!(matches!(members.find_setter("maxSize"), Some(SetterRef::Operation(_))));
        assert!(matches!(members.find_setter("level"), Some(SetterRef::Attribute(_))));
        assert!(members.find_setter("missing").is_none());
    }

    #[test]
    fn test_split_prefixed() {
        let caps = Capabilities::new(Members::new())
            .with_component("pool", Members::new())
            .with_component("pool_stats", Members::new());
        let (sub, rest) = caps.split_prefixed("pool.max_threads").unwrap();
        assert_eq!(sub.name(), "pool");
        assert_eq!(rest, "max_threads");
        let (sub, _) = caps.split_prefixed("pool_stats.hits").unwrap();
        assert_eq!(sub.name(), "pool_stats");
        assert!(caps.split_prefixed("max_threads").is_none());
    }
}
