//! Operation invocation (`op=` / `invoke=`) and listing (`ops`)

use crate::convert::convert;
use crate::error::{ProbeError, Result, ResultExt};
use crate::stack::{Capabilities, ComponentRegistry, Operation, Protocol};
use crate::types::Value;

/// A parsed `Component.method[arg1,arg2,...]` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationCall<'a> {
    /// Class or instance name of the target component
    pub component: &'a str,
    /// Method name as written, possibly `sub.method`
    pub method: &'a str,
    /// Raw, trimmed arguments
    pub args: Vec<&'a str>,
}

impl<'a> OperationCall<'a> {
    pub fn parse(input: &'a str) -> Result<Self> {
        let (component, rest) = input
            .split_once('.')
            .ok_or_else(|| ProbeError::malformed(input, "expected Component.method"))?;

        let Some(left) = rest.find('[') else {
            return Ok(Self {
                component,
                method: rest.trim(),
                args: Vec::new(),
            });
        };

        let inner = &rest[left + 1..];
        let right = inner
            .find(']')
            .ok_or_else(|| ProbeError::malformed(input, "] not found"))?;
        let inner = &inner[..right];
        let args = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(str::trim).collect()
        };

        Ok(Self {
            component,
            method: rest[..left].trim(),
            args,
        })
    }
}

/// Find `method` with the given arity on the component, then on a
/// sub-component named by its `sub.` prefix
pub fn resolve_operation<'c>(
    caps: &'c Capabilities,
    method: &str,
    arity: usize,
) -> Option<&'c Operation> {
    caps.members().find_operation(method, arity).or_else(|| {
        caps.components().iter().find_map(|sub| {
            method
                .strip_prefix(sub.name())
                .and_then(|rest| rest.strip_prefix('.'))
                .and_then(|rest| sub.members().find_operation(rest, arity))
        })
    })
}

/// Resolve and run one invocation
///
/// Returns the result entry `(<instance>.<method>, value)` when the
/// operation produced a value.
pub fn invoke(
    registry: &dyn ComponentRegistry,
    input: &str,
) -> Result<Option<(String, String)>> {
    let call = OperationCall::parse(input)?;
    let component = registry
        .find_by_class(call.component)
        .or_else(|| registry.find_by_name(call.component))
        .ok_or_else(|| ProbeError::ComponentNotFound(call.component.to_string()))?;

    let operation = resolve_operation(component.capabilities(), call.method, call.args.len())
        .ok_or_else(|| ProbeError::OperationNotFound {
            operation: format!("{}[{}]", call.method, call.args.len()),
            component: component.name().to_string(),
        })?;

    let args = operation
        .params()
        .iter()
        .zip(&call.args)
        .map(|(ty, raw)| convert(raw, ty))
        .collect::<Result<Vec<Value>>>()?;

    tracing::debug!("Invoking {}.{} with {:?}", component.name(), call.method, call.args);
    let result = operation
        .invoke(&args)
        .with_context(|| format!("{}.{}", component.name(), call.method))?;

    Ok(result.map(|value| {
        (
            format!("{}.{}", component.name(), call.method),
            value.to_string(),
        )
    }))
}

/// Append the operation listing of one component
pub fn list_component(component: &dyn Protocol, out: &mut String) {
    let caps = component.capabilities();
    out.push_str(component.class_name());
    out.push_str(":\n");
    for op in caps.members().operations() {
        out.push_str("  ");
        out.push_str(&op.signature());
        out.push('\n');
    }
    for sub in caps.components() {
        for op in sub.members().operations() {
            out.push_str(&format!("  {}.{}\n", sub.name(), op.signature()));
        }
    }
}

/// Operation listing of every component in stack order
pub fn list_all(registry: &dyn ComponentRegistry) -> String {
    let mut out = String::new();
    for component in registry.components() {
        list_component(component.as_ref(), &mut out);
    }
    out
}

/// Operation listing of the component with the given class name
pub fn list_class(registry: &dyn ComponentRegistry, class_name: &str) -> Result<String> {
    let component = registry
        .find_by_class(class_name)
        .ok_or_else(|| ProbeError::ComponentNotFound(class_name.to_string()))?;
    let mut out = String::new();
    list_component(component.as_ref(), &mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::{Members, ProtocolStack};
    use crate::types::ValueType;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    struct Calc {
        caps: Capabilities,
    }

    impl Protocol for Calc {
        fn name(&self) -> &str {
            "calc"
        }

        fn class_name(&self) -> &str {
            "Calculator"
        }

        fn capabilities(&self) -> &Capabilities {
            &self.caps
        }
    }

    fn stack() -> (ProtocolStack, Arc<AtomicI64>) {
        let flushed = Arc::new(AtomicI64::new(0));
        let flushed_op = flushed.clone();
        let caps = Capabilities::new(
            Members::new()
                .operation(
                    Operation::new("add", vec![ValueType::I32, ValueType::I32], |args| {
                        Ok(Some((args[0].as_i64()? + args[1].as_i64()?).into()))
                    })
                    .returning(ValueType::I64),
                )
                .operation(Operation::new("add", vec![ValueType::I32], |args| {
                    Ok(Some((args[0].as_i64()? + 1).into()))
                }))
                .operation(Operation::new("fail", vec![], |_| {
                    Err(ProbeError::Operation("boom".to_string()))
                })),
        )
        .with_component(
            "cache",
            Members::new().operation(Operation::new("flush", vec![], move |_| {
                flushed_op.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })),
        );
        let calc: Arc<dyn Protocol> = Arc::new(Calc { caps });
        (ProtocolStack::new(vec![calc]).unwrap(), flushed)
    }

    #[test]
    fn test_parse_call() {
        let call = OperationCall::parse("A.m[ 1 , two ]").unwrap();
        assert_eq!(call.component, "A");
        assert_eq!(call.method, "m");
        assert_eq!(call.args, vec!["1", "two"]);

        let call = OperationCall::parse("A.sub.m").unwrap();
        assert_eq!(call.method, "sub.m");
        assert!(call.args.is_empty());

        assert!(OperationCall::parse("A.m[]").unwrap().args.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            OperationCall::parse("nodot"),
            Err(ProbeError::MalformedCommand { .. })
        ));
        let err = OperationCall::parse("A.m[1,2").unwrap_err();
        assert!(err.to_string().contains("] not found"));
    }

    #[test]
    fn test_invoke_by_class_and_instance() {
        let (stack, _) = stack();
        let entry = invoke(&stack, "Calculator.add[2,3]").unwrap();
        assert_eq!(entry, Some(("calc.add".to_string(), "5".to_string())));
        let entry = invoke(&stack, "calc.add[0x10]").unwrap();
        assert_eq!(entry, Some(("calc.add".to_string(), "17".to_string())));
    }

    #[test]
    fn test_invoke_sub_component() {
        let (stack, flushed) = stack();
        assert_eq!(invoke(&stack, "calc.cache.flush[]").unwrap(), None);
        assert_eq!(flushed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invoke_failures() {
        let (stack, _) = stack();
        assert!(matches!(
            invoke(&stack, "nope.add[1]"),
            Err(ProbeError::ComponentNotFound(_))
        ));
        assert!(matches!(
            invoke(&stack, "calc.add[1,2,3]"),
            Err(ProbeError::OperationNotFound { .. })
        ));
        assert!(matches!(
            invoke(&stack, "calc.add[x]"),
            Err(ProbeError::ArgumentConversion { .. })
        ));
        assert!(matches!(
            invoke(&stack, "calc.fail[]"),
            Err(ProbeError::WithContext { .. })
        ));
    }

    #[test]
    fn test_listing() {
        let (stack, _) = stack();
        assert_eq!(
            list_all(&stack),
            "Calculator:\n  add(i32,i32)\n  add(i32)\n  fail()\n  cache.flush()\n"
        );
        assert!(list_class(&stack, "Calculator").is_ok());
        assert!(list_class(&stack, "calc").is_err());
    }
}
