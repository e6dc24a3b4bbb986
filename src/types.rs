//! Core value types for stack-probe
//!
//! Every attribute and operation parameter registered on a component declares
//! a [`ValueType`]. Raw command text is converted into a [`Value`] of that
//! type before it reaches a setter or an operation body, and values coming
//! back out are rendered with [`Value`]'s `Display` implementation.
//!
//! # Supported Types
//!
//! - Unsigned integers: u8, u16, u32, u64, usize
//! - Signed integers: i8, i16, i32, i64
//! - Floating point: f32, f64
//! - Boolean values, strings and durations
//! - Named enums (a fixed list of variant names)
//! - Lists of any of the above

use crate::error::{ProbeError, Result};
use std::fmt;
use std::time::Duration;

/// Declared type of an attribute, parameter or return value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    U32,
    /// 64-bit unsigned integer
    U64,
    /// Pointer-sized unsigned integer
    Usize,
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
    /// Boolean value
    Bool,
    /// Free-form text
    String,
    /// Time span
    Duration,
    /// One of a fixed set of named constants
    Enum {
        /// Type name shown in operation signatures
        name: String,
        /// Accepted variant names
        variants: Vec<String>,
    },
    /// Whitespace or `;` separated elements of one type
    List(Box<ValueType>),
}

impl ValueType {
    /// Build an enum type from a name and its variants
    pub fn enumeration(name: impl Into<String>, variants: &[&str]) -> Self {
        ValueType::Enum {
            name: name.into(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Build a list type
    pub fn list_of(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }

    /// Inclusive range for the integer types, `None` for everything else
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        Some(match self {
            ValueType::U8 => (0, u8::MAX as i128),
            ValueType::U16 => (0, u16::MAX as i128),
            ValueType::U32 => (0, u32::MAX as i128),
            ValueType::U64 => (0, u64::MAX as i128),
            ValueType::Usize => (0, usize::MAX as i128),
            ValueType::I8 => (i8::MIN as i128, i8::MAX as i128),
            ValueType::I16 => (i16::MIN as i128, i16::MAX as i128),
            ValueType::I32 => (i32::MIN as i128, i32::MAX as i128),
            ValueType::I64 => (i64::MIN as i128, i64::MAX as i128),
            _ => return None,
        })
    }

    /// Returns true for the unsigned integer types
    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            ValueType::U8 | ValueType::U16 | ValueType::U32 | ValueType::U64 | ValueType::Usize
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::U8 => write!(f, "u8"),
            ValueType::U16 => write!(f, "u16"),
            ValueType::U32 => write!(f, "u32"),
            ValueType::U64 => write!(f, "u64"),
            ValueType::Usize => write!(f, "usize"),
            ValueType::I8 => write!(f, "i8"),
            ValueType::I16 => write!(f, "i16"),
            ValueType::I32 => write!(f, "i32"),
            ValueType::I64 => write!(f, "i64"),
            ValueType::F32 => write!(f, "f32"),
            ValueType::F64 => write!(f, "f64"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::String => write!(f, "String"),
            ValueType::Duration => write!(f, "Duration"),
            ValueType::Enum { name, .. } => write!(f, "{}", name),
            ValueType::List(element) => write!(f, "Vec<{}>", element),
        }
    }
}

/// A typed value read from or written to a component
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unsigned(u64),
    Signed(i64),
    /// Single-precision float, kept at its own width so it renders as written
    Float32(f32),
    Float(f64),
    Bool(bool),
    Text(String),
    Duration(Duration),
    /// Enum variant, stored by its declared name
    Enum(String),
    List(Vec<Value>),
}

impl Value {
    fn mismatch(&self, target: &str) -> ProbeError {
        ProbeError::ArgumentConversion {
            value: self.to_string(),
            target: target.to_string(),
            reason: "value has a different type".to_string(),
        }
    }

    /// Read the value as an unsigned integer
    pub fn as_u64(&self) -> Result<u64> {
        match self {
            Value::Unsigned(v) => Ok(*v),
            Value::Signed(v) if *v >= 0 => Ok(*v as u64),
            _ => Err(self.mismatch("u64")),
        }
    }

    /// Read the value as a signed integer
    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Value::Signed(v) => Ok(*v),
            Value::Unsigned(v) => i64::try_from(*v).map_err(|_| self.mismatch("i64")),
            _ => Err(self.mismatch("i64")),
        }
    }

    /// Read a single-precision float
    pub fn as_f32(&self) -> Result<f32> {
        match self {
            Value::Float32(v) => Ok(*v),
            Value::Signed(v) => Ok(*v as f32),
            Value::Unsigned(v) => Ok(*v as f32),
            _ => Err(self.mismatch("f32")),
        }
    }

    /// Read any numeric value as a float
    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Value::Float(v) => Ok(*v),
            Value::Float32(v) => Ok(*v as f64),
            Value::Signed(v) => Ok(*v as f64),
            Value::Unsigned(v) => Ok(*v as f64),
            _ => Err(self.mismatch("f64")),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(v) => Ok(*v),
            _ => Err(self.mismatch("bool")),
        }
    }

    /// Borrow text or an enum variant name
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::Text(s) | Value::Enum(s) => Ok(s),
            _ => Err(self.mismatch("String")),
        }
    }

    pub fn as_duration(&self) -> Result<Duration> {
        match self {
            Value::Duration(d) => Ok(*d),
            _ => Err(self.mismatch("Duration")),
        }
    }

    pub fn as_list(&self) -> Result<&[Value]> {
        match self {
            Value::List(items) => Ok(items),
            _ => Err(self.mismatch("Vec")),
        }
    }
}

/// Render a duration in the largest unit that represents it exactly
pub fn format_duration(d: Duration) -> String {
    if d.subsec_nanos() % 1_000_000 != 0 {
        return format!("{}ns", d.as_nanos());
    }
    let ms = d.as_millis();
    if ms != 0 && ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{}ms", ms)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unsigned(v) => write!(f, "{}", v),
            Value::Signed(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Text(s) | Value::Enum(s) => write!(f, "{}", s),
            Value::Duration(d) => write!(f, "{}", format_duration(*d)),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $cast:ty, $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v as $cast)
                }
            }
        )*
    };
}

impl_from_int!(Unsigned, u64, u8, u16, u32, u64, usize);
impl_from_int!(Signed, i64, i8, i16, i32, i64);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Duration(v)
    }
}
