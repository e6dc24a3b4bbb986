//! String to typed value conversion
//!
//! Attribute writes and operation arguments arrive as raw command text. This
//! module turns that text into a [`Value`] of the declared [`ValueType`], or
//! fails with [`ProbeError::ArgumentConversion`] so that only the affected
//! write or invocation is aborted.

use crate::error::{ProbeError, Result};
use crate::types::{Value, ValueType};
use std::time::Duration;

fn conversion_error(raw: &str, target: &ValueType, reason: impl Into<String>) -> ProbeError {
    ProbeError::ArgumentConversion {
        value: raw.to_string(),
        target: target.to_string(),
        reason: reason.into(),
    }
}

/// Convert `raw` into a value of type `target`
pub fn convert(raw: &str, target: &ValueType) -> Result<Value> {
    let text = raw.trim();
    match target {
        ValueType::String => Ok(Value::Text(raw.to_string())),
        ValueType::Bool => parse_bool(text)
            .map(Value::Bool)
            .ok_or_else(|| conversion_error(raw, target, "expected true/false")),
        ValueType::F32 => {
            let v: f32 = text
                .parse()
                .map_err(|e: std::num::ParseFloatError| conversion_error(raw, target, e.to_string()))?;
            Ok(Value::Float32(v))
        }
        ValueType::F64 => {
            let v: f64 = text
                .parse()
                .map_err(|e: std::num::ParseFloatError| conversion_error(raw, target, e.to_string()))?;
            Ok(Value::Float(v))
        }
        ValueType::Duration => parse_duration(text)
            .map(Value::Duration)
            .ok_or_else(|| conversion_error(raw, target, "expected <n>[ns|us|ms|s|m|h]")),
        ValueType::Enum { variants, .. } => variants
            .iter()
            .find(|v| v.eq_ignore_ascii_case(text))
            .map(|v| Value::Enum(v.clone()))
            .ok_or_else(|| {
                conversion_error(raw, target, format!("expected one of {}", variants.join("|")))
            }),
        ValueType::List(element) => text
            .split(|c: char| c == ';' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|item| convert(item, element))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        _ => convert_integer(raw, text, target),
    }
}

fn convert_integer(raw: &str, text: &str, target: &ValueType) -> Result<Value> {
    let (min, max) = target
        .integer_range()
        .ok_or_else(|| conversion_error(raw, target, "unsupported target type"))?;
    let v = parse_integer(text).ok_or_else(|| conversion_error(raw, target, "not an integer"))?;
    if v < min || v > max {
        return Err(conversion_error(
            raw,
            target,
            format!("out of range {}..={}", min, max),
        ));
    }
    Ok(if target.is_unsigned() {
        Value::Unsigned(v as u64)
    } else {
        Value::Signed(v as i64)
    })
}

/// Parse a decimal or `0x` hex integer, allowing `_` separators
pub fn parse_integer(text: &str) -> Option<i128> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(cleaned.as_str())),
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i128::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i128>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Parse a boolean in any of the usual spellings
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Parse `<n>[ns|us|ms|s|m|h]`; a bare number is milliseconds
pub fn parse_duration(text: &str) -> Option<Duration> {
    let split = text
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(split);
    let amount: f64 = number.parse().ok()?;
    let nanos_per_unit = match unit.trim() {
        "ns" => 1.0,
        "us" => 1e3,
        "" | "ms" => 1e6,
        "s" => 1e9,
        "m" => 60e9,
        "h" => 3600e9,
        _ => return None,
    };
    let nanos = amount * nanos_per_unit;
    if !nanos.is_finite() || nanos > u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(nanos.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_integers() {
        assert_eq!(convert("5", &ValueType::I32).unwrap(), Value::Signed(5));
        assert_eq!(convert(" 42 ", &ValueType::U16).unwrap(), Value::Unsigned(42));
        assert_eq!(convert("0xff", &ValueType::U8).unwrap(), Value::Unsigned(255));
        assert_eq!(
            convert("1_000_000", &ValueType::U64).unwrap(),
            Value::Unsigned(1_000_000)
        );
        assert_eq!(convert("-128", &ValueType::I8).unwrap(), Value::Signed(-128));
    }

    #[test]
    fn test_integer_out_of_range() {
        assert!(convert("256", &ValueType::U8).is_err());
        assert!(convert("-1", &ValueType::U32).is_err());
        assert!(convert("abc", &ValueType::I64).is_err());
        assert!(convert("", &ValueType::I64).is_err());
    }

    #[test]
    fn test_floats_and_bools() {
        assert_eq!(convert("2.5", &ValueType::F64).unwrap(), Value::Float(2.5));
        assert_eq!(convert("0.1", &ValueType::F32).unwrap(), Value::Float32(0.1));
        assert_eq!(convert(" 0.1", &ValueType::F32).unwrap().to_string(), "0.1");
        assert_eq!(convert("yes", &ValueType::Bool).unwrap(), Value::Bool(true));
        assert_eq!(convert("OFF", &ValueType::Bool).unwrap(), Value::Bool(false));
        assert!(convert("maybe", &ValueType::Bool).is_err());
    }

    #[test]
    fn test_string_passthrough() {
        assert_eq!(
            convert(" keep spaces ", &ValueType::String).unwrap(),
            Value::Text(" keep spaces ".to_string())
        );
    }

    #[test]
    fn test_durations() {
        assert_eq!(parse_duration("250"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("3s"), Some(Duration::from_secs(3)));
        assert_eq!(parse_duration("1.5s"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("10us"), Some(Duration::from_micros(10)));
        assert_eq!(parse_duration("5 weeks"), None);
        assert_eq!(parse_duration("s"), None);
    }

    #[test]
    fn test_enums_are_case_insensitive() {
        let level = ValueType::enumeration("Level", &["DEBUG", "INFO", "WARN"]);
        assert_eq!(convert("info", &level).unwrap(), Value::Enum("INFO".to_string()));
        let err = convert("TRACE", &level).unwrap_err();
        assert!(err.to_string().contains("DEBUG|INFO|WARN"));
    }

    #[test]
    fn test_lists() {
        let ports = ValueType::list_of(ValueType::U16);
        assert_eq!(
            convert("7800 7801;7802", &ports).unwrap(),
            Value::List(vec![
                Value::Unsigned(7800),
                Value::Unsigned(7801),
                Value::Unsigned(7802)
            ])
        );
        assert!(convert("7800 nope", &ports).is_err());
        assert_eq!(convert("", &ports).unwrap(), Value::List(vec![]));
    }

    proptest! {
        #[test]
        fn test_convert_never_panics(raw in ".{0,32}") {
            for target in [
                ValueType::U8, ValueType::I64, ValueType::F32, ValueType::Bool,
                ValueType::Duration, ValueType::list_of(ValueType::I16),
            ] {
                let _ = convert(&raw, &target);
            }
        }

        #[test]
        fn test_i32_text_round_trips(v in any::<i32>()) {
            let converted = convert(&v.to_string(), &ValueType::I32).unwrap();
            prop_assert_eq!(converted.to_string(), v.to_string());
        }

        #[test]
        fn test_millisecond_durations_round_trip(ms in 0u64..10_000_000) {
            let value = convert(&format!("{}ms", ms), &ValueType::Duration).unwrap();
            let again = convert(&value.to_string(), &ValueType::Duration).unwrap();
            prop_assert_eq!(value, again);
        }
    }
}
