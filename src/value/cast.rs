//! Conversions between value types.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::{DataTypeDescriptor, Domain, TypeTag};
use crate::value::numeric::{self, Number};
use crate::value::temporal;
use crate::value::text;
use crate::value::{Value, ValueError, ValueResult};

/// Convert `value` to the domain `target`.
///
/// Sentinel targets (NONE, NULL, MAYBE) leave the value as it is.
pub fn cast_value(value: &Value, target: &Domain) -> ValueResult<Value> {
    if value.is_null() || target.tag.is_sentinel() {
        return Ok(value.clone());
    }

    let tag = target.tag;
    if tag.is_numeric() {
        let number = to_number(value, tag).ok_or_else(|| ValueError::incompatible(value, target))?;
        return fit_number(number, target);
    }
    if tag.is_string() || tag == TypeTag::Clob {
        return to_string(value, target);
    }
    if tag.is_bit() || tag == TypeTag::Blob {
        return to_bits(value, target);
    }

    match tag {
        TypeTag::Date => temporal::date_part(value)
            .map(Value::Date)
            .map_err(|_| ValueError::incompatible(value, target)),
        TypeTag::Time => match value {
            Value::Time(_) | Value::Timestamp(_) | Value::DateTime(_) | Value::String(_) => {
                temporal::time_part(value).map(Value::Time)
            }
            _ => Err(ValueError::incompatible(value, target)),
        },
        TypeTag::Timestamp => temporal::datetime_part(value)
            .map(|dt| Value::Timestamp(temporal::to_seconds(dt)))
            .map_err(|_| ValueError::incompatible(value, target)),
        TypeTag::DateTime => temporal::datetime_part(value)
            .map(|dt| Value::DateTime(temporal::to_millis(dt)))
            .map_err(|_| ValueError::incompatible(value, target)),
        TypeTag::Logical => to_logical(value).ok_or_else(|| ValueError::incompatible(value, target)),
        TypeTag::Enumeration => to_enum(value, target),
        TypeTag::Set | TypeTag::Multiset | TypeTag::Sequence => to_collection(value, target),
        _ => Err(ValueError::incompatible(value, target)),
    }
}

/// Numeric reading of a value, parsing character strings.
fn to_number(value: &Value, target: TypeTag) -> Option<Number> {
    if let Some(number) = Number::from_value(value) {
        return Some(number);
    }
    let text = value.as_str()?.trim();
    if target.is_discrete_number() {
        if let Ok(v) = i64::from_str(text) {
            return Some(Number::Int(v));
        }
    }
    if let Ok(d) = Decimal::from_str(text) {
        return Some(Number::Exact(d));
    }
    f64::from_str(text)
        .ok()
        .filter(|f| f.is_finite())
        .map(Number::Approx)
}

/// Fit a number into a numeric domain, checking range and precision.
pub fn fit_number(number: Number, target: &Domain) -> ValueResult<Value> {
    match target.tag {
        TypeTag::SmallInt => {
            let v = number.to_i64()?;
            i16::try_from(v).map(Value::SmallInt).map_err(|_| ValueError::Overflow)
        }
        TypeTag::Integer => {
            let v = number.to_i64()?;
            i32::try_from(v).map(Value::Integer).map_err(|_| ValueError::Overflow)
        }
        TypeTag::BigInt => number.to_i64().map(Value::BigInt),
        TypeTag::Float => {
            let v = numeric::finite(number.to_f64())?;
            if v.abs() > f64::from(f32::MAX) {
                return Err(ValueError::Overflow);
            }
            Ok(Value::Float(v as f32))
        }
        TypeTag::Double => numeric::finite(number.to_f64()).map(Value::Double),
        TypeTag::Numeric => fit_decimal(number.to_decimal()?, target).map(Value::Numeric),
        TypeTag::Monetary => fit_decimal(number.to_decimal()?, target).map(Value::Monetary),
        other => Err(ValueError::invalid(format!("{other} is not numeric"))),
    }
}

fn fit_decimal(value: Decimal, target: &Domain) -> ValueResult<Decimal> {
    let desc = match (&target.descriptor, target.tag) {
        (Some(desc), _) => Some(desc.clone()),
        (None, TypeTag::Monetary) => DataTypeDescriptor::default_for(TypeTag::Monetary),
        _ => None,
    };
    let Some(desc) = desc.filter(|d| d.precision > 0) else {
        return Ok(value);
    };

    let scale = desc.scale.min(28);
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    if numeric::integral_digits(rounded) > desc.precision.saturating_sub(desc.scale) {
        return Err(ValueError::Overflow);
    }
    rounded.rescale(scale);
    Ok(rounded)
}

fn to_string(value: &Value, target: &Domain) -> ValueResult<Value> {
    if matches!(value, Value::Collection(_)) {
        return Err(ValueError::incompatible(value, target));
    }
    let mut text = value.to_text();
    let Some(length) = target
        .descriptor
        .as_ref()
        .map(|d| d.precision)
        .filter(|p| *p > 0)
    else {
        return Ok(Value::String(text));
    };
    if target.tag == TypeTag::Clob {
        return Ok(Value::String(text));
    }

    let length = length as usize;
    let count = text.chars().count();
    if count > length {
        text = text.chars().take(length).collect();
    } else if count < length && matches!(target.tag, TypeTag::Char | TypeTag::NChar) {
        // Fixed-length strings are blank padded.
        let padding = text::space((length - count) as i64)?;
        text = text::concat(&[&text, &padding])?;
    }
    Ok(Value::String(text))
}

fn to_bits(value: &Value, target: &Domain) -> ValueResult<Value> {
    let mut bits = match value {
        Value::Bits(bits) => bits.clone(),
        Value::String(s) if s.chars().all(|c| c == '0' || c == '1') => {
            s.chars().map(|c| c == '1').collect()
        }
        other => match other.as_i64() {
            Some(v) if v >= 0 => {
                let width = (64 - v.leading_zeros()).max(1);
                (0..width).rev().map(|i| (v >> i) & 1 == 1).collect()
            }
            _ => return Err(ValueError::incompatible(value, target)),
        },
    };

    if let Some(length) = target
        .descriptor
        .as_ref()
        .map(|d| d.precision as usize)
        .filter(|p| *p > 0)
    {
        if bits.len() > length {
            bits.truncate(length);
        } else if target.tag == TypeTag::Bit {
            bits.try_reserve(length - bits.len())
                .map_err(|_| ValueError::OutOfMemory)?;
            bits.resize(length, false);
        }
    }
    Ok(Value::Bits(bits))
}

fn to_logical(value: &Value) -> Option<Value> {
    if let Some(number) = Number::from_value(value) {
        return Some(Value::Logical(!number.is_zero()));
    }
    let text = value.as_str()?.trim().to_ascii_lowercase();
    match text.as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(Value::Logical(true)),
        "false" | "f" | "no" | "n" | "0" => Some(Value::Logical(false)),
        _ => None,
    }
}

fn to_enum(value: &Value, target: &Domain) -> ValueResult<Value> {
    let labels = target
        .descriptor
        .as_ref()
        .map(|d| d.enum_values.as_slice())
        .unwrap_or(&[]);

    if labels.is_empty() {
        return match value {
            Value::Enum { .. } => Ok(value.clone()),
            _ => Err(ValueError::incompatible(value, target)),
        };
    }

    let by_label = |label: &str| {
        labels
            .iter()
            .position(|l| l == label)
            .map(|i| enum_value(i, labels))
    };
    let found = match value {
        Value::Enum { label, .. } | Value::String(label) => by_label(label),
        other => other
            .as_i64()
            .and_then(|i| usize::try_from(i).ok())
            .filter(|i| (1..=labels.len()).contains(i))
            .map(|i| enum_value(i - 1, labels)),
    };
    found.ok_or_else(|| ValueError::incompatible(value, target))
}

fn enum_value(position: usize, labels: &[String]) -> Value {
    Value::Enum {
        index: u16::try_from(position + 1).unwrap_or(u16::MAX),
        label: labels[position].clone(),
    }
}

fn to_collection(value: &Value, target: &Domain) -> ValueResult<Value> {
    let Value::Collection(items) = value else {
        return Err(ValueError::incompatible(value, target));
    };

    let mut out = Vec::new();
    out.try_reserve(items.len())
        .map_err(|_| ValueError::OutOfMemory)?;
    let element_domain = match target.elements() {
        [single] => Some(single),
        _ => None,
    };
    for item in items {
        let item = match element_domain {
            Some(domain) => cast_value(item, domain)?,
            None => item.clone(),
        };
        if target.tag == TypeTag::Set && out.contains(&item) {
            continue;
        }
        out.push(item);
    }
    Ok(Value::Collection(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn numeric(p: u32, s: u32) -> Domain {
        Domain::new(TypeTag::Numeric, DataTypeDescriptor::numeric(p, s))
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(
            cast_value(&Value::String(" 42 ".into()), &Domain::of(TypeTag::Integer)),
            Ok(Value::Integer(42))
        );
        assert_eq!(
            cast_value(&Value::String("1.5".into()), &Domain::of(TypeTag::Double)),
            Ok(Value::Double(1.5))
        );
        assert!(matches!(
            cast_value(&Value::String("abc".into()), &Domain::of(TypeTag::Integer)),
            Err(ValueError::Incompatible { .. })
        ));
    }

    #[test]
    fn test_integer_range() {
        assert_eq!(
            cast_value(&Value::Integer(70_000), &Domain::of(TypeTag::SmallInt)),
            Err(ValueError::Overflow)
        );
        assert_eq!(
            cast_value(&Value::Double(2.5), &Domain::of(TypeTag::Integer)),
            Ok(Value::Integer(3))
        );
    }

    #[test]
    fn test_numeric_precision() {
        let d = Decimal::from_str("123.456").unwrap();
        assert_eq!(
            cast_value(&Value::Numeric(d), &numeric(5, 2)),
            Ok(Value::Numeric(Decimal::from_str("123.46").unwrap()))
        );
        assert_eq!(
            cast_value(&Value::Numeric(d), &numeric(4, 2)),
            Err(ValueError::Overflow)
        );
    }

    #[test]
    fn test_to_string() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 6).unwrap();
        assert_eq!(
            cast_value(&Value::Date(d), &Domain::of(TypeTag::VarChar)),
            Ok(Value::String("2020-01-06".into()))
        );
        let char3 = Domain::new(
            TypeTag::Char,
            DataTypeDescriptor {
                precision: 3,
                ..Default::default()
            },
        );
        assert_eq!(
            cast_value(&Value::String("a".into()), &char3),
            Ok(Value::String("a  ".into()))
        );
        assert_eq!(
            cast_value(&Value::String("abcd".into()), &char3),
            Ok(Value::String("abc".into()))
        );
    }

    #[test]
    fn test_temporal() {
        assert_eq!(
            cast_value(&Value::String("2020-01-06".into()), &Domain::of(TypeTag::Date)),
            Ok(Value::Date(NaiveDate::from_ymd_opt(2020, 1, 6).unwrap()))
        );
        assert!(cast_value(&Value::Integer(5), &Domain::of(TypeTag::Date)).is_err());
        let d = NaiveDate::from_ymd_opt(2020, 1, 6).unwrap();
        assert_eq!(
            cast_value(&Value::Date(d), &Domain::of(TypeTag::Timestamp)),
            Ok(Value::Timestamp(d.and_hms_opt(0, 0, 0).unwrap()))
        );
        assert!(cast_value(&Value::Date(d), &Domain::of(TypeTag::Time)).is_err());
    }

    #[test]
    fn test_enumeration() {
        let colors = Domain::new(
            TypeTag::Enumeration,
            DataTypeDescriptor::enumeration(
                vec!["red".into(), "green".into()],
                crate::types::CollationId::UTF8_BIN,
            ),
        );
        assert_eq!(
            cast_value(&Value::String("green".into()), &colors),
            Ok(Value::Enum {
                index: 2,
                label: "green".into()
            })
        );
        assert_eq!(
            cast_value(&Value::Integer(1), &colors),
            Ok(Value::Enum {
                index: 1,
                label: "red".into()
            })
        );
        assert!(cast_value(&Value::String("blue".into()), &colors).is_err());
    }

    #[test]
    fn test_set_removes_duplicates() {
        let set_of_int = Domain::new(
            TypeTag::Set,
            DataTypeDescriptor::collection(vec![Domain::of(TypeTag::Integer)]),
        );
        let value = Value::Collection(vec![
            Value::String("1".into()),
            Value::Integer(1),
            Value::Integer(2),
        ]);
        assert_eq!(
            cast_value(&value, &set_of_int),
            Ok(Value::Collection(vec![Value::Integer(1), Value::Integer(2)]))
        );
    }

    #[test]
    fn test_logical_and_bits() {
        assert_eq!(
            cast_value(&Value::Integer(0), &Domain::of(TypeTag::Logical)),
            Ok(Value::Logical(false))
        );
        assert_eq!(
            cast_value(&Value::Integer(5), &Domain::of(TypeTag::VarBit)),
            Ok(Value::Bits(vec![true, false, true]))
        );
    }

    #[test]
    fn test_null_stays_null() {
        assert_eq!(
            cast_value(&Value::Null, &Domain::of(TypeTag::Integer)),
            Ok(Value::Null)
        );
    }
}
