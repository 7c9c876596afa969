//! Numeric arithmetic with overflow and zero-division checks.

use std::cmp::Ordering;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::catalog::OperatorId;
use crate::types::TypeTag;
use crate::value::{Value, ValueError, ValueResult};

/// A numeric operand normalised to one of three representations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Exact(Decimal),
    Approx(f64),
}

impl Number {
    /// Numeric reading of a value. LOGICAL reads as 0/1 and an enumeration
    /// as its position.
    pub fn from_value(value: &Value) -> Option<Number> {
        let number = match value {
            Value::SmallInt(v) => Number::Int(i64::from(*v)),
            Value::Integer(v) => Number::Int(i64::from(*v)),
            Value::BigInt(v) => Number::Int(*v),
            Value::Float(v) => Number::Approx(f64::from(*v)),
            Value::Double(v) => Number::Approx(*v),
            Value::Numeric(v) | Value::Monetary(v) => Number::Exact(*v),
            Value::Logical(b) => Number::Int(i64::from(*b)),
            Value::Enum { index, .. } => Number::Int(i64::from(*index)),
            _ => return None,
        };
        Some(number)
    }

    /// Rounds half away from zero when the value has a fraction.
    pub fn to_i64(self) -> ValueResult<i64> {
        match self {
            Number::Int(v) => Ok(v),
            Number::Exact(d) => d
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
                .ok_or(ValueError::Overflow),
            Number::Approx(f) => {
                let rounded = f.round();
                if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
                    return Err(ValueError::Overflow);
                }
                Ok(rounded as i64)
            }
        }
    }

    pub fn to_decimal(self) -> ValueResult<Decimal> {
        match self {
            Number::Int(v) => Ok(Decimal::from(v)),
            Number::Exact(d) => Ok(d),
            Number::Approx(f) => Decimal::from_f64(f).ok_or(ValueError::Overflow),
        }
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::Exact(d) => d.to_f64().unwrap_or(f64::NAN),
            Number::Approx(f) => f,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Int(v) => v == 0,
            Number::Exact(d) => d.is_zero(),
            Number::Approx(f) => f == 0.0,
        }
    }

    pub fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (Number::Approx(_), _) | (_, Number::Approx(_)) => {
                self.to_f64().partial_cmp(&other.to_f64())
            }
            (a, b) => match (a.to_decimal(), b.to_decimal()) {
                (Ok(a), Ok(b)) => Some(a.cmp(&b)),
                _ => self.to_f64().partial_cmp(&other.to_f64()),
            },
        }
    }
}

/// Convert an operand to the representation a result of type `tag` is
/// computed in.
fn represent(value: Number, tag: TypeTag) -> ValueResult<Number> {
    match tag {
        TypeTag::SmallInt | TypeTag::Integer | TypeTag::BigInt => value.to_i64().map(Number::Int),
        TypeTag::Numeric | TypeTag::Monetary => value.to_decimal().map(Number::Exact),
        TypeTag::Float | TypeTag::Double => Ok(Number::Approx(value.to_f64())),
        _ => Err(ValueError::invalid(format!("{tag} is not a numeric result"))),
    }
}

/// Binary arithmetic computed in the representation of `result`.
///
/// The returned value is not yet fitted to the result domain.
pub fn arithmetic(op: OperatorId, left: Number, right: Number, result: TypeTag) -> ValueResult<Value> {
    match (represent(left, result)?, represent(right, result)?) {
        (Number::Int(a), Number::Int(b)) => integer_op(op, a, b).map(Value::BigInt),
        (Number::Exact(a), Number::Exact(b)) => decimal_op(op, a, b).map(Value::Numeric),
        (Number::Approx(a), Number::Approx(b)) => float_op(op, a, b).map(Value::Double),
        _ => Err(ValueError::Unsupported { op }),
    }
}

fn integer_op(op: OperatorId, a: i64, b: i64) -> ValueResult<i64> {
    match op {
        OperatorId::Plus => a.checked_add(b).ok_or(ValueError::Overflow),
        OperatorId::Minus => a.checked_sub(b).ok_or(ValueError::Overflow),
        OperatorId::Times => a.checked_mul(b).ok_or(ValueError::Overflow),
        OperatorId::Divide | OperatorId::Div => {
            if b == 0 {
                return Err(ValueError::ZeroDivide);
            }
            a.checked_div(b).ok_or(ValueError::Overflow)
        }
        // MOD(m, 0) is m.
        OperatorId::Mod if b == 0 => Ok(a),
        OperatorId::Mod => a.checked_rem(b).ok_or(ValueError::Overflow),
        OperatorId::BitAnd => Ok(a & b),
        OperatorId::BitOr => Ok(a | b),
        OperatorId::BitXor => Ok(a ^ b),
        OperatorId::BitShiftLeft => shift(b).map(|s| a.checked_shl(s).unwrap_or(0)),
        OperatorId::BitShiftRight => shift(b).map(|s| a.checked_shr(s).unwrap_or(0)),
        _ => Err(ValueError::Unsupported { op }),
    }
}

fn shift(amount: i64) -> ValueResult<u32> {
    u32::try_from(amount).map_err(|_| ValueError::invalid(format!("shift by {amount}")))
}

fn decimal_op(op: OperatorId, a: Decimal, b: Decimal) -> ValueResult<Decimal> {
    match op {
        OperatorId::Plus => a.checked_add(b).ok_or(ValueError::Overflow),
        OperatorId::Minus => a.checked_sub(b).ok_or(ValueError::Overflow),
        OperatorId::Times => a.checked_mul(b).ok_or(ValueError::Overflow),
        OperatorId::Divide => {
            if b.is_zero() {
                return Err(ValueError::ZeroDivide);
            }
            a.checked_div(b).ok_or(ValueError::Overflow)
        }
        OperatorId::Div => {
            if b.is_zero() {
                return Err(ValueError::ZeroDivide);
            }
            a.checked_div(b).map(|q| q.trunc()).ok_or(ValueError::Overflow)
        }
        OperatorId::Mod if b.is_zero() => Ok(a),
        OperatorId::Mod => a.checked_rem(b).ok_or(ValueError::Overflow),
        _ => Err(ValueError::Unsupported { op }),
    }
}

fn float_op(op: OperatorId, a: f64, b: f64) -> ValueResult<f64> {
    let result = match op {
        OperatorId::Plus => a + b,
        OperatorId::Minus => a - b,
        OperatorId::Times => a * b,
        OperatorId::Divide | OperatorId::Div => {
            if b == 0.0 {
                return Err(ValueError::ZeroDivide);
            }
            let q = a / b;
            if op == OperatorId::Div {
                q.trunc()
            } else {
                q
            }
        }
        OperatorId::Mod if b == 0.0 => a,
        OperatorId::Mod => a % b,
        OperatorId::Power => a.powf(b),
        OperatorId::Atan | OperatorId::Atan2 => a.atan2(b),
        OperatorId::Log => {
            if a <= 0.0 || a == 1.0 || b <= 0.0 {
                return Err(ValueError::invalid(format!("LOG({a}, {b})")));
            }
            b.ln() / a.ln()
        }
        _ => return Err(ValueError::Unsupported { op }),
    };
    finite(result)
}

pub fn finite(value: f64) -> ValueResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else if value.is_nan() {
        Err(ValueError::invalid("result is not a number"))
    } else {
        Err(ValueError::Overflow)
    }
}

/// Arithmetic negation.
pub fn negate(value: Number) -> ValueResult<Value> {
    match value {
        Number::Int(v) => v.checked_neg().map(Value::BigInt).ok_or(ValueError::Overflow),
        Number::Exact(d) => Ok(Value::Numeric(-d)),
        Number::Approx(f) => Ok(Value::Double(-f)),
    }
}

pub fn abs(value: Number) -> ValueResult<Value> {
    match value {
        Number::Int(v) => v.checked_abs().map(Value::BigInt).ok_or(ValueError::Overflow),
        Number::Exact(d) => Ok(Value::Numeric(d.abs())),
        Number::Approx(f) => Ok(Value::Double(f.abs())),
    }
}

pub fn sign(value: Number) -> Value {
    let sign = match value {
        Number::Int(v) => v.signum(),
        Number::Exact(d) if d.is_zero() => 0,
        Number::Exact(d) => {
            if d.is_sign_negative() {
                -1
            } else {
                1
            }
        }
        Number::Approx(f) if f == 0.0 => 0,
        Number::Approx(f) => f.signum() as i64,
    };
    Value::Integer(sign as i32)
}

/// CEIL and FLOOR.
pub fn to_integral(value: Number, ceiling: bool) -> ValueResult<Value> {
    match value {
        Number::Int(v) => Ok(Value::BigInt(v)),
        Number::Exact(d) => Ok(Value::Numeric(if ceiling { d.ceil() } else { d.floor() })),
        Number::Approx(f) => Ok(Value::Double(if ceiling { f.ceil() } else { f.floor() })),
    }
}

/// ROUND and TRUNC to `places` fractional digits; negative places round to
/// tens, hundreds and so on.
pub fn round(value: Number, places: i64, truncate: bool) -> ValueResult<Value> {
    let strategy = if truncate {
        RoundingStrategy::ToZero
    } else {
        RoundingStrategy::MidpointAwayFromZero
    };

    match value {
        Number::Int(v) if places >= 0 => Ok(Value::BigInt(v)),
        Number::Int(v) => round(Number::Exact(Decimal::from(v)), places, truncate),
        Number::Exact(d) if places >= 0 => {
            let dp = u32::try_from(places).unwrap_or(u32::MAX).min(28);
            Ok(Value::Numeric(d.round_dp_with_strategy(dp, strategy)))
        }
        Number::Exact(d) => {
            let exponent = u32::try_from(-places).unwrap_or(u32::MAX).min(28);
            let factor = Decimal::from_i128_with_scale(10i128.pow(exponent), 0);
            let scaled = d
                .checked_div(factor)
                .ok_or(ValueError::Overflow)?
                .round_dp_with_strategy(0, strategy);
            scaled
                .checked_mul(factor)
                .map(Value::Numeric)
                .ok_or(ValueError::Overflow)
        }
        Number::Approx(f) => {
            let factor = 10f64.powi(places.clamp(-308, 308) as i32);
            let scaled = f * factor;
            let rounded = if truncate { scaled.trunc() } else { scaled.round() };
            finite(rounded / factor).map(Value::Double)
        }
    }
}

/// Unary mathematical functions evaluated in double precision.
pub fn math(op: OperatorId, x: f64) -> ValueResult<f64> {
    let out_of_domain = || ValueError::invalid(format!("{op}({x})"));
    let result = match op {
        OperatorId::Sqrt if x < 0.0 => return Err(out_of_domain()),
        OperatorId::Sqrt => x.sqrt(),
        OperatorId::Exp => x.exp(),
        OperatorId::Ln | OperatorId::Log if x <= 0.0 => return Err(out_of_domain()),
        OperatorId::Ln | OperatorId::Log => x.ln(),
        OperatorId::Log2 if x <= 0.0 => return Err(out_of_domain()),
        OperatorId::Log2 => x.log2(),
        OperatorId::Log10 if x <= 0.0 => return Err(out_of_domain()),
        OperatorId::Log10 => x.log10(),
        OperatorId::Sin => x.sin(),
        OperatorId::Cos => x.cos(),
        OperatorId::Tan => x.tan(),
        OperatorId::Cot if x == 0.0 => return Err(ValueError::ZeroDivide),
        OperatorId::Cot => 1.0 / x.tan(),
        OperatorId::Asin | OperatorId::Acos if !(-1.0..=1.0).contains(&x) => {
            return Err(out_of_domain())
        }
        OperatorId::Asin => x.asin(),
        OperatorId::Acos => x.acos(),
        OperatorId::Atan => x.atan(),
        OperatorId::Degrees => x.to_degrees(),
        OperatorId::Radians => x.to_radians(),
        _ => return Err(ValueError::Unsupported { op }),
    };
    finite(result)
}

/// Number of digits left of the decimal point.
pub fn integral_digits(d: Decimal) -> u32 {
    let integral = d.trunc().abs();
    if integral.is_zero() {
        0
    } else {
        integral.to_string().len() as u32
    }
}
