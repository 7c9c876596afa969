//! Default value engine.

use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::catalog::OperatorId;
use crate::config::ResolverConfig;
use crate::types::{CollationId, Domain, TypeTag};
use crate::value::cast::cast_value;
use crate::value::numeric::{self, Number};
use crate::value::{temporal, text};
use crate::value::{EvalContext, Value, ValueEngine, ValueError, ValueResult};

static NULL: Value = Value::Null;

/// Computes every operator the folder may evaluate at compile time.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardValueEngine {
    /// NULL reads as the empty string in concatenation, and an empty result
    /// reads as NULL.
    oracle_style_empty_string: bool,
}

impl StandardValueEngine {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            oracle_style_empty_string: config.oracle_style_empty_string,
        }
    }

    fn handles_null(&self, op: OperatorId) -> bool {
        op.treats_null_specially() || (self.oracle_style_empty_string && op.is_concat_family())
    }

    fn evaluate(
        &self,
        op: OperatorId,
        args: &[Value],
        target: &Domain,
        ctx: &EvalContext<'_>,
    ) -> ValueResult<Value> {
        use OperatorId::*;

        match op {
            Plus | Minus | Times | Divide | Div | Mod => binary_arithmetic(op, args, target),
            UnaryMinus => numeric::negate(number(arg(args, 0))?),
            UnaryPlus => Ok(arg(args, 0).clone()),
            Abs => numeric::abs(number(arg(args, 0))?),
            Ceil | Floor => numeric::to_integral(number(arg(args, 0))?, op == Ceil),
            Sign => Ok(numeric::sign(number(arg(args, 0))?)),
            Round | Trunc => rounding(op, args),
            Power | Atan2 => float_pair(op, args),
            Atan if args.len() == 2 => float_pair(op, args),
            Log if args.len() == 2 => float_pair(op, args),
            Sqrt | Exp | Ln | Log | Log2 | Log10 | Sin | Cos | Tan | Cot | Asin | Acos | Atan
            | Degrees | Radians => {
                numeric::math(op, number(arg(args, 0))?.to_f64()).map(Value::Double)
            }
            Pi => Ok(Value::Double(std::f64::consts::PI)),

            BitAnd | BitOr | BitXor | BitShiftLeft | BitShiftRight => numeric::arithmetic(
                op,
                number(arg(args, 0))?,
                number(arg(args, 1))?,
                TypeTag::BigInt,
            ),
            BitNot => Ok(Value::BigInt(!integer(arg(args, 0))?)),
            BitCount => match arg(args, 0) {
                Value::Bits(bits) => Ok(Value::Integer(bits.iter().filter(|b| **b).count() as i32)),
                other => Ok(Value::Integer(integer(other)?.count_ones() as i32)),
            },

            Eq | Ne | Lt | Le | Gt | Ge | NullSafeEq | Between | NotBetween | IsIn | IsNotIn => {
                self.comparison(op, args, ctx.collation)
            }
            Like | NotLike => {
                let escape = args.get(2).map(string).transpose()?.and_then(|e| e.chars().next());
                let matched = text::like(
                    &string(arg(args, 0))?,
                    &string(arg(args, 1))?,
                    escape,
                    ctx.collation,
                );
                Ok(Value::Logical(matched == (op == Like)))
            }
            RLike | NotRLike => {
                let matched = text::rlike(&string(arg(args, 0))?, &string(arg(args, 1))?, ctx.collation)?;
                Ok(Value::Logical(matched == (op == RLike)))
            }
            IsNull => Ok(Value::Logical(arg(args, 0).is_null())),
            IsNotNull => Ok(Value::Logical(!arg(args, 0).is_null())),

            And | Or => Ok(three_valued(op, logical(arg(args, 0))?, logical(arg(args, 1))?)),
            Xor => Ok(Value::Logical(
                truth(arg(args, 0))? != truth(arg(args, 1))?,
            )),
            Not => Ok(Value::Logical(!truth(arg(args, 0))?)),

            Concat => {
                let parts = args
                    .iter()
                    .map(|v| if v.is_null() { Ok(String::new()) } else { string(v) })
                    .collect::<ValueResult<Vec<_>>>()?;
                let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
                text::concat(&parts).map(Value::String)
            }
            ConcatWs => {
                let separator = arg(args, 0);
                if separator.is_null() {
                    return Ok(Value::Null);
                }
                let separator = string(separator)?;
                let parts = args[1..]
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(string)
                    .collect::<ValueResult<Vec<_>>>()?;
                let mut pieces: Vec<&str> = Vec::new();
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        pieces.push(&separator);
                    }
                    pieces.push(part);
                }
                text::concat(&pieces).map(Value::String)
            }
            Lower => Ok(Value::String(string(arg(args, 0))?.to_lowercase())),
            Upper => Ok(Value::String(string(arg(args, 0))?.to_uppercase())),
            CharLength => Ok(Value::Integer(length(string(arg(args, 0))?.chars().count())?)),
            OctetLength => match arg(args, 0) {
                Value::Bits(bits) => Ok(Value::Integer(length(bits.len().div_ceil(8))?)),
                other => Ok(Value::Integer(length(string(other)?.len())?)),
            },
            BitLength => match arg(args, 0) {
                Value::Bits(bits) => Ok(Value::Integer(length(bits.len())?)),
                other => Ok(Value::Integer(length(string(other)?.len() * 8)?)),
            },
            Substring => {
                let len = args.get(2).map(integer).transpose()?;
                Ok(Value::String(text::substring(
                    &string(arg(args, 0))?,
                    integer(arg(args, 1))?,
                    len,
                )))
            }
            Position => Ok(Value::Integer(found(text::position(
                &string(arg(args, 1))?,
                &string(arg(args, 0))?,
                1,
                ctx.collation,
            ))?)),
            Instr => {
                let from = args.get(2).map(integer).transpose()?.unwrap_or(1);
                Ok(Value::Integer(found(text::position(
                    &string(arg(args, 0))?,
                    &string(arg(args, 1))?,
                    from,
                    ctx.collation,
                ))?))
            }
            Locate => {
                let from = args.get(2).map(integer).transpose()?.unwrap_or(1);
                Ok(Value::Integer(found(text::position(
                    &string(arg(args, 1))?,
                    &string(arg(args, 0))?,
                    from,
                    ctx.collation,
                ))?))
            }
            Trim | LTrim | RTrim => {
                let what = args.get(1).map(string).transpose()?;
                Ok(Value::String(text::trim(
                    &string(arg(args, 0))?,
                    what.as_deref(),
                    op != RTrim,
                    op != LTrim,
                )))
            }
            LPad | RPad => {
                let fill = args.get(2).map(string).transpose()?;
                let padded = text::pad(
                    &string(arg(args, 0))?,
                    integer(arg(args, 1))?,
                    fill.as_deref().unwrap_or(" "),
                    op == LPad,
                )?;
                Ok(padded.map(Value::String).unwrap_or(Value::Null))
            }
            Replace => {
                let to = args.get(2).map(string).transpose()?.unwrap_or_default();
                Ok(Value::String(text::replace(
                    &string(arg(args, 0))?,
                    &string(arg(args, 1))?,
                    &to,
                )))
            }
            Translate => Ok(Value::String(text::translate(
                &string(arg(args, 0))?,
                &string(arg(args, 1))?,
                &string(arg(args, 2))?,
            ))),
            Repeat => text::repeat(&string(arg(args, 0))?, integer(arg(args, 1))?).map(Value::String),
            Space => text::space(integer(arg(args, 0))?).map(Value::String),
            Left => Ok(Value::String(text::left(&string(arg(args, 0))?, integer(arg(args, 1))?))),
            Right => Ok(Value::String(text::right(&string(arg(args, 0))?, integer(arg(args, 1))?))),
            Reverse => Ok(Value::String(text::reverse(&string(arg(args, 0))?))),
            Ascii => Ok(Value::Integer(
                i32::try_from(text::ascii(&string(arg(args, 0))?)).map_err(|_| ValueError::Overflow)?,
            )),
            Chr => text::chr(integer(arg(args, 0))?).map(Value::String),
            Strcmp => {
                let ordering = text::compare(&string(arg(args, 0))?, &string(arg(args, 1))?, ctx.collation);
                Ok(Value::Integer(ordering as i32))
            }
            Hex => Ok(Value::String(match arg(args, 0) {
                Value::Bits(bits) => text::hex_bits(bits),
                Value::String(s) => text::hex_bytes(s.as_bytes()),
                other => format!("{:X}", integer(other)? as u64),
            })),
            Bin => Ok(Value::String(format!("{:b}", integer(arg(args, 0))? as u64))),

            SysDate => Ok(Value::Date(ctx.session.now.date())),
            SysTime => Ok(Value::Time(temporal::to_seconds(ctx.session.now).time())),
            SysTimestamp => Ok(Value::Timestamp(temporal::to_seconds(ctx.session.now))),
            SysDateTime => Ok(Value::DateTime(temporal::to_millis(ctx.session.now))),
            AddMonths => temporal::add_months(date(arg(args, 0))?, integer(arg(args, 1))?)
                .map(Value::Date),
            MonthsBetween => Ok(Value::Double(temporal::months_between(
                date(arg(args, 0))?,
                date(arg(args, 1))?,
            ))),
            LastDay => Ok(Value::Date(temporal::last_day(date(arg(args, 0))?))),
            AddDate | SubDate => {
                let days = integer(arg(args, 1))?;
                let days = if op == SubDate {
                    days.checked_neg().ok_or(ValueError::Overflow)?
                } else {
                    days
                };
                shift_days(arg(args, 0), days)
            }
            DateDiff => {
                let days = date(arg(args, 0))?
                    .signed_duration_since(date(arg(args, 1))?)
                    .num_days();
                Ok(Value::Integer(i32::try_from(days).map_err(|_| ValueError::Overflow)?))
            }
            TimeDiff => time_difference(arg(args, 0), arg(args, 1)),
            Year => Ok(Value::Integer(date(arg(args, 0))?.year())),
            Month => date_field(args, |d| d.month()),
            Day => date_field(args, |d| d.day()),
            DayOfWeek => date_field(args, temporal::day_of_week),
            DayOfYear => date_field(args, |d| d.ordinal()),
            Quarter => date_field(args, temporal::quarter),
            Hour => time_field(args, |t| t.hour()),
            Minute => time_field(args, |t| t.minute()),
            Second => time_field(args, |t| t.second()),
            DateFormat => {
                let dt = temporal::datetime_part(arg(args, 0))?;
                temporal::render(&dt, &temporal::mysql_format(&string(arg(args, 1))?))
                    .map(Value::String)
            }
            TimeFormat => {
                let dt = time_bearing(arg(args, 0))?;
                temporal::render(&dt, &temporal::mysql_format(&string(arg(args, 1))?))
                    .map(Value::String)
            }
            ToChar => to_char(arg(args, 0), args.get(1)),
            ToDate | ToTime | ToTimestamp | ToDateTime => parse_temporal(op, args),
            ToNumber => {
                let cleaned: String = string(arg(args, 0))?
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != ',')
                    .collect();
                Decimal::from_str(&cleaned)
                    .map(Value::Numeric)
                    .map_err(|_| ValueError::incompatible(arg(args, 0), "NUMERIC"))
            }
            UnixTimestamp => {
                let dt = match args.first() {
                    Some(value) => temporal::datetime_part(value)?,
                    None => ctx.session.now,
                };
                Ok(Value::BigInt(temporal::unix_timestamp(dt)))
            }
            FromUnixTime => temporal::from_unix_time(integer(arg(args, 0))?).map(Value::DateTime),
            MakeDate => Ok(temporal::make_date(integer(arg(args, 0))?, integer(arg(args, 1))?)?
                .map(Value::Date)
                .unwrap_or(Value::Null)),
            MakeTime => temporal::make_time(
                integer(arg(args, 0))?,
                integer(arg(args, 1))?,
                integer(arg(args, 2))?,
            )
            .map(Value::Time),

            Nvl | IfNull | Coalesce => Ok(args
                .iter()
                .find(|v| !v.is_null())
                .cloned()
                .unwrap_or(Value::Null)),
            Nvl2 => Ok(if arg(args, 0).is_null() {
                arg(args, 2).clone()
            } else {
                arg(args, 1).clone()
            }),
            NullIf => {
                let (first, second) = (arg(args, 0), arg(args, 1));
                if self.compare(first, second, ctx.collation)? == Some(Ordering::Equal) {
                    Ok(Value::Null)
                } else {
                    Ok(first.clone())
                }
            }
            If => Ok(if arg(args, 0).as_bool() == Some(true) {
                arg(args, 1).clone()
            } else {
                arg(args, 2).clone()
            }),
            Greatest | Least => {
                let (first, second) = (arg(args, 0), arg(args, 1));
                let wanted = if op == Greatest {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                match self.compare(first, second, ctx.collation)? {
                    Some(ordering) if ordering == wanted => Ok(second.clone()),
                    Some(_) => Ok(first.clone()),
                    None => Ok(Value::Null),
                }
            }

            CharToClob | ClobToChar => Ok(Value::String(string(arg(args, 0))?)),
            BitToBlob | BlobToBit => match arg(args, 0) {
                Value::Bits(bits) => Ok(Value::Bits(bits.clone())),
                other => Err(ValueError::incompatible(other, "BIT VARYING")),
            },
            CurrentUser => Ok(Value::String(ctx.session.user.clone())),
            Cast => cast_value(arg(args, 0), target),

            Md5 | Sha1 | ToBase64 | FromBase64 | NextValue | CurrentValue | RowCount
            | LastInsertId | IndexCardinality | Random | DRandom | Exists => {
                Err(ValueError::Unsupported { op })
            }
        }
    }

    fn comparison(
        &self,
        op: OperatorId,
        args: &[Value],
        collation: Option<CollationId>,
    ) -> ValueResult<Value> {
        use OperatorId::*;

        let (left, right) = (arg(args, 0), arg(args, 1));
        let result = match op {
            NullSafeEq => {
                return Ok(Value::Logical(match (left.is_null(), right.is_null()) {
                    (true, true) => true,
                    (false, false) => self.compare(left, right, collation)? == Some(Ordering::Equal),
                    _ => false,
                }))
            }
            IsIn | IsNotIn => {
                if left.is_null() {
                    return Ok(Value::Null);
                }
                let items = match right {
                    Value::Collection(items) => items.as_slice(),
                    other => std::slice::from_ref(other),
                };
                let mut saw_null = false;
                let mut hit = false;
                for item in items {
                    match self.compare(left, item, collation)? {
                        Some(Ordering::Equal) => {
                            hit = true;
                            break;
                        }
                        Some(_) => {}
                        None => saw_null = true,
                    }
                }
                if !hit && saw_null {
                    return Ok(Value::Null);
                }
                return Ok(Value::Logical(hit == (op == IsIn)));
            }
            Between | NotBetween => {
                let low = self.compare(left, right, collation)?;
                let high = self.compare(left, arg(args, 2), collation)?;
                match (low, high) {
                    (Some(low), Some(high)) => {
                        let inside = low != Ordering::Less && high != Ordering::Greater;
                        inside == (op == Between)
                    }
                    _ => return Ok(Value::Null),
                }
            }
            _ => {
                let Some(ordering) = self.compare(left, right, collation)? else {
                    return Ok(Value::Null);
                };
                match op {
                    Eq => ordering == Ordering::Equal,
                    Ne => ordering != Ordering::Equal,
                    Lt => ordering == Ordering::Less,
                    Le => ordering != Ordering::Greater,
                    Gt => ordering == Ordering::Greater,
                    _ => ordering != Ordering::Less,
                }
            }
        };
        Ok(Value::Logical(result))
    }
}

impl ValueEngine for StandardValueEngine {
    fn cast(&self, value: &Value, target: &Domain) -> ValueResult<Value> {
        cast_value(value, target)
    }

    fn apply(
        &self,
        op: OperatorId,
        args: &[Value],
        target: &Domain,
        ctx: &EvalContext<'_>,
    ) -> ValueResult<Value> {
        if op.is_runtime_only() {
            return Err(ValueError::Unsupported { op });
        }
        if !self.handles_null(op) && args.iter().any(Value::is_null) {
            return Ok(Value::Null);
        }

        let value = self.evaluate(op, args, target, ctx)?;
        if self.oracle_style_empty_string && value.as_str() == Some("") {
            return Ok(Value::Null);
        }
        cast_value(&value, target)
    }

    fn compare(
        &self,
        left: &Value,
        right: &Value,
        collation: Option<CollationId>,
    ) -> ValueResult<Option<Ordering>> {
        if left.is_null() || right.is_null() {
            return Ok(None);
        }

        match (left, right) {
            (Value::Enum { index: a, .. }, Value::Enum { index: b, .. }) => Ok(Some(a.cmp(b))),
            (Value::String(_) | Value::Enum { .. }, Value::String(_) | Value::Enum { .. }) => {
                Ok(Some(text::compare(
                    left.as_str().unwrap_or_default(),
                    right.as_str().unwrap_or_default(),
                    collation,
                )))
            }
            (Value::Logical(a), Value::Logical(b)) => Ok(Some(a.cmp(b))),
            (Value::Bits(a), Value::Bits(b)) => Ok(Some(a.cmp(b))),
            (Value::Time(a), Value::Time(b)) => Ok(Some(a.cmp(b))),
            (Value::Collection(a), Value::Collection(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match self.compare(x, y, collation)? {
                        Some(Ordering::Equal) => {}
                        other => return Ok(other),
                    }
                }
                Ok(Some(a.len().cmp(&b.len())))
            }
            (Value::String(_), other) | (other, Value::String(_))
                if other.tag().is_numeric() || other.tag().is_temporal() =>
            {
                // The string side is read as a value of the other side's type.
                let domain = Domain::of(if other.tag().is_numeric() {
                    TypeTag::Double
                } else {
                    other.tag()
                });
                let l = cast_value(left, &domain)?;
                let r = cast_value(right, &domain)?;
                self.compare(&l, &r, collation)
            }
            _ if left.tag().is_temporal() && right.tag().is_temporal() => {
                let l = temporal::datetime_part(left)?;
                let r = temporal::datetime_part(right)?;
                Ok(Some(l.cmp(&r)))
            }
            _ => match (Number::from_value(left), Number::from_value(right)) {
                (Some(a), Some(b)) => Ok(a.compare(b)),
                _ => Err(ValueError::incompatible(right, left.tag())),
            },
        }
    }
}

fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&NULL)
}

/// Numeric reading of an operand; character strings are parsed.
fn number(value: &Value) -> ValueResult<Number> {
    if let Some(number) = Number::from_value(value) {
        return Ok(number);
    }
    let parsed = cast_value(value, &Domain::of(TypeTag::Double))?;
    Number::from_value(&parsed).ok_or_else(|| ValueError::incompatible(value, "a number"))
}

fn integer(value: &Value) -> ValueResult<i64> {
    number(value)?.to_i64()
}

fn string(value: &Value) -> ValueResult<String> {
    match value {
        Value::Collection(_) => Err(ValueError::incompatible(value, "a character string")),
        other => Ok(other.as_str().map(str::to_string).unwrap_or_else(|| other.to_text())),
    }
}

fn date(value: &Value) -> ValueResult<NaiveDate> {
    temporal::date_part(value)
}

fn logical(value: &Value) -> ValueResult<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        other => truth(other).map(Some),
    }
}

fn truth(value: &Value) -> ValueResult<bool> {
    match value {
        Value::Logical(b) => Ok(*b),
        other => number(other).map(|n| !n.is_zero()),
    }
}

fn length(count: usize) -> ValueResult<i32> {
    i32::try_from(count).map_err(|_| ValueError::Overflow)
}

fn found(position: i64) -> ValueResult<i32> {
    i32::try_from(position).map_err(|_| ValueError::Overflow)
}

fn three_valued(op: OperatorId, left: Option<bool>, right: Option<bool>) -> Value {
    let result = if op == OperatorId::And {
        match (left, right) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        }
    } else {
        match (left, right) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        }
    };
    result.map(Value::Logical).unwrap_or(Value::Null)
}

/// Representation a numeric result is computed in when the target does not
/// name one.
fn natural_tag(left: Number, right: Number) -> TypeTag {
    match (left, right) {
        (Number::Approx(_), _) | (_, Number::Approx(_)) => TypeTag::Double,
        (Number::Exact(_), _) | (_, Number::Exact(_)) => TypeTag::Numeric,
        _ => TypeTag::BigInt,
    }
}

fn binary_arithmetic(op: OperatorId, args: &[Value], target: &Domain) -> ValueResult<Value> {
    let (left, right) = (arg(args, 0), arg(args, 1));

    if let (Value::Collection(a), Value::Collection(b)) = (left, right) {
        return collection_arithmetic(op, a, b);
    }

    let left_temporal = left.tag().is_temporal();
    let right_temporal = right.tag().is_temporal();
    if left_temporal || right_temporal {
        return match (op, left_temporal, right_temporal) {
            (OperatorId::Minus, true, true) => temporal::difference(left, right).map(Value::BigInt),
            (OperatorId::Minus, true, false) => {
                let amount = integer(right)?.checked_neg().ok_or(ValueError::Overflow)?;
                temporal::shift(left, amount)
            }
            (OperatorId::Plus, true, false) => temporal::shift(left, integer(right)?),
            (OperatorId::Plus, false, true) => temporal::shift(right, integer(left)?),
            _ => Err(ValueError::Unsupported { op }),
        };
    }

    let (a, b) = (number(left)?, number(right)?);
    let tag = if target.tag.is_numeric() {
        target.tag
    } else {
        natural_tag(a, b)
    };
    numeric::arithmetic(op, a, b, tag)
}

/// Union, difference and intersection of collections.
fn collection_arithmetic(op: OperatorId, left: &[Value], right: &[Value]) -> ValueResult<Value> {
    let mut out = Vec::new();
    out.try_reserve(left.len() + right.len())
        .map_err(|_| ValueError::OutOfMemory)?;
    match op {
        OperatorId::Plus => {
            out.extend(left.iter().cloned());
            out.extend(right.iter().cloned());
        }
        OperatorId::Minus => {
            let mut remaining: Vec<&Value> = right.iter().collect();
            for item in left {
                match remaining.iter().position(|r| *r == item) {
                    Some(i) => {
                        remaining.swap_remove(i);
                    }
                    None => out.push(item.clone()),
                }
            }
        }
        OperatorId::Times => {
            let mut remaining: Vec<&Value> = right.iter().collect();
            for item in left {
                if let Some(i) = remaining.iter().position(|r| *r == item) {
                    remaining.swap_remove(i);
                    out.push(item.clone());
                }
            }
        }
        _ => return Err(ValueError::Unsupported { op }),
    }
    Ok(Value::Collection(out))
}

fn float_pair(op: OperatorId, args: &[Value]) -> ValueResult<Value> {
    numeric::arithmetic(
        op,
        number(arg(args, 0))?,
        number(arg(args, 1))?,
        TypeTag::Double,
    )
}

/// ROUND and TRUNC over numbers (by decimal places) or dates (by unit).
fn rounding(op: OperatorId, args: &[Value]) -> ValueResult<Value> {
    let value = arg(args, 0);
    let truncate = op == OperatorId::Trunc;

    if value.tag().has_date_part() {
        let unit = args.get(1).map(string).transpose()?.unwrap_or_default();
        let day = date(value)?;
        let day = if truncate {
            temporal::truncate_date(day, &unit)?
        } else {
            temporal::round_date(day, &unit)?
        };
        let midnight = day.and_time(NaiveTime::MIN);
        return Ok(match value {
            Value::Timestamp(_) => Value::Timestamp(midnight),
            Value::DateTime(_) => Value::DateTime(midnight),
            _ => Value::Date(day),
        });
    }

    let places = args.get(1).map(integer).transpose()?.unwrap_or(0);
    numeric::round(number(value)?, places, truncate)
}

fn shift_days(value: &Value, days: i64) -> ValueResult<Value> {
    let factor = match value {
        Value::Date(_) => 1,
        Value::Timestamp(_) => 86_400,
        Value::DateTime(_) => 86_400_000,
        other => return Err(ValueError::incompatible(other, "a date")),
    };
    let amount = days.checked_mul(factor).ok_or(ValueError::Overflow)?;
    temporal::shift(value, amount)
}

fn time_difference(left: &Value, right: &Value) -> ValueResult<Value> {
    let seconds = match (left, right) {
        (Value::Time(a), Value::Time(b)) => a.signed_duration_since(*b).num_seconds(),
        _ => temporal::datetime_part(left)?
            .signed_duration_since(temporal::datetime_part(right)?)
            .num_seconds(),
    };
    u32::try_from(seconds)
        .ok()
        .and_then(|s| NaiveTime::from_num_seconds_from_midnight_opt(s, 0))
        .map(Value::Time)
        .ok_or_else(|| ValueError::invalid(format!("time difference of {seconds} seconds")))
}

fn date_field(args: &[Value], field: impl Fn(NaiveDate) -> u32) -> ValueResult<Value> {
    let value = field(date(arg(args, 0))?);
    Ok(Value::Integer(value as i32))
}

fn time_field(args: &[Value], field: impl Fn(NaiveTime) -> u32) -> ValueResult<Value> {
    let value = field(temporal::time_part(arg(args, 0))?);
    Ok(Value::Integer(value as i32))
}

/// A date-time carrying the value's time of day; a bare TIME sits on the
/// epoch date.
fn time_bearing(value: &Value) -> ValueResult<NaiveDateTime> {
    match value {
        Value::Time(t) => Ok(NaiveDate::default().and_time(*t)),
        other => temporal::datetime_part(other),
    }
}

fn to_char(value: &Value, format: Option<&Value>) -> ValueResult<Value> {
    let Some(format) = format.filter(|f| !f.is_null()) else {
        return Ok(Value::String(value.to_text()));
    };
    let format = string(format)?;

    if value.tag().is_temporal() {
        let dt = time_bearing(value)?;
        return temporal::render(&dt, &temporal::oracle_format(&format)).map(Value::String);
    }

    // Numeric format models: the digits after the decimal point fix the
    // number of fractional digits.
    let places = format
        .split_once('.')
        .map(|(_, fraction)| fraction.chars().filter(|c| *c == '9' || *c == '0').count())
        .unwrap_or(0);
    let rounded = numeric::round(Number::Exact(number(value)?.to_decimal()?), places as i64, false)?;
    match rounded {
        Value::Numeric(mut d) => {
            d.rescale(places as u32);
            Ok(Value::String(d.to_string()))
        }
        other => Ok(Value::String(other.to_text())),
    }
}

fn parse_temporal(op: OperatorId, args: &[Value]) -> ValueResult<Value> {
    let input = string(arg(args, 0))?;
    let format = args
        .get(1)
        .filter(|f| !f.is_null())
        .map(string)
        .transpose()?
        .map(|f| temporal::oracle_format(&f));
    let target = match op {
        OperatorId::ToDate => TypeTag::Date,
        OperatorId::ToTime => TypeTag::Time,
        OperatorId::ToTimestamp => TypeTag::Timestamp,
        _ => TypeTag::DateTime,
    };
    let invalid = || ValueError::incompatible(arg(args, 0), target);

    let Some(format) = format else {
        return cast_value(&Value::String(input.clone()), &Domain::of(target));
    };
    let parsed = match target {
        TypeTag::Date => NaiveDate::parse_from_str(input.trim(), &format).map(Value::Date),
        TypeTag::Time => NaiveTime::parse_from_str(input.trim(), &format).map(Value::Time),
        TypeTag::Timestamp => NaiveDateTime::parse_from_str(input.trim(), &format)
            .map(|dt| Value::Timestamp(temporal::to_seconds(dt))),
        _ => NaiveDateTime::parse_from_str(input.trim(), &format)
            .map(|dt| Value::DateTime(temporal::to_millis(dt))),
    };
    parsed.map_err(|_| invalid())
}
