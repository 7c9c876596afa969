//! Runtime values and the engine that computes with them.
//!
//! This module provides:
//! - `Value`, the literal payload of expression nodes
//! - `ValueEngine`, the cast/apply/compare interface the constant folder uses
//! - `StandardValueEngine`, its default implementation

pub mod cast;
pub mod engine;
pub mod numeric;
pub mod temporal;
pub mod text;

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::catalog::OperatorId;
use crate::config::SessionContext;
use crate::types::{CollationId, Domain, TypeTag};

pub use engine::StandardValueEngine;

/// A single SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Numeric(Decimal),
    Monetary(Decimal),
    /// Any character string, including CLOB contents
    String(String),
    /// Bit string, most significant bit first; also BLOB contents
    Bits(Vec<bool>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    DateTime(NaiveDateTime),
    Logical(bool),
    /// Enumeration value: 1-based position and label
    Enum { index: u16, label: String },
    Collection(Vec<Value>),
}

impl Value {
    /// The natural type of this value when it appears as a literal.
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::SmallInt(_) => TypeTag::SmallInt,
            Value::Integer(_) => TypeTag::Integer,
            Value::BigInt(_) => TypeTag::BigInt,
            Value::Float(_) => TypeTag::Float,
            Value::Double(_) => TypeTag::Double,
            Value::Numeric(_) => TypeTag::Numeric,
            Value::Monetary(_) => TypeTag::Monetary,
            Value::String(_) => TypeTag::VarChar,
            Value::Bits(_) => TypeTag::VarBit,
            Value::Date(_) => TypeTag::Date,
            Value::Time(_) => TypeTag::Time,
            Value::Timestamp(_) => TypeTag::Timestamp,
            Value::DateTime(_) => TypeTag::DateTime,
            Value::Logical(_) => TypeTag::Logical,
            Value::Enum { .. } => TypeTag::Enumeration,
            Value::Collection(_) => TypeTag::Sequence,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Logical(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Enum { label, .. } => Some(label),
            _ => None,
        }
    }

    /// Integral value of exact integer kinds.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::SmallInt(v) => Some(i64::from(*v)),
            Value::Integer(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Text of the value as a cast to a character string produces it.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::SmallInt(v) => v.to_string(),
            Value::Integer(v) => v.to_string(),
            Value::BigInt(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Numeric(v) | Value::Monetary(v) => v.to_string(),
            Value::String(s) => s.clone(),
            Value::Bits(bits) => bits.iter().map(|b| if *b { '1' } else { '0' }).collect(),
            Value::Date(d) => d.format(temporal::DATE_FORMAT).to_string(),
            Value::Time(t) => t.format(temporal::TIME_FORMAT).to_string(),
            Value::Timestamp(ts) => ts.format(temporal::TIMESTAMP_FORMAT).to_string(),
            Value::DateTime(dt) => dt.format(temporal::DATETIME_FORMAT).to_string(),
            Value::Logical(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Enum { label, .. } => label.clone(),
            Value::Collection(items) => {
                let inner: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                format!("{{{}}}", inner.join(", "))
            }
        }
    }
}

impl fmt::Display for Value {
    /// SQL literal syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Value::Enum { label, .. } => write!(f, "'{}'", label.replace('\'', "''")),
            Value::Bits(_) => write!(f, "B'{}'", self.to_text()),
            Value::Date(_) => write!(f, "DATE'{}'", self.to_text()),
            Value::Time(_) => write!(f, "TIME'{}'", self.to_text()),
            Value::Timestamp(_) => write!(f, "TIMESTAMP'{}'", self.to_text()),
            Value::DateTime(_) => write!(f, "DATETIME'{}'", self.to_text()),
            Value::Logical(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::Monetary(v) => write!(f, "${v}"),
            _ => write!(f, "{}", self.to_text()),
        }
    }
}

/// Failures of the value engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("numeric overflow")]
    Overflow,

    #[error("division by zero")]
    ZeroDivide,

    #[error("cannot convert {value} to {target}")]
    Incompatible { value: String, target: String },

    /// Argument outside the function's domain
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The engine does not compute this operator at compile time
    #[error("{op} cannot be evaluated here")]
    Unsupported { op: OperatorId },

    #[error("out of memory")]
    OutOfMemory,
}

impl ValueError {
    pub(crate) fn incompatible(value: &Value, target: impl fmt::Display) -> Self {
        ValueError::Incompatible {
            value: value.to_string(),
            target: target.to_string(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ValueError::InvalidArgument {
            message: message.into(),
        }
    }
}

pub type ValueResult<T> = Result<T, ValueError>;

/// Inputs an operator may observe besides its arguments.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub session: &'a SessionContext,
    /// Collation unified over the operator's string operands.
    pub collation: Option<CollationId>,
}

impl<'a> EvalContext<'a> {
    pub fn new(session: &'a SessionContext) -> Self {
        Self {
            session,
            collation: None,
        }
    }

    pub fn with_collation(mut self, collation: Option<CollationId>) -> Self {
        self.collation = collation;
        self
    }
}

/// Computes with values on behalf of the constant folder.
pub trait ValueEngine {
    /// Convert `value` to `target`, failing on overflow or incompatibility.
    fn cast(&self, value: &Value, target: &Domain) -> ValueResult<Value>;

    /// Evaluate `op` over `args`, producing a value of domain `target`.
    fn apply(
        &self,
        op: OperatorId,
        args: &[Value],
        target: &Domain,
        ctx: &EvalContext<'_>,
    ) -> ValueResult<Value>;

    /// Order two values; `None` when either is NULL.
    fn compare(
        &self,
        left: &Value,
        right: &Value,
        collation: Option<CollationId>,
    ) -> ValueResult<Option<Ordering>>;
}
