//! Dynamic values seen by the template evaluator
//!
//! `Value` is what the caller side holds: it carries no static type, so the
//! bridge has to work out which native type each value should become.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;
use num_traits::FromPrimitive;

use crate::native::NativeRef;

/// Dynamically-typed value
///
/// Sequences and maps are owned and immutable once built, so values can be
/// shared between threads without locking.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value (`null` on the native side)
    Null,
    /// Boolean
    Bool(bool),
    /// Any number, see [`Number`]
    Number(Number),
    /// String
    Str(String),
    /// Sequence of values
    Seq(Vec<Value>),
    /// Mapping from string keys to values
    Map(BTreeMap<String, Value>),
    /// Native object the evaluator does not model
    Object(NativeRef),
}

/// Dynamic number
///
/// The evaluator does not track numeric widths. The bridge derives a natural
/// native type from the representation and the magnitude.
#[derive(Debug, Clone)]
pub enum Number {
    /// Integral value that fits in 64 bits
    Int(i64),
    /// Arbitrary precision integral value
    Big(BigInt),
    /// Floating point value
    Float(f64),
}

impl Number {
    /// True when the number has no fractional part (and is finite).
    pub fn is_integral(&self) -> bool {
        match self {
            Number::Int(_) | Number::Big(_) => true,
            Number::Float(v) => v.is_finite() && v.fract() == 0.0,
        }
    }

    /// Integral value as a `BigInt`, if the number is integral.
    pub fn to_bigint(&self) -> Option<BigInt> {
        match self {
            Number::Int(v) => Some(BigInt::from(*v)),
            Number::Big(v) => Some(v.clone()),
            Number::Float(v) if self.is_integral() => BigInt::from_f64(*v),
            Number::Float(_) => None,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a == b,
            (Number::Float(_), _) | (_, Number::Float(_)) => {
                // Mixed float/integral: equal only when both are the same integer.
                match (self.to_bigint(), other.to_bigint()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            _ => self.to_bigint() == other.to_bigint(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{}", v),
            Number::Big(v) => write!(f, "{}", v),
            Number::Float(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{}.0", v)
                } else {
                    write!(f, "{}", v)
                }
            }
        }
    }
}

impl Value {
    /// Short description of the value's dynamic type, used in diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Number(Number::Float(_)) => "number(float)".to_string(),
            Value::Number(_) => "number(integer)".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::Seq(_) => "sequence".to_string(),
            Value::Map(_) => "hash".to_string(),
            Value::Object(obj) => format!("object({})", obj.class().name()),
        }
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to extract as i64 (only for `Number::Int`)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(Number::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Try to extract the wrapped native object
    pub fn as_object(&self) -> Option<&NativeRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

// ========== From implementations ==========

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(Number::Int(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(Number::Int(v as i64))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(Number::Float(v))
    }
}

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Self {
        Value::Number(Number::Big(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<NativeRef> for Value {
    fn from(v: NativeRef) -> Self {
        Value::Object(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Seq(v.into_iter().map(Into::into).collect())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

// ========== Display implementation ==========

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Seq(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\"{}\": {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Object(obj) => write!(f, "{}", obj.describe()),
        }
    }
}

// ========== PartialEq implementation ==========

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // Native objects are compared by identity
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
