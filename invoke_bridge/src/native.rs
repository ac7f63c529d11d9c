//! Native side of the bridge.
//!
//! Native methods receive and return [`NativeValue`]s. Objects the evaluator
//! cannot model travel as [`NativeRef`]s and describe their own class through
//! [`NativeObject::class`].

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use num_bigint::BigInt;

use crate::class::ClassInfo;
use crate::error::InvocationError;

/// Error type native methods raise.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shared handle to a native object.
pub type NativeRef = Arc<dyn NativeObject>;

/// Callable body of a native method.
///
/// Receives the receiver (`None` for static methods) and the already
/// converted arguments. Variable-arity trailing arguments arrive packed in a
/// single [`NativeValue::Array`].
pub type MethodHandle = Arc<
    dyn Fn(Option<&NativeRef>, Vec<NativeValue>) -> Result<NativeValue, NativeFailure>
        + Send
        + Sync,
>;

/// A native object exposed to the evaluator.
pub trait NativeObject: Any + Send + Sync + fmt::Debug {
    /// Method table and supertypes of this object's class.
    fn class(&self) -> &ClassInfo;

    fn as_any(&self) -> &dyn Any;

    /// Human readable description used in diagnostics.
    fn describe(&self) -> String {
        format!("{} instance", self.class().name())
    }
}

/// Downcast the receiver of an instance method to its concrete type.
pub fn receiver_as<'a, T: NativeObject>(
    receiver: Option<&'a NativeRef>,
) -> Result<&'a T, NativeFailure> {
    let Some(receiver) = receiver else {
        return Err(NativeFailure::raised(format!(
            "instance method called without a receiver (expected {})",
            std::any::type_name::<T>()
        )));
    };
    receiver.as_any().downcast_ref::<T>().ok_or_else(|| {
        NativeFailure::raised(format!(
            "receiver {} is not a {}",
            receiver.describe(),
            std::any::type_name::<T>()
        ))
    })
}

/// Failure reported by a native method.
#[derive(Debug)]
pub enum NativeFailure {
    /// Error raised by the method body itself.
    Raised(BoxError),
    /// A nested bridge call failed; forwarded without re-wrapping.
    Bridge(InvocationError),
}

impl NativeFailure {
    pub fn raised(error: impl Into<BoxError>) -> Self {
        NativeFailure::Raised(error.into())
    }
}

impl From<InvocationError> for NativeFailure {
    fn from(err: InvocationError) -> Self {
        NativeFailure::Bridge(err)
    }
}

impl fmt::Display for NativeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeFailure::Raised(err) => write!(f, "{}", err),
            NativeFailure::Bridge(err) => write!(f, "{}", err),
        }
    }
}

/// Value on the native side of a call.
#[derive(Debug, Clone)]
pub enum NativeValue {
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    BigInt(BigInt),
    Str(String),
    Array(Vec<NativeValue>),
    List(Vec<NativeValue>),
    Map(BTreeMap<String, NativeValue>),
    Object(NativeRef),
}

impl NativeValue {
    /// Name of the native type this value carries.
    pub fn type_name(&self) -> String {
        match self {
            NativeValue::Null => "null".to_string(),
            NativeValue::Bool(_) => "bool".to_string(),
            NativeValue::Char(_) => "char".to_string(),
            NativeValue::I8(_) => "i8".to_string(),
            NativeValue::I16(_) => "i16".to_string(),
            NativeValue::I32(_) => "i32".to_string(),
            NativeValue::I64(_) => "i64".to_string(),
            NativeValue::F32(_) => "f32".to_string(),
            NativeValue::F64(_) => "f64".to_string(),
            NativeValue::BigInt(_) => "BigInt".to_string(),
            NativeValue::Str(_) => "String".to_string(),
            NativeValue::Array(_) => "array".to_string(),
            NativeValue::List(_) => "List".to_string(),
            NativeValue::Map(_) => "Map".to_string(),
            NativeValue::Object(obj) => obj.class().name().to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    /// Any integral primitive, widened to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NativeValue::I8(v) => Some(*v as i64),
            NativeValue::I16(v) => Some(*v as i64),
            NativeValue::I32(v) => Some(*v as i64),
            NativeValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Any numeric primitive, widened to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NativeValue::F32(v) => Some(*v as f64),
            NativeValue::F64(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of an array or list
    pub fn as_slice(&self) -> Option<&[NativeValue]> {
        match self {
            NativeValue::Array(items) | NativeValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for NativeValue {
    fn from(v: bool) -> Self {
        NativeValue::Bool(v)
    }
}

impl From<char> for NativeValue {
    fn from(v: char) -> Self {
        NativeValue::Char(v)
    }
}

impl From<i32> for NativeValue {
    fn from(v: i32) -> Self {
        NativeValue::I32(v)
    }
}

impl From<i64> for NativeValue {
    fn from(v: i64) -> Self {
        NativeValue::I64(v)
    }
}

impl From<f64> for NativeValue {
    fn from(v: f64) -> Self {
        NativeValue::F64(v)
    }
}

impl From<String> for NativeValue {
    fn from(v: String) -> Self {
        NativeValue::Str(v)
    }
}

impl From<&str> for NativeValue {
    fn from(v: &str) -> Self {
        NativeValue::Str(v.to_string())
    }
}

impl From<NativeRef> for NativeValue {
    fn from(v: NativeRef) -> Self {
        NativeValue::Object(v)
    }
}

impl From<()> for NativeValue {
    fn from(_: ()) -> Self {
        NativeValue::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_accessors_widen() {
        assert_eq!(NativeValue::I8(-4).as_i64(), Some(-4));
        assert_eq!(NativeValue::I32(7).as_f64(), Some(7.0));
        assert_eq!(NativeValue::F32(1.5).as_f64(), Some(1.5));
        assert_eq!(NativeValue::F64(1.5).as_i64(), None);
        assert_eq!(NativeValue::Str("x".into()).as_i64(), None);
    }

    #[test]
    fn test_raised_failure_keeps_message() {
        let failure = NativeFailure::raised("disk full");
        assert_eq!(failure.to_string(), "disk full");
        assert!(matches!(failure, NativeFailure::Raised(_)));
    }

    #[test]
    fn test_receiver_as_without_receiver() {
        #[derive(Debug)]
        struct Nothing;
        impl NativeObject for Nothing {
            fn class(&self) -> &ClassInfo {
                unreachable!("not called")
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }
        let result = receiver_as::<Nothing>(None);
        assert!(matches!(result, Err(NativeFailure::Raised(_))));
    }
}
