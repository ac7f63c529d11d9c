//! Invoking a resolved overload.
//!
//! The [`Invoker`] re-plans the arguments for the chosen signature, runs the
//! native handle through a [`CallSite`] and hands the native result to an
//! [`ObjectWrapper`]. Failures are returned as [`Failure`]s and translated by
//! the caller.

#![deny(clippy::unwrap_used)]

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::class::MethodSignature;
use crate::config::CostModel;
use crate::debug::dispatch_trace;
use crate::error::Failure;
use crate::native::{BoxError, NativeRef, NativeValue};
use crate::score::plan_arguments;
use crate::value::{Number, Value};

/// Converts native return values back into dynamic values.
pub trait ObjectWrapper: Send + Sync + fmt::Debug {
    fn wrap(&self, value: NativeValue) -> Result<Value, BoxError>;
}

/// Wrapper used when none is configured. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultObjectWrapper;

impl ObjectWrapper for DefaultObjectWrapper {
    fn wrap(&self, value: NativeValue) -> Result<Value, BoxError> {
        Ok(wrap_native(value))
    }
}

/// Structural native → dynamic conversion.
///
/// Integral primitives become `Number::Int`, floats `Number::Float`, a `char`
/// becomes a one-character string and arrays and lists both become sequences.
pub fn wrap_native(value: NativeValue) -> Value {
    match value {
        NativeValue::Null => Value::Null,
        NativeValue::Bool(b) => Value::Bool(b),
        NativeValue::Char(c) => Value::Str(c.to_string()),
        NativeValue::I8(v) => Value::Number(Number::Int(i64::from(v))),
        NativeValue::I16(v) => Value::Number(Number::Int(i64::from(v))),
        NativeValue::I32(v) => Value::Number(Number::Int(i64::from(v))),
        NativeValue::I64(v) => Value::Number(Number::Int(v)),
        NativeValue::F32(v) => Value::Number(Number::Float(f64::from(v))),
        NativeValue::F64(v) => Value::Number(Number::Float(v)),
        NativeValue::BigInt(v) => Value::Number(Number::Big(v)),
        NativeValue::Str(s) => Value::Str(s),
        NativeValue::Array(items) | NativeValue::List(items) => {
            Value::Seq(items.into_iter().map(wrap_native).collect())
        }
        NativeValue::Map(entries) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, wrap_native(v)))
                .collect(),
        ),
        NativeValue::Object(obj) => Value::Object(obj),
    }
}

/// One native call: receiver, resolved signature and converted arguments.
#[derive(Debug)]
pub struct CallSite<'a> {
    pub receiver: Option<NativeRef>,
    pub signature: &'a MethodSignature,
    pub arguments: Vec<NativeValue>,
}

impl CallSite<'_> {
    /// Run the native handle. A panic inside the handle is caught and
    /// reported as [`Failure::Panicked`].
    pub fn execute(self) -> Result<NativeValue, Failure> {
        let CallSite {
            receiver,
            signature,
            arguments,
        } = self;
        let handle = signature.handle();
        let outcome = catch_unwind(AssertUnwindSafe(|| handle(receiver.as_ref(), arguments)));
        match outcome {
            Ok(result) => result.map_err(Failure::Native),
            Err(payload) => Err(Failure::Panicked(panic_message(payload))),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Calls one resolved overload.
#[derive(Debug, Clone, Copy)]
pub struct Invoker<'a> {
    costs: &'a CostModel,
    wrapper: &'a dyn ObjectWrapper,
}

impl<'a> Invoker<'a> {
    pub fn new(costs: &'a CostModel, wrapper: &'a dyn ObjectWrapper) -> Self {
        Self { costs, wrapper }
    }

    pub fn invoke(
        &self,
        receiver: Option<&NativeRef>,
        signature: &MethodSignature,
        args: &[Value],
    ) -> Result<Value, Failure> {
        let plan = plan_arguments(signature, args, self.costs)?;
        let site = CallSite {
            receiver: receiver.cloned(),
            signature,
            arguments: plan.values,
        };
        let native = site.execute().map_err(|failure| {
            dispatch_trace!("{} failed: {:?}", signature, failure);
            failure
        })?;
        let wrapper = self.wrapper;
        match catch_unwind(AssertUnwindSafe(|| wrapper.wrap(native))) {
            Ok(result) => result.map_err(Failure::ResultConversion),
            Err(payload) => Err(Failure::ResultConversion(
                format!("object wrapper panicked: {}", panic_message(payload)).into(),
            )),
        }
    }
}
