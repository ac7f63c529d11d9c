//! Invoke Bridge
//!
//! Calls natively typed methods with dynamically typed arguments. Given a
//! receiver, a method name and a list of [`Value`]s, the bridge:
//!
//! - converts each argument to the parameter's [`NativeType`](types::NativeType)
//!   and scores how exact the conversion is
//! - picks the best overload, rejecting ties as ambiguous
//! - runs the native method and wraps its result back into a [`Value`]
//! - reports every failure as one [`InvocationError`] with receiver and
//!   method descriptions
//!
//! Native classes publish their methods through [`ClassInfo`]
//! (see [`class`] for an example).

#![deny(clippy::print_stderr)]

pub mod class;
pub mod config;
pub mod convert;
mod debug;
pub mod error;
pub mod invoke;
pub mod method;
pub mod native;
pub mod resolve;
pub mod score;
pub mod types;
pub mod value;

/// Prelude module for convenient imports
///
/// # Example
/// ```
/// use invoke_bridge::prelude::*;
///
/// let bridge = Bridge::default();
/// let err = bridge.method(&Value::from(1i64), "abs").unwrap_err();
/// assert_eq!(err.kind(), InvocationErrorKind::NoApplicableOverload);
/// ```
pub mod prelude {
    pub use super::class::{ClassInfo, MethodSignature};
    pub use super::config::{BridgeConfig, CostModel, ObjectMatch};
    pub use super::error::{InvocationError, InvocationErrorKind, InvocationResult};
    pub use super::invoke::ObjectWrapper;
    pub use super::method::{Bridge, CallableMethod, IndexedAccess, TemplateMethod};
    pub use super::native::{receiver_as, NativeFailure, NativeObject, NativeRef, NativeValue};
    pub use super::types::{NativeType, PrimitiveType};
    pub use super::value::{Number, Value};
}

pub use prelude::*;
