//! Native invocation, error translation and the indexed-access surface.

mod common;

use std::error::Error as _;

use common::*;
use invoke_bridge::config::ConfigError;
use invoke_bridge::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn test_native_error_carries_cause_and_descriptions() {
    let err = call(&calculator(), "fail", &[]).unwrap_err();
    assert_eq!(err.kind(), InvocationErrorKind::NativeExceptionThrown);
    assert!(!err.receiver().is_empty());
    assert!(!err.method().is_empty());

    let cause = err.source().expect("cause is kept");
    assert!(cause.downcast_ref::<DiskFull>().is_some());
    insta::assert_snapshot!(err.to_string(), @r"
    NativeExceptionThrown: native method failed: disk full
      receiver: Calculator 'main'
      method: Calculator.fail()
    ");
}

#[test]
fn test_native_panic_is_native_exception() {
    let err = call(&calculator(), "explode", &[]).unwrap_err();
    assert_eq!(err.kind(), InvocationErrorKind::NativeExceptionThrown);
    assert_eq!(err.message(), "native method panicked: calculator exploded");
    assert!(err.cause().is_some());
}

#[test]
fn test_nested_bridge_error_passes_through_unchanged() {
    let err = call(&calculator(), "nested", &[]).unwrap_err();
    assert_eq!(err.kind(), InvocationErrorKind::AmbiguousOverload);
    assert_eq!(err.receiver(), "Inner instance");
    assert_eq!(err.method(), "Inner.pick (2 overloads)");
}

#[test]
fn test_nested_error_raised_as_boxed_error_is_not_rewrapped() {
    let err = call(&calculator(), "nested_raised", &[]).unwrap_err();
    assert_eq!(err.kind(), InvocationErrorKind::AmbiguousOverload);
    assert_eq!(err.receiver(), "Inner instance");
    assert_eq!(err.method(), "Inner.pick (2 overloads)");
}

#[test]
fn test_arity_mismatch_message() {
    let err = call(&calculator(), "add", &[Value::from(1i64)]).unwrap_err();
    assert_eq!(err.kind(), InvocationErrorKind::ArgumentConversionFailed);
    assert_eq!(err.message(), "expected 2 argument(s), got 1");
    assert!(err.kind().is_caller_side());
}

#[test]
fn test_at_matches_call() {
    let bridge = Bridge::default();
    let f = bridge.method(&calculator(), "f").unwrap();
    for i in [-3i64, 0, 7, i64::from(i32::MAX) + 1] {
        assert_eq!(f.at(i).unwrap(), f.call(&[Value::from(i)]).unwrap());
    }
    assert_eq!(f.at(7).unwrap(), Value::from("int:7"));
}

#[test]
fn test_size_and_items_are_not_supported() {
    let f = Bridge::default().method(&calculator(), "f").unwrap();
    let size = f.size().unwrap_err();
    let items = f.items().unwrap_err();
    assert_eq!(size.kind(), InvocationErrorKind::NoApplicableOverload);
    assert_eq!(items.kind(), InvocationErrorKind::NoApplicableOverload);
    assert_eq!(size.message(), items.message());
    insta::assert_snapshot!(size.message(), @r"
    getting the number of items or enumerating the items is not supported on method Calculator.f (2 overloads)
    (hint 1: call the method first and work with its return value; hint 2: getting items by index works, e.g. at(0))
    ");
}

#[test]
fn test_callable_method_display() {
    let bridge = Bridge::default();
    let add = bridge.method(&calculator(), "add").unwrap();
    assert_eq!(add.to_string(), "Calculator.add(i64, i64)");
    let describe = bridge.method(&calculator(), "describe").unwrap();
    assert_eq!(describe.to_string(), "Calculator.describe (2 overloads)");
}

#[test]
fn test_char_round_trip() {
    let result = call(&calculator(), "echo_char", &[Value::from("λ")]).unwrap();
    assert_eq!(result, Value::from("λ"));
    let code = call(&calculator(), "echo_char", &[Value::from(955i64)]).unwrap();
    assert_eq!(code, Value::from("λ"));
}

#[derive(Debug)]
struct NoObjects;

impl ObjectWrapper for NoObjects {
    fn wrap(&self, value: NativeValue) -> Result<Value, invoke_bridge::native::BoxError> {
        match value {
            NativeValue::Str(_) => Err("strings cannot be exposed".into()),
            other => Ok(invoke_bridge::invoke::wrap_native(other)),
        }
    }
}

#[test]
fn test_custom_wrapper_failure() {
    let bridge = Bridge::with_wrapper(BridgeConfig::default(), NoObjects);
    let label = bridge.method(&calculator(), "label").unwrap();
    let err = label.call(&[]).unwrap_err();
    assert_eq!(err.kind(), InvocationErrorKind::ResultConversionFailed);
    assert_eq!(
        err.message(),
        "return value cannot be converted: strings cannot be exposed"
    );
    assert!(!err.kind().is_caller_side());

    let sum = bridge.method(&calculator(), "add").unwrap();
    assert_eq!(sum.call(&[Value::from(1i64), Value::from(1i64)]).unwrap(), Value::from(2i64));
}

#[derive(Debug)]
struct BrokenWrapper;

impl ObjectWrapper for BrokenWrapper {
    fn wrap(&self, _value: NativeValue) -> Result<Value, invoke_bridge::native::BoxError> {
        panic!("wrapper lost its table")
    }
}

#[test]
fn test_wrapper_panic_stays_inside_call() {
    let bridge = Bridge::with_wrapper(BridgeConfig::default(), BrokenWrapper);
    let err = bridge.method(&calculator(), "label").unwrap().call(&[]).unwrap_err();
    assert_eq!(err.kind(), InvocationErrorKind::ResultConversionFailed);
    assert_eq!(
        err.message(),
        "return value cannot be converted: object wrapper panicked: wrapper lost its table"
    );
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bridge.toml");
    std::fs::write(&path, "[costs]\nwidening = 20\nboxing = 200\n").unwrap();
    let config = BridgeConfig::from_path(&path).unwrap();
    assert_eq!(config.costs.widening, 20);
    assert_eq!(config.costs.boxing, 200);

    let bridge = Bridge::new(config);
    let f = bridge.method(&calculator(), "f").unwrap();
    assert_eq!(f.call(&[Value::from(1i64)]).unwrap(), Value::from("int:1"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = BridgeConfig::from_toml_str("[costs]\nassignability = 50\n").unwrap_err();
    assert!(matches!(err, ConfigError::CostOrdering { .. }), "{:?}", err);
}

#[test]
fn test_extreme_widening_step_does_not_panic() {
    let config = BridgeConfig {
        costs: CostModel {
            widening_step: u64::MAX,
            ..CostModel::default()
        },
    };
    let err = Bridge::validated(config.clone()).unwrap_err();
    assert!(matches!(err, ConfigError::CostOrdering { .. }), "{:?}", err);

    // Scoring `f(f64)` saturates; `f(i32)` is exact.
    let bridge = Bridge::new(config);
    let f = bridge.method(&calculator(), "f").unwrap();
    assert_eq!(f.call(&[Value::from(3i64)]).unwrap(), Value::from("int:3"));
}
