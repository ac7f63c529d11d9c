//! Dynamic → native value conversion
//!
//! [`unwrap`] converts one [`Value`] for one target [`NativeType`] and reports
//! how far the conversion strays from an exact match. The cost tiers come
//! from the [`CostModel`]:
//!
//! | conversion                                  | cost                      |
//! |---------------------------------------------|---------------------------|
//! | exact natural type                          | 0                         |
//! | numeric widening (`i32` → `i64`, → `f64`)   | `widening + step × ranks` |
//! | boxing (`i32` → `Boxed<i32>`)               | `+ boxing`                |
//! | supertype / interface / `Number` / `Object` | `assignability + depth`   |
//! | range-checked numeric narrowing             | `narrowing`               |
//!
//! Integral values never get truncated: a value that does not fit the target
//! range is [`Incompatible`].

#![deny(clippy::unwrap_used)]

use std::collections::BTreeMap;

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};
use thiserror::Error;

use crate::config::CostModel;
use crate::native::{NativeRef, NativeValue};
use crate::types::{NativeType, PrimitiveType, BIGINT_RANK};
use crate::value::{Number, Value};

/// A converted argument and the cost of the conversion.
#[derive(Debug, Clone)]
pub struct Unwrapped {
    pub value: NativeValue,
    pub cost: u64,
}

impl Unwrapped {
    fn new(value: NativeValue, cost: u64) -> Self {
        Self { value, cost }
    }

    fn plus(mut self, extra: u64) -> Self {
        self.cost = self.cost.saturating_add(extra);
        self
    }
}

/// The value cannot be passed as the target type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert {found} to {target}: {reason}")]
pub struct Incompatible {
    /// Dynamic type of the rejected value
    pub found: String,
    /// Requested native type
    pub target: String,
    pub reason: String,
}

impl Incompatible {
    fn new(value: &Value, target: &NativeType, reason: String) -> Self {
        Self {
            found: value.type_name(),
            target: target.to_string(),
            reason,
        }
    }
}

type Conversion = Result<Unwrapped, String>;

/// Convert `value` for a parameter of type `target`.
///
/// Pure: the input is never modified, and the same input always yields the
/// same result and cost.
pub fn unwrap(
    value: &Value,
    target: &NativeType,
    costs: &CostModel,
) -> Result<Unwrapped, Incompatible> {
    convert(value, target, costs).map_err(|reason| Incompatible::new(value, target, reason))
}

fn convert(value: &Value, target: &NativeType, costs: &CostModel) -> Conversion {
    if let NativeType::Object = target {
        return to_object(value, costs);
    }
    match value {
        Value::Null => null_to(target, costs),
        Value::Bool(b) => bool_to(*b, target, costs),
        Value::Number(n) => number_to(n, target, costs),
        Value::Str(s) => str_to(s, target, costs),
        Value::Seq(items) => seq_to(items, target, costs),
        Value::Map(entries) => map_to(entries, target, costs),
        Value::Object(obj) => object_to(obj, target, costs),
    }
}

// ========== Null ==========

fn null_to(target: &NativeType, costs: &CostModel) -> Conversion {
    if !target.is_nullable() {
        return Err(format!("null is not a legal {} value", target));
    }
    let is_object = matches!(target, NativeType::Object);
    Ok(Unwrapped::new(
        NativeValue::Null,
        costs.null_cost(target.generality(), is_object),
    ))
}

// ========== Object (root type) ==========

fn to_object(value: &Value, costs: &CostModel) -> Conversion {
    let (native, depth) = match value {
        Value::Null => return null_to(&NativeType::Object, costs),
        Value::Bool(b) => (NativeValue::Bool(*b), 1),
        // Number sits between the numeric types and Object
        Value::Number(n) => (natural_value(n), 2),
        Value::Str(s) => (NativeValue::Str(s.clone()), 1),
        Value::Seq(items) => {
            let elements = items
                .iter()
                .map(|item| to_object(item, costs).map(|u| u.value))
                .collect::<Result<Vec<_>, _>>()?;
            (NativeValue::Array(elements), 1)
        }
        Value::Map(entries) => {
            let converted = entries
                .iter()
                .map(|(k, v)| to_object(v, costs).map(|u| (k.clone(), u.value)))
                .collect::<Result<BTreeMap<_, _>, _>>()?;
            (NativeValue::Map(converted), 1)
        }
        Value::Object(obj) => (
            NativeValue::Object(obj.clone()),
            obj.class().supertypes().len() as u64 + 1,
        ),
    };
    Ok(Unwrapped::new(native, costs.object_cost(depth)))
}

// ========== Booleans ==========

fn bool_to(b: bool, target: &NativeType, costs: &CostModel) -> Conversion {
    match target {
        NativeType::Primitive(PrimitiveType::Bool) => Ok(Unwrapped::new(NativeValue::Bool(b), 0)),
        NativeType::Boxed(PrimitiveType::Bool) => {
            Ok(Unwrapped::new(NativeValue::Bool(b), costs.boxing))
        }
        _ => Err("booleans only convert to bool".to_string()),
    }
}

// ========== Numbers ==========

/// Rank of the number's natural native type on the widening ladder.
fn natural_rank(n: &Number) -> u8 {
    match n {
        Number::Int(v) if i32::try_from(*v).is_ok() => 2,
        Number::Int(_) => 3,
        Number::Big(_) => BIGINT_RANK,
        Number::Float(_) => 5,
    }
}

/// The number as its natural native type.
pub(crate) fn natural_value(n: &Number) -> NativeValue {
    match n {
        Number::Int(v) => match i32::try_from(*v) {
            Ok(small) => NativeValue::I32(small),
            Err(_) => NativeValue::I64(*v),
        },
        Number::Big(v) => NativeValue::BigInt(v.clone()),
        Number::Float(v) => NativeValue::F64(*v),
    }
}

fn number_to(n: &Number, target: &NativeType, costs: &CostModel) -> Conversion {
    match target {
        NativeType::Primitive(p) => number_to_primitive(n, *p, costs),
        NativeType::Boxed(p) => number_to_primitive(n, *p, costs).map(|u| u.plus(costs.boxing)),
        NativeType::BigInt => {
            let big = integral_value(n)?;
            let cost = if matches!(n, Number::Float(_)) {
                costs.narrowing
            } else {
                costs.numeric_cost(natural_rank(n), BIGINT_RANK)
            };
            Ok(Unwrapped::new(NativeValue::BigInt(big), cost))
        }
        NativeType::Number => Ok(Unwrapped::new(
            natural_value(n),
            costs.assignability_cost(1),
        )),
        _ => Err("numbers only convert to numeric types".to_string()),
    }
}

fn number_to_primitive(n: &Number, target: PrimitiveType, costs: &CostModel) -> Conversion {
    if target == PrimitiveType::Char {
        let c = integral_value(n)?
            .to_u32()
            .and_then(char::from_u32)
            .ok_or_else(|| format!("{} is not a valid Unicode scalar value", n))?;
        return Ok(Unwrapped::new(NativeValue::Char(c), costs.narrowing));
    }
    let Some(target_rank) = target.numeric_rank() else {
        return Err(format!("numbers do not convert to {}", target.name()));
    };
    let value = match target {
        PrimitiveType::I8 => NativeValue::I8(fit_integral(n, "i8", |b| b.to_i8())?),
        PrimitiveType::I16 => NativeValue::I16(fit_integral(n, "i16", |b| b.to_i16())?),
        PrimitiveType::I32 => NativeValue::I32(fit_integral(n, "i32", |b| b.to_i32())?),
        PrimitiveType::I64 => NativeValue::I64(fit_integral(n, "i64", |b| b.to_i64())?),
        PrimitiveType::F32 => NativeValue::F32(to_f32(n)?),
        PrimitiveType::F64 => NativeValue::F64(to_f64(n)?),
        PrimitiveType::Bool | PrimitiveType::Char => {
            return Err(format!("numbers do not convert to {}", target.name()))
        }
    };
    Ok(Unwrapped::new(
        value,
        costs.numeric_cost(natural_rank(n), target_rank),
    ))
}

fn integral_value(n: &Number) -> Result<BigInt, String> {
    n.to_bigint()
        .ok_or_else(|| format!("{} is not an integral value", n))
}

/// Range-checked integral conversion.
fn fit_integral<T>(
    n: &Number,
    type_name: &str,
    narrow: impl Fn(&BigInt) -> Option<T>,
) -> Result<T, String> {
    let big = integral_value(n)?;
    narrow(&big).ok_or_else(|| format!("{} is out of range for {}", n, type_name))
}

/// Integral values must be exactly representable; floats pass through.
fn to_f64(n: &Number) -> Result<f64, String> {
    match n {
        Number::Float(v) => Ok(*v),
        Number::Int(v) => {
            let f = *v as f64;
            if f as i128 == i128::from(*v) {
                Ok(f)
            } else {
                Err(format!("{} is not exactly representable as f64", v))
            }
        }
        Number::Big(v) => match v.to_f64() {
            Some(f) if f.is_finite() && BigInt::from_f64(f).as_ref() == Some(v) => Ok(f),
            _ => Err(format!("{} is not exactly representable as f64", v)),
        },
    }
}

/// Like [`to_f64`]; finite floats outside the f32 range are rejected.
fn to_f32(n: &Number) -> Result<f32, String> {
    match n {
        Number::Float(v) => {
            if v.is_finite() && v.abs() > f32::MAX as f64 {
                Err(format!("{} is out of range for f32", v))
            } else {
                Ok(*v as f32)
            }
        }
        Number::Int(v) => {
            let f = *v as f32;
            if f as i128 == i128::from(*v) {
                Ok(f)
            } else {
                Err(format!("{} is not exactly representable as f32", v))
            }
        }
        Number::Big(v) => match v.to_f32() {
            Some(f) if f.is_finite() && BigInt::from_f32(f).as_ref() == Some(v) => Ok(f),
            _ => Err(format!("{} is not exactly representable as f32", v)),
        },
    }
}

// ========== Strings ==========

fn str_to(s: &str, target: &NativeType, costs: &CostModel) -> Conversion {
    match target {
        NativeType::String => Ok(Unwrapped::new(NativeValue::Str(s.to_string()), 0)),
        NativeType::Primitive(PrimitiveType::Char) => {
            single_char(s).map(|c| Unwrapped::new(NativeValue::Char(c), costs.widening))
        }
        NativeType::Boxed(PrimitiveType::Char) => {
            single_char(s).map(|c| Unwrapped::new(NativeValue::Char(c), costs.boxing))
        }
        _ => Err("strings only convert to String or char".to_string()),
    }
}

fn single_char(s: &str) -> Result<char, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(format!(
            "string must have exactly one character, got {}",
            s.chars().count()
        )),
    }
}

// ========== Sequences and maps ==========

/// Convert every element; the container costs as much as its worst element.
fn convert_elements<'a>(
    items: impl Iterator<Item = &'a Value>,
    elem: &NativeType,
    costs: &CostModel,
) -> Result<(Vec<NativeValue>, u64), String> {
    let mut converted = Vec::new();
    let mut worst = 0;
    for (i, item) in items.enumerate() {
        let u = convert(item, elem, costs).map_err(|reason| format!("element {}: {}", i, reason))?;
        worst = worst.max(u.cost);
        converted.push(u.value);
    }
    Ok((converted, worst))
}

fn seq_to(items: &[Value], target: &NativeType, costs: &CostModel) -> Conversion {
    match target {
        NativeType::Array(elem) => {
            let (values, cost) = convert_elements(items.iter(), elem, costs)?;
            Ok(Unwrapped::new(NativeValue::Array(values), cost))
        }
        NativeType::List(elem) => {
            let (values, cost) = convert_elements(items.iter(), elem, costs)?;
            Ok(Unwrapped::new(NativeValue::List(values), cost).plus(costs.assignability_step))
        }
        _ => Err("sequences only convert to arrays or lists".to_string()),
    }
}

fn map_to(entries: &BTreeMap<String, Value>, target: &NativeType, costs: &CostModel) -> Conversion {
    let NativeType::Map(elem) = target else {
        return Err("hashes only convert to maps".to_string());
    };
    let mut converted = BTreeMap::new();
    let mut worst = 0;
    for (key, item) in entries {
        let u = convert(item, elem, costs).map_err(|reason| format!("key '{}': {}", key, reason))?;
        worst = worst.max(u.cost);
        converted.insert(key.clone(), u.value);
    }
    Ok(Unwrapped::new(NativeValue::Map(converted), worst))
}

// ========== Wrapped native objects ==========

fn object_to(obj: &NativeRef, target: &NativeType, costs: &CostModel) -> Conversion {
    let class = obj.class();
    let NativeType::Class(name) = target else {
        return Err(format!("{} is not assignable to {}", class.name(), target));
    };
    match class.supertype_distance(name) {
        Some(0) => Ok(Unwrapped::new(NativeValue::Object(obj.clone()), 0)),
        Some(depth) => Ok(Unwrapped::new(
            NativeValue::Object(obj.clone()),
            costs.assignability_cost(depth as u64),
        )),
        None => Err(format!("{} is not assignable to {}", class.name(), name)),
    }
}
