//! Candidate scoring.
//!
//! A signature is scored against an argument list by unwrapping every
//! argument for its parameter and summing the conversion costs. Scoring and
//! argument planning share [`plan_arguments`], so the invoker always passes
//! exactly the values the ranker scored.

#![deny(clippy::unwrap_used)]

use crate::class::MethodSignature;
use crate::config::CostModel;
use crate::convert::{unwrap, Unwrapped};
use crate::error::Failure;
use crate::native::NativeValue;
use crate::types::NativeType;
use crate::value::Value;

/// How well one signature fits one argument list.
///
/// The derived order puts every `Compatible` below `Incompatible`, and a
/// lower cost is a better match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchScore {
    Compatible(u64),
    Incompatible,
}

impl MatchScore {
    pub fn is_compatible(self) -> bool {
        matches!(self, MatchScore::Compatible(_))
    }

    pub fn cost(self) -> Option<u64> {
        match self {
            MatchScore::Compatible(cost) => Some(cost),
            MatchScore::Incompatible => None,
        }
    }
}

/// Native arguments ready for a call, with their total conversion cost.
#[derive(Debug, Clone)]
pub struct ArgumentPlan {
    pub values: Vec<NativeValue>,
    pub cost: u64,
}

impl ArgumentPlan {
    fn push(&mut self, converted: Unwrapped) {
        self.cost = self.cost.saturating_add(converted.cost);
        self.values.push(converted.value);
    }
}

/// Score `sig` for `args`.
pub fn score(sig: &MethodSignature, args: &[Value], costs: &CostModel) -> MatchScore {
    match plan_arguments(sig, args, costs) {
        Ok(plan) => MatchScore::Compatible(plan.cost),
        Err(_) => MatchScore::Incompatible,
    }
}

/// Unwrap `args` for the parameters of `sig`.
///
/// A variable-arity tail is packed into one `NativeValue::Array`. When the
/// caller passes exactly one value for the tail and it already converts to the
/// tail's array type, it is passed through as that array.
pub fn plan_arguments(
    sig: &MethodSignature,
    args: &[Value],
    costs: &CostModel,
) -> Result<ArgumentPlan, Failure> {
    let fixed = sig.fixed_param_count();
    let arity_ok = if sig.is_varargs() {
        args.len() >= fixed
    } else {
        args.len() == fixed
    };
    if !arity_ok {
        return Err(Failure::ArityMismatch {
            expected: sig.arity_description(),
            found: args.len(),
        });
    }

    let mut plan = ArgumentPlan {
        values: Vec::with_capacity(sig.params().len()),
        cost: 0,
    };
    for (index, (arg, param)) in args.iter().zip(sig.params()).take(fixed).enumerate() {
        plan.push(unwrap_argument(arg, param, index, costs)?);
    }

    if let Some(elem) = sig.vararg_element() {
        let tail = &args[fixed..];
        plan.push(pack_varargs(tail, elem, fixed, costs)?);
    }
    Ok(plan)
}

fn unwrap_argument(
    arg: &Value,
    param: &NativeType,
    index: usize,
    costs: &CostModel,
) -> Result<Unwrapped, Failure> {
    unwrap(arg, param, costs).map_err(|error| Failure::Argument { index, error })
}

/// Convert the variable-arity tail. `offset` is the index of its first argument.
fn pack_varargs(
    tail: &[Value],
    elem: &NativeType,
    offset: usize,
    costs: &CostModel,
) -> Result<Unwrapped, Failure> {
    if let [single @ Value::Seq(_)] = tail {
        let array_type = NativeType::array_of(elem.clone());
        if let Ok(array) = unwrap(single, &array_type, costs) {
            return Ok(array);
        }
    }

    let mut values = Vec::with_capacity(tail.len());
    let mut cost = 0u64;
    for (i, arg) in tail.iter().enumerate() {
        let converted = unwrap_argument(arg, elem, offset + i, costs)?;
        cost = cost.saturating_add(converted.cost);
        values.push(converted.value);
    }
    Ok(Unwrapped {
        value: NativeValue::Array(values),
        cost,
    })
}
