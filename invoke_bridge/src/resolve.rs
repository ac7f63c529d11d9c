//! Overload resolution.
//!
//! Resolution runs in two phases. Fixed-arity overloads are scored first, and
//! variable-arity overloads are considered only when none of them fits. Within
//! a phase the lowest [`MatchScore`] wins. Several overloads sharing the lowest
//! score is an [`Failure::AmbiguousOverload`]; there is no declaration-order
//! tie-break.

#![deny(clippy::unwrap_used)]

use crate::class::MethodSignature;
use crate::config::CostModel;
use crate::debug::dispatch_trace;
use crate::error::Failure;
use crate::score::{score, MatchScore};
use crate::value::Value;

/// Pick the overload of `signatures` that best fits `args`.
///
/// A single overload is returned without scoring; argument problems then
/// surface when the invoker plans the call.
pub fn resolve<'a>(
    signatures: &'a [MethodSignature],
    args: &[Value],
    costs: &CostModel,
) -> Result<&'a MethodSignature, Failure> {
    match signatures {
        [] => Err(no_applicable(signatures, args)),
        [only] => Ok(only),
        _ => {
            for varargs in [false, true] {
                let phase = signatures.iter().filter(|sig| sig.is_varargs() == varargs);
                if let Some(found) = best_of(phase, args, costs)? {
                    return Ok(found);
                }
            }
            Err(no_applicable(signatures, args))
        }
    }
}

/// Lowest-scoring signature of one phase, `None` when nothing fits.
fn best_of<'a>(
    phase: impl Iterator<Item = &'a MethodSignature>,
    args: &[Value],
    costs: &CostModel,
) -> Result<Option<&'a MethodSignature>, Failure> {
    let mut best: Vec<&'a MethodSignature> = Vec::new();
    let mut best_score = MatchScore::Incompatible;

    for sig in phase {
        let s = score(sig, args, costs);
        dispatch_trace!("score {} = {:?}", sig, s);
        if !s.is_compatible() {
            continue;
        }
        if s < best_score {
            best_score = s;
            best.clear();
            best.push(sig);
        } else if s == best_score {
            best.push(sig);
        }
    }

    match best.as_slice() {
        [] => Ok(None),
        [winner] => {
            dispatch_trace!("resolved {} ({:?})", winner, best_score);
            Ok(Some(*winner))
        }
        tied => {
            dispatch_trace!("ambiguous: {} overloads at {:?}", tied.len(), best_score);
            Err(Failure::AmbiguousOverload {
                arg_types: arg_types(args),
                candidates: describe_sorted(tied.iter().copied()),
            })
        }
    }
}

fn no_applicable(signatures: &[MethodSignature], args: &[Value]) -> Failure {
    dispatch_trace!("no applicable overload among {}", signatures.len());
    Failure::NoApplicableOverload {
        arg_types: arg_types(args),
        candidates: describe_sorted(signatures.iter()),
    }
}

fn arg_types(args: &[Value]) -> Vec<String> {
    args.iter().map(Value::type_name).collect()
}

fn describe_sorted<'a>(signatures: impl Iterator<Item = &'a MethodSignature>) -> Vec<String> {
    let mut described: Vec<String> = signatures.map(ToString::to_string).collect();
    described.sort();
    described
}
