//! Method tables for native classes.
//!
//! A [`ClassInfo`] is built once per native class and never mutated again.
//! Classes usually publish it through a lazy static:
//!
//! ```
//! use invoke_bridge::class::{ClassInfo, MethodSignature};
//! use invoke_bridge::native::NativeValue;
//! use invoke_bridge::types::{NativeType, PrimitiveType};
//! use once_cell::sync::Lazy;
//!
//! static COUNTER: Lazy<ClassInfo> = Lazy::new(|| {
//!     ClassInfo::builder("Counter")
//!         .static_method(MethodSignature::new(
//!             "twice",
//!             vec![NativeType::Primitive(PrimitiveType::I32)],
//!             |_, args| Ok(NativeValue::I64(args[0].as_i64().unwrap_or(0) * 2)),
//!         ))
//!         .build()
//! });
//!
//! assert!(COUNTER.static_overloads("twice").is_some());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::native::{MethodHandle, NativeFailure, NativeRef, NativeValue};
use crate::types::NativeType;

/// One native method overload.
#[derive(Clone)]
pub struct MethodSignature {
    owner: String,
    name: String,
    params: Vec<NativeType>,
    /// Last parameter is the element type of a variable-arity tail
    varargs: bool,
    is_static: bool,
    handle: MethodHandle,
}

impl MethodSignature {
    pub fn new<F>(name: impl Into<String>, params: Vec<NativeType>, handle: F) -> Self
    where
        F: Fn(Option<&NativeRef>, Vec<NativeValue>) -> Result<NativeValue, NativeFailure>
            + Send
            + Sync
            + 'static,
    {
        Self {
            owner: String::new(),
            name: name.into(),
            params,
            varargs: false,
            is_static: false,
            handle: Arc::new(handle),
        }
    }

    /// Mark the last parameter as variable-arity. Its type is then the
    /// element type of the trailing arguments.
    pub fn varargs(mut self) -> Self {
        self.varargs = !self.params.is_empty();
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[NativeType] {
        &self.params
    }

    pub fn is_varargs(&self) -> bool {
        self.varargs
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Number of parameters before the variable-arity tail.
    pub fn fixed_param_count(&self) -> usize {
        if self.varargs {
            self.params.len() - 1
        } else {
            self.params.len()
        }
    }

    /// Element type of the variable-arity tail.
    pub fn vararg_element(&self) -> Option<&NativeType> {
        if self.varargs {
            self.params.last()
        } else {
            None
        }
    }

    pub fn handle(&self) -> &MethodHandle {
        &self.handle
    }

    /// Same parameter list and arity kind.
    pub fn same_params(&self, other: &MethodSignature) -> bool {
        self.varargs == other.varargs && self.params == other.params
    }

    /// Arity description used in mismatch messages, e.g. `2` or `at least 1`.
    pub(crate) fn arity_description(&self) -> String {
        if self.varargs {
            format!("at least {}", self.fixed_param_count())
        } else {
            self.params.len().to_string()
        }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.owner.is_empty() {
            write!(f, "{}(", self.name)?;
        } else {
            write!(f, "{}.{}(", self.owner, self.name)?;
        }
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
            if self.varargs && i + 1 == self.params.len() {
                write!(f, "...")?;
            }
        }
        write!(f, ")")
    }
}

impl fmt::Debug for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSignature")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("varargs", &self.varargs)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

/// Immutable method table of one native class.
#[derive(Debug)]
pub struct ClassInfo {
    name: String,
    /// Declared supertypes, nearest first
    supertypes: Vec<String>,
    methods: HashMap<String, Arc<[MethodSignature]>>,
    static_methods: HashMap<String, Arc<[MethodSignature]>>,
}

impl ClassInfo {
    pub fn builder(name: impl Into<String>) -> ClassInfoBuilder {
        ClassInfoBuilder {
            name: name.into(),
            supertypes: Vec::new(),
            methods: HashMap::new(),
            static_methods: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    /// Distance from this class to `name`: 0 for the class itself, `k + 1`
    /// for its k-th declared supertype, `None` when unrelated.
    pub fn supertype_distance(&self, name: &str) -> Option<usize> {
        if self.name == name {
            return Some(0);
        }
        self.supertypes
            .iter()
            .position(|s| s == name)
            .map(|k| k + 1)
    }

    /// Instance method overloads sharing `name`.
    pub fn overloads(&self, name: &str) -> Option<&Arc<[MethodSignature]>> {
        self.methods.get(name)
    }

    /// Static method overloads sharing `name`.
    pub fn static_overloads(&self, name: &str) -> Option<&Arc<[MethodSignature]>> {
        self.static_methods.get(name)
    }
}

/// Collects overloads for a [`ClassInfo`].
#[derive(Debug)]
pub struct ClassInfoBuilder {
    name: String,
    supertypes: Vec<String>,
    methods: HashMap<String, Vec<MethodSignature>>,
    static_methods: HashMap<String, Vec<MethodSignature>>,
}

impl ClassInfoBuilder {
    /// Declare a supertype. Call in order from nearest to farthest.
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn method(mut self, sig: MethodSignature) -> Self {
        let sig = MethodSignature {
            owner: self.name.clone(),
            is_static: false,
            ..sig
        };
        add_overload(&mut self.methods, sig);
        self
    }

    pub fn static_method(mut self, sig: MethodSignature) -> Self {
        let sig = MethodSignature {
            owner: self.name.clone(),
            is_static: true,
            ..sig
        };
        add_overload(&mut self.static_methods, sig);
        self
    }

    pub fn build(self) -> ClassInfo {
        ClassInfo {
            name: self.name,
            supertypes: self.supertypes,
            methods: freeze(self.methods),
            static_methods: freeze(self.static_methods),
        }
    }
}

/// Add an overload, replacing an existing one with identical parameters.
fn add_overload(table: &mut HashMap<String, Vec<MethodSignature>>, sig: MethodSignature) {
    let overloads = table.entry(sig.name.clone()).or_default();
    if let Some(pos) = overloads.iter().position(|existing| existing.same_params(&sig)) {
        overloads[pos] = sig;
    } else {
        overloads.push(sig);
    }
}

fn freeze(
    table: HashMap<String, Vec<MethodSignature>>,
) -> HashMap<String, Arc<[MethodSignature]>> {
    table
        .into_iter()
        .map(|(name, overloads)| (name, Arc::from(overloads)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveType;

    fn constant(name: &str, params: Vec<NativeType>, result: i32) -> MethodSignature {
        MethodSignature::new(name, params, move |_, _| Ok(NativeValue::I32(result)))
    }

    #[test]
    fn test_identical_params_replace_existing_overload() {
        let int = NativeType::Primitive(PrimitiveType::I32);
        let info = ClassInfo::builder("Calc")
            .method(constant("f", vec![int.clone()], 1))
            .method(constant("f", vec![NativeType::String], 2))
            .method(constant("f", vec![int.clone()], 3))
            .build();

        let overloads = info.overloads("f").unwrap();
        assert_eq!(overloads.len(), 2);
        let replaced = overloads.iter().find(|s| s.params() == [int.clone()]).unwrap();
        let result = (replaced.handle())(None, vec![]).unwrap();
        assert!(matches!(result, NativeValue::I32(3)));
    }

    #[test]
    fn test_varargs_is_distinct_from_array_param() {
        let arr = NativeType::array_of(NativeType::String);
        let info = ClassInfo::builder("Calc")
            .method(constant("g", vec![arr.clone()], 1))
            .method(constant("g", vec![NativeType::String], 2).varargs())
            .build();
        assert_eq!(info.overloads("g").unwrap().len(), 2);
    }

    #[test]
    fn test_owner_and_static_flag_set_by_builder() {
        let info = ClassInfo::builder("Math")
            .static_method(constant("abs", vec![NativeType::Number], 0))
            .build();
        let sig = &info.static_overloads("abs").unwrap()[0];
        assert_eq!(sig.owner(), "Math");
        assert!(sig.is_static());
        assert!(info.overloads("abs").is_none());
        assert_eq!(sig.to_string(), "Math.abs(Number)");
    }

    #[test]
    fn test_signature_display_marks_varargs() {
        let sig = constant(
            "join",
            vec![NativeType::String, NativeType::Object],
            0,
        )
        .varargs();
        assert_eq!(sig.to_string(), "join(String, Object...)");
        assert_eq!(sig.fixed_param_count(), 1);
        assert_eq!(sig.arity_description(), "at least 1");
    }

    #[test]
    fn test_supertype_distance() {
        let info = ClassInfo::builder("Dog")
            .extends("Animal")
            .extends("Named")
            .build();
        assert_eq!(info.supertype_distance("Dog"), Some(0));
        assert_eq!(info.supertype_distance("Animal"), Some(1));
        assert_eq!(info.supertype_distance("Named"), Some(2));
        assert_eq!(info.supertype_distance("Car"), None);
    }
}
