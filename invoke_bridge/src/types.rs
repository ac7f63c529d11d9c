//! Native parameter types.
//!
//! The hierarchy the bridge reasons about:
//! ```text
//! Object
//!  ├── Number
//!  │    ├── Boxed<i8>, Boxed<i16>, Boxed<i32>, Boxed<i64>, Boxed<f32>, Boxed<f64>
//!  │    └── BigInt
//!  ├── Boxed<bool>, Boxed<char>
//!  ├── String
//!  ├── [T], List<T>, Map<String, T>
//!  └── user classes (with their declared supertypes)
//!
//! bool, char, i8, i16, i32, i64, f32, f64   (primitives, never null)
//! ```

use std::fmt;

/// Non-nullable primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

/// Position of `BigInt` on the numeric widening ladder.
pub(crate) const BIGINT_RANK: u8 = 6;

impl PrimitiveType {
    /// Position on the numeric widening ladder `i8 < i16 < i32 < i64 < f32 < f64`.
    ///
    /// Returns `None` for `bool` and `char`, which are not numeric.
    pub fn numeric_rank(self) -> Option<u8> {
        match self {
            PrimitiveType::I8 => Some(0),
            PrimitiveType::I16 => Some(1),
            PrimitiveType::I32 => Some(2),
            PrimitiveType::I64 => Some(3),
            PrimitiveType::F32 => Some(4),
            PrimitiveType::F64 => Some(5),
            PrimitiveType::Bool | PrimitiveType::Char => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Char => "char",
            PrimitiveType::I8 => "i8",
            PrimitiveType::I16 => "i16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
        }
    }
}

/// Type of a native method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeType {
    /// Non-nullable primitive
    Primitive(PrimitiveType),
    /// Nullable object wrapper around a primitive
    Boxed(PrimitiveType),
    /// Arbitrary precision integer
    BigInt,
    /// Abstract supertype of every numeric type
    Number,
    String,
    /// Root of the hierarchy; accepts any value
    Object,
    /// Native array with the given element type
    Array(Box<NativeType>),
    /// Native list with the given element type
    List(Box<NativeType>),
    /// String-keyed map with the given value type
    Map(Box<NativeType>),
    /// User class, matched by name against an object's class and supertypes
    Class(String),
}

impl NativeType {
    pub fn array_of(elem: NativeType) -> Self {
        NativeType::Array(Box::new(elem))
    }

    pub fn list_of(elem: NativeType) -> Self {
        NativeType::List(Box::new(elem))
    }

    pub fn map_of(elem: NativeType) -> Self {
        NativeType::Map(Box::new(elem))
    }

    pub fn class(name: impl Into<String>) -> Self {
        NativeType::Class(name.into())
    }

    /// Whether native `null` is a legal value of this type.
    pub fn is_nullable(&self) -> bool {
        !matches!(self, NativeType::Primitive(_))
    }

    /// How far up the hierarchy this type sits.
    ///
    /// `Object` is 2, `Number` is 1, everything else 0. Used so that null
    /// prefers the most specific nullable parameter.
    pub fn generality(&self) -> u64 {
        match self {
            NativeType::Object => 2,
            NativeType::Number => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Primitive(p) => write!(f, "{}", p.name()),
            NativeType::Boxed(p) => write!(f, "Boxed<{}>", p.name()),
            NativeType::BigInt => write!(f, "BigInt"),
            NativeType::Number => write!(f, "Number"),
            NativeType::String => write!(f, "String"),
            NativeType::Object => write!(f, "Object"),
            NativeType::Array(elem) => write!(f, "[{}]", elem),
            NativeType::List(elem) => write!(f, "List<{}>", elem),
            NativeType::Map(elem) => write!(f, "Map<String, {}>", elem),
            NativeType::Class(name) => write!(f, "{}", name),
        }
    }
}
