//! Shared fixtures for integration tests
// Each test target uses only some of these fixtures.
#![allow(dead_code)]

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use invoke_bridge::prelude::*;
use num_bigint::BigInt;
use once_cell::sync::Lazy;

fn prim(p: PrimitiveType) -> NativeType {
    NativeType::Primitive(p)
}

/// Error raised by `Calculator.fail()`.
#[derive(Debug)]
pub struct DiskFull;

impl fmt::Display for DiskFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "disk full")
    }
}

impl std::error::Error for DiskFull {}

fn echo(name: &str, ty: NativeType) -> MethodSignature {
    MethodSignature::new(name, vec![ty], |_, mut args| Ok(args.remove(0)))
}

pub static CALCULATOR: Lazy<ClassInfo> = Lazy::new(|| {
    ClassInfo::builder("Calculator")
        .method(MethodSignature::new("f", vec![prim(PrimitiveType::I32)], |_, args| {
            Ok(format!("int:{}", args[0].as_i64().unwrap_or_default()).into())
        }))
        .method(MethodSignature::new("f", vec![prim(PrimitiveType::F64)], |_, args| {
            Ok(format!("double:{}", args[0].as_f64().unwrap_or_default()).into())
        }))
        .method(MethodSignature::new("describe", vec![NativeType::String], |_, _| {
            Ok("string".into())
        }))
        .method(
            MethodSignature::new("describe", vec![NativeType::Object], |_, args| {
                let count = args[0].as_slice().map_or(0, <[_]>::len);
                Ok(format!("varargs:{}", count).into())
            })
            .varargs(),
        )
        .method(MethodSignature::new(
            "add",
            vec![prim(PrimitiveType::I64), prim(PrimitiveType::I64)],
            |_, args| {
                let a = args[0].as_i64().unwrap_or_default();
                let b = args[1].as_i64().unwrap_or_default();
                Ok(NativeValue::I64(a + b))
            },
        ))
        .method(MethodSignature::new(
            "total",
            vec![NativeType::list_of(prim(PrimitiveType::I64))],
            |_, args| {
                let items = args[0].as_slice().unwrap_or_default();
                Ok(NativeValue::I64(items.iter().filter_map(NativeValue::as_i64).sum()))
            },
        ))
        .method(MethodSignature::new("pick", vec![NativeType::String], |_, _| {
            Ok("string".into())
        }))
        .method(MethodSignature::new(
            "pick",
            vec![NativeType::Boxed(PrimitiveType::I32)],
            |_, _| Ok("boxed".into()),
        ))
        .method(MethodSignature::new("label", vec![], |receiver, _| {
            let calc = receiver_as::<Calculator>(receiver)?;
            Ok(calc.label.clone().into())
        }))
        .method(MethodSignature::new("fail", vec![], |_, _| {
            Err(NativeFailure::raised(DiskFull))
        }))
        .method(MethodSignature::new("explode", vec![], |_, _| {
            panic!("calculator exploded")
        }))
        .method(MethodSignature::new("nested", vec![], |_, _| {
            let inner = Value::Object(Arc::new(Inner));
            let method = Bridge::default().method(&inner, "pick")?;
            let result = method.call(&[Value::Null])?;
            Ok(NativeValue::from(result.to_string()))
        }))
        .method(MethodSignature::new("nested_raised", vec![], |_, _| {
            let inner = Value::Object(Arc::new(Inner));
            let method = Bridge::default().method(&inner, "pick")?;
            method
                .call(&[Value::Null])
                .map(|result| NativeValue::from(result.to_string()))
                .map_err(NativeFailure::raised)
        }))
        .method(echo("echo_i8", prim(PrimitiveType::I8)))
        .method(echo("echo_i16", prim(PrimitiveType::I16)))
        .method(echo("echo_i32", prim(PrimitiveType::I32)))
        .method(echo("echo_i64", prim(PrimitiveType::I64)))
        .method(echo("echo_big", NativeType::BigInt))
        .method(echo("echo_f64", prim(PrimitiveType::F64)))
        .method(echo("echo_char", prim(PrimitiveType::Char)))
        .static_method(MethodSignature::new(
            "abs",
            vec![prim(PrimitiveType::I64)],
            |_, args| Ok(NativeValue::I64(args[0].as_i64().unwrap_or_default().abs())),
        ))
        .static_method(MethodSignature::new("abs", vec![NativeType::BigInt], |_, args| {
            match &args[0] {
                NativeValue::BigInt(v) => Ok(NativeValue::BigInt(if v < &BigInt::from(0) {
                    -v
                } else {
                    v.clone()
                })),
                other => Err(NativeFailure::raised(format!("unexpected {}", other.type_name()))),
            }
        }))
        .build()
});

#[derive(Debug)]
pub struct Calculator {
    pub label: String,
}

impl NativeObject for Calculator {
    fn class(&self) -> &ClassInfo {
        &CALCULATOR
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> String {
        format!("Calculator '{}'", self.label)
    }
}

pub fn calculator() -> Value {
    let obj: NativeRef = Arc::new(Calculator {
        label: "main".to_string(),
    });
    Value::Object(obj)
}

/// Target of nested bridge calls; `pick(null)` is ambiguous here.
pub static INNER: Lazy<ClassInfo> = Lazy::new(|| {
    ClassInfo::builder("Inner")
        .method(MethodSignature::new("pick", vec![NativeType::String], |_, _| {
            Ok("string".into())
        }))
        .method(MethodSignature::new(
            "pick",
            vec![NativeType::Boxed(PrimitiveType::I64)],
            |_, _| Ok("boxed".into()),
        ))
        .build()
});

#[derive(Debug)]
pub struct Inner;

impl NativeObject for Inner {
    fn class(&self) -> &ClassInfo {
        &INNER
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ========== Class hierarchy ==========

pub static KENNEL: Lazy<ClassInfo> = Lazy::new(|| {
    ClassInfo::builder("Kennel")
        .static_method(MethodSignature::new(
            "admit",
            vec![NativeType::class("Animal")],
            |_, _| Ok("animal".into()),
        ))
        .static_method(MethodSignature::new(
            "admit",
            vec![NativeType::class("Dog")],
            |_, _| Ok("dog".into()),
        ))
        .build()
});

pub static DOG: Lazy<ClassInfo> = Lazy::new(|| {
    ClassInfo::builder("Dog").extends("Animal").build()
});

pub static CAT: Lazy<ClassInfo> = Lazy::new(|| {
    ClassInfo::builder("Cat").extends("Animal").build()
});

#[derive(Debug)]
pub struct Pet {
    class: &'static ClassInfo,
}

impl NativeObject for Pet {
    fn class(&self) -> &ClassInfo {
        self.class
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn dog() -> Value {
    let obj: NativeRef = Arc::new(Pet { class: &DOG });
    Value::Object(obj)
}

pub fn cat() -> Value {
    let obj: NativeRef = Arc::new(Pet { class: &CAT });
    Value::Object(obj)
}

// ========== Runtime-built classes ==========

/// Object whose method table is built at runtime, for order-sensitivity tests.
#[derive(Debug)]
pub struct Dynamic {
    info: ClassInfo,
}

impl NativeObject for Dynamic {
    fn class(&self) -> &ClassInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn dynamic(info: ClassInfo) -> Value {
    let obj: NativeRef = Arc::new(Dynamic { info });
    Value::Object(obj)
}

/// Signature of `name` that returns its own parameter list, e.g. `"f(i32)"`.
pub fn self_describing(name: &str, params: Vec<NativeType>) -> MethodSignature {
    let rendered = params
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let label = format!("{}({})", name, rendered);
    MethodSignature::new(name, params, move |_, _| Ok(label.clone().into()))
}

/// Call `name` on `receiver` through a default bridge.
pub fn call(receiver: &Value, name: &str, args: &[Value]) -> InvocationResult<Value> {
    Bridge::default().method(receiver, name)?.call(args)
}
