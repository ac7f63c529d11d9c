//! The callable method surface handed to the evaluator.
//!
//! [`Bridge::method`] looks a method up on a wrapped native object and returns
//! a [`CallableMethod`], which the evaluator calls with dynamic arguments. The
//! method also answers index-style access (`m[3]` is `m(3)`), but has no length
//! and cannot be enumerated.

#![deny(clippy::unwrap_used)]

use std::fmt;
use std::sync::Arc;

use crate::class::{ClassInfo, MethodSignature};
use crate::config::{BridgeConfig, ConfigError};
use crate::error::{ErrorTranslator, Failure, InvocationResult};
use crate::invoke::{DefaultObjectWrapper, Invoker, ObjectWrapper};
use crate::native::NativeRef;
use crate::resolve::resolve;
use crate::value::{Number, Value};

/// Something the evaluator can call with a list of dynamic arguments.
pub trait TemplateMethod {
    fn call(&self, args: &[Value]) -> InvocationResult<Value>;
}

/// Index-style access on a value that may look like a sequence.
pub trait IndexedAccess {
    fn at(&self, index: i64) -> InvocationResult<Value>;
    fn size(&self) -> InvocationResult<usize>;
    fn items(&self) -> InvocationResult<Vec<Value>>;
}

/// Entry point: owns the configuration and the result wrapper.
///
/// Cloning is cheap; every clone shares the same configuration.
#[derive(Debug, Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

#[derive(Debug)]
struct BridgeInner {
    config: BridgeConfig,
    wrapper: Arc<dyn ObjectWrapper>,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

impl Bridge {
    /// Bridge using `config` as given. The cost tiers are not checked; an
    /// out-of-order [`CostModel`](crate::config::CostModel) ranks overloads
    /// oddly but never panics. Use [`Bridge::validated`] to reject it.
    pub fn new(config: BridgeConfig) -> Self {
        Self::with_wrapper(config, DefaultObjectWrapper)
    }

    /// Like [`Bridge::new`], after [`CostModel::validate`](crate::config::CostModel::validate).
    pub fn validated(config: BridgeConfig) -> Result<Self, ConfigError> {
        config.costs.validate()?;
        Ok(Self::new(config))
    }

    pub fn with_wrapper(config: BridgeConfig, wrapper: impl ObjectWrapper + 'static) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                config,
                wrapper: Arc::new(wrapper),
            }),
        }
    }

    /// Bridge configured from `INVOKE_BRIDGE_CONFIG`, see [`BridgeConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        BridgeConfig::from_env().map(Self::new)
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn wrapper(&self) -> &dyn ObjectWrapper {
        self.inner.wrapper.as_ref()
    }

    /// Instance method `name` of the native object in `receiver`.
    pub fn method(&self, receiver: &Value, name: &str) -> InvocationResult<CallableMethod> {
        let Some(object) = receiver.as_object() else {
            let translator = ErrorTranslator::new(receiver.type_name(), name);
            return Err(translator.translate(Failure::Unsupported {
                message: format!("{} values have no native methods", receiver.type_name()),
            }));
        };
        let class = object.class();
        match class.overloads(name) {
            Some(overloads) => Ok(CallableMethod {
                receiver: Some(object.clone()),
                class_name: class.name().to_string(),
                name: name.to_string(),
                overloads: overloads.clone(),
                bridge: self.clone(),
            }),
            None => Err(ErrorTranslator::new(object.describe(), name).translate(
                Failure::NoSuchMethod {
                    name: name.to_string(),
                },
            )),
        }
    }

    /// Static method `name` of `class`.
    pub fn static_method(&self, class: &ClassInfo, name: &str) -> InvocationResult<CallableMethod> {
        match class.static_overloads(name) {
            Some(overloads) => Ok(CallableMethod {
                receiver: None,
                class_name: class.name().to_string(),
                name: name.to_string(),
                overloads: overloads.clone(),
                bridge: self.clone(),
            }),
            None => Err(ErrorTranslator::new(static_context(class.name()), name).translate(
                Failure::NoSuchMethod {
                    name: name.to_string(),
                },
            )),
        }
    }
}

fn static_context(class_name: &str) -> String {
    format!("static context of {}", class_name)
}

/// A native method bound to its receiver.
#[derive(Debug, Clone)]
pub struct CallableMethod {
    receiver: Option<NativeRef>,
    class_name: String,
    name: String,
    overloads: Arc<[MethodSignature]>,
    bridge: Bridge,
}

impl CallableMethod {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn receiver(&self) -> Option<&NativeRef> {
        self.receiver.as_ref()
    }

    pub fn overloads(&self) -> &[MethodSignature] {
        &self.overloads
    }

    fn receiver_description(&self) -> String {
        match &self.receiver {
            Some(object) => object.describe(),
            None => static_context(&self.class_name),
        }
    }

    fn translator(&self) -> ErrorTranslator {
        ErrorTranslator::new(self.receiver_description(), self.to_string())
    }

    fn unsupported_listing(&self) -> Failure {
        Failure::Unsupported {
            message: format!(
                "getting the number of items or enumerating the items is not supported on method {}\n\
                 (hint 1: call the method first and work with its return value; \
                 hint 2: getting items by index works, e.g. at(0))",
                self
            ),
        }
    }
}

impl TemplateMethod for CallableMethod {
    fn call(&self, args: &[Value]) -> InvocationResult<Value> {
        let translator = self.translator();
        let costs = &self.bridge.config().costs;
        let signature =
            resolve(&self.overloads, args, costs).map_err(|failure| translator.translate(failure))?;

        Invoker::new(costs, self.bridge.wrapper())
            .invoke(self.receiver.as_ref(), signature, args)
            .map_err(|failure| {
                translator
                    .with_method(signature.to_string())
                    .translate(failure)
            })
    }
}

impl IndexedAccess for CallableMethod {
    fn at(&self, index: i64) -> InvocationResult<Value> {
        self.call(&[Value::Number(Number::Int(index))])
    }

    fn size(&self) -> InvocationResult<usize> {
        Err(self.translator().translate(self.unsupported_listing()))
    }

    fn items(&self) -> InvocationResult<Vec<Value>> {
        Err(self.translator().translate(self.unsupported_listing()))
    }
}

impl fmt::Display for CallableMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.overloads {
            [only] => write!(f, "{}", only),
            overloads => write!(
                f,
                "{}.{} ({} overloads)",
                self.class_name,
                self.name,
                overloads.len()
            ),
        }
    }
}
