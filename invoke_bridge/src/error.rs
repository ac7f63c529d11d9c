//! Invocation error types
//!
//! Every failure inside the bridge is first described as a [`Failure`] and
//! then turned into one [`InvocationError`] by the [`ErrorTranslator`], which
//! attaches receiver and method descriptions.

use std::fmt;
use std::sync::Arc;

use crate::convert::Incompatible;
use crate::native::{BoxError, NativeFailure};

/// What went wrong during an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationErrorKind {
    /// No overload accepts the arguments
    NoApplicableOverload,
    /// Several overloads accept the arguments equally well
    AmbiguousOverload,
    /// An argument could not be converted for the chosen overload
    ArgumentConversionFailed,
    /// The native method itself failed
    NativeExceptionThrown,
    /// The native return value could not be represented
    ResultConversionFailed,
}

impl InvocationErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoApplicableOverload => "NoApplicableOverload",
            Self::AmbiguousOverload => "AmbiguousOverload",
            Self::ArgumentConversionFailed => "ArgumentConversionFailed",
            Self::NativeExceptionThrown => "NativeExceptionThrown",
            Self::ResultConversionFailed => "ResultConversionFailed",
        }
    }

    /// True when the caller has to fix the call (argument shape),
    /// false when the native side failed.
    pub fn is_caller_side(self) -> bool {
        matches!(
            self,
            Self::NoApplicableOverload | Self::AmbiguousOverload | Self::ArgumentConversionFailed
        )
    }
}

impl fmt::Display for InvocationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform error returned to the evaluator.
#[derive(Debug, Clone)]
pub struct InvocationError {
    kind: InvocationErrorKind,
    receiver: String,
    method: String,
    message: String,
    cause: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
}

/// Result type alias for bridge calls
pub type InvocationResult<T> = Result<T, InvocationError>;

impl InvocationError {
    pub fn new(
        kind: InvocationErrorKind,
        receiver: impl Into<String>,
        method: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            receiver: receiver.into(),
            method: method.into(),
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(Arc::from(cause.into()));
        self
    }

    pub fn kind(&self) -> InvocationErrorKind {
        self.kind
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The underlying failure, if any.
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}\n  receiver: {}\n  method: {}",
            self.kind, self.message, self.receiver, self.method
        )
    }
}

impl std::error::Error for InvocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// Failure raised somewhere between resolution and result conversion.
#[derive(Debug)]
pub enum Failure {
    /// Argument count does not fit the signature
    ArityMismatch { expected: String, found: usize },
    /// Argument `index` (0-based) could not be unwrapped
    Argument { index: usize, error: Incompatible },
    /// No overload scored
    NoApplicableOverload {
        arg_types: Vec<String>,
        candidates: Vec<String>,
    },
    /// Several overloads share the best score
    AmbiguousOverload {
        arg_types: Vec<String>,
        candidates: Vec<String>,
    },
    /// The receiver has no method of that name
    NoSuchMethod { name: String },
    /// The caller asked for a capability the method surface does not offer
    Unsupported { message: String },
    /// The native method returned an error
    Native(NativeFailure),
    /// The native method panicked
    Panicked(String),
    /// The object wrapper rejected the return value
    ResultConversion(BoxError),
}

impl From<NativeFailure> for Failure {
    fn from(failure: NativeFailure) -> Self {
        Failure::Native(failure)
    }
}

/// Turns [`Failure`]s into [`InvocationError`]s for one call.
#[derive(Debug, Clone)]
pub struct ErrorTranslator {
    receiver: String,
    method: String,
}

impl ErrorTranslator {
    pub fn new(receiver: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            receiver: receiver.into(),
            method: method.into(),
        }
    }

    /// Same receiver, narrower method description (e.g. the resolved overload).
    pub fn with_method(&self, method: impl Into<String>) -> Self {
        Self {
            receiver: self.receiver.clone(),
            method: method.into(),
        }
    }

    /// Translate a failure. A bridge error forwarded by a nested call comes
    /// back unchanged, whether it arrives as [`NativeFailure::Bridge`] or
    /// boxed inside a raised error or a wrapper error.
    pub fn translate(&self, failure: Failure) -> InvocationError {
        use InvocationErrorKind as Kind;

        let failure = match failure {
            Failure::Native(NativeFailure::Bridge(err)) => return err,
            Failure::Native(NativeFailure::Raised(err)) => match forwarded(err) {
                Ok(nested) => return nested,
                Err(err) => Failure::Native(NativeFailure::Raised(err)),
            },
            Failure::ResultConversion(err) => match forwarded(err) {
                Ok(nested) => return nested,
                Err(err) => Failure::ResultConversion(err),
            },
            other => other,
        };

        let (kind, message, cause): (Kind, String, Option<BoxError>) = match failure {
            Failure::Native(NativeFailure::Bridge(err)) => return err,
            Failure::ArityMismatch { expected, found } => (
                Kind::ArgumentConversionFailed,
                format!("expected {} argument(s), got {}", expected, found),
                None,
            ),
            Failure::Argument { index, error } => (
                Kind::ArgumentConversionFailed,
                format!("argument {} does not fit: {}", index + 1, error),
                Some(Box::new(error) as BoxError),
            ),
            Failure::NoApplicableOverload {
                arg_types,
                candidates,
            } => (
                Kind::NoApplicableOverload,
                format!(
                    "no overload accepts ({}); candidates: {}",
                    arg_types.join(", "),
                    candidates.join(", ")
                ),
                None,
            ),
            Failure::AmbiguousOverload {
                arg_types,
                candidates,
            } => (
                Kind::AmbiguousOverload,
                format!(
                    "({}) matches several overloads equally well: {}",
                    arg_types.join(", "),
                    candidates.join(", ")
                ),
                None,
            ),
            Failure::NoSuchMethod { name } => (
                Kind::NoApplicableOverload,
                format!("no method named '{}'", name),
                None,
            ),
            Failure::Unsupported { message } => (Kind::NoApplicableOverload, message, None),
            Failure::Native(NativeFailure::Raised(err)) => (
                Kind::NativeExceptionThrown,
                format!("native method failed: {}", err),
                Some(err),
            ),
            Failure::Panicked(payload) => (
                Kind::NativeExceptionThrown,
                format!("native method panicked: {}", payload),
                Some(payload.into()),
            ),
            Failure::ResultConversion(err) => (
                Kind::ResultConversionFailed,
                format!("return value cannot be converted: {}", err),
                Some(err),
            ),
        };

        let error = InvocationError::new(kind, &*self.receiver, &*self.method, message);
        match cause {
            Some(cause) => error.with_cause(cause),
            None => error,
        }
    }
}

/// The boxed error is a bridge error from a nested call.
fn forwarded(err: BoxError) -> Result<InvocationError, BoxError> {
    err.downcast::<InvocationError>().map(|nested| *nested)
}
