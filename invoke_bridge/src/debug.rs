//! Dispatch tracing.
//!
//! Set `INVOKE_BRIDGE_DEBUG=1` to trace overload scoring and invocation
//! failures on stderr. Only available in debug builds.

/// Check if dispatch tracing is enabled via `INVOKE_BRIDGE_DEBUG`.
#[cfg(debug_assertions)]
pub(crate) fn dispatch_debug_enabled() -> bool {
    use std::sync::OnceLock;
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var("INVOKE_BRIDGE_DEBUG").is_ok())
}

/// Emit one trace line without relying on `eprintln!`.
#[cfg(debug_assertions)]
pub(crate) fn dispatch_debug_log(args: std::fmt::Arguments<'_>) {
    use std::io::Write;
    let _ = writeln!(std::io::stderr(), "[invoke_bridge] {args}");
}

/// Trace a dispatch event when `INVOKE_BRIDGE_DEBUG` is set (debug builds only).
macro_rules! dispatch_trace {
    ($($arg:tt)*) => {
        #[cfg(debug_assertions)]
        {
            if $crate::debug::dispatch_debug_enabled() {
                $crate::debug::dispatch_debug_log(format_args!($($arg)*));
            }
        }
    };
}

pub(crate) use dispatch_trace;
