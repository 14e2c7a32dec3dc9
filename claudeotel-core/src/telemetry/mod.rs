//! Content-tracing policy and per-call instrumentation options.
//!
//! Options are normally passed explicitly through [`CallOptions`]. Callers
//! that cannot thread a parameter through (e.g. code that only sees the
//! `AnthropicClient` trait) can attach the same flags to the ambient
//! OpenTelemetry [`Context`] instead; [`CallOptions::current`] reads them back.

pub mod keys;
#[cfg(test)]
pub mod test_capture;

pub use keys::*;

use opentelemetry::Context;

/// Environment variable controlling default content tracing.
/// Unset means enabled; any value other than "true" (case-insensitive) disables.
pub const TRACE_CONTENT_ENV: &str = "TRACELOOP_TRACE_CONTENT";

/// Per-call instrumentation flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Skip all telemetry for this call.
    pub suppress_instrumentation: bool,
    /// `Some(true)` forces content tracing on regardless of the environment.
    pub override_enable_content_tracing: Option<bool>,
}

impl CallOptions {
    pub fn suppressed() -> Self {
        Self {
            suppress_instrumentation: true,
            ..Default::default()
        }
    }

    pub fn with_content_tracing(mut self, enabled: bool) -> Self {
        self.override_enable_content_tracing = Some(enabled);
        self
    }

    /// Options attached to the current OpenTelemetry context.
    pub fn current() -> Self {
        Self::from_context(&Context::current())
    }

    pub fn from_context(cx: &Context) -> Self {
        Self {
            suppress_instrumentation: cx.get::<SuppressInstrumentation>().is_some(),
            override_enable_content_tracing: cx.get::<ContentTracingOverride>().map(|o| o.0),
        }
    }
}

/// Context marker: instrumentation is suppressed for calls made under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressInstrumentation;

/// Context value: explicit content-tracing override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentTracingOverride(pub bool);

pub fn with_suppressed_instrumentation(cx: &Context) -> Context {
    cx.with_value(SuppressInstrumentation)
}

pub fn with_content_tracing_override(cx: &Context, enabled: bool) -> Context {
    cx.with_value(ContentTracingOverride(enabled))
}

/// Decide whether prompt and completion text may be recorded.
///
/// `setting` is the environment (or configured) value; `None` and the empty
/// string mean "true". An override of `Some(true)` always wins.
pub fn content_tracing_enabled(setting: Option<&str>, override_enable: Option<bool>) -> bool {
    let setting = setting.filter(|v| !v.is_empty()).unwrap_or("true");
    setting.eq_ignore_ascii_case("true") || override_enable.unwrap_or(false)
}

/// Resolve content tracing for one call.
///
/// A configured value replaces the environment lookup; otherwise
/// `TRACELOOP_TRACE_CONTENT` is read on every call.
pub fn should_send_prompts(options: &CallOptions, configured: Option<bool>) -> bool {
    match configured {
        Some(enabled) => enabled || options.override_enable_content_tracing.unwrap_or(false),
        None => {
            let env = std::env::var(TRACE_CONTENT_ENV).ok();
            content_tracing_enabled(env.as_deref(), options.override_enable_content_tracing)
        }
    }
}
