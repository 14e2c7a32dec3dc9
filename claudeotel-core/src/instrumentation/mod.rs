//! Anthropic client instrumentation.
//!
//! [`AnthropicInstrumentor`] owns the installed tracer; [`InstrumentedClient`]
//! proxies built with [`AnthropicInstrumentor::wrap`] consult it on every
//! call. Installing registers the tracer for each entry in
//! [`targets::WRAPPED_METHODS`]; removing unregisters them, after which the
//! proxies behave exactly like the clients they wrap.

pub mod attributes;
pub mod targets;
pub mod wrapper;

pub use targets::{Endpoint, WrappedMethod, WRAPPED_METHODS};
pub use wrapper::InstrumentedClient;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use opentelemetry::global::{self, BoxedTracer};
use opentelemetry::trace::{Tracer, TracerProvider};
use opentelemetry::InstrumentationScope;
use tracing::debug;

use crate::client::AnthropicClient;
use crate::error::{ClaudeOtelError, CoreResult};
use crate::telemetry::{self, CallOptions};

/// Tracer name reported in the instrumentation scope.
pub const INSTRUMENTATION_NAME: &str = env!("CARGO_PKG_NAME");
pub const INSTRUMENTATION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Client API versions this instrumentation understands.
const INSTRUMENTS: &[&str] = &["anthropic-api >= 2023-06-01"];

/// Capability contract expected by an instrumentation manager.
pub trait Instrumentor: Send + Sync {
    fn name(&self) -> &str;

    /// Version-constrained names of the client APIs this instrumentor targets.
    fn instrumentation_dependencies(&self) -> &'static [&'static str];

    /// Start tracing every target with `tracer`.
    ///
    /// # Errors
    /// [`ClaudeOtelError::AlreadyInstrumented`] if already installed.
    fn instrument(&self, tracer: BoxedTracer) -> CoreResult<()>;

    /// Stop tracing every target. A no-op when not installed.
    fn uninstrument(&self) -> CoreResult<()>;

    fn is_instrumented(&self) -> bool;
}

#[derive(Default)]
pub(crate) struct InstrumentationState {
    tracers: RwLock<HashMap<Endpoint, Arc<BoxedTracer>>>,
    trace_content: Option<bool>,
}

impl InstrumentationState {
    fn read(&self) -> RwLockReadGuard<'_, HashMap<Endpoint, Arc<BoxedTracer>>> {
        self.tracers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Endpoint, Arc<BoxedTracer>>> {
        self.tracers.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn tracer(&self, endpoint: Endpoint) -> Option<Arc<BoxedTracer>> {
        self.read().get(&endpoint).cloned()
    }

    pub(crate) fn should_send_prompts(&self, options: &CallOptions) -> bool {
        telemetry::should_send_prompts(options, self.trace_content)
    }
}

/// Instrumentor for Anthropic clients.
///
/// Cloning is cheap and clones share installation state.
#[derive(Clone, Default)]
pub struct AnthropicInstrumentor {
    state: Arc<InstrumentationState>,
}

impl AnthropicInstrumentor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix content tracing for this instrumentor instead of reading
    /// `TRACELOOP_TRACE_CONTENT` per call. `None` keeps the environment lookup.
    pub fn with_trace_content(trace_content: Option<bool>) -> Self {
        Self {
            state: Arc::new(InstrumentationState {
                tracers: RwLock::default(),
                trace_content,
            }),
        }
    }

    fn scope() -> InstrumentationScope {
        InstrumentationScope::builder(INSTRUMENTATION_NAME)
            .with_version(INSTRUMENTATION_VERSION)
            .build()
    }

    /// Install using the globally registered tracer provider.
    pub fn install(&self) -> CoreResult<()> {
        self.instrument(global::tracer_with_scope(Self::scope()))
    }

    /// Install using an explicit tracer provider.
    pub fn install_with_provider<P>(&self, provider: &P) -> CoreResult<()>
    where
        P: TracerProvider,
        P::Tracer: Send + Sync + 'static,
        <P::Tracer as Tracer>::Span: Send + Sync + 'static,
    {
        let tracer = provider.tracer_with_scope(Self::scope());
        self.instrument(BoxedTracer::new(Box::new(tracer)))
    }

    pub fn remove(&self) -> CoreResult<()> {
        self.uninstrument()
    }

    /// Bind `client` to this instrumentor.
    pub fn wrap<C: AnthropicClient>(&self, client: C) -> InstrumentedClient<C> {
        InstrumentedClient::new(client, self.state.clone())
    }
}

impl Instrumentor for AnthropicInstrumentor {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn instrumentation_dependencies(&self) -> &'static [&'static str] {
        INSTRUMENTS
    }

    fn instrument(&self, tracer: BoxedTracer) -> CoreResult<()> {
        let mut tracers = self.state.write();
        if !tracers.is_empty() {
            return Err(ClaudeOtelError::AlreadyInstrumented {
                name: self.name().to_string(),
            });
        }
        let tracer = Arc::new(tracer);
        for method in WRAPPED_METHODS.iter() {
            tracers.insert(method.endpoint, tracer.clone());
            debug!(target_method = %method, "instrumented");
        }
        Ok(())
    }

    fn uninstrument(&self) -> CoreResult<()> {
        let mut tracers = self.state.write();
        if tracers.is_empty() {
            debug!("anthropic instrumentation not installed; nothing to remove");
            return Ok(());
        }
        for method in WRAPPED_METHODS.iter() {
            tracers.remove(&method.endpoint);
            debug!(target_method = %method, "uninstrumented");
        }
        Ok(())
    }

    fn is_instrumented(&self) -> bool {
        !self.state.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_sdk::trace::SdkTracerProvider;

    #[test]
    fn install_registers_every_target() {
        let inst = AnthropicInstrumentor::new();
        assert!(!inst.is_instrumented());
        inst.install_with_provider(&SdkTracerProvider::builder().build()).unwrap();
        assert!(inst.is_instrumented());
        for method in WRAPPED_METHODS.iter() {
            assert!(inst.state.tracer(method.endpoint).is_some(), "{method}");
        }
    }

    #[test]
    fn double_install_is_rejected() {
        let inst = AnthropicInstrumentor::new();
        inst.install().unwrap();
        let err = inst.install().unwrap_err();
        match err {
            ClaudeOtelError::AlreadyInstrumented { name } => assert_eq!(name, "anthropic"),
            other => panic!("expected AlreadyInstrumented, got {other:?}"),
        }
    }

    #[test]
    fn remove_restores_and_allows_reinstall() {
        let inst = AnthropicInstrumentor::new();
        inst.remove().unwrap();
        inst.install().unwrap();
        inst.remove().unwrap();
        assert!(!inst.is_instrumented());
        assert!(inst.state.tracer(Endpoint::Messages).is_none());
        inst.install().unwrap();
        assert!(inst.is_instrumented());
    }

    #[test]
    fn clones_share_state() {
        let inst = AnthropicInstrumentor::new();
        let other = inst.clone();
        inst.install().unwrap();
        assert!(other.is_instrumented());
    }

    #[test]
    fn declares_client_dependency() {
        let inst = AnthropicInstrumentor::new();
        assert_eq!(inst.instrumentation_dependencies(), &["anthropic-api >= 2023-06-01"]);
    }
}
