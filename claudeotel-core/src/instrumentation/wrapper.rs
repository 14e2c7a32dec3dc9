use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use opentelemetry::trace::{FutureExt, SpanKind, Status, TraceContextExt, Tracer};
use opentelemetry::{Context, KeyValue};
use tracing::warn;

use super::attributes;
use super::targets::{self, Endpoint};
use super::InstrumentationState;
use crate::client::AnthropicClient;
use crate::error::{AttributeError, CoreResult};
use crate::model::{
    CompletionRequest, CompletionResponse, MessageResponse, MessagesRequest, RequestSnapshot,
    ResponseSnapshot,
};
use crate::telemetry::{keys, CallOptions};

/// An [`AnthropicClient`] that traces the instrumented call sites of the
/// client it wraps and forwards everything else untouched.
///
/// Obtained from [`AnthropicInstrumentor::wrap`](super::AnthropicInstrumentor::wrap).
/// While the instrumentor is not installed, calls go straight to the inner
/// client.
pub struct InstrumentedClient<C> {
    inner: C,
    state: Arc<InstrumentationState>,
}

impl<C: AnthropicClient> InstrumentedClient<C> {
    pub(crate) fn new(inner: C, state: Arc<InstrumentationState>) -> Self {
        Self { inner, state }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    pub async fn create_completion_with(
        &self,
        req: CompletionRequest,
        options: &CallOptions,
    ) -> CoreResult<CompletionResponse> {
        self.traced_call(Endpoint::Completions, req, options, |req| {
            self.inner.create_completion(req)
        })
        .await
    }

    pub async fn create_message_with(
        &self,
        req: MessagesRequest,
        options: &CallOptions,
    ) -> CoreResult<MessageResponse> {
        self.traced_call(Endpoint::Messages, req, options, |req| {
            self.inner.create_message(req)
        })
        .await
    }

    async fn traced_call<Req, Resp, F, Fut>(
        &self,
        endpoint: Endpoint,
        request: Req,
        options: &CallOptions,
        call: F,
    ) -> CoreResult<Resp>
    where
        Req: RequestSnapshot + Clone + Send + Sync,
        Resp: ResponseSnapshot + Send + Sync,
        F: FnOnce(Req) -> Fut + Send,
        Fut: Future<Output = CoreResult<Resp>> + Send,
    {
        if options.suppress_instrumentation {
            return call(request).await;
        }
        let (Some(target), Some(tracer)) = (targets::lookup(endpoint), self.state.tracer(endpoint))
        else {
            return call(request).await;
        };
        let send_prompts = self.state.should_send_prompts(options);

        let span = tracer
            .span_builder(target.span_name)
            .with_kind(SpanKind::Client)
            .with_attributes([
                KeyValue::new(keys::LLM_VENDOR, keys::VENDOR_ANTHROPIC),
                KeyValue::new(keys::LLM_REQUEST_TYPE, keys::REQUEST_TYPE_COMPLETION),
            ])
            .start_with_context(&*tracer, &Context::current());
        let cx = Context::current_with_span(span);

        let recording = cx.span().is_recording();
        if recording
            && let Err(e) = attributes::set_input_attributes(&cx.span(), &request, send_prompts)
        {
            warn!(error = %e, "Failed to set input attributes for anthropic span");
        }

        let snapshot = request.clone();
        let result = call(request).with_context(cx.clone()).await;

        if recording && let Ok(response) = &result {
            if let Err(e) = self
                .record_response(&cx, &snapshot, response, send_prompts)
                .with_context(cx.clone())
                .await
            {
                warn!(error = %e, "Failed to set response attributes for anthropic span");
            }
            cx.span().set_status(Status::Ok);
        }

        cx.span().end();
        result
    }

    async fn record_response<Req, Resp>(
        &self,
        cx: &Context,
        request: &Req,
        response: &Resp,
        send_prompts: bool,
    ) -> Result<(), AttributeError>
    where
        Req: RequestSnapshot + Sync,
        Resp: ResponseSnapshot + Sync,
    {
        attributes::set_response_attributes(&cx.span(), response, send_prompts)?;
        if let Some(usage) = attributes::fallback_token_usage(&self.inner, request, response).await? {
            attributes::record_token_usage(&cx.span(), &usage);
        }
        Ok(())
    }
}

#[async_trait]
impl<C: AnthropicClient> AnthropicClient for InstrumentedClient<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn create_completion(&self, req: CompletionRequest) -> CoreResult<CompletionResponse> {
        self.create_completion_with(req, &CallOptions::current()).await
    }

    async fn create_message(&self, req: MessagesRequest) -> CoreResult<MessageResponse> {
        self.create_message_with(req, &CallOptions::current()).await
    }

    async fn count_tokens(&self, model: &str, text: &str) -> CoreResult<u32> {
        self.inner.count_tokens(model, text).await
    }
}
