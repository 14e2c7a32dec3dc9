//! Span attribute extraction from requests and responses.
//!
//! Every writer goes through [`set_span_attribute`], which drops absent and
//! empty-string values. Extractors return `Result<_, AttributeError>`; the
//! wrapper logs and discards failures.

use opentelemetry::trace::SpanRef;
use opentelemetry::{Key, KeyValue, Value};
use serde::Serialize;

use crate::client::{count_content_tokens, AnthropicClient};
use crate::error::AttributeError;
use crate::model::{ContentBlock, MessageContent, RequestSnapshot, ResponseSnapshot};
use crate::telemetry::keys;

/// Write `value` under `key` unless it is absent or an empty string.
pub fn set_span_attribute<V: Into<Value>>(span: &SpanRef<'_>, key: impl Into<Key>, value: Option<V>) {
    let Some(value) = value.map(Into::into) else {
        return;
    };
    if let Value::String(s) = &value
        && s.as_str().is_empty()
    {
        return;
    }
    span.set_attribute(KeyValue::new(key, value));
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum DumpedBlock<'a> {
    Text { text: &'a str },
    Image { source: DumpedSource<'a> },
}

#[derive(Serialize)]
struct DumpedSource<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    media_type: &'a str,
    data: String,
}

fn data_as_string(data: &serde_json::Value) -> String {
    match data {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render message content as a single attribute value.
///
/// Plain text is returned verbatim. Block lists keep only text and image
/// blocks and are serialized as a JSON array.
pub fn dump_content(content: &MessageContent) -> Result<String, AttributeError> {
    let blocks = match content {
        MessageContent::Text(s) => return Ok(s.clone()),
        MessageContent::Blocks(blocks) => blocks,
    };
    let dumped: Vec<DumpedBlock<'_>> = blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(DumpedBlock::Text { text }),
            ContentBlock::Image { source } => Some(DumpedBlock::Image {
                source: DumpedSource {
                    kind: &source.kind,
                    media_type: &source.media_type,
                    data: data_as_string(&source.data),
                },
            }),
            _ => None,
        })
        .collect();
    Ok(serde_json::to_string(&dumped)?)
}

pub fn set_input_attributes<R: RequestSnapshot + ?Sized>(
    span: &SpanRef<'_>,
    request: &R,
    send_prompts: bool,
) -> Result<(), AttributeError> {
    set_span_attribute(span, keys::LLM_REQUEST_MODEL, request.model().map(str::to_string));
    set_span_attribute(span, keys::LLM_REQUEST_MAX_TOKENS, request.max_tokens().map(i64::from));
    set_span_attribute(span, keys::LLM_TEMPERATURE, request.temperature());
    set_span_attribute(span, keys::LLM_TOP_P, request.top_p());
    set_span_attribute(span, keys::LLM_FREQUENCY_PENALTY, request.frequency_penalty());
    set_span_attribute(span, keys::LLM_PRESENCE_PENALTY, request.presence_penalty());

    if !send_prompts {
        return Ok(());
    }
    if let Some(prompt) = request.prompt() {
        set_span_attribute(span, keys::prompt_user(0), Some(prompt.to_string()));
    } else if let Some(messages) = request.messages() {
        for (i, message) in messages.iter().enumerate() {
            set_span_attribute(span, keys::prompt_user(i), Some(dump_content(&message.content)?));
        }
    }
    Ok(())
}

fn set_span_completions<R: ResponseSnapshot + ?Sized>(span: &SpanRef<'_>, response: &R) {
    set_span_attribute(
        span,
        keys::completion_finish_reason(0),
        response.stop_reason().map(str::to_string),
    );
    if let Some(completion) = response.completion().filter(|c| !c.is_empty()) {
        set_span_attribute(span, keys::completion_content(0), Some(completion.to_string()));
    } else if let Some(content) = response.content() {
        for (i, block) in content.iter().enumerate() {
            set_span_attribute(span, keys::completion_content(i), block.text().map(str::to_string));
        }
    }
}

pub fn set_response_attributes<R: ResponseSnapshot + ?Sized>(
    span: &SpanRef<'_>,
    response: &R,
    send_prompts: bool,
) -> Result<(), AttributeError> {
    set_span_attribute(span, keys::LLM_RESPONSE_MODEL, response.model().map(str::to_string));

    if let Some(usage) = response.usage() {
        let prompt = i64::from(usage.input_tokens);
        let completion = i64::from(usage.output_tokens);
        set_span_attribute(span, keys::LLM_USAGE_PROMPT_TOKENS, Some(prompt));
        set_span_attribute(span, keys::LLM_USAGE_COMPLETION_TOKENS, Some(completion));
        set_span_attribute(span, keys::LLM_USAGE_TOTAL_TOKENS, Some(prompt + completion));
    }

    if send_prompts {
        set_span_completions(span, response);
    }
    Ok(())
}

/// Token counts computed by the client when the response carried none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> i64 {
        i64::from(self.prompt_tokens) + i64::from(self.completion_tokens)
    }
}

/// Count usage through the client's tokenizer.
///
/// Returns `None` when the response already has a usage object; those
/// native counts take precedence.
pub async fn fallback_token_usage<C, Req, Resp>(
    client: &C,
    request: &Req,
    response: &Resp,
) -> Result<Option<TokenUsage>, AttributeError>
where
    C: AnthropicClient + ?Sized,
    Req: RequestSnapshot + ?Sized + Sync,
    Resp: ResponseSnapshot + ?Sized + Sync,
{
    if response.usage().is_some() {
        return Ok(None);
    }
    let model = request.model().unwrap_or_default();

    let mut prompt_tokens = 0u32;
    if let Some(prompt) = request.prompt().filter(|p| !p.is_empty()) {
        prompt_tokens = client.count_tokens(model, prompt).await?;
    } else if let Some(messages) = request.messages().filter(|m| !m.is_empty()) {
        for message in messages {
            let n = count_content_tokens(client, model, &message.content).await?;
            prompt_tokens = prompt_tokens
                .checked_add(n)
                .ok_or(AttributeError::Overflow { field: "prompt_tokens" })?;
        }
    }

    let mut completion_tokens = 0u32;
    if let Some(completion) = response.completion().filter(|c| !c.is_empty()) {
        completion_tokens = client.count_tokens(model, completion).await?;
    } else if let Some(first) = response.content().and_then(|c| c.first()) {
        completion_tokens = client.count_tokens(model, first.text().unwrap_or_default()).await?;
    }

    Ok(Some(TokenUsage {
        prompt_tokens,
        completion_tokens,
    }))
}

/// Zero counts are written too.
pub fn record_token_usage(span: &SpanRef<'_>, usage: &TokenUsage) {
    set_span_attribute(span, keys::LLM_USAGE_PROMPT_TOKENS, Some(i64::from(usage.prompt_tokens)));
    set_span_attribute(
        span,
        keys::LLM_USAGE_COMPLETION_TOKENS,
        Some(i64::from(usage.completion_tokens)),
    );
    set_span_attribute(span, keys::LLM_USAGE_TOTAL_TOKENS, Some(usage.total_tokens()));
}
