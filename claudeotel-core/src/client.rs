use async_trait::async_trait;

use crate::error::CoreResult;
use crate::model::{
    CompletionRequest, CompletionResponse, MessageContent, MessageResponse, MessagesRequest,
    ResponseBlock, Usage,
};

/// The client surface the instrumentation wraps.
///
/// `create_completion` and `create_message` are the traced call sites;
/// `count_tokens` is the token-counting facility the usage fallback
/// delegates to.
#[async_trait]
pub trait AnthropicClient: Send + Sync {
    fn name(&self) -> &str;

    async fn create_completion(&self, req: CompletionRequest) -> CoreResult<CompletionResponse>;

    async fn create_message(&self, req: MessagesRequest) -> CoreResult<MessageResponse>;

    async fn count_tokens(&self, model: &str, text: &str) -> CoreResult<u32>;
}

#[async_trait]
impl<C: AnthropicClient + ?Sized> AnthropicClient for std::sync::Arc<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn create_completion(&self, req: CompletionRequest) -> CoreResult<CompletionResponse> {
        (**self).create_completion(req).await
    }

    async fn create_message(&self, req: MessagesRequest) -> CoreResult<MessageResponse> {
        (**self).create_message(req).await
    }

    async fn count_tokens(&self, model: &str, text: &str) -> CoreResult<u32> {
        (**self).count_tokens(model, text).await
    }
}

/// A dummy client that always returns canned responses.
/// Useful for tests or for running the CLI without network access.
pub struct NullClient;

impl NullClient {
    pub const REPLY: &'static str = "[null client response]";

    fn whitespace_tokens(text: &str) -> u32 {
        text.split_whitespace().count() as u32
    }
}

#[async_trait]
impl AnthropicClient for NullClient {
    fn name(&self) -> &str {
        "null"
    }

    async fn create_completion(&self, req: CompletionRequest) -> CoreResult<CompletionResponse> {
        Ok(CompletionResponse {
            id: "null-completion".into(),
            model: Some(req.model),
            completion: Self::REPLY.into(),
            stop_reason: Some("stop_sequence".into()),
        })
    }

    async fn create_message(&self, req: MessagesRequest) -> CoreResult<MessageResponse> {
        let input: u32 = req
            .messages
            .iter()
            .map(|m| Self::whitespace_tokens(&m.content.text()))
            .sum();
        Ok(MessageResponse {
            id: "null-message".into(),
            model: Some(req.model),
            role: Some(crate::model::Role::Assistant),
            content: vec![ResponseBlock::Text { text: Self::REPLY.into() }],
            stop_reason: Some("end_turn".into()),
            usage: Some(Usage {
                input_tokens: input,
                output_tokens: Self::whitespace_tokens(Self::REPLY),
            }),
        })
    }

    async fn count_tokens(&self, _model: &str, text: &str) -> CoreResult<u32> {
        Ok(Self::whitespace_tokens(text))
    }
}

/// Convenience for callers holding content rather than a full message.
pub async fn count_content_tokens<C: AnthropicClient + ?Sized>(
    client: &C,
    model: &str,
    content: &MessageContent,
) -> CoreResult<u32> {
    client.count_tokens(model, &content.text()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Message;

    #[tokio::test]
    async fn null_client_message() {
        let client = NullClient;
        let req = MessagesRequest::new("claude-3-haiku", vec![Message::user("hi there")], 32);
        let resp = client.create_message(req).await.expect("message ok");
        assert_eq!(resp.model.as_deref(), Some("claude-3-haiku"));
        assert_eq!(resp.content[0].text(), Some(NullClient::REPLY));
        assert_eq!(resp.usage.map(|u| u.input_tokens), Some(2));
    }

    #[tokio::test]
    async fn null_client_completion_and_count() {
        let client = NullClient;
        let resp = client
            .create_completion(CompletionRequest::new("claude-2", "\n\nHuman: hi\n\nAssistant:", 16))
            .await
            .expect("completion ok");
        assert_eq!(resp.completion, NullClient::REPLY);
        assert_eq!(client.count_tokens("claude-2", "one two three").await.unwrap(), 3);
        assert_eq!(client.count_tokens("claude-2", "").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn arc_client_forwards() {
        let client: std::sync::Arc<dyn AnthropicClient> = std::sync::Arc::new(NullClient);
        assert_eq!(client.name(), "null");
        let n = count_content_tokens(&client, "claude-2", &"a b".into()).await.unwrap();
        assert_eq!(n, 2);
    }
}
