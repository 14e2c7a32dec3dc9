//! Request and response shapes for the two Anthropic endpoints the
//! instrumentation knows about, plus the read-only snapshot traits the
//! attribute extractors work against.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

// ===== Legacy text completion (/v1/complete) =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens_to_sample: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, max_tokens_to_sample: u32) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            max_tokens_to_sample,
            temperature: None,
            top_p: None,
            top_k: None,
            frequency_penalty: None,
            presence_penalty: None,
            stop_sequences: None,
            metadata: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CompletionResponse {
    pub id: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub completion: String,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

// ===== Messages API (/v1/messages) =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MessagesRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl MessagesRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages,
            system: None,
            max_tokens,
            temperature: None,
            top_p: None,
            top_k: None,
            frequency_penalty: None,
            presence_penalty: None,
            stop_sequences: None,
            metadata: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Message content is either a bare string or a list of typed blocks.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    /// Concatenated text of the content; non-text blocks contribute nothing.
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Text(s)
    }
}

impl From<Vec<ContentBlock>> for MessageContent {
    fn from(blocks: Vec<ContentBlock>) -> Self {
        MessageContent::Blocks(blocks)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        source: ImageSource,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: String,
    /// Usually a base64 string, but callers may hand over any JSON payload.
    pub data: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MessageResponse {
    pub id: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub content: Vec<ResponseBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

impl ResponseBlock {
    pub fn text(&self) -> Option<&str> {
        match self {
            ResponseBlock::Text { text } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

// ===== Snapshot views used by the attribute extractors =====

/// Read-only view of an outgoing request.
pub trait RequestSnapshot {
    fn model(&self) -> Option<&str>;
    fn max_tokens(&self) -> Option<u32>;
    fn temperature(&self) -> Option<f64>;
    fn top_p(&self) -> Option<f64>;
    fn frequency_penalty(&self) -> Option<f64>;
    fn presence_penalty(&self) -> Option<f64>;
    /// Single legacy prompt, if this request carries one.
    fn prompt(&self) -> Option<&str> {
        None
    }
    fn messages(&self) -> Option<&[Message]> {
        None
    }
}

/// Read-only view of a returned response.
pub trait ResponseSnapshot {
    fn model(&self) -> Option<&str>;
    fn stop_reason(&self) -> Option<&str>;
    /// Single legacy completion text, if this response carries one.
    fn completion(&self) -> Option<&str> {
        None
    }
    fn content(&self) -> Option<&[ResponseBlock]> {
        None
    }
    fn usage(&self) -> Option<&Usage> {
        None
    }
}

impl RequestSnapshot for CompletionRequest {
    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
    fn max_tokens(&self) -> Option<u32> {
        Some(self.max_tokens_to_sample)
    }
    fn temperature(&self) -> Option<f64> {
        self.temperature
    }
    fn top_p(&self) -> Option<f64> {
        self.top_p
    }
    fn frequency_penalty(&self) -> Option<f64> {
        self.frequency_penalty
    }
    fn presence_penalty(&self) -> Option<f64> {
        self.presence_penalty
    }
    fn prompt(&self) -> Option<&str> {
        Some(&self.prompt)
    }
}

impl RequestSnapshot for MessagesRequest {
    fn model(&self) -> Option<&str> {
        Some(&self.model)
    }
    fn max_tokens(&self) -> Option<u32> {
        Some(self.max_tokens)
    }
    fn temperature(&self) -> Option<f64> {
        self.temperature
    }
    fn top_p(&self) -> Option<f64> {
        self.top_p
    }
    fn frequency_penalty(&self) -> Option<f64> {
        self.frequency_penalty
    }
    fn presence_penalty(&self) -> Option<f64> {
        self.presence_penalty
    }
    fn messages(&self) -> Option<&[Message]> {
        Some(&self.messages)
    }
}

impl ResponseSnapshot for CompletionResponse {
    fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
    fn stop_reason(&self) -> Option<&str> {
        self.stop_reason.as_deref()
    }
    fn completion(&self) -> Option<&str> {
        Some(&self.completion)
    }
}

impl ResponseSnapshot for MessageResponse {
    fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }
    fn stop_reason(&self) -> Option<&str> {
        self.stop_reason.as_deref()
    }
    fn content(&self) -> Option<&[ResponseBlock]> {
        Some(&self.content)
    }
    fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_response_parses_api_payload() {
        let body = json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-haiku-20240307",
            "content": [
                {"type": "text", "text": "hello"},
                {"type": "tool_use", "id": "tu_1", "name": "lookup", "input": {"q": "x"}},
                {"type": "thinking", "thinking": "..."}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 3, "output_tokens": 5}
        });
        let resp: MessageResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.model.as_deref(), Some("claude-3-haiku-20240307"));
        assert_eq!(resp.content.len(), 3);
        assert_eq!(resp.content[0].text(), Some("hello"));
        assert_eq!(resp.content[1].text(), None);
        assert_eq!(resp.content[2], ResponseBlock::Unknown);
        assert_eq!(resp.usage, Some(Usage { input_tokens: 3, output_tokens: 5 }));
    }

    #[test]
    fn message_content_accepts_string_or_blocks() {
        let plain: Message = serde_json::from_str(r#"{"role":"user","content":"hi"}"#).unwrap();
        assert_eq!(plain.content, MessageContent::Text("hi".into()));

        let blocks: Message = serde_json::from_value(json!({
            "role": "user",
            "content": [
                {"type": "text", "text": "what is this?"},
                {"type": "image", "source": {"type": "base64", "media_type": "image/png", "data": "AAAA"}}
            ]
        }))
        .unwrap();
        match &blocks.content {
            MessageContent::Blocks(b) => {
                assert_eq!(b.len(), 2);
                assert!(matches!(&b[1], ContentBlock::Image { source } if source.media_type == "image/png"));
            }
            other => panic!("expected blocks, got {other:?}"),
        }
        assert_eq!(blocks.content.text(), "what is this?");
    }

    #[test]
    fn optional_sampling_params_are_not_serialized() {
        let req = MessagesRequest::new("claude-2", vec![Message::user("hi")], 64);
        let as_json = serde_json::to_value(&req).unwrap();
        assert_eq!(as_json["max_tokens"], json!(64));
        assert!(as_json.get("temperature").is_none());
        assert!(as_json.get("frequency_penalty").is_none());
        assert_eq!(as_json["messages"][0]["content"], json!("hi"));
    }

    #[test]
    fn legacy_response_has_no_usage() {
        let resp: CompletionResponse = serde_json::from_value(json!({
            "id": "compl_1",
            "type": "completion",
            "completion": " Hello!",
            "stop_reason": "stop_sequence",
            "model": "claude-2"
        }))
        .unwrap();
        assert_eq!(resp.completion(), Some(" Hello!"));
        assert!(resp.usage().is_none());
        assert!(resp.content().is_none());
    }
}
