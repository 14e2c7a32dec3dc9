/// Span attribute keys for instrumented LLM calls.
/// Keep these stable; changing them is a breaking change for dashboards.
pub const LLM_VENDOR: &str = "llm.vendor";
pub const LLM_REQUEST_TYPE: &str = "llm.request.type";
pub const LLM_REQUEST_MODEL: &str = "llm.request.model";
pub const LLM_REQUEST_MAX_TOKENS: &str = "llm.request.max_tokens";
pub const LLM_TEMPERATURE: &str = "llm.temperature";
pub const LLM_TOP_P: &str = "llm.top_p";
pub const LLM_FREQUENCY_PENALTY: &str = "llm.frequency_penalty";
pub const LLM_PRESENCE_PENALTY: &str = "llm.presence_penalty";

/// Indexed prefixes; see [`prompt_user`] and [`completion_content`].
pub const LLM_PROMPTS: &str = "llm.prompts";
pub const LLM_COMPLETIONS: &str = "llm.completions";

pub const LLM_USAGE_PROMPT_TOKENS: &str = "llm.usage.prompt_tokens";
pub const LLM_USAGE_COMPLETION_TOKENS: &str = "llm.usage.completion_tokens";
pub const LLM_USAGE_TOTAL_TOKENS: &str = "llm.usage.total_tokens";
pub const LLM_RESPONSE_MODEL: &str = "llm.response.model";

/// Fixed values
pub const VENDOR_ANTHROPIC: &str = "Anthropic";
pub const REQUEST_TYPE_COMPLETION: &str = "completion";

pub fn prompt_user(index: usize) -> String {
    format!("{LLM_PROMPTS}.{index}.user")
}

pub fn completion_content(index: usize) -> String {
    format!("{LLM_COMPLETIONS}.{index}.content")
}

pub fn completion_finish_reason(index: usize) -> String {
    format!("{LLM_COMPLETIONS}.{index}.finish_reason")
}
