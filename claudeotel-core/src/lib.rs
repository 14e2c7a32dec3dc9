//! OpenTelemetry spans for Anthropic client calls.
//!
//! Wrap any [`client::AnthropicClient`] with an
//! [`instrumentation::AnthropicInstrumentor`] to get one span per legacy
//! completion or Messages API call, carrying `llm.*` request, response,
//! prompt/completion and token-usage attributes.

pub mod client;
pub mod config;
pub mod error;
pub mod http_client;
pub mod instrumentation;
pub mod model;
pub mod providers;
pub mod telemetry;
