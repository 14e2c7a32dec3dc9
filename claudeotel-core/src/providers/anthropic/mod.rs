use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::{
    client::AnthropicClient,
    config::Config,
    error::CoreResult,
    http_client::HttpClient,
    model::{CompletionRequest, CompletionResponse, Message, MessageResponse, MessagesRequest},
};
use async_trait::async_trait;

/// Default Anthropic API version header required by the API.
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct Anthropic {
    http: HttpClient,
    api_key: SecretString,
    base: String,
    name: String,
}

impl Anthropic {
    pub fn new(http: HttpClient, api_key: SecretString, base: String) -> Self {
        Self {
            http: http.with_provider("anthropic"),
            api_key,
            base: base.trim_end_matches('/').to_string(),
            name: "anthropic".into(),
        }
    }

    /// Build a client from configuration; the API key is read from the
    /// environment variable the config names.
    pub fn from_config(cfg: &Config) -> CoreResult<Self> {
        let http = HttpClient::from_cfg(&cfg.http)?;
        Ok(Self::new(http, cfg.anthropic.api_key()?, cfg.anthropic.base_url.clone()))
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            (
                "x-api-key".to_string(),
                self.api_key.expose_secret().to_string(),
            ),
            (
                "anthropic-version".to_string(),
                ANTHROPIC_API_VERSION.to_string(),
            ),
        ]
    }

    async fn post<T: Serialize + ?Sized + Sync, R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        payload: &T,
    ) -> CoreResult<R> {
        let url = format!("{}{}", self.base, path);
        let headers = self.headers();
        let header_pairs: Vec<(&str, &str)> = headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let (resp, provider_request_id, latency_ms) =
            self.http.post_json::<_, R>(&url, payload, &header_pairs).await?;
        tracing::debug!(
            path,
            latency_ms,
            request_id = provider_request_id.as_deref().unwrap_or(""),
            "anthropic call finished"
        );
        Ok(resp)
    }
}

// ===== Anthropic wire types (token counting) =====

#[derive(Serialize)]
struct ACountReq<'a> {
    model: &'a str,
    messages: [Message; 1],
}

#[derive(Deserialize)]
struct ACountResp {
    input_tokens: u32,
}

#[async_trait]
impl AnthropicClient for Anthropic {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_completion(&self, req: CompletionRequest) -> CoreResult<CompletionResponse> {
        self.post("/v1/complete", &req).await
    }

    async fn create_message(&self, req: MessagesRequest) -> CoreResult<MessageResponse> {
        self.post("/v1/messages", &req).await
    }

    async fn count_tokens(&self, model: &str, text: &str) -> CoreResult<u32> {
        if text.is_empty() {
            return Ok(0);
        }
        let payload = ACountReq {
            model,
            messages: [Message::user(text)],
        };
        let resp: ACountResp = self.post("/v1/messages/count_tokens", &payload).await?;
        Ok(resp.input_tokens)
    }
}
