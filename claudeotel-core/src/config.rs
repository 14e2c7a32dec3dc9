use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::error::{ClaudeOtelError, CoreResult};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AnthropicCfg {
    /// Name of the environment variable that contains the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for AnthropicCfg {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
        }
    }
}

impl AnthropicCfg {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> CoreResult<SecretString> {
        std::env::var(&self.api_key_env)
            .map(SecretString::from)
            .map_err(|_| {
                ClaudeOtelError::Validation(format!(
                    "required environment variable {} is not set",
                    self.api_key_env
                ))
            })
    }
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}
fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HttpCfg {
    /// TCP connect timeout in milliseconds (default 5000ms)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Total request timeout in milliseconds (default 600000ms; long generations are slow)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Optional per-host idle connection pool cap (None = reqwest default)
    #[serde(default)]
    pub pool_max_idle_per_host: Option<usize>,
}

impl Default for HttpCfg {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            pool_max_idle_per_host: None,
        }
    }
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}
fn default_request_timeout_ms() -> u64 {
    600_000
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TelemetryCfg {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// OTLP gRPC endpoint, e.g. "http://localhost:4317". None disables export.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    /// Forces prompt/completion content tracing on or off, taking the place
    /// of `TRACELOOP_TRACE_CONTENT` for the process.
    #[serde(default)]
    pub trace_content: Option<bool>,
}

impl Default for TelemetryCfg {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            otlp_endpoint: None,
            trace_content: None,
        }
    }
}

fn default_service_name() -> String {
    "claudeotel".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub anthropic: AnthropicCfg,
    /// HTTP client configuration (timeouts, pooling). Missing → defaults.
    #[serde(default)]
    pub http: HttpCfg,
    #[serde(default)]
    pub telemetry: TelemetryCfg,
}

impl Config {
    /// Load a Config from a file path (JSON or TOML by extension). If the
    /// extension is missing or unrecognized, try JSON first, then TOML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(ClaudeOtelError::from)?;
        let s = std::str::from_utf8(&bytes).map_err(|e| ClaudeOtelError::Other(e.into()))?;
        let cfg: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                serde_json::from_str::<Self>(s).map_err(|e| ClaudeOtelError::Other(e.into()))?
            }
            Some("toml") => {
                toml::from_str::<Self>(s).map_err(|e| ClaudeOtelError::Other(e.into()))?
            }
            _ => serde_json::from_str::<Self>(s)
                .map_err(|e| ClaudeOtelError::Other(e.into()))
                .or_else(|_| {
                    toml::from_str::<Self>(s).map_err(|e| ClaudeOtelError::Other(e.into()))
                })?,
        };
        Ok(cfg)
    }
}
