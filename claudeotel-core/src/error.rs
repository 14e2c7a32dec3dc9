use thiserror::Error;

/// Core error type for claudeotel.
/// Internally, modules can use `anyhow::Result<T>` for convenience,
/// but public boundaries should expose `CoreResult<T>` with this error.
#[derive(Debug, Error)]
pub enum ClaudeOtelError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("rate limited by provider {provider}")]
    RateLimited {
        provider: String,
        retry_after: Option<u64>,
    },

    #[error("provider unavailable: {provider}")]
    ProviderUnavailable { provider: String },

    #[error("upstream error from {provider}: {code} {message}")]
    ProviderError {
        provider: String,
        code: String,
        message: String,
    },

    #[error("instrumentor {name} is already installed")]
    AlreadyInstrumented { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CoreResult<T> = std::result::Result<T, ClaudeOtelError>;

/// Failure while deriving span attributes from a request or response.
/// Never surfaced to callers of an instrumented client; logged and dropped.
#[derive(Debug, Error)]
pub enum AttributeError {
    #[error("content serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("token counting failed: {0}")]
    TokenCount(#[source] Box<ClaudeOtelError>),

    #[error("token count overflow for {field}")]
    Overflow { field: &'static str },
}

impl From<ClaudeOtelError> for AttributeError {
    fn from(e: ClaudeOtelError) -> Self {
        AttributeError::TokenCount(Box::new(e))
    }
}
