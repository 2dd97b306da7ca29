use thiserror::Error;

/// Outcome of a single chat-completion attempt that produced no usable text.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("invalid API key for {provider}")]
    InvalidKey { provider: String },
    #[error("rate limited by {provider}, retry later")]
    RateLimited { provider: String },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("connectivity failure: {detail}{}", hint_suffix(.hint))]
    Connectivity { detail: String, hint: Option<String> },
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("request cancelled")]
    Cancelled,
    #[error("provider {0} is not supported yet")]
    Unsupported(String),
    #[error("no API key: pass --api-key or set {0}")]
    MissingKey(String),
    #[error("malformed completion body: {0}")]
    MalformedBody(String),
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_deref().map(|h| format!(" ({h})")).unwrap_or_default()
}

impl CompletionError {
    /// Whether a caller-side retry can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompletionError::RateLimited { .. }
                | CompletionError::Connectivity { .. }
                | CompletionError::Timeout(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("role description is empty")]
    EmptyRole,
    #[error("run an analysis before asking for more cases")]
    NothingToExtend,
    #[error("model output unusable: {reason}")]
    Unparseable { reason: String },
    #[error(transparent)]
    Completion(#[from] CompletionError),
}
