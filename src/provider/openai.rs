use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::GenerationParams;
use crate::cli::ProviderKind;
use crate::errors::CompletionError;
use crate::wire::{ApiErrorBody, ChatMessage, ChatRequest, ChatResponse};

/// OpenAI chat-completions adapter. The whole instruction goes out as a
/// single system message.
pub struct OpenAIProvider {
    model: String,
    api_key: String,
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl OpenAIProvider {
    pub fn new(model: String, api_key: String, base_url: String, timeout: Duration) -> Self {
        Self {
            model,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
            timeout,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn transport_error(&self, e: reqwest::Error) -> CompletionError {
        if e.is_timeout() {
            return CompletionError::Timeout(self.timeout.as_secs());
        }
        let hint = ProviderKind::OpenAI
            .region_restricted()
            .then(|| "the API may be blocked in your region; check your network or use a VPN".to_string());
        CompletionError::Connectivity { detail: e.to_string(), hint }
    }
}

/// Maps a non-success status and its body onto the error taxonomy.
fn status_error(status: StatusCode, body: &str) -> CompletionError {
    let provider = ProviderKind::OpenAI.name().to_string();
    match status {
        StatusCode::UNAUTHORIZED => CompletionError::InvalidKey { provider },
        StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited { provider },
        StatusCode::BAD_REQUEST => {
            let detail = serde_json::from_str::<ApiErrorBody>(body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| body.to_string());
            CompletionError::BadRequest(detail)
        }
        other => CompletionError::Http { status: other.as_u16(), body: body.to_string() },
    }
}

#[async_trait]
impl super::Provider for OpenAIProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
        cancel: &CancellationToken,
    ) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "system", content: prompt }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };
        debug!(model = %self.model, temperature = params.temperature, max_tokens = params.max_tokens, "POST {}", self.endpoint());

        let send = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send();

        let resp = tokio::select! {
            _ = cancel.cancelled() => return Err(CompletionError::Cancelled),
            r = send => r.map_err(|e| self.transport_error(e))?,
        };

        let status = resp.status();
        let text = tokio::select! {
            _ = cancel.cancelled() => return Err(CompletionError::Cancelled),
            r = resp.text() => r.map_err(|e| self.transport_error(e))?,
        };
        debug!(%status, bytes = text.len(), "openai response");

        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| CompletionError::MalformedBody(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CompletionError::MalformedBody("no choices[0].message.content".into()))
    }
}
