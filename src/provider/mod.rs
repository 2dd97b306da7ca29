use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::errors::CompletionError;

pub mod openai;
pub mod unsupported;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self { temperature: 0.7, max_tokens: 6000 }
    }
}

/// One chat-completion call per invocation; returns the raw assistant text.
#[async_trait]
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn complete(
        &self,
        prompt: &str,
        params: &GenerationParams,
        cancel: &CancellationToken,
    ) -> Result<String, CompletionError>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

pub fn make_provider(cfg: &Config, api_key: String) -> DynProvider {
    match cfg.provider {
        ProviderKind::OpenAI => Box::new(openai::OpenAIProvider::new(
            cfg.model.clone(),
            api_key,
            cfg.base_url.clone(),
            Duration::from_secs(cfg.timeout_secs),
        )),
        // No adapters for these yet; they report Unsupported instead of
        // quietly returning example data.
        kind @ (ProviderKind::Anthropic | ProviderKind::GigaChat | ProviderKind::YandexGpt) => {
            Box::new(unsupported::UnsupportedProvider::new(kind))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            max_attempts: cfg.retries.saturating_add(1),
            backoff: Duration::from_millis(cfg.retry_backoff_ms),
        }
    }
}

/// Caller-side retry around [`Provider::complete`]. Only transient failures
/// (see [`CompletionError::is_retryable`]) are retried.
pub async fn complete_with_retry(
    provider: &dyn Provider,
    prompt: &str,
    params: &GenerationParams,
    retry: RetryPolicy,
    cancel: &CancellationToken,
) -> Result<String, CompletionError> {
    let attempts = retry.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match provider.complete(prompt, params, cancel).await {
            Err(e) if e.is_retryable() && attempt < attempts => {
                warn!(attempt, attempts, error = %e, provider = %provider.kind(), "completion failed, retrying");
                tokio::select! {
                    _ = cancel.cancelled() => return Err(CompletionError::Cancelled),
                    _ = tokio::time::sleep(retry.backoff) => {}
                }
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct Scripted {
        calls: AtomicU32,
        outcomes: Mutex<Vec<Result<String, CompletionError>>>,
    }

    impl Scripted {
        fn new(mut outcomes: Vec<Result<String, CompletionError>>) -> Self {
            outcomes.reverse();
            Self { calls: AtomicU32::new(0), outcomes: Mutex::new(outcomes) }
        }
    }

    #[async_trait]
    impl Provider for Scripted {
        fn kind(&self) -> ProviderKind {
            ProviderKind::OpenAI
        }

        async fn complete(
            &self,
            _prompt: &str,
            _params: &GenerationParams,
            _cancel: &CancellationToken,
        ) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes.lock().unwrap().pop().expect("scripted outcome")
        }
    }

    fn rate_limited() -> Result<String, CompletionError> {
        Err(CompletionError::RateLimited { provider: "openai".into() })
    }

    #[tokio::test]
    async fn single_attempt_by_default() {
        let p = Scripted::new(vec![rate_limited(), Ok("late".into())]);
        let out = complete_with_retry(&p, "x", &GenerationParams::default(), RetryPolicy { max_attempts: 1, backoff: Duration::ZERO }, &CancellationToken::new()).await;
        assert!(matches!(out, Err(CompletionError::RateLimited { .. })));
        assert_eq!(p.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let p = Scripted::new(vec![rate_limited(), rate_limited(), Ok("done".into())]);
        let retry = RetryPolicy { max_attempts: 3, backoff: Duration::from_millis(1) };
        let out = complete_with_retry(&p, "x", &GenerationParams::default(), retry, &CancellationToken::new()).await;
        assert_eq!(out.unwrap(), "done");
        assert_eq!(p.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_auth_failures() {
        let p = Scripted::new(vec![
            Err(CompletionError::InvalidKey { provider: "openai".into() }),
            Ok("never".into()),
        ]);
        let retry = RetryPolicy { max_attempts: 5, backoff: Duration::from_millis(1) };
        let out = complete_with_retry(&p, "x", &GenerationParams::default(), retry, &CancellationToken::new()).await;
        assert!(matches!(out, Err(CompletionError::InvalidKey { .. })));
        assert_eq!(p.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_interrupts_backoff() {
        let p = Scripted::new(vec![rate_limited(), Ok("never".into())]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let retry = RetryPolicy { max_attempts: 2, backoff: Duration::from_secs(60) };
        let out = complete_with_retry(&p, "x", &GenerationParams::default(), retry, &cancel).await;
        assert!(matches!(out, Err(CompletionError::Cancelled)));
    }

    #[test]
    fn retry_policy_counts_extra_attempts() {
        let cfg = Config { retries: 2, ..Config::default() };
        assert_eq!(RetryPolicy::from_config(&cfg).max_attempts, 3);
    }

    #[test]
    fn non_openai_kinds_get_stub() {
        let cfg = Config { provider: ProviderKind::GigaChat, ..Config::default() };
        assert_eq!(make_provider(&cfg, "token".into()).kind(), ProviderKind::GigaChat);
    }
}
