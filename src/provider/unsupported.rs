use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{GenerationParams, Provider};
use crate::cli::ProviderKind;
use crate::errors::CompletionError;

/// Placeholder for providers without an adapter in this build.
pub struct UnsupportedProvider {
    kind: ProviderKind,
}

impl UnsupportedProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl Provider for UnsupportedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
        _cancel: &CancellationToken,
    ) -> Result<String, CompletionError> {
        Err(CompletionError::Unsupported(self.kind.name().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_unsupported_instead_of_content() {
        for kind in [ProviderKind::Anthropic, ProviderKind::GigaChat, ProviderKind::YandexGpt] {
            let p = UnsupportedProvider::new(kind);
            let err = p
                .complete("prompt", &GenerationParams::default(), &CancellationToken::new())
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), format!("provider {} is not supported yet", kind.name()));
        }
    }
}
