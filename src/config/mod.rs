use anyhow::{Context, Result};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::{Args, ProviderKind};
use crate::errors::CompletionError;
use crate::normalize::FallbackPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderKind,
    pub model: String,
    pub base_url: String,
    pub initial_temperature: f32,
    pub more_temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub retries: u32,
    pub retry_backoff_ms: u64,
    pub fallback_policy: FallbackPolicy,
    pub artifacts_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAI,
            model: "gpt-4o-mini".into(),
            base_url: "https://api.openai.com/v1".into(),
            initial_temperature: 0.7,
            more_temperature: 0.8,
            max_tokens: 6000,
            timeout_secs: 120,
            retries: 0,
            retry_backoff_ms: 2000,
            fallback_policy: FallbackPolicy::Substitute,
            artifacts_dir: ".scout/runs".into(),
        }
    }
}

impl Config {
    /// Defaults, overridden by the TOML file when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)?;
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Command-line flags win over the file.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(p) = args.provider {
            self.provider = p;
        }
        if let Some(m) = &args.model {
            self.model = m.clone();
        }
        if let Some(u) = &args.base_url {
            self.base_url = u.clone();
        }
        if let Some(t) = args.timeout_secs {
            self.timeout_secs = t;
        }
        if let Some(r) = args.retries {
            self.retries = r;
        }
        if args.strict {
            self.fallback_policy = FallbackPolicy::Fail;
        }
    }

    pub fn resolve_api_key(&self, explicit: Option<&str>) -> Result<String, CompletionError> {
        if let Some(k) = explicit.map(str::trim).filter(|k| !k.is_empty()) {
            return Ok(k.to_string());
        }
        let var = self.provider.key_env_var();
        std::env::var(var)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| CompletionError::MissingKey(var.to_string()))
    }
}
