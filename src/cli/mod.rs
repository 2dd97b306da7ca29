use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(name = "openai", alias = "open-ai")]
    OpenAI,
    #[value(name = "anthropic", alias = "claude")]
    Anthropic,
    #[value(name = "gigachat")]
    GigaChat,
    #[value(name = "yandexgpt", alias = "yandex")]
    YandexGpt,
}

impl ProviderKind {
    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::GigaChat => "gigachat",
            ProviderKind::YandexGpt => "yandexgpt",
        }
    }

    pub fn key_env_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::GigaChat => "GIGACHAT_API_KEY",
            ProviderKind::YandexGpt => "YANDEXGPT_API_KEY",
        }
    }

    /// Endpoints that are commonly unreachable from some regions without a VPN.
    pub fn region_restricted(self) -> bool {
        matches!(self, ProviderKind::OpenAI | ProviderKind::Anthropic)
    }

    /// Cheap shape check on the key before spending a request on it.
    pub fn key_format_problem(self, key: &str) -> Option<&'static str> {
        let ok = match self {
            ProviderKind::OpenAI => key.starts_with("sk-"),
            ProviderKind::Anthropic => key.starts_with("sk-ant-"),
            ProviderKind::GigaChat | ProviderKind::YandexGpt => key.len() > 10,
        };
        if ok {
            return None;
        }
        Some(match self {
            ProviderKind::OpenAI => "OpenAI keys start with \"sk-\"",
            ProviderKind::Anthropic => "Anthropic keys start with \"sk-ant-\"",
            ProviderKind::GigaChat => "expected a GigaChat access token",
            ProviderKind::YandexGpt => "expected a YandexGPT token",
        })
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Parser, Debug)]
#[command(name = "role_scout", version, about = "Suggests AI-agent automation cases for a professional role")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file overriding the built-in defaults
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(long, value_enum, global = true)]
    pub provider: Option<ProviderKind>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Falls back to the provider's environment variable (e.g. OPENAI_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Extra attempts after a rate-limit, timeout or connectivity failure
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Fail instead of substituting example cases when the model output is unusable
    #[arg(long, default_value_t = false, global = true)]
    pub strict: bool,

    #[arg(long, default_value_t = false, global = true)]
    pub save_artifacts: bool,

    #[arg(long, default_value_t = false, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a role description and print automation cases
    Analyze {
        #[arg(long)]
        role: String,

        /// Rounds of "generate more" to run after the analysis; asks interactively when omitted
        #[arg(long)]
        more: Option<u32>,

        /// Write the final result as JSON to this file
        #[arg(long)]
        output: Option<String>,

        /// Print JSON instead of the formatted view
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Check the API key format and make a minimal request
    Probe,
}
