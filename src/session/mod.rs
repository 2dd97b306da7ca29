use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::ScoutError;
use crate::log::RunLog;
use crate::normalize::{self, FallbackContext, FallbackPolicy, Normalized, Provenance};
use crate::prompt::{self, MoreContext};
use crate::provider::{complete_with_retry, GenerationParams, Provider, RetryPolicy};
use crate::wire::{AutomationCase, AutomationRecommendationSet, Mode};

/// Generation knobs the session applies to every round.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub initial: GenerationParams,
    pub more: GenerationParams,
    pub retry: RetryPolicy,
    pub policy: FallbackPolicy,
}

impl SessionSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            initial: GenerationParams { temperature: cfg.initial_temperature, max_tokens: cfg.max_tokens },
            more: GenerationParams { temperature: cfg.more_temperature, max_tokens: cfg.max_tokens },
            retry: RetryPolicy::from_config(cfg),
            policy: cfg.fallback_policy,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// The current recommendation set for one role and the operations that
/// replace, extend or drop it. Every operation takes `&mut self`, so at most
/// one request per session is in flight.
pub struct Session {
    settings: SessionSettings,
    role: String,
    current: Option<AutomationRecommendationSet>,
    last_provenance: Option<Provenance>,
    example_data: bool,
    rounds: u32,
    artifacts: Option<RunLog>,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            role: String::new(),
            current: None,
            last_provenance: None,
            example_data: false,
            rounds: 0,
            artifacts: None,
        }
    }

    pub fn with_artifacts(mut self, log: RunLog) -> Self {
        self.artifacts = Some(log);
        self
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn current(&self) -> Option<&AutomationRecommendationSet> {
        self.current.as_ref()
    }

    pub fn last_provenance(&self) -> Option<&Provenance> {
        self.last_provenance.as_ref()
    }

    /// True once any round in this session has shown example cases.
    pub fn shows_example_data(&self) -> bool {
        self.example_data
    }

    /// Replaces the current set with a fresh analysis of `role`.
    pub async fn analyze(
        &mut self,
        provider: &dyn Provider,
        role: &str,
        cancel: &CancellationToken,
    ) -> Result<&AutomationRecommendationSet, ScoutError> {
        let role = role.trim();
        if role.is_empty() {
            return Err(ScoutError::EmptyRole);
        }
        info!(provider = %provider.kind(), "analyzing role");

        let prompt = prompt::initial_prompt(role);
        let raw = complete_with_retry(provider, &prompt, &self.settings.initial, self.settings.retry, cancel).await?;
        let ctx = FallbackContext { existing: &[], role };
        let normalized = normalize::normalize(&raw, Mode::Initial, ctx, self.settings.policy)?;

        self.save_artifacts("analyze", &prompt, &raw, &normalized);
        self.role = role.to_string();
        self.rounds = 0;
        self.example_data = normalized.provenance.uses_example_data();
        self.last_provenance = Some(normalized.provenance);
        Ok(&*self.current.insert(normalized.set))
    }

    /// Asks for cases that extend the current set and appends them.
    /// Returns the newly added cases.
    pub async fn generate_more(
        &mut self,
        provider: &dyn Provider,
        cancel: &CancellationToken,
    ) -> Result<&[AutomationCase], ScoutError> {
        let Some(current) = self.current.as_ref().filter(|s| !s.automation_cases.is_empty()) else {
            return Err(ScoutError::NothingToExtend);
        };
        info!(provider = %provider.kind(), existing = current.automation_cases.len(), "generating more cases");

        let prompt = prompt::more_prompt(&MoreContext {
            role: &self.role,
            prior_analysis: &current.role_analysis,
            prior_practices: &current.best_practices,
            prior_cases: &current.automation_cases,
        });
        let raw = complete_with_retry(provider, &prompt, &self.settings.more, self.settings.retry, cancel).await?;
        let ctx = FallbackContext { existing: &current.automation_cases, role: &self.role };
        let normalized = normalize::normalize(&raw, Mode::More, ctx, self.settings.policy)?;

        self.rounds += 1;
        self.save_artifacts(&format!("more-{}", self.rounds), &prompt, &raw, &normalized);
        self.example_data |= normalized.provenance.uses_example_data();
        self.last_provenance = Some(normalized.provenance);

        let Some(current) = self.current.as_mut() else {
            return Err(ScoutError::NothingToExtend);
        };
        let start = current.automation_cases.len();
        current.automation_cases.extend(normalized.set.automation_cases);
        Ok(&current.automation_cases[start..])
    }

    pub fn clear(&mut self) {
        self.role.clear();
        self.current = None;
        self.last_provenance = None;
        self.example_data = false;
        self.rounds = 0;
    }

    fn save_artifacts(&self, stage: &str, prompt: &str, raw: &str, normalized: &Normalized) {
        let Some(log) = &self.artifacts else { return };
        if let Err(e) = log.save_stage(stage, prompt, raw, &normalized.set, &normalized.provenance) {
            warn!(stage, error = %e, "could not save run artifacts");
        }
    }
}
