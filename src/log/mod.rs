use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::Serialize;
use serde_json::to_string_pretty;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::normalize::Provenance;
use crate::wire::AutomationRecommendationSet;

/// Installs the stderr subscriber. `RUST_LOG` wins when set; otherwise
/// `info`, or `debug` with `--debug`.
pub fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("role_scout={level}")));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
}

/// Per-run artifact directory: `<root>/<run id>/`.
#[derive(Debug, Clone)]
pub struct RunLog {
    id: Uuid,
    dir: PathBuf,
}

#[derive(Debug)]
pub struct SavedPaths {
    pub prompt: PathBuf,
    pub response: PathBuf,
    pub result: PathBuf,
}

#[derive(Serialize)]
struct StageRecord<'a> {
    run: Uuid,
    stage: &'a str,
    saved_at: DateTime<Utc>,
    provenance: &'a Provenance,
    result: &'a AutomationRecommendationSet,
}

impl RunLog {
    pub fn create(root: &Path) -> anyhow::Result<Self> {
        let id = Uuid::new_v4();
        let dir = root.join(id.to_string());
        fs::create_dir_all(&dir)?;
        Ok(Self { id, dir })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `<stage>.prompt.txt`, `<stage>.response.txt` and
    /// `<stage>.result.json`.
    pub fn save_stage(
        &self,
        stage: &str,
        prompt: &str,
        response: &str,
        result: &AutomationRecommendationSet,
        provenance: &Provenance,
    ) -> anyhow::Result<SavedPaths> {
        let prompt_path = self.dir.join(format!("{stage}.prompt.txt"));
        fs::write(&prompt_path, prompt)?;

        let response_path = self.dir.join(format!("{stage}.response.txt"));
        fs::write(&response_path, response)?;

        let record = StageRecord {
            run: self.id,
            stage,
            saved_at: Utc::now(),
            provenance,
            result,
        };
        let result_path = self.dir.join(format!("{stage}.result.json"));
        fs::write(&result_path, to_string_pretty(&record)?)?;

        Ok(SavedPaths { prompt: prompt_path, response: response_path, result: result_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;

    #[test]
    fn stage_files_land_in_run_dir() {
        let root = tempfile::tempdir().unwrap();
        let log = RunLog::create(root.path()).unwrap();
        assert_eq!(log.dir(), root.path().join(log.id().to_string()));

        let set = fallback::initial();
        let saved = log
            .save_stage("analyze", "the prompt", "the response", &set, &Provenance::Generated)
            .unwrap();

        assert_eq!(fs::read_to_string(&saved.prompt).unwrap(), "the prompt");
        assert_eq!(fs::read_to_string(&saved.response).unwrap(), "the response");

        let record: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&saved.result).unwrap()).unwrap();
        assert_eq!(record["stage"], "analyze");
        assert_eq!(record["provenance"]["kind"], "generated");
        assert_eq!(record["result"]["automationCases"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn repeated_tracing_init_is_harmless() {
        init_tracing(false);
        init_tracing(true);
    }

    #[test]
    fn separate_runs_get_separate_dirs() {
        let root = tempfile::tempdir().unwrap();
        let a = RunLog::create(root.path()).unwrap();
        let b = RunLog::create(root.path()).unwrap();
        assert_ne!(a.dir(), b.dir());
    }
}
