//! Step Executor Client
//!
//! Contract to the backend that actually performs a step's AWS operations.
//! A step is addressed by `<phase-type>/<slug>` with the selected account
//! forwarded as the `account_id` query parameter; responses carry a status
//! from the shared step enum plus an opaque result payload and log lines.

use async_trait::async_trait;
use awsmig_core::{MigrationStep, StepStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default backend location for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8005/api";

/// Environment variable overriding the backend location.
pub const BASE_URL_ENV: &str = "MIGRATION_API_BASE_URL";

/// Result of one executor invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepExecution {
    pub step_id: u32,
    pub title: String,
    pub status: StepStatus,
    /// Opaque payload; rendered by the presentation layer, never
    /// interpreted here.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub logs: Vec<String>,
    /// Seconds the backend spent executing.
    #[serde(default)]
    pub execution_time: Option<u32>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Executor failures. None of these mutate step status; the caller surfaces
/// the message and the operator may retry.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The backend answered with a non-success status code.
    #[error("executor returned HTTP {status} for {path}")]
    Http { status: u16, path: String },

    /// The request never completed (connect failure, timeout, bad body).
    #[error("executor transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The step id does not exist in the catalog.
    #[error("step {0} not found")]
    UnknownStep(u32),

    /// The step has no backend endpoint; it is handled through manual
    /// instructions only.
    #[error("step {0} has no execution endpoint")]
    NotExecutable(u32),
}

/// Seam between state transitions and the backend. Production uses
/// [`HttpExecutor`]; tests drop in hand-rolled fakes so the store stays
/// unit-testable without network mocking.
#[async_trait]
pub trait StepExecutor {
    /// Run the step once and return its outcome.
    async fn execute_step(
        &self,
        step: &MigrationStep,
        account_id: Option<&str>,
    ) -> Result<StepExecution, ExecutorError>;

    /// Latest stored outcome for the step, without re-executing it.
    async fn latest_result(
        &self,
        step: &MigrationStep,
        account_id: Option<&str>,
    ) -> Result<StepExecution, ExecutorError>;

    /// Full execution history for the step.
    async fn step_history(
        &self,
        step: &MigrationStep,
        account_id: Option<&str>,
    ) -> Result<Vec<StepExecution>, ExecutorError>;
}

/// Executor path for a step: `<phase-type>/<slug>`, the numeric id standing
/// in when the step carries no slug.
pub fn step_path(step: &MigrationStep) -> String {
    format!("{}/{}", step.phase.as_str(), step.slug_or_id())
}

/// HTTP executor over the backend API.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
    base_url: String,
}

impl HttpExecutor {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Base URL from `MIGRATION_API_BASE_URL`, falling back to the local
    /// development backend.
    pub fn from_env() -> Self {
        let base = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, step: &MigrationStep, suffix: Option<&str>) -> String {
        let mut url = format!("{}/{}", self.base_url, step_path(step));
        if let Some(suffix) = suffix {
            url.push('/');
            url.push_str(suffix);
        }
        url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        account_id: Option<&str>,
    ) -> Result<T, ExecutorError> {
        let mut request = self.client.get(&url);
        if let Some(account) = account_id {
            request = request.query(&[("account_id", account)]);
        }

        debug!(%url, account = ?account_id, "calling step executor");
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ExecutorError::Http {
                status: response.status().as_u16(),
                path: url,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl StepExecutor for HttpExecutor {
    async fn execute_step(
        &self,
        step: &MigrationStep,
        account_id: Option<&str>,
    ) -> Result<StepExecution, ExecutorError> {
        self.get_json(self.url_for(step, None), account_id).await
    }

    async fn latest_result(
        &self,
        step: &MigrationStep,
        account_id: Option<&str>,
    ) -> Result<StepExecution, ExecutorError> {
        self.get_json(self.url_for(step, Some("latest")), account_id)
            .await
    }

    async fn step_history(
        &self,
        step: &MigrationStep,
        account_id: Option<&str>,
    ) -> Result<Vec<StepExecution>, ExecutorError> {
        self.get_json(self.url_for(step, Some("history")), account_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awsmig_core::{builtin_phases, AutomationType, PhaseType};

    fn check_ram_step() -> MigrationStep {
        builtin_phases()
            .into_iter()
            .flat_map(|p| p.steps)
            .find(|s| s.id == 1)
            .unwrap()
    }

    #[test]
    fn test_step_path_uses_slug() {
        let step = check_ram_step();
        assert_eq!(step_path(&step), "assess-existing/check_ram");
    }

    #[test]
    fn test_step_path_falls_back_to_id() {
        let mut step = check_ram_step();
        step.slug = None;
        assert_eq!(step_path(&step), "assess-existing/1");
    }

    #[test]
    fn test_url_construction() {
        let exec = HttpExecutor::new("http://backend:8005/api/");
        let step = check_ram_step();
        assert_eq!(
            exec.url_for(&step, None),
            "http://backend:8005/api/assess-existing/check_ram"
        );
        assert_eq!(
            exec.url_for(&step, Some("latest")),
            "http://backend:8005/api/assess-existing/check_ram/latest"
        );
        assert_eq!(
            exec.url_for(&step, Some("history")),
            "http://backend:8005/api/assess-existing/check_ram/history"
        );
    }

    #[test]
    fn test_from_env_defaults_to_local_backend() {
        std::env::remove_var(BASE_URL_ENV);
        let exec = HttpExecutor::from_env();
        assert_eq!(exec.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_step_execution_deserializes_backend_shape() {
        let body = serde_json::json!({
            "step_id": 1,
            "title": "Check for resources shared via RAM",
            "status": "completed",
            "result": { "success": true, "shared_resources": [] },
            "logs": [
                "Initializing AWS SDK...",
                "Connecting to AWS account...",
                "Checking for resources shared via RAM...",
            ],
            "execution_time": 4
        });

        let execution: StepExecution = serde_json::from_value(body).unwrap();
        assert_eq!(execution.step_id, 1);
        assert_eq!(execution.status, StepStatus::Completed);
        assert_eq!(execution.logs.len(), 3);
        assert_eq!(execution.execution_time, Some(4));
        assert!(execution.slug.is_none());
    }

    #[test]
    fn test_step_execution_tolerates_minimal_payload() {
        let body = serde_json::json!({
            "step_id": 19,
            "title": "Move account into target OU",
            "status": "requires-action"
        });

        let execution: StepExecution = serde_json::from_value(body).unwrap();
        assert_eq!(execution.status, StepStatus::RequiresAction);
        assert!(execution.result.is_none());
        assert!(execution.logs.is_empty());
    }

    #[test]
    fn test_catalog_slugs_resolve_against_phase_paths() {
        // Every executable step must produce a well-formed address
        for phase in builtin_phases() {
            for step in &phase.steps {
                if !step.api_available {
                    continue;
                }
                let path = step_path(step);
                assert!(path.starts_with(PhaseType::AssessExisting.as_str()));
                assert_eq!(step.automation_type, AutomationType::FullyAutomated);
            }
        }
    }
}
