//! Execution Result Adapter
//!
//! Folds executor responses back into store transitions. The step is marked
//! in progress *before* the await so any read during the suspension sees a
//! consistent snapshot; exactly one executor call is made per user action,
//! with no automatic retry. An abandoned await leaves the step in progress
//! until a later action resolves it.

use awsmig_core::{AutomationType, MigrationState, StepStatus};
use tracing::{info, warn};

use crate::api::{ExecutorError, StepExecution, StepExecutor};

/// Orchestrates step execution against a [`StepExecutor`] and applies the
/// outcome to the store. The store itself stays free of I/O.
pub struct StepRunner<E> {
    executor: E,
}

impl<E: StepExecutor> StepRunner<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Run one executable step. Outcome mapping:
    /// - `Completed` and the step is fully automated: the step completes
    ///   and the pointers advance;
    /// - `Failed`: the step is marked failed;
    /// - anything else (completed-but-manual, requires-action, in-progress):
    ///   the status set by `start_step` stands and the manual flow decides.
    ///
    /// On an executor error the step keeps the status it had before the
    /// await, so the operator can retry.
    pub async fn run_step(
        &self,
        state: &mut MigrationState,
        step_id: u32,
        account_id: Option<&str>,
    ) -> Result<StepExecution, ExecutorError> {
        let step = state
            .process()
            .find_step(step_id)
            .cloned()
            .ok_or(ExecutorError::UnknownStep(step_id))?;
        if !step.api_available {
            return Err(ExecutorError::NotExecutable(step_id));
        }

        state.start_step(step_id);

        let response = match self.executor.execute_step(&step, account_id).await {
            Ok(response) => response,
            Err(e) => {
                warn!(step_id, error = %e, "step execution failed; status left for retry");
                return Err(e);
            }
        };

        match response.status {
            StepStatus::Completed
                if step.automation_type == AutomationType::FullyAutomated =>
            {
                info!(step_id, "executor completed automated step");
                state.complete_step(step_id);
            }
            StepStatus::Failed => {
                warn!(step_id, "executor reported step failure");
                state.set_step_failed(step_id);
            }
            _ => {}
        }

        Ok(response)
    }

    /// Re-fetch the result payload and logs of an already completed step
    /// for display. Returns `None` when the step is not completed (or
    /// unknown) and never mutates state; the repeated executor call is
    /// idempotent from the store's perspective.
    pub async fn fetch_previous_results(
        &self,
        state: &MigrationState,
        step_id: u32,
        account_id: Option<&str>,
    ) -> Result<Option<StepExecution>, ExecutorError> {
        let Some(step) = state.process().find_step(step_id) else {
            return Ok(None);
        };
        if step.status != StepStatus::Completed {
            return Ok(None);
        }

        self.executor.execute_step(step, account_id).await.map(Some)
    }

    /// Execution history for a step, for the logs view.
    pub async fn step_history(
        &self,
        state: &MigrationState,
        step_id: u32,
        account_id: Option<&str>,
    ) -> Result<Vec<StepExecution>, ExecutorError> {
        let step = state
            .process()
            .find_step(step_id)
            .ok_or(ExecutorError::UnknownStep(step_id))?;
        self.executor.step_history(step, account_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use awsmig_core::{MigrationStep, Phase, PhaseType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn step(id: u32, automation: AutomationType, api: bool) -> MigrationStep {
        MigrationStep {
            id,
            title: format!("step {}", id),
            description: String::new(),
            phase: PhaseType::AssessExisting,
            status: StepStatus::Pending,
            automation_type: automation,
            api_available: api,
            estimated_time: 5,
            requires_confirmation: false,
            completed_at: None,
            notes: None,
            slug: Some(format!("step_{}", id)),
        }
    }

    fn state(steps: Vec<MigrationStep>) -> MigrationState {
        let phase = Phase {
            id: 1,
            phase_type: PhaseType::AssessExisting,
            title: "Assess".to_string(),
            description: String::new(),
            steps,
            status: StepStatus::Pending,
            progress: 0,
        };
        MigrationState::new("runner", vec![phase]).unwrap()
    }

    /// Answers every call with a fixed status and counts invocations.
    struct CannedExecutor {
        status: StepStatus,
        calls: AtomicUsize,
    }

    impl CannedExecutor {
        fn new(status: StepStatus) -> Self {
            Self {
                status,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn respond(&self, step: &MigrationStep) -> StepExecution {
            self.calls.fetch_add(1, Ordering::SeqCst);
            StepExecution {
                step_id: step.id,
                title: step.title.clone(),
                status: self.status,
                result: Some(serde_json::json!({ "success": true })),
                logs: vec!["Connecting to AWS account...".to_string()],
                execution_time: Some(3),
                slug: step.slug.clone(),
            }
        }
    }

    #[async_trait]
    impl StepExecutor for CannedExecutor {
        async fn execute_step(
            &self,
            step: &MigrationStep,
            _account_id: Option<&str>,
        ) -> Result<StepExecution, ExecutorError> {
            Ok(self.respond(step))
        }

        async fn latest_result(
            &self,
            step: &MigrationStep,
            _account_id: Option<&str>,
        ) -> Result<StepExecution, ExecutorError> {
            Ok(self.respond(step))
        }

        async fn step_history(
            &self,
            step: &MigrationStep,
            _account_id: Option<&str>,
        ) -> Result<Vec<StepExecution>, ExecutorError> {
            Ok(vec![self.respond(step)])
        }
    }

    /// Fails every call at the transport layer.
    struct BrokenExecutor;

    #[async_trait]
    impl StepExecutor for BrokenExecutor {
        async fn execute_step(
            &self,
            step: &MigrationStep,
            _account_id: Option<&str>,
        ) -> Result<StepExecution, ExecutorError> {
            Err(ExecutorError::Http {
                status: 502,
                path: crate::api::step_path(step),
            })
        }

        async fn latest_result(
            &self,
            step: &MigrationStep,
            _account_id: Option<&str>,
        ) -> Result<StepExecution, ExecutorError> {
            Err(ExecutorError::Http {
                status: 502,
                path: crate::api::step_path(step),
            })
        }

        async fn step_history(
            &self,
            step: &MigrationStep,
            _account_id: Option<&str>,
        ) -> Result<Vec<StepExecution>, ExecutorError> {
            Err(ExecutorError::Http {
                status: 502,
                path: crate::api::step_path(step),
            })
        }
    }

    #[tokio::test]
    async fn test_completed_response_completes_fully_automated_step() {
        let mut state = state(vec![
            step(1, AutomationType::FullyAutomated, true),
            step(2, AutomationType::FullyAutomated, true),
        ]);
        let runner = StepRunner::new(CannedExecutor::new(StepStatus::Completed));

        let response = runner.run_step(&mut state, 1, Some("123456789012")).await.unwrap();
        assert_eq!(response.status, StepStatus::Completed);
        assert_eq!(
            state.process().find_step(1).unwrap().status,
            StepStatus::Completed
        );
        // Auto-advance moved the pointer onto the next step
        assert_eq!(state.process().current_step, 2);
    }

    #[tokio::test]
    async fn test_completed_response_leaves_semi_automated_step_in_progress() {
        let mut state = state(vec![step(1, AutomationType::SemiAutomated, true)]);
        let runner = StepRunner::new(CannedExecutor::new(StepStatus::Completed));

        runner.run_step(&mut state, 1, None).await.unwrap();
        assert_eq!(
            state.process().find_step(1).unwrap().status,
            StepStatus::InProgress
        );
    }

    #[tokio::test]
    async fn test_failed_response_marks_step_failed() {
        let mut state = state(vec![step(1, AutomationType::FullyAutomated, true)]);
        let runner = StepRunner::new(CannedExecutor::new(StepStatus::Failed));

        runner.run_step(&mut state, 1, None).await.unwrap();
        assert_eq!(
            state.process().find_step(1).unwrap().status,
            StepStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_requires_action_response_leaves_status_alone() {
        let mut state = state(vec![step(1, AutomationType::FullyAutomated, true)]);
        let runner = StepRunner::new(CannedExecutor::new(StepStatus::RequiresAction));

        runner.run_step(&mut state, 1, None).await.unwrap();
        assert_eq!(
            state.process().find_step(1).unwrap().status,
            StepStatus::InProgress
        );
    }

    #[tokio::test]
    async fn test_executor_failure_leaves_step_for_retry() {
        let mut state = state(vec![step(1, AutomationType::FullyAutomated, true)]);
        let runner = StepRunner::new(BrokenExecutor);

        let err = runner.run_step(&mut state, 1, None).await.unwrap_err();
        assert!(matches!(err, ExecutorError::Http { status: 502, .. }));
        // The pre-await transition stands; nothing else was touched
        assert_eq!(
            state.process().find_step(1).unwrap().status,
            StepStatus::InProgress
        );
    }

    #[tokio::test]
    async fn test_unknown_and_manual_steps_are_rejected() {
        let mut state = state(vec![step(1, AutomationType::Manual, false)]);
        let runner = StepRunner::new(CannedExecutor::new(StepStatus::Completed));

        let err = runner.run_step(&mut state, 99, None).await.unwrap_err();
        assert!(matches!(err, ExecutorError::UnknownStep(99)));

        let err = runner.run_step(&mut state, 1, None).await.unwrap_err();
        assert!(matches!(err, ExecutorError::NotExecutable(1)));
        assert_eq!(
            state.process().find_step(1).unwrap().status,
            StepStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_fetch_previous_results_only_for_completed_steps() {
        let mut state = state(vec![step(1, AutomationType::FullyAutomated, true)]);
        let executor = CannedExecutor::new(StepStatus::Completed);
        let runner = StepRunner::new(executor);

        // Not completed yet: nothing to fetch, no executor call
        let fetched = runner.fetch_previous_results(&state, 1, None).await.unwrap();
        assert!(fetched.is_none());
        assert_eq!(runner.executor.calls(), 0);

        state.complete_step(1);
        let snapshot = state.process().clone();
        let fetched = runner.fetch_previous_results(&state, 1, None).await.unwrap();
        assert!(fetched.is_some());
        assert_eq!(runner.executor.calls(), 1);

        // Display-only: the aggregate is untouched
        assert_eq!(
            format!("{:?}", state.process()),
            format!("{:?}", &snapshot)
        );
    }

    #[tokio::test]
    async fn test_step_history_passthrough() {
        let state = state(vec![step(1, AutomationType::FullyAutomated, true)]);
        let runner = StepRunner::new(CannedExecutor::new(StepStatus::Completed));

        let history = runner.step_history(&state, 1, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].step_id, 1);

        let err = runner.step_history(&state, 99, None).await.unwrap_err();
        assert!(matches!(err, ExecutorError::UnknownStep(99)));
    }

    #[tokio::test]
    async fn test_latest_result_contract() {
        let state = state(vec![step(1, AutomationType::FullyAutomated, true)]);
        let executor = CannedExecutor::new(StepStatus::Completed);
        let step = state.process().find_step(1).unwrap();

        let latest = executor.latest_result(step, Some("123456789012")).await.unwrap();
        assert_eq!(latest.step_id, 1);
        assert_eq!(latest.status, StepStatus::Completed);
    }
}
