//! Migration State Store
//!
//! Single source of truth for the [`MigrationProcess`] aggregate. All
//! mutation goes through named operations so derived progress and status
//! are never stale; no other component writes step, phase, or aggregate
//! fields directly.
//!
//! Operations are synchronous in-memory transitions. Backend calls live in
//! the client crate and are awaited by the caller, never here.

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::validate_catalog;
use crate::error::CatalogError;
use crate::types::{MigrationProcess, MigrationStep, Phase, PhaseType, StepStatus};

/// Owner of the migration aggregate.
///
/// Unknown step or phase identifiers are handled by doing nothing: the
/// caller sees "nothing happened", never a panic or an error. Status
/// transitions are intentionally lenient "set" operations; completing a
/// step straight from `Pending` is legal.
#[derive(Debug, Clone)]
pub struct MigrationState {
    process: MigrationProcess,
}

impl MigrationState {
    /// Build a store over a validated catalog. Every step starts `Pending`
    /// and the navigation pointers sit on the first phase's first step.
    pub fn new(title: impl Into<String>, phases: Vec<Phase>) -> Result<Self, CatalogError> {
        validate_catalog(&phases)?;
        let (current_phase, current_step) =
            first_position(&phases).ok_or(CatalogError::NoSteps)?;

        let mut state = Self {
            process: MigrationProcess {
                id: Uuid::new_v4(),
                title: title.into(),
                phases,
                current_phase,
                current_step,
                status: StepStatus::Pending,
                progress: 0,
                started_at: Utc::now(),
                completed_at: None,
            },
        };
        state.recompute();
        Ok(state)
    }

    /// Read access to the aggregate snapshot.
    pub fn process(&self) -> &MigrationProcess {
        &self.process
    }

    /// The phase the pointers currently reference.
    pub fn current_phase(&self) -> Option<&Phase> {
        self.process.phase(self.process.current_phase)
    }

    /// The step the pointers currently reference.
    pub fn current_step(&self) -> Option<&MigrationStep> {
        self.process.find_step(self.process.current_step)
    }

    /// Mark the whole process in progress and point at the first phase's
    /// first step. Safe to call again once started.
    pub fn start_migration(&mut self) {
        self.process.status = StepStatus::InProgress;
        if let Some((phase, step)) = first_position(&self.process.phases) {
            self.process.current_phase = phase;
            self.process.current_step = step;
        }
        info!(process_id = %self.process.id, "migration started");
    }

    /// Move the named step to `InProgress` and make it current. No-op for
    /// an unknown id.
    pub fn start_step(&mut self, step_id: u32) {
        if !self.set_status(step_id, StepStatus::InProgress) {
            warn!(step_id, "start_step: unknown step id");
            return;
        }
        self.process.current_step = step_id;
        debug!(step_id, "step started");
        self.recompute();
    }

    /// Complete the named step, stamp its completion time, and advance the
    /// pointers to the next step in flattened phase-then-id order. When the
    /// last step overall completes, the aggregate completes with it.
    pub fn complete_step(&mut self, step_id: u32) {
        let now = Utc::now();
        let found = self.with_step(step_id, |step| {
            step.status = StepStatus::Completed;
            step.completed_at = Some(now);
        });

        if found {
            let order: Vec<u32> = self
                .process
                .all_steps_ordered()
                .iter()
                .map(|s| s.id)
                .collect();
            let next = order
                .iter()
                .position(|&id| id == step_id)
                .and_then(|idx| order.get(idx + 1).copied());

            match next {
                Some(next_id) => {
                    self.process.current_step = next_id;
                    if let Some(owner) = self.process.phase_of_step(next_id) {
                        self.process.current_phase = owner.phase_type;
                    }
                    self.process.status = StepStatus::InProgress;
                    debug!(step_id, next_id, "step completed, advanced");
                }
                None => {
                    self.process.status = StepStatus::Completed;
                    if self.process.completed_at.is_none() {
                        self.process.completed_at = Some(now);
                    }
                    info!(process_id = %self.process.id, "final step completed, migration finished");
                }
            }
        } else {
            warn!(step_id, "complete_step: unknown step id");
        }

        self.recompute();
    }

    /// Flag the named step as needing operator action. Pointers stay put.
    pub fn require_action(&mut self, step_id: u32) {
        if !self.set_status(step_id, StepStatus::RequiresAction) {
            warn!(step_id, "require_action: unknown step id");
        }
        self.recompute();
    }

    /// Flag the named step as failed. Pointers stay put; the step can be
    /// re-run.
    pub fn set_step_failed(&mut self, step_id: u32) {
        if !self.set_status(step_id, StepStatus::Failed) {
            warn!(step_id, "set_step_failed: unknown step id");
        }
        self.recompute();
    }

    /// Point at the named phase's first step. No-op when the phase is
    /// unknown or has no steps.
    pub fn go_to_phase(&mut self, phase_type: PhaseType) {
        let first = self
            .process
            .phase(phase_type)
            .and_then(|p| p.first_step())
            .map(|s| s.id);
        if let Some(step_id) = first {
            self.process.current_phase = phase_type;
            self.process.current_step = step_id;
        }
    }

    /// Point at the named step (and its owning phase). No-op for an unknown
    /// id.
    pub fn go_to_step(&mut self, step_id: u32) {
        let owner = self.process.phase_of_step(step_id).map(|p| p.phase_type);
        if let Some(phase_type) = owner {
            self.process.current_phase = phase_type;
            self.process.current_step = step_id;
        }
    }

    /// Set a step's status, returning whether the id exists.
    fn set_status(&mut self, step_id: u32, status: StepStatus) -> bool {
        self.with_step(step_id, |step| step.status = status)
    }

    fn with_step(&mut self, step_id: u32, f: impl FnOnce(&mut MigrationStep)) -> bool {
        for phase in &mut self.process.phases {
            for step in &mut phase.steps {
                if step.id == step_id {
                    f(step);
                    return true;
                }
            }
        }
        false
    }

    /// Recompute every derived field from step statuses: each phase's
    /// progress and status, then the aggregate progress. The aggregate
    /// *status* is owned by `start_migration`/`complete_step` so that a
    /// freshly started migration at 0% stays `InProgress`.
    fn recompute(&mut self) {
        let mut total = 0usize;
        let mut completed = 0usize;

        for phase in &mut self.process.phases {
            let phase_total = phase.steps.len();
            let phase_completed = phase
                .steps
                .iter()
                .filter(|s| s.status == StepStatus::Completed)
                .count();

            phase.progress = percentage(phase_completed, phase_total);
            phase.status = if phase_total > 0 && phase_completed == phase_total {
                StepStatus::Completed
            } else if phase_completed > 0 {
                StepStatus::InProgress
            } else {
                StepStatus::Pending
            };

            total += phase_total;
            completed += phase_completed;
        }

        self.process.progress = percentage(completed, total);
    }
}

/// First phase (ascending id) that has a step, and that step's id.
fn first_position(phases: &[Phase]) -> Option<(PhaseType, u32)> {
    let mut sorted: Vec<&Phase> = phases.iter().collect();
    sorted.sort_by_key(|p| p.id);
    sorted
        .iter()
        .find_map(|p| p.first_step().map(|s| (p.phase_type, s.id)))
}

/// Integer progress with the exact-100 guard: 100 only when everything is
/// complete, so rounding can never report 100 early (or 99 at the end).
fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    if completed == total {
        return 100;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u8
}
