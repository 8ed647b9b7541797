//! Step Gating
//!
//! Decides whether a requested step may be entered, given the linear phase
//! order (ascending phase id) and, within a phase, the linear step order
//! (ascending step id). Advisory and UI-level only: it governs whether a
//! step's view is shown or replaced by a redirect prompt, and never blocks
//! store operations.

use serde::Serialize;

use crate::types::{MigrationProcess, Phase, PhaseType, StepStatus};

/// Outcome of a gating query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepAccess {
    pub allowed: bool,
    /// Blocking phase to send the operator to when entry is denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<PhaseType>,
}

impl StepAccess {
    fn allow() -> Self {
        Self {
            allowed: true,
            redirect: None,
        }
    }

    fn deny(redirect: PhaseType) -> Self {
        Self {
            allowed: false,
            redirect: Some(redirect),
        }
    }
}

/// May the operator enter `(phase_type, step_id)`?
///
/// Rules, in order:
/// 1. Unknown phases are not gated.
/// 2. The first step of any phase after the first requires every step of
///    every earlier phase to be completed; the redirect names the lowest-id
///    incomplete predecessor.
/// 3. The first step of a phase (or an id the phase does not contain) is
///    otherwise always allowed.
/// 4. Any other step requires all earlier steps of its own phase to be
///    completed; the redirect re-enters the same phase.
///
/// An empty predecessor phase blocks nothing.
pub fn check_step_access(
    process: &MigrationProcess,
    phase_type: PhaseType,
    step_id: u32,
) -> StepAccess {
    let Some(target) = process.phase(phase_type) else {
        return StepAccess::allow();
    };

    let phases = process.sorted_phases();
    let Some(phase_index) = phases.iter().position(|p| p.phase_type == phase_type) else {
        return StepAccess::allow();
    };

    let steps = target.sorted_steps();
    let is_first_step = steps.first().map(|s| s.id) == Some(step_id);

    if phase_index > 0 && is_first_step {
        let blocking = phases[..phase_index]
            .iter()
            .find(|p| !phase_completed(p));
        if let Some(blocker) = blocking {
            return StepAccess::deny(blocker.phase_type);
        }
    }

    let Some(step_index) = steps.iter().position(|s| s.id == step_id) else {
        return StepAccess::allow();
    };
    if step_index == 0 {
        return StepAccess::allow();
    }

    let predecessors_done = steps[..step_index]
        .iter()
        .all(|s| s.status == StepStatus::Completed);
    if predecessors_done {
        StepAccess::allow()
    } else {
        StepAccess::deny(phase_type)
    }
}

fn phase_completed(phase: &Phase) -> bool {
    phase.all_steps_completed()
}
