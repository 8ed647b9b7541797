//! Migration Data Model
//!
//! Core types for the account-migration process: the status/phase/automation
//! enums, the step and phase catalog records, and the aggregate process root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a migration step. Phases and the aggregate reuse the same enum
/// for their derived status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    RequiresAction,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::RequiresAction => "requires-action",
        }
    }

    /// Whether the step needs no further work.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "requires-action" => Ok(Self::RequiresAction),
            _ => Err(format!("Unknown step status: {}", s)),
        }
    }
}

/// The fixed, closed set of migration phases. `as_str()` doubles as the
/// executor path segment for steps in the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseType {
    AssessExisting,
    PrepareNew,
    VerifyNew,
    AwsAttachDetach,
    Migration,
    PostMigration,
}

impl PhaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssessExisting => "assess-existing",
            Self::PrepareNew => "prepare-new",
            Self::VerifyNew => "verify-new",
            Self::AwsAttachDetach => "aws-attach-detach",
            Self::Migration => "migration",
            Self::PostMigration => "post-migration",
        }
    }
}

impl std::fmt::Display for PhaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PhaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assess-existing" => Ok(Self::AssessExisting),
            "prepare-new" => Ok(Self::PrepareNew),
            "verify-new" => Ok(Self::VerifyNew),
            "aws-attach-detach" => Ok(Self::AwsAttachDetach),
            "migration" => Ok(Self::Migration),
            "post-migration" => Ok(Self::PostMigration),
            _ => Err(format!("Unknown phase type: {}", s)),
        }
    }
}

/// How a step is carried out. Fixed per step, never changes at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutomationType {
    FullyAutomated,
    SemiAutomated,
    Manual,
}

impl AutomationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullyAutomated => "fully-automated",
            Self::SemiAutomated => "semi-automated",
            Self::Manual => "manual",
        }
    }
}

impl std::fmt::Display for AutomationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An atomic unit of migration work.
///
/// The catalog fields (everything except `status`, `completed_at`, and
/// `notes`) are immutable after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationStep {
    /// Globally unique; doubles as the ordering key within a phase.
    pub id: u32,
    pub title: String,
    pub description: String,
    /// Owning phase.
    pub phase: PhaseType,
    pub status: StepStatus,
    pub automation_type: AutomationType,
    /// Whether a backend execution endpoint exists; when false the step is
    /// handled purely through manual instructions.
    pub api_available: bool,
    /// Estimated duration in minutes, display/aggregation only.
    pub estimated_time: u32,
    /// UI hint: ask the operator before running.
    pub requires_confirmation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Stable identifier for executor addressing; the numeric id stands in
    /// when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl MigrationStep {
    /// The executor address segment for this step.
    pub fn slug_or_id(&self) -> String {
        self.slug.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// An ordered container of steps. `status` and `progress` are derived from
/// the steps and recomputed after every step mutation, never set directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    /// Defines phase ordering (ascending).
    pub id: u32,
    #[serde(rename = "type")]
    pub phase_type: PhaseType,
    pub title: String,
    pub description: String,
    pub steps: Vec<MigrationStep>,
    pub status: StepStatus,
    /// Derived 0-100.
    pub progress: u8,
}

impl Phase {
    /// Steps in ascending-id order. Sequencing decisions must use this, not
    /// insertion order.
    pub fn sorted_steps(&self) -> Vec<&MigrationStep> {
        let mut steps: Vec<&MigrationStep> = self.steps.iter().collect();
        steps.sort_by_key(|s| s.id);
        steps
    }

    /// Lowest-id step of the phase.
    pub fn first_step(&self) -> Option<&MigrationStep> {
        self.steps.iter().min_by_key(|s| s.id)
    }

    /// True when every step is completed; vacuously true for an empty phase.
    pub fn all_steps_completed(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Completed)
    }
}

/// The aggregate root: all phases plus the navigation pointers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationProcess {
    pub id: Uuid,
    pub title: String,
    pub phases: Vec<Phase>,
    /// Phase the operator is currently engaged with.
    pub current_phase: PhaseType,
    /// Step the operator is currently engaged with.
    pub current_step: u32,
    pub status: StepStatus,
    /// Derived 0-100 over all steps across all phases.
    pub progress: u8,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl MigrationProcess {
    /// Phases in ascending-id order.
    pub fn sorted_phases(&self) -> Vec<&Phase> {
        let mut phases: Vec<&Phase> = self.phases.iter().collect();
        phases.sort_by_key(|p| p.id);
        phases
    }

    pub fn phase(&self, phase_type: PhaseType) -> Option<&Phase> {
        self.phases.iter().find(|p| p.phase_type == phase_type)
    }

    pub fn find_step(&self, step_id: u32) -> Option<&MigrationStep> {
        self.phases
            .iter()
            .flat_map(|p| p.steps.iter())
            .find(|s| s.id == step_id)
    }

    /// The phase that contains `step_id`.
    pub fn phase_of_step(&self, step_id: u32) -> Option<&Phase> {
        self.phases
            .iter()
            .find(|p| p.steps.iter().any(|s| s.id == step_id))
    }

    /// All steps flattened into phase-then-id order. This is the sequence
    /// auto-advance walks.
    pub fn all_steps_ordered(&self) -> Vec<&MigrationStep> {
        let mut steps = Vec::new();
        for phase in self.sorted_phases() {
            steps.extend(phase.sorted_steps());
        }
        steps
    }
}
