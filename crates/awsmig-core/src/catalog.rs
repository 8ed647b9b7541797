//! Step/Phase Catalog
//!
//! The shipped definition of every migration phase and step: identity,
//! display text, automation classification, time estimate, and whether a
//! backend execution endpoint exists. The catalog is immutable after
//! construction; only step status, completion timestamps, and notes mutate
//! at runtime.

use std::collections::HashMap;

use crate::error::CatalogError;
use crate::types::{AutomationType, MigrationStep, Phase, PhaseType, StepStatus};

/// Reject a malformed catalog before a store is ever built over it.
///
/// Checks: at least one phase, at least one step overall, unique phase ids,
/// globally unique step ids, and each step's `phase` field matching its
/// owning phase.
pub fn validate_catalog(phases: &[Phase]) -> Result<(), CatalogError> {
    if phases.is_empty() {
        return Err(CatalogError::NoPhases);
    }
    if phases.iter().all(|p| p.steps.is_empty()) {
        return Err(CatalogError::NoSteps);
    }

    let mut phase_ids: HashMap<u32, PhaseType> = HashMap::new();
    let mut step_owners: HashMap<u32, PhaseType> = HashMap::new();

    for phase in phases {
        if phase_ids.insert(phase.id, phase.phase_type).is_some() {
            return Err(CatalogError::DuplicatePhaseId { id: phase.id });
        }
        for step in &phase.steps {
            if step.phase != phase.phase_type {
                return Err(CatalogError::PhaseMismatch {
                    step_id: step.id,
                    declared: step.phase,
                    actual: phase.phase_type,
                });
            }
            if let Some(first) = step_owners.insert(step.id, phase.phase_type) {
                return Err(CatalogError::DuplicateStepId {
                    id: step.id,
                    first,
                    second: phase.phase_type,
                });
            }
        }
    }

    Ok(())
}

/// The built-in six-phase catalog for an AWS account move between
/// organizations. Step ids are assigned densely and ascending across the
/// whole catalog; ordering leans on that.
pub fn builtin_phases() -> Vec<Phase> {
    vec![
        phase(
            1,
            PhaseType::AssessExisting,
            "Assess Existing Environment",
            "Evaluate current AWS environment and identify migration requirements",
            vec![
                step(1, PhaseType::AssessExisting, "check_ram")
                    .title("Check for resources shared via RAM")
                    .description("Check for resources shared via RAM with the rest of the Org or OUs")
                    .automated()
                    .notes("Agent will automatically scan for shared resources")
                    .build(),
                step(2, PhaseType::AssessExisting, "check_admin_services")
                    .title("Check for delegated admin services")
                    .description(
                        "Check if services like AWS Backup, GuardDuty, and Inspector have a \
                         delegated admin in the old organization",
                    )
                    .automated()
                    .estimated_time(8)
                    .notes("Agent will identify all delegated admin services")
                    .build(),
                step(3, PhaseType::AssessExisting, "cost_explorer_data")
                    .title("Check Cost Explorer data")
                    .description(
                        "Cost Explorer in the new payer will not carry historical data from the \
                         old payer",
                    )
                    .automated()
                    .notes("Agent will automatically check Cost Explorer data")
                    .build(),
                step(4, PhaseType::AssessExisting, "check_savings")
                    .title("Check RI and Savings Plans")
                    .description(
                        "Inventory Reserved Instances and Savings Plans that need re-evaluation \
                         after the move",
                    )
                    .automated()
                    .notes("Agent will automatically check RI and Savings Plans")
                    .build(),
                step(5, PhaseType::AssessExisting, "check_policies")
                    .title("Check for policy references")
                    .description(
                        "Check policy documents across AWS services for Organization or OU \
                         references",
                    )
                    .automated()
                    .notes("Agent will automatically check for policy references")
                    .build(),
                step(6, PhaseType::AssessExisting, "check_stacksets")
                    .title("Check for stacksets")
                    .description("Check if CloudFormation StackSets use AWS Organizations")
                    .automated()
                    .notes("Agent will automatically check for stacksets")
                    .build(),
                step(7, PhaseType::AssessExisting, "check_enterprise_support")
                    .title("Confirm Enterprise Support")
                    .description(
                        "Confirm the Enterprise Support plan carries over to the new organization",
                    )
                    .estimated_time(10)
                    .build(),
                step(8, PhaseType::AssessExisting, "create_iam_admin")
                    .title("Create fallback IAM admin")
                    .description("Create a fallback IAM admin in case SSO fails during the move")
                    .automated()
                    .notes("Agent will automatically create the IAM admin")
                    .build(),
            ],
        ),
        phase(
            2,
            PhaseType::PrepareNew,
            "Prepare New Environment",
            "Set up and configure the target AWS environment for migration",
            vec![
                step(9, PhaseType::PrepareNew, "create_ou")
                    .title("Create organizational units")
                    .description("Create the organizational units in the new organization")
                    .estimated_time(15)
                    .build(),
                step(10, PhaseType::PrepareNew, "register_ou")
                    .title("Register OUs with Control Tower")
                    .description("Register the new organizational units with Control Tower")
                    .estimated_time(10)
                    .build(),
                step(11, PhaseType::PrepareNew, "create_kms_key")
                    .title("Create KMS keys")
                    .description("Create KMS keys required by workloads in the new environment")
                    .semi_automated()
                    .estimated_time(10)
                    .build(),
                step(12, PhaseType::PrepareNew, "duplicate_sso")
                    .title("Duplicate SSO configuration")
                    .description(
                        "Duplicate the SSO and identity-provider configuration in the new \
                         organization",
                    )
                    .estimated_time(20)
                    .build(),
                step(13, PhaseType::PrepareNew, "request_limit_increase")
                    .title("Request organization limit increase")
                    .description(
                        "Request an Organizations service-limit increase ahead of the account \
                         move",
                    )
                    .build(),
            ],
        ),
        phase(
            3,
            PhaseType::VerifyNew,
            "Verify New Environment",
            "Validate the new environment configuration before migration",
            vec![
                step(14, PhaseType::VerifyNew, "verify_cloudtrail")
                    .title("Verify CloudTrail log distribution")
                    .description(
                        "Verify CloudTrail log distribution is flowing in the new organization",
                    )
                    .semi_automated()
                    .estimated_time(10)
                    .build(),
                step(15, PhaseType::VerifyNew, "validate_scp")
                    .title("Validate service control policies")
                    .description("Validate service control policies attached in the new organization")
                    .estimated_time(10)
                    .build(),
                step(16, PhaseType::VerifyNew, "import_control_tower")
                    .title("Import account into Control Tower")
                    .description(
                        "Import the existing account into the new organization's Control Tower",
                    )
                    .semi_automated()
                    .estimated_time(15)
                    .requires_confirmation()
                    .build(),
            ],
        ),
        phase(
            4,
            PhaseType::AwsAttachDetach,
            "Attach/Detach",
            "Manually attach or detach AWS accounts as needed for the migration process",
            vec![
                step(17, PhaseType::AwsAttachDetach, "detach_account")
                    .title("Detach account from old organization")
                    .description("Detach the account from the old organization")
                    .estimated_time(10)
                    .requires_confirmation()
                    .build(),
                step(18, PhaseType::AwsAttachDetach, "attach_account")
                    .title("Attach account to new organization")
                    .description("Attach the account to the new organization")
                    .estimated_time(10)
                    .requires_confirmation()
                    .build(),
            ],
        ),
        phase(
            5,
            PhaseType::Migration,
            "Migration",
            "Execute the migration of AWS accounts to the new organization",
            vec![
                step(19, PhaseType::Migration, "move_account")
                    .title("Move account into target OU")
                    .description("Move the account into its target organizational unit")
                    .semi_automated()
                    .estimated_time(10)
                    .requires_confirmation()
                    .build(),
                step(20, PhaseType::Migration, "validate_workloads")
                    .title("Validate workloads")
                    .description("Validate workloads and integrations after the account move")
                    .estimated_time(30)
                    .build(),
            ],
        ),
        phase(
            6,
            PhaseType::PostMigration,
            "Post Migration",
            "Complete final tasks and validate the migration was successful",
            vec![
                step(21, PhaseType::PostMigration, "remove_secops")
                    .title("Remove legacy SecOps tooling")
                    .description("Remove legacy security-operations tooling from the migrated account")
                    .estimated_time(15)
                    .build(),
                step(22, PhaseType::PostMigration, "delete_cur_report")
                    .title("Delete old CUR definitions")
                    .description("Delete Cost and Usage Report definitions left in the old payer")
                    .semi_automated()
                    .build(),
                step(23, PhaseType::PostMigration, "confirm_billing")
                    .title("Confirm consolidated billing")
                    .description("Confirm consolidated billing picks up the migrated account")
                    .estimated_time(10)
                    .build(),
            ],
        ),
    ]
}

fn phase(
    id: u32,
    phase_type: PhaseType,
    title: &str,
    description: &str,
    steps: Vec<MigrationStep>,
) -> Phase {
    Phase {
        id,
        phase_type,
        title: title.to_string(),
        description: description.to_string(),
        steps,
        status: StepStatus::Pending,
        progress: 0,
    }
}

fn step(id: u32, phase: PhaseType, slug: &str) -> StepBuilder {
    StepBuilder {
        step: MigrationStep {
            id,
            title: String::new(),
            description: String::new(),
            phase,
            status: StepStatus::Pending,
            automation_type: AutomationType::Manual,
            api_available: false,
            estimated_time: 5,
            requires_confirmation: false,
            completed_at: None,
            notes: None,
            slug: Some(slug.to_string()),
        },
    }
}

/// Catalog-construction helper; manual, 5 minutes, no API by default.
struct StepBuilder {
    step: MigrationStep,
}

impl StepBuilder {
    fn title(mut self, title: &str) -> Self {
        self.step.title = title.to_string();
        self
    }

    fn description(mut self, description: &str) -> Self {
        self.step.description = description.to_string();
        self
    }

    /// Fully automated with a backend endpoint.
    fn automated(mut self) -> Self {
        self.step.automation_type = AutomationType::FullyAutomated;
        self.step.api_available = true;
        self
    }

    fn semi_automated(mut self) -> Self {
        self.step.automation_type = AutomationType::SemiAutomated;
        self
    }

    fn estimated_time(mut self, minutes: u32) -> Self {
        self.step.estimated_time = minutes;
        self
    }

    fn requires_confirmation(mut self) -> Self {
        self.step.requires_confirmation = true;
        self
    }

    fn notes(mut self, notes: &str) -> Self {
        self.step.notes = Some(notes.to_string());
        self
    }

    fn build(self) -> MigrationStep {
        self.step
    }
}
