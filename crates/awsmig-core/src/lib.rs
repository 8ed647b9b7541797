//! Core of the AWS account-migration assistant.
//!
//! Owns the phases/steps data model and the sequencing logic around it:
//! - `types` - status enums and the step/phase/process records
//! - `catalog` - the shipped six-phase catalog plus construction-time
//!   validation
//! - `state` - the migration state store; all mutation flows through its
//!   named operations
//! - `gating` - pure entry checks enforcing phase and step ordering
//!
//! Everything here is synchronous and in-memory. The executor client, the
//! result adapter, and the chat agent live in `awsmig-client`.

pub mod catalog;
pub mod error;
pub mod gating;
pub mod state;
pub mod types;

pub use catalog::{builtin_phases, validate_catalog};
pub use error::CatalogError;
pub use gating::{check_step_access, StepAccess};
pub use state::MigrationState;
pub use types::{
    AutomationType, MigrationProcess, MigrationStep, Phase, PhaseType, StepStatus,
};
