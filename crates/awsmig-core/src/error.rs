//! Catalog validation error types.

use thiserror::Error;

use crate::types::PhaseType;

/// Errors rejected at store construction time. A live store can only exist
/// over a catalog that passed validation, so runtime operations never have
/// to re-check catalog shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The phase list is empty.
    #[error("catalog has no phases")]
    NoPhases,

    /// No phase contains a step, leaving the navigation pointers nowhere
    /// to sit.
    #[error("catalog has no steps")]
    NoSteps,

    /// Two phases share an ordering id.
    #[error("duplicate phase id {id}")]
    DuplicatePhaseId { id: u32 },

    /// A step id appears more than once across the catalog.
    #[error("duplicate step id {id} (in {first} and {second})")]
    DuplicateStepId {
        id: u32,
        first: PhaseType,
        second: PhaseType,
    },

    /// A step's `phase` field disagrees with the phase that contains it.
    #[error("step {step_id} declares phase {declared} but is listed under {actual}")]
    PhaseMismatch {
        step_id: u32,
        declared: PhaseType,
        actual: PhaseType,
    },
}
