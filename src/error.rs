// src/error.rs
//
// Error taxonomy for the simulation core.
//
// Every variant is detected eagerly: at model construction, or at the start
// of a simulation before the first trial runs. Nothing here is retried.

use thiserror::Error;

use crate::types::AttributeKey;

/// Errors surfaced by model construction and by `simulate`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A distribution's own invariant is violated.
    #[error("invalid {kind} distribution: {reason}")]
    InvalidDistribution { kind: &'static str, reason: String },

    /// A profile has no archetypes, or an archetype has no attributes.
    #[error("{owner} must contain at least one {item}")]
    EmptyCollection { owner: String, item: &'static str },

    /// All discrete weights sum to zero, so nothing can be drawn.
    #[error("discrete weights for '{attribute}' in archetype '{archetype}' sum to zero")]
    DegenerateWeights { archetype: String, attribute: String },

    /// Trial count below one without opting into empty summaries.
    #[error("trial count must be >= 1 (got {count})")]
    InvalidTrialCount { count: u64 },

    /// A structural field outside the distribution invariants is malformed.
    #[error("invalid profile: {reason}")]
    InvalidProfile { reason: String },
}

impl SimError {
    pub(crate) fn distribution(kind: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidDistribution {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn profile(reason: impl Into<String>) -> Self {
        SimError::InvalidProfile {
            reason: reason.into(),
        }
    }

    /// Attach the attribute location to a `DegenerateWeights` raised by the
    /// sampler, which only sees the distribution.
    pub(crate) fn located(self, key: &AttributeKey) -> Self {
        match self {
            SimError::DegenerateWeights { .. } => SimError::DegenerateWeights {
                archetype: key.archetype.clone(),
                attribute: key.attribute.clone(),
            },
            other => other,
        }
    }

    /// Process exit code for CLI callers.
    ///
    /// Configuration problems exit with 2 (same as argument errors);
    /// failures discovered while preparing the run exit with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            SimError::DegenerateWeights { .. } => 1,
            _ => 2,
        }
    }
}
