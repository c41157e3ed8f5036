//! Per-entity status conditions.
//!
//! # Lifecycle
//!
//! ```text
//! add_condition ──► active (remaining > 0 or uncounted)
//!                      │ clock tick
//!                      ▼
//!                   active, remaining == 0
//!                      │ next clock tick / damage / save / rest / removal
//!                      ▼
//!                   removed
//! ```
//!
//! A condition created with `remaining = R` survives exactly `R` clock ticks
//! and is removed on the `R + 1`-th.

mod effect;
mod kind;
mod manager;

pub use effect::{Effect, EffectFlags};
pub use kind::{ConditionType, DurationType, RemovalReason};
pub use manager::ConditionManager;

use std::collections::BTreeMap;
use std::fmt;

use crate::entity::EntityId;
use crate::error::{ErrorSeverity, RulesError};

/// Identifier of a condition, unique per bearer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionId {
    pub bearer: EntityId,
    pub seq: u64,
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/cond-{}", self.bearer, self.seq)
    }
}

/// One tracked status condition.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Condition {
    pub id: ConditionId,
    pub kind: ConditionType,
    /// Who or what imposed the condition.
    pub source: String,
    pub duration_type: DurationType,
    /// Duration granted by the most recent application or extension.
    pub duration: u32,
    /// Clock ticks left; only counted duration types decrement it.
    pub remaining: u32,
    /// Stacking level; zero for non-stacking conditions.
    pub level: u8,
    /// Round counter of the bearer's manager when the condition was applied.
    pub applied_at: u32,
    pub metadata: BTreeMap<String, String>,
}

impl Condition {
    /// Standard effect table entry for this condition.
    pub fn effect(&self) -> Effect {
        Effect::for_condition(self.kind, self.level)
    }
}

/// Errors surfaced by [`ConditionManager`]. The condition set is unchanged
/// whenever one is returned.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    #[error("exhaustion is already at its maximum level ({max})")]
    ExhaustionAtMax { max: u8 },

    #[error("condition {0} not found")]
    NotFound(ConditionId),
}

impl RulesError for ConditionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ExhaustionAtMax { .. } => "CONDITION_EXHAUSTION_AT_MAX",
            Self::NotFound(_) => "CONDITION_NOT_FOUND",
        }
    }
}
