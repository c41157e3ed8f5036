//! Conditional, prioritized effects with a lifespan.
//!
//! A [`Modifier`] is the unit rule fragments are written in. It never talks to
//! the bus directly: [`ModifierListener`] adapts it into a [`Listener`] and
//! [`ModifierSet`] owns the registrations, ticks durations, and deregisters
//! expired modifiers. The bus does not unregister anything on its own.
//!
//! # Implementation Rules
//! 1. `condition` MUST NOT mutate anything; it reads the event and the modifier's own
//!    state (character id, level, per-turn flags)
//! 2. `apply` is the only place that mutates the event
//! 3. Per-turn counters that must reset without touching the event are cleared
//!    in `observe`, which is never recorded on the event
//! 4. Damage bonuses add to [`ContextKey::Damage`](crate::ContextKey::Damage);
//!    resistances halve it with floor division

mod adapter;
pub mod priority;
mod set;

pub use adapter::{DurationTicker, ModifierListener};
pub use priority::PriorityBand;
pub use set::ModifierSet;

use crate::duration::DurationHandle;
use crate::error::ListenerError;
use crate::event::GameEvent;

#[cfg(doc)]
use crate::bus::Listener;

/// Where a modifier comes from.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SourceKind {
    /// Class or subclass feature.
    #[default]
    Feature,
    /// Racial trait.
    Race,
    /// Spell effect.
    Spell,
    /// Status condition.
    Condition,
    /// Equipment or magic item.
    Item,
    /// Feat.
    Feat,
}

/// Provenance record attached to every modifier.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierSource {
    pub kind: SourceKind,
    pub name: String,
    pub description: String,
}

impl ModifierSource {
    pub fn new(kind: SourceKind, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A conditional effect applied to events.
pub trait Modifier: Send + Sync {
    /// Stable identifier, unique per character.
    fn id(&self) -> &str;

    fn source(&self) -> &ModifierSource;

    /// Ordering key, see [`priority`].
    fn priority(&self) -> i32;

    /// Sees every delivered event before `condition`, for internal bookkeeping.
    fn observe(&self, _event: &GameEvent) {}

    /// Whether this modifier applies to `event`. Must not mutate state.
    fn condition(&self, event: &GameEvent) -> bool;

    /// Applies the effect. Only called after `condition` returned true.
    fn apply(&self, event: &mut GameEvent) -> Result<(), ListenerError>;

    /// Lifespan of the modifier.
    fn duration(&self) -> &DurationHandle;
}
