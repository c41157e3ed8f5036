//! Mechanical rule fragments and the registry that attaches them to characters.
//!
//! A [`Feature`] is stateless: it describes how to build modifiers for one
//! character. [`FeatureRegistry::finalize`] turns a character's feature list
//! into live modifiers subscribed on a bus.
//!
//! # Event conventions
//!
//! | Event | actor | target | context |
//! |---|---|---|---|
//! | `OnAttackRoll` | attacker | defender | `attack_roll`, `roll_bonus`, `melee`, `advantage` |
//! | `OnDamageRoll` | attacker | defender | `damage`, `melee`, `finesse`, `ranged`, `advantage`, `disadvantage`, `ally_adjacent`, `critical` |
//! | `OnTakeDamage` | attacker | damaged creature | `damage`, `damage_type` |
//! | `OnSavingThrow` | saving creature | | `ability`, `save_dc`, `roll_bonus` |

mod bless;
mod rage;
mod registry;
mod resistance;
mod sneak_attack;

pub use bless::{Bless, BlessModifier};
pub use rage::{Rage, RageDamage};
pub use registry::{FeatureRegistry, RegistryError};
pub use resistance::{DamageResistance, Resistance};
pub use sneak_attack::{SneakAttack, SneakAttackModifier};

use std::sync::Arc;

use rules_core::{DiceRoller, EventType, Modifier, RulesConfig};

use crate::character::Character;

/// A modifier together with the events it modifies.
pub struct Grant {
    pub modifier: Arc<dyn Modifier>,
    pub events: Vec<EventType>,
}

impl Grant {
    pub fn new(modifier: Arc<dyn Modifier>, events: impl Into<Vec<EventType>>) -> Self {
        Self {
            modifier,
            events: events.into(),
        }
    }
}

/// Shared inputs available to every feature while it builds modifiers.
#[derive(Clone)]
pub struct FeatureContext {
    pub config: RulesConfig,
    pub dice: Arc<dyn DiceRoller>,
}

/// A named rule fragment.
pub trait Feature: Send + Sync {
    /// Registry key, matched against [`Character::features`].
    fn name(&self) -> &str;

    /// Builds the modifiers this feature grants `character`.
    fn grant(&self, character: &Character, ctx: &FeatureContext) -> Vec<Grant>;
}

/// `ceil(level / 2)`, the usual "scales every odd level" progression.
pub(crate) fn half_level_rounded_up(level: u8) -> u32 {
    u32::from(level).div_ceil(2)
}

/// Modifier id scoped to one character, e.g. `rage:damage@#3`.
pub(crate) fn modifier_id(feature: &str, part: &str, character: &Character) -> String {
    format!("{feature}:{part}@{}", character.id)
}
