//! Standard effect table and the merged snapshot queried by resolution code.

use std::collections::BTreeSet;

use bitflags::bitflags;
use strum::IntoEnumIterator;

use super::ConditionType;
use crate::types::{DamageType, SaveTarget};

bitflags! {
    /// Boolean effect flags. Merging takes the union (logical OR).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct EffectFlags: u16 {
        /// The bearer's attack rolls have advantage.
        const ATTACK_ADVANTAGE     = 1 << 0;
        /// The bearer's attack rolls have disadvantage.
        const ATTACK_DISADVANTAGE  = 1 << 1;
        /// Attack rolls against the bearer have advantage.
        const DEFENSE_ADVANTAGE    = 1 << 2;
        /// Attack rolls against the bearer have disadvantage.
        const DEFENSE_DISADVANTAGE = 1 << 3;
        /// The bearer's ability checks have disadvantage.
        const CHECK_DISADVANTAGE   = 1 << 4;
        const INCAPACITATED        = 1 << 5;
        const CANT_MOVE            = 1 << 6;
        const CANT_ACT             = 1 << 7;
        const CANT_REACT           = 1 << 8;
        const CANT_SPEAK           = 1 << 9;
        /// The bearer falls (or is) prone.
        const FALL_PRONE           = 1 << 10;
        /// The bearer drops whatever it is holding.
        const DROP_ITEMS           = 1 << 11;
    }
}

/// Merged mechanical effect of a set of conditions.
///
/// Combination rules:
/// - flags: logical OR
/// - `speed_multiplier`: the most restrictive (lowest) value
/// - save and damage sets: union
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Effect {
    pub flags: EffectFlags,
    pub speed_multiplier: f32,
    pub save_advantage: BTreeSet<SaveTarget>,
    pub save_disadvantage: BTreeSet<SaveTarget>,
    pub save_auto_fail: BTreeSet<SaveTarget>,
    pub vulnerability: BTreeSet<DamageType>,
    pub resistance: BTreeSet<DamageType>,
    pub immunity: BTreeSet<DamageType>,
    /// Highest exhaustion level among merged conditions (0 when not exhausted).
    pub exhaustion_level: u8,
}

impl Default for Effect {
    fn default() -> Self {
        Self::none()
    }
}

impl Effect {
    /// Effect of an entity with no conditions.
    pub fn none() -> Self {
        Self {
            flags: EffectFlags::empty(),
            speed_multiplier: 1.0,
            save_advantage: BTreeSet::new(),
            save_disadvantage: BTreeSet::new(),
            save_auto_fail: BTreeSet::new(),
            vulnerability: BTreeSet::new(),
            resistance: BTreeSet::new(),
            immunity: BTreeSet::new(),
            exhaustion_level: 0,
        }
    }

    /// Standard effect table entry for one condition.
    ///
    /// `level` only matters for Exhaustion, whose penalties accumulate:
    /// 1 check disadvantage, 2 speed halved, 3 attack and save disadvantage,
    /// 5 speed zero. Levels 4 and 6 are reported through `exhaustion_level`.
    pub fn for_condition(kind: ConditionType, level: u8) -> Self {
        use EffectFlags as F;

        let mut effect = Self::none();
        let helpless = F::INCAPACITATED | F::CANT_MOVE | F::CANT_ACT | F::CANT_REACT;
        match kind {
            ConditionType::Blinded => {
                effect.flags = F::ATTACK_DISADVANTAGE | F::DEFENSE_ADVANTAGE;
            }
            ConditionType::Charmed | ConditionType::Deafened | ConditionType::Concentration => {}
            ConditionType::Exhaustion => {
                effect.exhaustion_level = level;
                if level >= 1 {
                    effect.flags |= F::CHECK_DISADVANTAGE;
                }
                if level >= 2 {
                    effect.speed_multiplier = 0.5;
                }
                if level >= 3 {
                    effect.flags |= F::ATTACK_DISADVANTAGE;
                    effect.save_disadvantage.insert(SaveTarget::All);
                }
                if level >= 5 {
                    effect.speed_multiplier = 0.0;
                }
            }
            ConditionType::Frightened => {
                effect.flags = F::ATTACK_DISADVANTAGE | F::CHECK_DISADVANTAGE;
            }
            ConditionType::Grappled => {
                effect.speed_multiplier = 0.0;
            }
            ConditionType::Incapacitated => {
                effect.flags = F::INCAPACITATED | F::CANT_ACT | F::CANT_REACT;
            }
            ConditionType::Invisible => {
                effect.flags = F::ATTACK_ADVANTAGE | F::DEFENSE_DISADVANTAGE;
            }
            ConditionType::Paralyzed => {
                effect.flags = helpless | F::CANT_SPEAK | F::DEFENSE_ADVANTAGE;
                effect.speed_multiplier = 0.0;
                effect.save_auto_fail = [SaveTarget::Strength, SaveTarget::Dexterity].into();
            }
            ConditionType::Petrified => {
                effect.flags = helpless | F::CANT_SPEAK | F::DEFENSE_ADVANTAGE | F::DROP_ITEMS;
                effect.speed_multiplier = 0.0;
                effect.save_auto_fail = [SaveTarget::Strength, SaveTarget::Dexterity].into();
                effect.resistance = DamageType::iter().collect();
                effect.immunity.insert(DamageType::Poison);
            }
            ConditionType::Poisoned => {
                effect.flags = F::ATTACK_DISADVANTAGE | F::CHECK_DISADVANTAGE;
                effect.save_disadvantage.insert(SaveTarget::All);
            }
            ConditionType::Prone => {
                effect.flags = F::ATTACK_DISADVANTAGE | F::FALL_PRONE;
                effect.speed_multiplier = 0.5;
            }
            ConditionType::Restrained => {
                effect.flags = F::ATTACK_DISADVANTAGE | F::DEFENSE_ADVANTAGE;
                effect.speed_multiplier = 0.0;
                effect.save_disadvantage.insert(SaveTarget::Dexterity);
            }
            ConditionType::Stunned => {
                effect.flags = helpless | F::DEFENSE_ADVANTAGE;
                effect.speed_multiplier = 0.0;
                effect.save_auto_fail = [SaveTarget::Strength, SaveTarget::Dexterity].into();
            }
            ConditionType::Unconscious => {
                effect.flags = helpless
                    | F::CANT_SPEAK
                    | F::DEFENSE_ADVANTAGE
                    | F::FALL_PRONE
                    | F::DROP_ITEMS;
                effect.speed_multiplier = 0.0;
                effect.save_auto_fail = [SaveTarget::Strength, SaveTarget::Dexterity].into();
            }
        }
        effect
    }

    /// Folds `other` into `self` using the combination rules.
    pub fn merge(&mut self, other: &Effect) {
        self.flags |= other.flags;
        self.speed_multiplier = self.speed_multiplier.min(other.speed_multiplier);
        self.save_advantage.extend(&other.save_advantage);
        self.save_disadvantage.extend(&other.save_disadvantage);
        self.save_auto_fail.extend(&other.save_auto_fail);
        self.vulnerability.extend(&other.vulnerability);
        self.resistance.extend(&other.resistance);
        self.immunity.extend(&other.immunity);
        self.exhaustion_level = self.exhaustion_level.max(other.exhaustion_level);
    }

    pub fn attack_advantage(&self) -> bool {
        self.flags.contains(EffectFlags::ATTACK_ADVANTAGE)
    }

    pub fn attack_disadvantage(&self) -> bool {
        self.flags.contains(EffectFlags::ATTACK_DISADVANTAGE)
    }

    pub fn defense_advantage(&self) -> bool {
        self.flags.contains(EffectFlags::DEFENSE_ADVANTAGE)
    }

    pub fn defense_disadvantage(&self) -> bool {
        self.flags.contains(EffectFlags::DEFENSE_DISADVANTAGE)
    }

    pub fn check_disadvantage(&self) -> bool {
        self.flags.contains(EffectFlags::CHECK_DISADVANTAGE)
    }

    pub fn incapacitated(&self) -> bool {
        self.flags.contains(EffectFlags::INCAPACITATED)
    }

    pub fn cant_move(&self) -> bool {
        self.flags.contains(EffectFlags::CANT_MOVE)
    }

    pub fn cant_act(&self) -> bool {
        self.flags.contains(EffectFlags::CANT_ACT)
    }

    pub fn cant_react(&self) -> bool {
        self.flags.contains(EffectFlags::CANT_REACT)
    }

    pub fn cant_speak(&self) -> bool {
        self.flags.contains(EffectFlags::CANT_SPEAK)
    }

    pub fn fall_prone(&self) -> bool {
        self.flags.contains(EffectFlags::FALL_PRONE)
    }

    pub fn drop_items(&self) -> bool {
        self.flags.contains(EffectFlags::DROP_ITEMS)
    }

    /// Whether saves of `ability` have disadvantage, directly or through `All`.
    pub fn has_save_disadvantage(&self, ability: SaveTarget) -> bool {
        self.save_disadvantage.contains(&SaveTarget::All)
            || self.save_disadvantage.contains(&ability)
    }

    /// Whether saves of `ability` have advantage, directly or through `All`.
    pub fn has_save_advantage(&self, ability: SaveTarget) -> bool {
        self.save_advantage.contains(&SaveTarget::All) || self.save_advantage.contains(&ability)
    }

    /// Whether saves of `ability` fail automatically, directly or through `All`.
    pub fn auto_fails_save(&self, ability: SaveTarget) -> bool {
        self.save_auto_fail.contains(&SaveTarget::All) || self.save_auto_fail.contains(&ability)
    }
}

impl<'a> FromIterator<&'a Effect> for Effect {
    fn from_iter<I: IntoIterator<Item = &'a Effect>>(iter: I) -> Self {
        iter.into_iter().fold(Self::none(), |mut merged, effect| {
            merged.merge(effect);
            merged
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poisoned_and_prone_merge() {
        let effects = [
            Effect::for_condition(ConditionType::Poisoned, 0),
            Effect::for_condition(ConditionType::Prone, 0),
        ];
        let merged: Effect = effects.iter().collect();

        assert!(merged.attack_disadvantage());
        assert!(merged.save_disadvantage.contains(&SaveTarget::All));
        assert!(merged.has_save_disadvantage(SaveTarget::Wisdom));
        assert_eq!(merged.speed_multiplier, 0.5);
        assert!(merged.fall_prone());
        assert!(!merged.incapacitated());
    }

    #[test]
    fn speed_takes_most_restrictive() {
        let mut merged = Effect::for_condition(ConditionType::Prone, 0);
        merged.merge(&Effect::for_condition(ConditionType::Grappled, 0));
        assert_eq!(merged.speed_multiplier, 0.0);

        merged.merge(&Effect::none());
        assert_eq!(merged.speed_multiplier, 0.0);
    }

    #[test]
    fn exhaustion_penalties_accumulate_by_level() {
        let one = Effect::for_condition(ConditionType::Exhaustion, 1);
        assert!(one.check_disadvantage());
        assert_eq!(one.speed_multiplier, 1.0);

        let three = Effect::for_condition(ConditionType::Exhaustion, 3);
        assert_eq!(three.speed_multiplier, 0.5);
        assert!(three.attack_disadvantage());
        assert!(three.has_save_disadvantage(SaveTarget::Constitution));

        let five = Effect::for_condition(ConditionType::Exhaustion, 5);
        assert_eq!(five.speed_multiplier, 0.0);
        assert_eq!(five.exhaustion_level, 5);
    }

    #[test]
    fn petrified_resists_everything_and_ignores_poison() {
        let effect = Effect::for_condition(ConditionType::Petrified, 0);
        assert!(effect.resistance.contains(&DamageType::Fire));
        assert!(effect.immunity.contains(&DamageType::Poison));
        assert!(effect.auto_fails_save(SaveTarget::Dexterity));
        assert!(!effect.auto_fails_save(SaveTarget::Wisdom));
    }

    #[test]
    fn empty_merge_is_neutral() {
        let merged: Effect = std::iter::empty().collect();
        assert_eq!(merged, Effect::none());
    }
}
