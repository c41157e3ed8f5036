use std::sync::Arc;

use rules_core::modifier::priority;
use rules_core::{
    ContextKey, DamageType, DurationHandle, EntityId, EventType, GameEvent, ListenerError,
    Modifier, ModifierSource, RoundsDuration, SourceKind,
};
use strum::IntoEnumIterator;

use super::{DamageResistance, Feature, FeatureContext, Grant, modifier_id};
use crate::character::Character;

/// Rounds a rage lasts without being refreshed by an attack.
pub const RAGE_ROUNDS: u32 = 10;

/// Melee damage bonus while raging.
pub struct RageDamage {
    id: String,
    source: ModifierSource,
    bearer: EntityId,
    bonus: i32,
    duration: DurationHandle,
}

impl RageDamage {
    pub fn new(character: &Character, duration: DurationHandle) -> Self {
        Self {
            id: modifier_id(Rage::NAME, "damage", character),
            source: rage_source(),
            bearer: character.id,
            bonus: Rage::damage_bonus(character.level),
            duration,
        }
    }

    pub fn bonus(&self) -> i32 {
        self.bonus
    }
}

impl Modifier for RageDamage {
    fn id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> &ModifierSource {
        &self.source
    }

    fn priority(&self) -> i32 {
        priority::FEATURES
    }

    fn condition(&self, event: &GameEvent) -> bool {
        event.actor() == Some(self.bearer) && event.flag(ContextKey::Melee)
    }

    fn apply(&self, event: &mut GameEvent) -> Result<(), ListenerError> {
        event.add_int(ContextKey::Damage, self.bonus);
        Ok(())
    }

    fn duration(&self) -> &DurationHandle {
        &self.duration
    }
}

fn rage_source() -> ModifierSource {
    ModifierSource::new(
        SourceKind::Feature,
        "Rage",
        "bonus melee damage and resistance to physical damage",
    )
}

/// Barbarian rage.
///
/// Grants a melee damage bonus and resistance to bludgeoning, piercing and
/// slashing damage. The rage lasts [`RAGE_ROUNDS`] rounds, restarted each time
/// the barbarian attacks.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rage;

impl Rage {
    pub const NAME: &'static str = "rage";

    pub const fn damage_bonus(level: u8) -> i32 {
        match level {
            0..=8 => 2,
            9..=15 => 3,
            _ => 4,
        }
    }

    fn duration(bearer: EntityId) -> DurationHandle {
        DurationHandle::new(
            RoundsDuration::rounds(RAGE_ROUNDS)
                .reset_on(EventType::OnAttackRoll)
                .for_entity(bearer),
        )
    }
}

impl Feature for Rage {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn grant(&self, character: &Character, ctx: &FeatureContext) -> Vec<Grant> {
        // Each modifier owns its own clock; both tick on the same events.
        let damage = RageDamage::new(character, Self::duration(character.id));
        let resistance = DamageResistance::new(
            modifier_id(Self::NAME, "resistance", character),
            rage_source(),
            character.id,
            DamageType::iter().filter(|ty| ty.is_physical()),
            &ctx.config,
            Self::duration(character.id),
        );

        vec![
            Grant::new(Arc::new(damage), [EventType::OnDamageRoll]),
            Grant::new(Arc::new(resistance), [EventType::OnTakeDamage]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules_core::{FixedDice, RulesConfig};

    fn barbarian(level: u8) -> Character {
        Character::new(EntityId(3), "Grog", level)
    }

    #[test]
    fn bonus_scales_with_level() {
        assert_eq!(Rage::damage_bonus(1), 2);
        assert_eq!(Rage::damage_bonus(9), 3);
        assert_eq!(Rage::damage_bonus(16), 4);
    }

    #[test]
    fn damage_bonus_only_on_own_melee() {
        let modifier = RageDamage::new(&barbarian(5), DurationHandle::permanent());
        let melee = GameEvent::new(EventType::OnDamageRoll)
            .with_actor(EntityId(3))
            .with(ContextKey::Melee, true)
            .with(ContextKey::Damage, 6);
        let ranged = GameEvent::new(EventType::OnDamageRoll)
            .with_actor(EntityId(3))
            .with(ContextKey::Ranged, true);
        let other = GameEvent::new(EventType::OnDamageRoll)
            .with_actor(EntityId(4))
            .with(ContextKey::Melee, true);

        assert!(modifier.condition(&melee));
        assert!(!modifier.condition(&ranged));
        assert!(!modifier.condition(&other));

        let mut melee = melee;
        modifier.apply(&mut melee).unwrap();
        assert_eq!(melee.get_int(ContextKey::Damage), Some(8));
    }

    #[test]
    fn grant_covers_damage_and_resistance() {
        let ctx = FeatureContext {
            config: RulesConfig::default(),
            dice: Arc::new(FixedDice(1)),
        };
        let grants = Rage.grant(&barbarian(1), &ctx);
        assert_eq!(grants.len(), 2);
        assert_eq!(grants[0].modifier.id(), "rage:damage@#3");
        assert_eq!(grants[1].events, vec![EventType::OnTakeDamage]);
    }
}
