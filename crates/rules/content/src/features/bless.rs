use std::collections::BTreeSet;
use std::sync::Arc;

use rules_core::modifier::priority;
use rules_core::{
    ConcentrationDuration, ContextKey, DiceRoller, DurationHandle, EntityId, EventType, GameEvent,
    ListenerError, Modifier, ModifierSource, RoundsDuration, SourceKind,
};

use super::{Feature, FeatureContext, Grant, modifier_id};
use crate::character::Character;

/// Adds 1d4 to the attack rolls and saving throws of blessed creatures.
pub struct BlessModifier {
    id: String,
    source: ModifierSource,
    targets: BTreeSet<EntityId>,
    dice: Arc<dyn DiceRoller>,
    duration: DurationHandle,
}

impl BlessModifier {
    pub const SIDES: u32 = 4;

    pub fn targets(&self) -> &BTreeSet<EntityId> {
        &self.targets
    }
}

impl Modifier for BlessModifier {
    fn id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> &ModifierSource {
        &self.source
    }

    fn priority(&self) -> i32 {
        priority::TEMPORARY
    }

    fn condition(&self, event: &GameEvent) -> bool {
        matches!(
            event.kind(),
            EventType::OnAttackRoll | EventType::OnSavingThrow
        ) && event.actor().is_some_and(|actor| self.targets.contains(&actor))
    }

    fn apply(&self, event: &mut GameEvent) -> Result<(), ListenerError> {
        let bonus = self.dice.roll(1, Self::SIDES, 0)?;
        event.add_int(ContextKey::RollBonus, bonus);
        Ok(())
    }

    fn duration(&self) -> &DurationHandle {
        &self.duration
    }
}

/// The Bless spell: up to a minute of concentration.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bless;

impl Bless {
    pub const NAME: &'static str = "bless";
    pub const ROUNDS: u32 = 10;

    /// Builds the modifier for `caster` blessing `targets`.
    ///
    /// The duration ends after [`Self::ROUNDS`] rounds or when the caster's
    /// Concentration condition is removed, whichever comes first.
    pub fn cast(
        caster: &Character,
        targets: impl IntoIterator<Item = EntityId>,
        dice: Arc<dyn DiceRoller>,
    ) -> Grant {
        let duration = DurationHandle::new(
            ConcentrationDuration::new(RoundsDuration::rounds(Self::ROUNDS))
                .for_caster(caster.id),
        );
        let modifier = BlessModifier {
            id: modifier_id(Self::NAME, "roll", caster),
            source: ModifierSource::new(
                SourceKind::Spell,
                "Bless",
                "1d4 bonus to attack rolls and saving throws",
            ),
            targets: targets.into_iter().collect(),
            dice,
            duration,
        };
        Grant::new(
            Arc::new(modifier),
            [EventType::OnAttackRoll, EventType::OnSavingThrow],
        )
    }
}

impl Feature for Bless {
    fn name(&self) -> &str {
        Self::NAME
    }

    /// A character listing Bless as a feature starts blessed themselves.
    fn grant(&self, character: &Character, ctx: &FeatureContext) -> Vec<Grant> {
        vec![Self::cast(character, [character.id], Arc::clone(&ctx.dice))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules_core::{ConditionType, FixedDice};

    const CLERIC: EntityId = EntityId(1);
    const FIGHTER: EntityId = EntityId(2);

    fn cast() -> Grant {
        let caster = Character::new(CLERIC, "Pike", 3);
        Bless::cast(&caster, [CLERIC, FIGHTER], Arc::new(FixedDice(3)))
    }

    #[test]
    fn blesses_attacks_and_saves_of_targets() {
        let grant = cast();
        let mut attack = GameEvent::new(EventType::OnAttackRoll).with_actor(FIGHTER);
        assert!(grant.modifier.condition(&attack));
        grant.modifier.apply(&mut attack).unwrap();
        assert_eq!(attack.get_int(ContextKey::RollBonus), Some(3));

        let save = GameEvent::new(EventType::OnSavingThrow).with_actor(CLERIC);
        assert!(grant.modifier.condition(&save));

        let outsider = GameEvent::new(EventType::OnAttackRoll).with_actor(EntityId(9));
        assert!(!grant.modifier.condition(&outsider));
        let damage = GameEvent::new(EventType::OnDamageRoll).with_actor(FIGHTER);
        assert!(!grant.modifier.condition(&damage));
    }

    #[test]
    fn ends_when_caster_loses_concentration() {
        let grant = cast();
        let duration = grant.modifier.duration();
        assert!(duration.triggers().contains(&EventType::OnConditionRemoved));

        duration.tick(
            &GameEvent::new(EventType::OnConditionRemoved)
                .with_actor(FIGHTER)
                .with(ContextKey::Condition, ConditionType::Concentration.as_ref()),
        );
        assert!(!duration.is_expired());

        duration.tick(
            &GameEvent::new(EventType::OnConditionRemoved)
                .with_actor(CLERIC)
                .with(ContextKey::Condition, ConditionType::Concentration.as_ref()),
        );
        assert!(duration.is_expired());
    }
}
