use std::collections::BTreeSet;
use std::sync::Arc;

use rules_core::modifier::priority;
use rules_core::{
    ContextKey, DamageType, DurationHandle, EntityId, EventType, GameEvent, ListenerError,
    Modifier, ModifierSource, RulesConfig, SourceKind,
};

use super::{Feature, FeatureContext, Grant, modifier_id};
use crate::character::Character;

/// Divides incoming damage of the listed types on the bearer.
///
/// Runs in the post-calculation band so it halves the final amount after every
/// bonus has been added.
pub struct DamageResistance {
    id: String,
    source: ModifierSource,
    bearer: EntityId,
    types: BTreeSet<DamageType>,
    config: RulesConfig,
    duration: DurationHandle,
}

impl DamageResistance {
    pub fn new(
        id: impl Into<String>,
        source: ModifierSource,
        bearer: EntityId,
        types: impl IntoIterator<Item = DamageType>,
        config: &RulesConfig,
        duration: DurationHandle,
    ) -> Self {
        Self {
            id: id.into(),
            source,
            bearer,
            types: types.into_iter().collect(),
            config: config.clone(),
            duration,
        }
    }

    pub fn resists(&self, damage_type: DamageType) -> bool {
        self.types.contains(&damage_type)
    }
}

impl Modifier for DamageResistance {
    fn id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> &ModifierSource {
        &self.source
    }

    fn priority(&self) -> i32 {
        priority::POST_CALCULATION
    }

    fn condition(&self, event: &GameEvent) -> bool {
        event.kind().is_damage_taken()
            && event.target() == Some(self.bearer)
            && event.get_int(ContextKey::Damage).is_some_and(|d| d > 0)
            && event
                .get_string(ContextKey::DamageType)
                .and_then(|s| s.parse::<DamageType>().ok())
                .is_some_and(|ty| self.resists(ty))
    }

    fn apply(&self, event: &mut GameEvent) -> Result<(), ListenerError> {
        let damage = event.get_int(ContextKey::Damage).unwrap_or_default();
        event.set(ContextKey::Damage, self.config.resist(damage));
        Ok(())
    }

    fn duration(&self) -> &DurationHandle {
        &self.duration
    }
}

/// Permanent resistance to one damage type, e.g. a racial trait.
pub struct Resistance {
    name: String,
    damage_type: DamageType,
}

impl Resistance {
    pub fn new(name: impl Into<String>, damage_type: DamageType) -> Self {
        Self {
            name: name.into(),
            damage_type,
        }
    }
}

impl Feature for Resistance {
    fn name(&self) -> &str {
        &self.name
    }

    fn grant(&self, character: &Character, ctx: &FeatureContext) -> Vec<Grant> {
        let modifier = DamageResistance::new(
            modifier_id(&self.name, "resistance", character),
            ModifierSource::new(
                SourceKind::Race,
                self.name.as_str(),
                format!("resistance to {} damage", self.damage_type),
            ),
            character.id,
            [self.damage_type],
            &ctx.config,
            DurationHandle::permanent(),
        );
        vec![Grant::new(Arc::new(modifier), [EventType::OnTakeDamage])]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire_resistance(bearer: EntityId) -> DamageResistance {
        DamageResistance::new(
            "fire",
            ModifierSource::new(SourceKind::Race, "fire", "test"),
            bearer,
            [DamageType::Fire],
            &RulesConfig::default(),
            DurationHandle::permanent(),
        )
    }

    fn hit(target: EntityId, amount: i32, damage_type: DamageType) -> GameEvent {
        GameEvent::new(EventType::OnTakeDamage)
            .with_target(target)
            .with(ContextKey::Damage, amount)
            .with(ContextKey::DamageType, damage_type.as_ref())
    }

    #[test]
    fn halves_matching_damage_with_floor() {
        let resistance = fire_resistance(EntityId(1));
        let mut event = hit(EntityId(1), 7, DamageType::Fire);
        assert!(resistance.condition(&event));
        resistance.apply(&mut event).unwrap();
        assert_eq!(event.get_int(ContextKey::Damage), Some(3));
    }

    #[test]
    fn ignores_other_types_and_targets() {
        let resistance = fire_resistance(EntityId(1));
        assert!(!resistance.condition(&hit(EntityId(1), 7, DamageType::Cold)));
        assert!(!resistance.condition(&hit(EntityId(2), 7, DamageType::Fire)));
        assert!(!resistance.condition(&hit(EntityId(1), 0, DamageType::Fire)));
    }
}
