use super::Duration;
use crate::condition::ConditionType;
use crate::entity::EntityId;
use crate::event::{ContextKey, EventType, GameEvent};

/// Wraps a base duration and also ends when concentration is broken.
///
/// Concentration breaks either through [`Duration::break_concentration`] or
/// when a condition manager announces that the caster's Concentration
/// condition was removed.
#[derive(Debug)]
pub struct ConcentrationDuration {
    base: Box<dyn Duration>,
    caster: Option<EntityId>,
    broken: bool,
}

impl ConcentrationDuration {
    pub fn new(base: impl Duration + 'static) -> Self {
        Self {
            base: Box::new(base),
            caster: None,
            broken: false,
        }
    }

    /// Only the caster's Concentration removal breaks this duration (builder pattern).
    #[must_use]
    pub fn for_caster(mut self, caster: EntityId) -> Self {
        self.caster = Some(caster);
        self
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    fn is_concentration_removal(&self, event: &GameEvent) -> bool {
        event.kind() == EventType::OnConditionRemoved
            && event.get_string(ContextKey::Condition) == Some(ConditionType::Concentration.as_ref())
            && self.caster.is_none_or(|caster| event.actor() == Some(caster))
    }
}

impl Duration for ConcentrationDuration {
    fn tick(&mut self, event: &GameEvent) {
        if self.is_concentration_removal(event) {
            self.broken = true;
        }
        self.base.tick(event);
    }

    fn is_expired(&self) -> bool {
        self.broken || self.base.is_expired()
    }

    fn triggers(&self) -> Vec<EventType> {
        let mut triggers = self.base.triggers();
        if !triggers.contains(&EventType::OnConditionRemoved) {
            triggers.push(EventType::OnConditionRemoved);
        }
        triggers
    }

    fn break_concentration(&mut self) {
        self.broken = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::{Permanent, RoundsDuration};

    fn removal(condition: ConditionType, owner: EntityId) -> GameEvent {
        GameEvent::new(EventType::OnConditionRemoved)
            .with_actor(owner)
            .with(ContextKey::Condition, condition.as_ref())
            .with(ContextKey::Reason, "concentration_broken")
    }

    #[test]
    fn expires_with_base() {
        let mut duration = ConcentrationDuration::new(RoundsDuration::rounds(1));
        duration.tick(&GameEvent::new(EventType::OnRoundEnd));
        assert!(duration.is_expired());
        assert!(!duration.is_broken());
    }

    #[test]
    fn direct_break() {
        let mut duration = ConcentrationDuration::new(Permanent);
        duration.break_concentration();
        assert!(duration.is_expired());
    }

    #[test]
    fn breaks_on_concentration_removed_notification() {
        let caster = EntityId(3);
        let mut duration = ConcentrationDuration::new(Permanent).for_caster(caster);

        duration.tick(&removal(ConditionType::Poisoned, caster));
        assert!(!duration.is_expired());
        duration.tick(&removal(ConditionType::Concentration, EntityId(9)));
        assert!(!duration.is_expired());
        duration.tick(&removal(ConditionType::Concentration, caster));
        assert!(duration.is_expired());
    }

    #[test]
    fn triggers_include_removal() {
        let duration = ConcentrationDuration::new(RoundsDuration::rounds(10));
        assert_eq!(
            duration.triggers(),
            vec![EventType::OnRoundEnd, EventType::OnConditionRemoved]
        );
    }
}
