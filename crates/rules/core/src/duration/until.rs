use super::Duration;
use crate::entity::EntityId;
use crate::event::{ContextKey, EventType, GameEvent};

/// Expires on the first occurrence of an event type and stays expired.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UntilEvent {
    trigger: EventType,
    owner: Option<EntityId>,
    expired: bool,
}

impl UntilEvent {
    pub fn new(trigger: EventType) -> Self {
        Self {
            trigger,
            owner: None,
            expired: false,
        }
    }

    /// Only reacts when the triggering event's actor is `owner` (builder pattern).
    #[must_use]
    pub fn for_entity(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }
}

impl Duration for UntilEvent {
    fn tick(&mut self, event: &GameEvent) {
        if event.kind() != self.trigger {
            return;
        }
        if self.owner.is_none_or(|owner| event.actor() == Some(owner)) {
            self.expired = true;
        }
    }

    fn is_expired(&self) -> bool {
        self.expired
    }

    fn triggers(&self) -> Vec<EventType> {
        vec![self.trigger]
    }
}

/// Expires the first time its bearer takes a positive amount of damage.
///
/// Damage is read from [`ContextKey::Damage`], falling back to
/// [`ContextKey::Amount`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UntilDamaged {
    bearer: Option<EntityId>,
    expired: bool,
}

impl UntilDamaged {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only reacts to damage dealt to `bearer` (builder pattern).
    #[must_use]
    pub fn for_entity(mut self, bearer: EntityId) -> Self {
        self.bearer = Some(bearer);
        self
    }
}

impl Duration for UntilDamaged {
    fn tick(&mut self, event: &GameEvent) {
        if !event.kind().is_damage_taken() {
            return;
        }
        if self.bearer.is_some_and(|bearer| event.target() != Some(bearer)) {
            return;
        }
        let amount = event
            .get_int(ContextKey::Damage)
            .or_else(|| event.get_int(ContextKey::Amount))
            .unwrap_or(0);
        if amount > 0 {
            self.expired = true;
        }
    }

    fn is_expired(&self) -> bool {
        self.expired
    }

    fn triggers(&self) -> Vec<EventType> {
        vec![
            EventType::BeforeTakeDamage,
            EventType::OnTakeDamage,
            EventType::AfterTakeDamage,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn until_event_is_sticky() {
        let mut duration = UntilEvent::new(EventType::OnShortRest);
        duration.tick(&GameEvent::new(EventType::OnLongRest));
        assert!(!duration.is_expired());
        duration.tick(&GameEvent::new(EventType::OnShortRest));
        assert!(duration.is_expired());
        duration.tick(&GameEvent::new(EventType::OnTurnStart));
        assert!(duration.is_expired());
    }

    #[test]
    fn until_event_scoped_to_owner() {
        let mut duration = UntilEvent::new(EventType::OnTurnEnd).for_entity(EntityId(1));
        duration.tick(&GameEvent::new(EventType::OnTurnEnd).with_actor(EntityId(2)));
        assert!(!duration.is_expired());
        duration.tick(&GameEvent::new(EventType::OnTurnEnd).with_actor(EntityId(1)));
        assert!(duration.is_expired());
    }

    #[test]
    fn until_damaged_ignores_zero_damage() {
        let mut duration = UntilDamaged::new();
        duration.tick(&GameEvent::new(EventType::OnTakeDamage).with(ContextKey::Damage, 0));
        assert!(!duration.is_expired());
        duration.tick(&GameEvent::new(EventType::OnDamageRoll).with(ContextKey::Damage, 9));
        assert!(!duration.is_expired());
        duration.tick(&GameEvent::new(EventType::AfterTakeDamage).with(ContextKey::Amount, 3));
        assert!(duration.is_expired());
    }

    #[test]
    fn until_damaged_checks_bearer() {
        let mut duration = UntilDamaged::new().for_entity(EntityId(4));
        let hit_other = GameEvent::new(EventType::OnTakeDamage)
            .with_target(EntityId(5))
            .with(ContextKey::Damage, 6);
        duration.tick(&hit_other);
        assert!(!duration.is_expired());

        let hit_bearer = GameEvent::new(EventType::OnTakeDamage)
            .with_target(EntityId(4))
            .with(ContextKey::Damage, 6);
        duration.tick(&hit_bearer);
        assert!(duration.is_expired());
    }
}
