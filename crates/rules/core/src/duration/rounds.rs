use super::Duration;
use crate::entity::EntityId;
use crate::event::{EventType, GameEvent};

/// Expires after a number of clock ticks.
///
/// The clock is either round ends or turn starts. Turn clocks can be scoped to
/// one entity so only that creature's turns count. An optional interrupt event
/// (e.g. making an attack) restarts the counter while the duration is live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundsDuration {
    clock: EventType,
    total: u32,
    remaining: u32,
    interrupt: Option<EventType>,
    owner: Option<EntityId>,
}

impl RoundsDuration {
    /// Counts `OnRoundEnd` events.
    pub fn rounds(count: u32) -> Self {
        Self::with_clock(EventType::OnRoundEnd, count)
    }

    /// Counts `OnTurnStart` events.
    pub fn turns(count: u32) -> Self {
        Self::with_clock(EventType::OnTurnStart, count)
    }

    fn with_clock(clock: EventType, count: u32) -> Self {
        Self {
            clock,
            total: count,
            remaining: count,
            interrupt: None,
            owner: None,
        }
    }

    /// Restarts the counter whenever `interrupt` fires (builder pattern).
    #[must_use]
    pub fn reset_on(mut self, interrupt: EventType) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Only counts clock and interrupt events whose actor is `owner` (builder pattern).
    ///
    /// Round ends are raised by the system, so the scope never filters them.
    #[must_use]
    pub fn for_entity(mut self, owner: EntityId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    fn concerns(&self, event: &GameEvent) -> bool {
        match (self.owner, event.kind()) {
            (_, EventType::OnRoundEnd) => true,
            (Some(owner), _) => event.actor() == Some(owner),
            (None, _) => true,
        }
    }
}

impl Duration for RoundsDuration {
    fn tick(&mut self, event: &GameEvent) {
        if self.is_expired() || !self.concerns(event) {
            return;
        }
        if event.kind() == self.clock {
            self.remaining -= 1;
        } else if Some(event.kind()) == self.interrupt {
            self.remaining = self.total;
        }
    }

    fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    fn triggers(&self) -> Vec<EventType> {
        let mut triggers = vec![self.clock];
        triggers.extend(self.interrupt);
        triggers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_end() -> GameEvent {
        GameEvent::new(EventType::OnRoundEnd).with_actor(EntityId::SYSTEM)
    }

    #[test]
    fn expires_after_n_round_ends() {
        let mut duration = RoundsDuration::rounds(2);
        duration.tick(&round_end());
        assert!(!duration.is_expired());
        duration.tick(&GameEvent::new(EventType::OnTurnStart));
        assert_eq!(duration.remaining(), 1);
        duration.tick(&round_end());
        assert!(duration.is_expired());
    }

    #[test]
    fn interrupt_restarts_counter() {
        let hero = EntityId(7);
        let mut duration = RoundsDuration::turns(2)
            .reset_on(EventType::OnAttackRoll)
            .for_entity(hero);

        duration.tick(&GameEvent::new(EventType::OnTurnStart).with_actor(hero));
        assert_eq!(duration.remaining(), 1);
        duration.tick(&GameEvent::new(EventType::OnAttackRoll).with_actor(hero));
        assert_eq!(duration.remaining(), 2);
    }

    #[test]
    fn other_entities_turns_do_not_count() {
        let hero = EntityId(7);
        let mut duration = RoundsDuration::turns(1).for_entity(hero);
        duration.tick(&GameEvent::new(EventType::OnTurnStart).with_actor(EntityId(8)));
        assert!(!duration.is_expired());
        duration.tick(&GameEvent::new(EventType::OnTurnStart).with_actor(hero));
        assert!(duration.is_expired());
    }

    #[test]
    fn interrupt_after_expiry_does_not_revive() {
        let mut duration = RoundsDuration::rounds(1).reset_on(EventType::OnAttackRoll);
        duration.tick(&round_end());
        duration.tick(&GameEvent::new(EventType::OnAttackRoll));
        assert!(duration.is_expired());
    }

    #[test]
    fn zero_count_is_already_expired() {
        assert!(RoundsDuration::rounds(0).is_expired());
    }
}
