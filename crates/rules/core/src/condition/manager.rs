//! Authority for one entity's active conditions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::{
    Condition, ConditionError, ConditionId, ConditionType, DurationType, Effect, RemovalReason,
};
use crate::bus::Bus;
use crate::config::RulesConfig;
use crate::entity::EntityId;
use crate::event::{ContextKey, EventType, GameEvent};

/// Lifecycle change captured inside the critical section and published after it.
enum Notification {
    Applied(Condition),
    Modified(Condition),
    Removed(Condition, RemovalReason),
    ConcentrationCheck {
        condition: Condition,
        amount: i32,
        dc: i32,
    },
}

impl Notification {
    fn into_event(self, bearer: EntityId) -> GameEvent {
        match self {
            Self::Applied(condition) => {
                lifecycle_event(EventType::OnConditionApplied, bearer, &condition)
            }
            Self::Modified(condition) => {
                lifecycle_event(EventType::OnConditionModified, bearer, &condition)
            }
            Self::Removed(condition, reason) => {
                lifecycle_event(EventType::OnConditionRemoved, bearer, &condition)
                    .with(ContextKey::Reason, reason.as_ref())
            }
            Self::ConcentrationCheck {
                condition,
                amount,
                dc,
            } => lifecycle_event(EventType::OnConcentrationCheck, bearer, &condition)
                .with(ContextKey::Amount, amount)
                .with(ContextKey::SaveDc, dc)
                .with(ContextKey::Ability, "con"),
        }
    }
}

fn lifecycle_event(kind: EventType, bearer: EntityId, condition: &Condition) -> GameEvent {
    GameEvent::new(kind)
        .with_actor(bearer)
        .with_target(bearer)
        .with(ContextKey::Condition, condition.kind.as_ref())
        .with(ContextKey::ConditionId, condition.id.to_string())
        .with(ContextKey::Source, condition.source.as_str())
        .with(ContextKey::Level, i32::from(condition.level))
        .with(
            ContextKey::Remaining,
            i32::try_from(condition.remaining).unwrap_or(i32::MAX),
        )
}

#[derive(Default)]
struct ManagerState {
    /// Live conditions in application order.
    conditions: Vec<Condition>,
    next_seq: u64,
    round: u32,
}

impl ManagerState {
    fn find_by_type_mut(&mut self, kind: ConditionType) -> Option<&mut Condition> {
        self.conditions.iter_mut().find(|c| c.kind == kind)
    }

    /// Removes and returns every condition matching `pred`, keeping order.
    fn take_where(&mut self, pred: impl Fn(&Condition) -> bool) -> Vec<Condition> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.conditions)
            .into_iter()
            .partition(|c| pred(c));
        self.conditions = kept;
        taken
    }
}

/// Tracks the status conditions of a single entity.
///
/// Every method takes `&self`; the condition set sits behind a mutex scoped to
/// this entity, so managers for different entities never contend. Lifecycle
/// notifications are emitted to the bus after the mutex is released, which
/// lets notified listeners call back into the same manager.
///
/// Notifications are best-effort: a failing listener is logged and the
/// condition change that triggered it stands.
pub struct ConditionManager {
    entity: EntityId,
    config: RulesConfig,
    bus: Option<Arc<dyn Bus>>,
    state: Mutex<ManagerState>,
}

impl ConditionManager {
    /// Creates a manager that does not publish notifications.
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            config: RulesConfig::default(),
            bus: None,
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// Creates a manager that publishes lifecycle notifications to `bus`.
    pub fn with_bus(entity: EntityId, bus: Arc<dyn Bus>) -> Self {
        Self {
            bus: Some(bus),
            ..Self::new(entity)
        }
    }

    /// Replaces the rule configuration (builder pattern).
    #[must_use]
    pub fn with_config(mut self, config: RulesConfig) -> Self {
        self.config = config;
        self
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Number of round ends processed so far.
    pub fn round(&self) -> u32 {
        self.state().round
    }

    /// Applies a condition.
    ///
    /// - Exhaustion gains one level, failing at the configured maximum
    /// - An existing non-stacking condition is only ever extended. A longer
    ///   application brings its own clock along; nothing replaces a
    ///   permanent condition, and a permanent application replaces anything
    /// - Otherwise a new condition is created
    pub fn add_condition(
        &self,
        kind: ConditionType,
        source: impl Into<String>,
        duration_type: DurationType,
        value: u32,
    ) -> Result<ConditionId, ConditionError> {
        let source = source.into();
        let max_level = self
            .config
            .max_exhaustion_level
            .min(RulesConfig::EXHAUSTION_LEVEL_CAP);

        let (id, note) = {
            let mut state = self.state();
            match state.find_by_type_mut(kind) {
                Some(existing) if kind.is_stacking() => {
                    if existing.level >= max_level {
                        return Err(ConditionError::ExhaustionAtMax { max: max_level });
                    }
                    existing.level += 1;
                    (existing.id, Notification::Modified(existing.clone()))
                }
                Some(existing) => {
                    let extends = match (existing.duration_type, duration_type) {
                        (DurationType::Permanent, _) => false,
                        (_, DurationType::Permanent) => true,
                        _ => value > existing.remaining,
                    };
                    if extends {
                        existing.duration_type = duration_type;
                        existing.remaining = value;
                        existing.duration = value;
                    }
                    (existing.id, Notification::Modified(existing.clone()))
                }
                None => {
                    if kind.is_stacking() && max_level == 0 {
                        return Err(ConditionError::ExhaustionAtMax { max: max_level });
                    }
                    state.next_seq += 1;
                    let condition = Condition {
                        id: ConditionId {
                            bearer: self.entity,
                            seq: state.next_seq,
                        },
                        kind,
                        source,
                        duration_type,
                        duration: value,
                        remaining: value,
                        level: u8::from(kind.is_stacking()),
                        applied_at: state.round,
                        metadata: Default::default(),
                    };
                    state.conditions.push(condition.clone());
                    (condition.id, Notification::Applied(condition))
                }
            }
        };

        match &note {
            Notification::Applied(c) => debug!(
                target: "rules::conditions",
                entity = %self.entity,
                condition = %c.kind,
                id = %c.id,
                duration_type = %c.duration_type,
                remaining = c.remaining,
                "Condition applied"
            ),
            Notification::Modified(c) => debug!(
                target: "rules::conditions",
                entity = %self.entity,
                condition = %c.kind,
                id = %c.id,
                remaining = c.remaining,
                level = c.level,
                "Condition modified"
            ),
            _ => {}
        }
        self.notify(vec![note]);
        Ok(id)
    }

    /// Attaches a metadata entry to a live condition.
    pub fn set_metadata(
        &self,
        id: ConditionId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ConditionError> {
        let mut state = self.state();
        let condition = state
            .conditions
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ConditionError::NotFound(id))?;
        condition.metadata.insert(key.into(), value.into());
        Ok(())
    }

    /// Removes the condition with `id`.
    pub fn remove_condition(&self, id: ConditionId) -> Result<Condition, ConditionError> {
        let removed = {
            let mut state = self.state();
            let index = state
                .conditions
                .iter()
                .position(|c| c.id == id)
                .ok_or(ConditionError::NotFound(id))?;
            state.conditions.remove(index)
        };
        self.publish_removals(std::slice::from_ref(&removed), RemovalReason::Removed);
        Ok(removed)
    }

    /// Removes every live condition of `kind`.
    pub fn remove_condition_by_type(&self, kind: ConditionType) -> Vec<Condition> {
        let removed = self.state().take_where(|c| c.kind == kind);
        self.publish_removals(&removed, RemovalReason::Removed);
        removed
    }

    /// Snapshot of all live conditions in application order.
    pub fn get_conditions(&self) -> Vec<Condition> {
        self.state().conditions.clone()
    }

    pub fn has_condition(&self, kind: ConditionType) -> bool {
        self.state().conditions.iter().any(|c| c.kind == kind)
    }

    pub fn get_condition_by_type(&self, kind: ConditionType) -> Option<Condition> {
        self.state().conditions.iter().find(|c| c.kind == kind).cloned()
    }

    /// Current Exhaustion level, zero when not exhausted.
    pub fn exhaustion_level(&self) -> u8 {
        self.state()
            .conditions
            .iter()
            .find(|c| c.kind == ConditionType::Exhaustion)
            .map_or(0, |c| c.level)
    }

    pub fn len(&self) -> usize {
        self.state().conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().conditions.is_empty()
    }

    /// Start of the bearer's turn: counts down `Turns` conditions.
    pub fn process_turn_start(&self) -> Vec<Condition> {
        self.tick_clock(DurationType::Turns, false)
    }

    /// End of the bearer's round: counts down `Rounds` conditions.
    pub fn process_round_end(&self) -> Vec<Condition> {
        self.tick_clock(DurationType::Rounds, true)
    }

    /// End of the bearer's turn.
    ///
    /// `SaveEnds` conditions are removed when `save_results` reports a
    /// successful save for their type; `EndOfNextTurn` conditions always end.
    pub fn process_turn_end(&self, save_results: &HashMap<ConditionType, bool>) -> Vec<Condition> {
        let (saved, ended) = {
            let mut state = self.state();
            let saved = state.take_where(|c| {
                c.duration_type == DurationType::SaveEnds
                    && save_results.get(&c.kind).copied().unwrap_or(false)
            });
            let ended = state.take_where(|c| c.duration_type == DurationType::EndOfNextTurn);
            (saved, ended)
        };

        self.publish_removals(&saved, RemovalReason::Saved);
        self.publish_removals(&ended, RemovalReason::TurnEnded);
        saved.into_iter().chain(ended).collect()
    }

    /// Reacts to the bearer taking `amount` damage.
    ///
    /// Positive damage removes every `UntilDamaged` condition and requests a
    /// concentration check for a live Concentration condition. The check itself
    /// is resolved by whoever listens for [`EventType::OnConcentrationCheck`].
    pub fn process_damage(&self, amount: i32) -> Vec<Condition> {
        if amount <= 0 {
            return Vec::new();
        }

        let (removed, concentrating) = {
            let mut state = self.state();
            let removed = state.take_where(|c| c.duration_type == DurationType::UntilDamaged);
            let concentrating: Vec<_> = state
                .conditions
                .iter()
                .filter(|c| c.kind == ConditionType::Concentration)
                .cloned()
                .collect();
            (removed, concentrating)
        };

        self.publish_removals(&removed, RemovalReason::Damaged);

        let dc = self.config.concentration_dc(amount);
        let checks = concentrating
            .into_iter()
            .map(|condition| {
                debug!(
                    target: "rules::conditions",
                    entity = %self.entity,
                    damage = amount,
                    dc,
                    "Concentration check requested"
                );
                Notification::ConcentrationCheck {
                    condition,
                    amount,
                    dc,
                }
            })
            .collect();
        self.notify(checks);
        removed
    }

    /// Short rest: ends `UntilShortRest` conditions.
    pub fn process_short_rest(&self) -> Vec<Condition> {
        let removed = self
            .state()
            .take_where(|c| c.duration_type == DurationType::UntilShortRest);
        self.publish_removals(&removed, RemovalReason::Rested);
        removed
    }

    /// Long rest: ends rest-bound conditions and lowers Exhaustion by one level.
    pub fn process_long_rest(&self) -> Vec<Condition> {
        let removed = self.state().take_where(|c| {
            matches!(
                c.duration_type,
                DurationType::UntilShortRest | DurationType::UntilLongRest
            )
        });
        self.publish_removals(&removed, RemovalReason::Rested);
        self.reduce_exhaustion();
        removed
    }

    /// Lowers Exhaustion by one level, removing it at zero.
    ///
    /// Returns the new level, or `None` when the bearer was not exhausted.
    pub fn reduce_exhaustion(&self) -> Option<u8> {
        let note = {
            let mut state = self.state();
            let exhaustion = state.find_by_type_mut(ConditionType::Exhaustion)?;
            exhaustion.level = exhaustion.level.saturating_sub(1);
            if exhaustion.level == 0 {
                let recovered = state.take_where(|c| c.kind == ConditionType::Exhaustion);
                recovered
                    .into_iter()
                    .next()
                    .map(|c| Notification::Removed(c, RemovalReason::Recovered))
            } else {
                Some(Notification::Modified(exhaustion.clone()))
            }
        };

        let level = match &note {
            Some(Notification::Modified(c)) => c.level,
            _ => 0,
        };
        debug!(
            target: "rules::conditions",
            entity = %self.entity,
            level,
            "Exhaustion reduced"
        );
        self.notify(note.into_iter().collect());
        Some(level)
    }

    /// Ends the bearer's concentration, returning the removed condition.
    ///
    /// Subscribers see an `OnConditionRemoved` notification with reason
    /// `concentration_broken`.
    pub fn break_concentration(&self) -> Option<Condition> {
        let removed = self
            .state()
            .take_where(|c| c.kind == ConditionType::Concentration);
        self.publish_removals(&removed, RemovalReason::ConcentrationBroken);
        removed.into_iter().next()
    }

    /// Merges the standard effect of every live condition.
    pub fn get_active_effects(&self) -> Effect {
        let state = self.state();
        let effects: Vec<Effect> = state.conditions.iter().map(Condition::effect).collect();
        effects.iter().collect()
    }

    fn state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decrements counted conditions on `clock`, removing those already at zero.
    fn tick_clock(&self, clock: DurationType, advance_round: bool) -> Vec<Condition> {
        let expired = {
            let mut state = self.state();
            if advance_round {
                state.round += 1;
            }
            let expired = state.take_where(|c| c.duration_type == clock && c.remaining == 0);
            for condition in state
                .conditions
                .iter_mut()
                .filter(|c| c.duration_type == clock)
            {
                condition.remaining -= 1;
            }
            expired
        };

        self.publish_removals(&expired, RemovalReason::Expired);
        expired
    }

    fn publish_removals(&self, removed: &[Condition], reason: RemovalReason) {
        for condition in removed {
            debug!(
                target: "rules::conditions",
                entity = %self.entity,
                condition = %condition.kind,
                id = %condition.id,
                reason = %reason,
                "Condition removed"
            );
        }
        self.notify(
            removed
                .iter()
                .cloned()
                .map(|c| Notification::Removed(c, reason))
                .collect(),
        );
    }

    /// Publishes notifications. Must be called with the state mutex released.
    fn notify(&self, notes: Vec<Notification>) {
        if !self.config.notify_lifecycle || notes.is_empty() {
            return;
        }
        let Some(bus) = &self.bus else {
            return;
        };

        for note in notes {
            let mut event = note.into_event(self.entity);
            if let Err(error) = bus.emit(&mut event) {
                warn!(
                    target: "rules::conditions",
                    entity = %self.entity,
                    event_type = %event.kind(),
                    error = %error,
                    "Lifecycle notification failed, condition change stands"
                );
            }
        }
    }
}
