//! The mutable value object that flows through one dispatch.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{ContextKey, ContextValue, EventType};
use crate::entity::EntityId;
use crate::modifier::Modifier;

/// Context for a single rule trigger.
///
/// A `GameEvent` is built by the code performing a game action, handed to
/// [`Bus::emit`](crate::bus::Bus::emit), mutated by listeners in priority order,
/// and read back by the caller once dispatch returns. It is not shared between
/// threads while in flight.
///
/// # Context contract
///
/// Entries are only added or overwritten during dispatch. Typed getters return
/// `None` both when a key is absent and when it holds a value of another type;
/// callers must treat those two cases the same.
///
/// # Example
///
/// ```
/// # use rules_core::{ContextKey, EntityId, EventType, GameEvent};
/// let mut event = GameEvent::new(EventType::OnDamageRoll)
///     .with_actor(EntityId(1))
///     .with_target(EntityId(2))
///     .with(ContextKey::Damage, 8)
///     .with(ContextKey::Melee, true);
///
/// event.add_int(ContextKey::Damage, 2);
/// assert_eq!(event.get_int(ContextKey::Damage), Some(10));
/// assert_eq!(event.get_bool(ContextKey::Damage), None);
/// ```
#[derive(Clone)]
pub struct GameEvent {
    kind: EventType,
    actor: Option<EntityId>,
    target: Option<EntityId>,
    context: BTreeMap<ContextKey, ContextValue>,
    modifiers: Vec<Arc<dyn Modifier>>,
    cancelled: bool,
}

impl GameEvent {
    /// Creates an event with no actor, target, or context.
    pub fn new(kind: EventType) -> Self {
        Self {
            kind,
            actor: None,
            target: None,
            context: BTreeMap::new(),
            modifiers: Vec::new(),
            cancelled: false,
        }
    }

    /// Sets the acting entity (builder pattern).
    #[must_use]
    pub fn with_actor(mut self, actor: EntityId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Sets the targeted entity (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    /// Adds a context entry (builder pattern).
    #[must_use]
    pub fn with(mut self, key: ContextKey, value: impl Into<ContextValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn kind(&self) -> EventType {
        self.kind
    }

    pub fn actor(&self) -> Option<EntityId> {
        self.actor
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Inserts or overwrites a context entry.
    pub fn set(&mut self, key: ContextKey, value: impl Into<ContextValue>) {
        self.context.insert(key, value.into());
    }

    /// Returns the raw value stored under `key`.
    pub fn get(&self, key: ContextKey) -> Option<&ContextValue> {
        self.context.get(&key)
    }

    pub fn get_int(&self, key: ContextKey) -> Option<i32> {
        self.get(key).and_then(ContextValue::as_int)
    }

    pub fn get_string(&self, key: ContextKey) -> Option<&str> {
        self.get(key).and_then(ContextValue::as_str)
    }

    pub fn get_bool(&self, key: ContextKey) -> Option<bool> {
        self.get(key).and_then(ContextValue::as_bool)
    }

    /// Reads a boolean flag, treating absence (or a non-bool value) as `false`.
    pub fn flag(&self, key: ContextKey) -> bool {
        self.get_bool(key).unwrap_or(false)
    }

    pub fn contains(&self, key: ContextKey) -> bool {
        self.context.contains_key(&key)
    }

    /// Adds `delta` to an integer entry and returns the new value.
    ///
    /// An absent entry, or one holding another type, is treated as zero and
    /// overwritten.
    pub fn add_int(&mut self, key: ContextKey, delta: i32) -> i32 {
        let value = self.get_int(key).unwrap_or(0).saturating_add(delta);
        self.set(key, value);
        value
    }

    /// Iterates over all context entries in key order.
    pub fn context(&self) -> impl Iterator<Item = (&ContextKey, &ContextValue)> {
        self.context.iter()
    }

    /// Marks the event cancelled. Idempotent; there is no way to undo it.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Records a modifier that applied itself to this event.
    pub fn add_modifier(&mut self, modifier: Arc<dyn Modifier>) {
        self.modifiers.push(modifier);
    }

    /// Modifiers applied so far, in application order.
    pub fn modifiers(&self) -> &[Arc<dyn Modifier>] {
        &self.modifiers
    }
}

impl fmt::Debug for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameEvent")
            .field("kind", &self.kind)
            .field("actor", &self.actor)
            .field("target", &self.target)
            .field("context", &self.context)
            .field(
                "modifiers",
                &self.modifiers.iter().map(|m| m.id()).collect::<Vec<_>>(),
            )
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_hide_type_mismatch() {
        let event = GameEvent::new(EventType::OnAttackRoll)
            .with(ContextKey::AttackRoll, 17)
            .with(ContextKey::DamageType, "fire");

        assert_eq!(event.get_int(ContextKey::AttackRoll), Some(17));
        assert_eq!(event.get_string(ContextKey::AttackRoll), None);
        assert_eq!(event.get_bool(ContextKey::AttackRoll), None);
        assert_eq!(event.get_string(ContextKey::DamageType), Some("fire"));
        assert_eq!(event.get_int(ContextKey::Damage), None);
    }

    #[test]
    fn set_overwrites_existing_entry() {
        let mut event = GameEvent::new(EventType::OnDamageRoll).with(ContextKey::Damage, 4);
        event.set(ContextKey::Damage, "lots");
        assert_eq!(event.get_int(ContextKey::Damage), None);
        assert_eq!(event.get_string(ContextKey::Damage), Some("lots"));
    }

    #[test]
    fn add_int_treats_absent_as_zero() {
        let mut event = GameEvent::new(EventType::OnDamageRoll);
        assert_eq!(event.add_int(ContextKey::Damage, 3), 3);
        assert_eq!(event.add_int(ContextKey::Damage, -1), 2);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut event = GameEvent::new(EventType::BeforeAttackRoll);
        assert!(!event.is_cancelled());
        event.cancel();
        event.cancel();
        assert!(event.is_cancelled());
    }

    #[test]
    fn custom_keys_are_distinct() {
        let event = GameEvent::new(EventType::OnTurnStart)
            .with(ContextKey::Custom("ki"), 3)
            .with(ContextKey::Custom("rage"), true);
        assert_eq!(event.get_int(ContextKey::Custom("ki")), Some(3));
        assert!(event.flag(ContextKey::Custom("rage")));
        assert!(!event.flag(ContextKey::Custom("bardic")));
    }
}
