//! Event-driven tabletop rules engine core.
//!
//! `rules-core` holds the machinery every rule fragment builds on: a
//! prioritized, cancellable [`EventBus`], the mutable [`GameEvent`] record that
//! flows through it, the [`Modifier`]/[`Duration`] framework for bounded-lifetime
//! effects, and the per-entity [`ConditionManager`] with its merged [`Effect`]
//! view. Concrete class features live in `rules-content`.
//!
//! A rule fragment reacts to events by subscribing a [`Listener`]:
//!
//! ```
//! use std::sync::Arc;
//! use rules_core::{Bus, ContextKey, EventBus, EventType, FnListener, GameEvent};
//!
//! let bus = EventBus::new();
//! bus.subscribe(
//!     EventType::OnDamageRoll,
//!     Arc::new(FnListener::new("great weapon", 100, |event: &mut GameEvent| {
//!         event.add_int(ContextKey::Damage, 2);
//!         Ok(())
//!     })),
//! );
//!
//! let mut event = GameEvent::new(EventType::OnDamageRoll).with(ContextKey::Damage, 8);
//! bus.emit(&mut event).unwrap();
//! assert_eq!(event.get_int(ContextKey::Damage), Some(10));
//! ```
pub mod bus;
pub mod condition;
pub mod config;
pub mod dice;
pub mod duration;
pub mod entity;
pub mod error;
pub mod event;
pub mod modifier;
pub mod types;

pub use bus::{Bus, BusError, EventBus, FnListener, Listener, SubscriptionId};
pub use condition::{
    Condition, ConditionError, ConditionId, ConditionManager, ConditionType, DurationType,
    Effect, EffectFlags, RemovalReason,
};
pub use config::RulesConfig;
pub use dice::{DiceError, DiceRoller, FixedDice, SeededDice};
pub use duration::{
    ConcentrationDuration, Duration, DurationHandle, Permanent, RoundsDuration, UntilDamaged,
    UntilEvent,
};
pub use entity::EntityId;
pub use error::{ErrorSeverity, ListenerError, RulesError};
pub use event::{ContextKey, ContextValue, EventType, GameEvent};
pub use modifier::{
    DurationTicker, Modifier, ModifierListener, ModifierSet, ModifierSource, PriorityBand,
    SourceKind,
};
pub use types::{DamageType, SaveTarget};
