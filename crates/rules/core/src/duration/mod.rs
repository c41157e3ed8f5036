//! Expiry policies for temporary effects.
//!
//! A [`Duration`] is a small state machine: the owner feeds it events through
//! [`Duration::tick`] and polls [`Duration::is_expired`]. Each policy reacts only
//! to the event types it reports from [`Duration::triggers`]; every other event
//! is a no-op.
//!
//! | Policy | Expires when |
//! |---|---|
//! | [`Permanent`] | never |
//! | [`RoundsDuration`] | N matching clock ticks elapse (optionally restarted by an interrupt) |
//! | [`UntilEvent`] | first occurrence of an event type, then stays expired |
//! | [`UntilDamaged`] | first damage taken with amount > 0 |
//! | [`ConcentrationDuration`] | base expires or concentration is broken |

mod concentration;
mod rounds;
mod until;

pub use concentration::ConcentrationDuration;
pub use rounds::RoundsDuration;
pub use until::{UntilDamaged, UntilEvent};

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::event::{EventType, GameEvent};

/// Stateful expiry policy.
pub trait Duration: Send + Sync + fmt::Debug {
    /// Advances or reacts to `event`.
    fn tick(&mut self, event: &GameEvent);

    /// Returns true once the effect should end.
    fn is_expired(&self) -> bool;

    /// Event types this policy reacts to.
    fn triggers(&self) -> Vec<EventType>;

    /// Signals that the concentration holding this effect was broken.
    ///
    /// Only concentration-based policies react; the default does nothing.
    fn break_concentration(&mut self) {}
}

/// Never expires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Permanent;

impl Duration for Permanent {
    fn tick(&mut self, _event: &GameEvent) {}

    fn is_expired(&self) -> bool {
        false
    }

    fn triggers(&self) -> Vec<EventType> {
        Vec::new()
    }
}

/// Shared handle to a duration.
///
/// A modifier and its owner both hold the handle: the owner ticks it and
/// polls it, the modifier's listener adapter checks it before applying.
#[derive(Clone)]
pub struct DurationHandle(Arc<Mutex<Box<dyn Duration>>>);

impl DurationHandle {
    pub fn new(duration: impl Duration + 'static) -> Self {
        Self(Arc::new(Mutex::new(Box::new(duration))))
    }

    /// Handle to a [`Permanent`] duration.
    pub fn permanent() -> Self {
        Self::new(Permanent)
    }

    pub fn tick(&self, event: &GameEvent) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tick(event);
    }

    pub fn is_expired(&self) -> bool {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_expired()
    }

    pub fn triggers(&self) -> Vec<EventType> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .triggers()
    }

    pub fn break_concentration(&self) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .break_concentration();
    }
}

impl fmt::Debug for DurationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_tuple("DurationHandle").field(&*inner).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_ignores_everything() {
        let handle = DurationHandle::permanent();
        for kind in [EventType::OnRoundEnd, EventType::OnTakeDamage, EventType::OnLongRest] {
            handle.tick(&GameEvent::new(kind));
        }
        handle.break_concentration();
        assert!(!handle.is_expired());
        assert!(handle.triggers().is_empty());
    }

    #[test]
    fn clones_share_state() {
        let handle = DurationHandle::new(RoundsDuration::rounds(1));
        let observer = handle.clone();
        handle.tick(&GameEvent::new(EventType::OnRoundEnd));
        assert!(observer.is_expired());
    }
}
