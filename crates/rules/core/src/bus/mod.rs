//! Prioritized, cancellable publish/subscribe dispatch for rule triggers.
//!
//! # Architecture
//!
//! - Listeners are registered per [`EventType`] and identified by the
//!   [`SubscriptionId`] handed back from `subscribe`
//! - On emission the bus snapshots the listener list, sorts the snapshot by
//!   priority (lower values run first) and invokes it on the calling thread
//! - A listener error aborts the dispatch; a cancelled event stops it quietly
//! - No lock is held while listener code runs, so listeners may subscribe,
//!   unsubscribe, or emit again from inside `handle_event`
//!
//! # Ordering
//!
//! Only distinct priorities are ordered. Listeners sharing a priority run in an
//! unspecified order relative to each other.

mod listener;
mod registry;

pub use listener::{FnListener, Listener};
pub use registry::EventBus;

use std::fmt;

use crate::error::{ErrorSeverity, ListenerError, RulesError};
use crate::event::{EventType, GameEvent};

/// Opaque handle identifying one registration on a bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Errors surfaced by [`Bus::emit`] and [`Bus::dispatch`].
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("cannot emit a missing event")]
    MissingEvent,

    #[error("listener `{listener}` failed while handling {event_type}")]
    Listener {
        event_type: EventType,
        listener: String,
        #[source]
        source: ListenerError,
    },
}

impl BusError {
    /// Event type whose dispatch was aborted, if any listener ran.
    pub fn event_type(&self) -> Option<EventType> {
        match self {
            Self::MissingEvent => None,
            Self::Listener { event_type, .. } => Some(*event_type),
        }
    }
}

impl RulesError for BusError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::MissingEvent => ErrorSeverity::Validation,
            Self::Listener { .. } => ErrorSeverity::Rule,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingEvent => "BUS_MISSING_EVENT",
            Self::Listener { .. } => "BUS_LISTENER_FAILED",
        }
    }
}

/// Surface exposed to rule code and to condition managers.
pub trait Bus: Send + Sync {
    /// Registers `listener` for `kind`. Registering the same listener twice
    /// produces two registrations and two invocations per emission.
    fn subscribe(&self, kind: EventType, listener: std::sync::Arc<dyn Listener>)
    -> SubscriptionId;

    /// Removes the registration identified by `id`.
    ///
    /// Returns false when no such registration exists for `kind`.
    fn unsubscribe(&self, kind: EventType, id: SubscriptionId) -> bool;

    /// Dispatches `event` to every listener registered for its type.
    fn emit(&self, event: &mut GameEvent) -> Result<(), BusError>;

    /// Removes every registration.
    fn clear(&self);

    /// Number of registrations for `kind`.
    fn listener_count(&self, kind: EventType) -> usize;

    /// Dispatches an optional event, rejecting `None` without invoking anything.
    fn dispatch(&self, event: Option<&mut GameEvent>) -> Result<(), BusError> {
        match event {
            Some(event) => self.emit(event),
            None => {
                tracing::warn!(target: "rules::bus", "Rejected dispatch of a missing event");
                Err(BusError::MissingEvent)
            }
        }
    }
}
