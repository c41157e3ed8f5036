use std::fmt;

use crate::error::ListenerError;
use crate::event::GameEvent;

/// Handler invoked by the bus for the event types it is subscribed to.
///
/// # Execution Order
///
/// Listeners are sorted by priority (lower values execute first). See
/// [`crate::modifier::priority`] for the conventional bands.
pub trait Listener: Send + Sync {
    /// Reacts to `event`, possibly mutating its context or cancelling it.
    ///
    /// Returning an error aborts the dispatch: no later listener runs and the
    /// error reaches the emitter.
    fn handle_event(&self, event: &mut GameEvent) -> Result<(), ListenerError>;

    /// Ordering key within one dispatch.
    fn priority(&self) -> i32;

    /// Human-readable name used in logs and error messages.
    fn name(&self) -> &str {
        "listener"
    }
}

/// Listener backed by a closure.
///
/// ```
/// # use std::sync::Arc;
/// # use rules_core::{Bus, ContextKey, EventBus, EventType, FnListener, GameEvent};
/// let bus = EventBus::new();
/// bus.subscribe(
///     EventType::OnDamageRoll,
///     Arc::new(FnListener::new("flat +1", 150, |event: &mut GameEvent| {
///         event.add_int(ContextKey::Damage, 1);
///         Ok(())
///     })),
/// );
///
/// let mut event = GameEvent::new(EventType::OnDamageRoll).with(ContextKey::Damage, 4);
/// bus.emit(&mut event).unwrap();
/// assert_eq!(event.get_int(ContextKey::Damage), Some(5));
/// ```
pub struct FnListener<F> {
    name: String,
    priority: i32,
    handler: F,
}

impl<F> FnListener<F>
where
    F: Fn(&mut GameEvent) -> Result<(), ListenerError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, priority: i32, handler: F) -> Self {
        Self {
            name: name.into(),
            priority,
            handler,
        }
    }
}

impl<F> Listener for FnListener<F>
where
    F: Fn(&mut GameEvent) -> Result<(), ListenerError> + Send + Sync,
{
    fn handle_event(&self, event: &mut GameEvent) -> Result<(), ListenerError> {
        (self.handler)(event)
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> fmt::Debug for FnListener<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnListener")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}
