//! Registry + dispatcher implementation of [`Bus`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error, trace};

use super::{Bus, BusError, Listener, SubscriptionId};
use crate::event::{EventType, GameEvent};

struct Registration {
    id: SubscriptionId,
    listener: Arc<dyn Listener>,
}

type ListenerTable = HashMap<EventType, Vec<Registration>>;

/// In-process event bus.
///
/// The registry is guarded by a reader/writer lock. Registration takes the
/// write lock; emission takes the read lock only long enough to copy the
/// relevant listeners, then releases it before calling any of them.
///
/// Cloning the bus yields another handle to the same registry.
pub struct EventBus {
    listeners: Arc<RwLock<ListenerTable>>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Total number of registrations across all event types.
    pub fn total_listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }

    /// Copies the listeners for `kind` and sorts the copy by priority.
    ///
    /// The read lock is dropped before this returns.
    fn snapshot(&self, kind: EventType) -> Vec<Arc<dyn Listener>> {
        let mut snapshot: Vec<Arc<dyn Listener>> = {
            let table = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
            table
                .get(&kind)
                .map(|regs| regs.iter().map(|r| Arc::clone(&r.listener)).collect())
                .unwrap_or_default()
        };
        snapshot.sort_by_key(|listener| listener.priority());
        snapshot
    }
}

impl Bus for EventBus {
    fn subscribe(&self, kind: EventType, listener: Arc<dyn Listener>) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(
            target: "rules::bus",
            event_type = %kind,
            listener = listener.name(),
            priority = listener.priority(),
            subscription = %id,
            "Listener subscribed"
        );

        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(Registration { id, listener });
        id
    }

    fn unsubscribe(&self, kind: EventType, id: SubscriptionId) -> bool {
        let mut table = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let Some(regs) = table.get_mut(&kind) else {
            return false;
        };
        let Some(index) = regs.iter().position(|r| r.id == id) else {
            return false;
        };

        let removed = regs.remove(index);
        if regs.is_empty() {
            table.remove(&kind);
        }
        debug!(
            target: "rules::bus",
            event_type = %kind,
            listener = removed.listener.name(),
            subscription = %id,
            "Listener unsubscribed"
        );
        true
    }

    fn emit(&self, event: &mut GameEvent) -> Result<(), BusError> {
        let kind = event.kind();
        let listeners = self.snapshot(kind);
        if listeners.is_empty() {
            trace!(target: "rules::bus", event_type = %kind, "No listeners for event");
            return Ok(());
        }

        for listener in listeners {
            trace!(
                target: "rules::bus",
                event_type = %kind,
                listener = listener.name(),
                priority = listener.priority(),
                "Invoking listener"
            );

            if let Err(source) = listener.handle_event(event) {
                error!(
                    target: "rules::bus",
                    event_type = %kind,
                    listener = listener.name(),
                    error = %source,
                    "Listener failed, aborting dispatch"
                );
                return Err(BusError::Listener {
                    event_type: kind,
                    listener: listener.name().to_owned(),
                    source,
                });
            }

            if event.is_cancelled() {
                debug!(
                    target: "rules::bus",
                    event_type = %kind,
                    listener = listener.name(),
                    "Event cancelled, skipping remaining listeners"
                );
                return Ok(());
            }
        }

        Ok(())
    }

    fn clear(&self) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!(target: "rules::bus", "All listeners cleared");
    }

    fn listener_count(&self, kind: EventType) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            listeners: Arc::clone(&self.listeners),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::bus::FnListener;
    use crate::error::ListenerError;

    fn recorder(
        log: &Arc<Mutex<Vec<&'static str>>>,
        name: &'static str,
        priority: i32,
    ) -> Arc<dyn Listener> {
        let log = Arc::clone(log);
        Arc::new(FnListener::new(name, priority, move |_event: &mut GameEvent| {
            log.lock().unwrap().push(name);
            Ok(())
        }))
    }

    #[test]
    fn emits_in_ascending_priority_regardless_of_subscription_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(EventType::OnAttackRoll, recorder(&log, "equipment", 300));
        bus.subscribe(EventType::OnAttackRoll, recorder(&log, "pre", 0));
        bus.subscribe(EventType::OnAttackRoll, recorder(&log, "caps", 500));
        bus.subscribe(EventType::OnAttackRoll, recorder(&log, "feature", 100));

        let mut event = GameEvent::new(EventType::OnAttackRoll);
        bus.emit(&mut event).unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["pre", "feature", "equipment", "caps"]
        );
    }

    #[test]
    fn emit_without_listeners_is_ok() {
        let bus = EventBus::new();
        let mut event = GameEvent::new(EventType::OnLongRest);
        assert!(bus.emit(&mut event).is_ok());
    }

    #[test]
    fn dispatch_rejects_missing_event() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(EventType::OnAttackRoll, recorder(&log, "any", 0));

        let err = bus.dispatch(None).unwrap_err();
        assert!(matches!(err, BusError::MissingEvent));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn cancellation_stops_later_listeners() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(EventType::BeforeAttackRoll, recorder(&log, "first", 10));
        bus.subscribe(
            EventType::BeforeAttackRoll,
            Arc::new(FnListener::new("canceller", 20, |event: &mut GameEvent| {
                event.cancel();
                Ok(())
            })),
        );
        bus.subscribe(EventType::BeforeAttackRoll, recorder(&log, "late", 30));

        let mut event = GameEvent::new(EventType::BeforeAttackRoll);
        assert!(bus.emit(&mut event).is_ok());
        assert!(event.is_cancelled());
        assert_eq!(*log.lock().unwrap(), vec!["first"]);
    }

    #[test]
    fn listener_error_aborts_and_names_event_type() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(
            EventType::OnDamageRoll,
            Arc::new(FnListener::new("broken", 10, |event: &mut GameEvent| {
                event.set(crate::ContextKey::Damage, 99);
                Err::<(), ListenerError>("out of charges".into())
            })),
        );
        bus.subscribe(EventType::OnDamageRoll, recorder(&log, "late", 20));

        let mut event = GameEvent::new(EventType::OnDamageRoll);
        let err = bus.emit(&mut event).unwrap_err();

        assert_eq!(err.event_type(), Some(EventType::OnDamageRoll));
        assert!(err.to_string().contains("on_damage_roll"));
        assert!(log.lock().unwrap().is_empty());
        // Mutations made before the failure are kept.
        assert_eq!(event.get_int(crate::ContextKey::Damage), Some(99));
    }

    #[test]
    fn unsubscribe_removes_exactly_one_registration() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let listener = recorder(&log, "dup", 0);
        let first = bus.subscribe(EventType::OnTurnStart, Arc::clone(&listener));
        bus.subscribe(EventType::OnTurnStart, listener);
        assert_eq!(bus.listener_count(EventType::OnTurnStart), 2);

        assert!(bus.unsubscribe(EventType::OnTurnStart, first));
        assert_eq!(bus.listener_count(EventType::OnTurnStart), 1);
        assert!(!bus.unsubscribe(EventType::OnTurnStart, first));

        let mut event = GameEvent::new(EventType::OnTurnStart);
        bus.emit(&mut event).unwrap();
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn unsubscribe_with_wrong_type_is_noop() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let id = bus.subscribe(EventType::OnTurnStart, recorder(&log, "a", 0));
        assert!(!bus.unsubscribe(EventType::OnTurnEnd, id));
        assert_eq!(bus.listener_count(EventType::OnTurnStart), 1);
    }

    #[test]
    fn clear_and_counts() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(EventType::OnTurnStart, recorder(&log, "a", 0));
        bus.subscribe(EventType::OnTurnEnd, recorder(&log, "b", 0));
        bus.subscribe(EventType::OnTurnEnd, recorder(&log, "c", 0));
        assert_eq!(bus.total_listener_count(), 3);
        assert_eq!(bus.listener_count(EventType::OnTurnEnd), 2);

        bus.clear();
        assert_eq!(bus.total_listener_count(), 0);
        assert_eq!(bus.listener_count(EventType::OnRoundEnd), 0);
    }

    #[test]
    fn listeners_may_reenter_the_bus() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let inner_bus = bus.clone();
        let inner_log = Arc::clone(&log);
        bus.subscribe(
            EventType::OnTurnEnd,
            Arc::new(FnListener::new("reentrant", 0, move |_event: &mut GameEvent| {
                inner_bus.subscribe(EventType::OnRoundEnd, recorder(&inner_log, "late-sub", 0));
                let mut nested = GameEvent::new(EventType::OnRoundEnd);
                inner_bus.emit(&mut nested)?;
                Ok(())
            })),
        );

        let mut event = GameEvent::new(EventType::OnTurnEnd);
        bus.emit(&mut event).unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["late-sub"]);
    }

    #[test]
    fn concurrent_subscribe_emit_unsubscribe() {
        const THREADS: usize = 8;
        const ITERATIONS: usize = 200;

        let bus = EventBus::new();
        let hits = Arc::new(AtomicU64::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let bus = bus.clone();
                let hits = Arc::clone(&hits);
                std::thread::spawn(move || {
                    (0..ITERATIONS).all(|_| {
                        let counter = Arc::clone(&hits);
                        let id = bus.subscribe(
                            EventType::OnAttackRoll,
                            Arc::new(FnListener::new("counter", 0, move |_event: &mut GameEvent| {
                                counter.fetch_add(1, Ordering::Relaxed);
                                Ok(())
                            })),
                        );
                        let mut event = GameEvent::new(EventType::OnAttackRoll);
                        bus.emit(&mut event).unwrap();
                        bus.unsubscribe(EventType::OnAttackRoll, id)
                    })
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap(), "every unsubscribe finds its registration");
        }
        assert_eq!(bus.total_listener_count(), 0);
        // Each emission sees at least the listener its own thread registered.
        assert!(hits.load(Ordering::Relaxed) >= (THREADS * ITERATIONS) as u64);
    }
}
