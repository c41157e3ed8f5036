//! Owner-side bookkeeping for registered modifiers.

use std::sync::Arc;

use tracing::debug;

use super::{DurationTicker, Modifier, ModifierListener};
use crate::bus::{Bus, SubscriptionId};
use crate::event::{EventType, GameEvent};

struct Entry {
    modifier: Arc<dyn Modifier>,
    subscriptions: Vec<(EventType, SubscriptionId)>,
}

/// Modifiers registered on a bus on behalf of one owner (usually a character).
///
/// `register` subscribes the modifier for the events it modifies and a
/// [`DurationTicker`] for the events its duration reacts to. `prune`
/// deregisters everything belonging to expired modifiers.
#[derive(Default)]
pub struct ModifierSet {
    entries: Vec<Entry>,
}

impl ModifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `modifier` to each of `kinds` and its duration ticker to the
    /// duration's triggers.
    pub fn register(&mut self, bus: &dyn Bus, modifier: Arc<dyn Modifier>, kinds: &[EventType]) {
        let listener = Arc::new(ModifierListener::new(Arc::clone(&modifier)));
        let mut subscriptions: Vec<_> = kinds
            .iter()
            .map(|&kind| (kind, bus.subscribe(kind, listener.clone())))
            .collect();

        let duration = modifier.duration().clone();
        let triggers = duration.triggers();
        if !triggers.is_empty() {
            let ticker = Arc::new(DurationTicker::new(
                format!("{}:duration", modifier.id()),
                duration,
            ));
            subscriptions.extend(
                triggers
                    .into_iter()
                    .map(|kind| (kind, bus.subscribe(kind, ticker.clone()))),
            );
        }

        debug!(
            target: "rules::modifier",
            modifier = modifier.id(),
            source = %modifier.source().kind,
            subscriptions = subscriptions.len(),
            "Modifier registered"
        );
        self.entries.push(Entry {
            modifier,
            subscriptions,
        });
    }

    /// Ticks every owned duration with `event`.
    ///
    /// For owners that drive clocks themselves instead of through the bus.
    pub fn tick(&self, event: &GameEvent) {
        for entry in &self.entries {
            entry.modifier.duration().tick(event);
        }
    }

    /// Deregisters and drops every expired modifier, returning them.
    pub fn prune(&mut self, bus: &dyn Bus) -> Vec<Arc<dyn Modifier>> {
        let (expired, live): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| entry.modifier.duration().is_expired());
        self.entries = live;

        expired
            .into_iter()
            .map(|entry| {
                Self::unsubscribe_entry(bus, &entry);
                debug!(
                    target: "rules::modifier",
                    modifier = entry.modifier.id(),
                    "Expired modifier deregistered"
                );
                entry.modifier
            })
            .collect()
    }

    /// Deregisters the modifier with `id`. Returns false if it is not owned here.
    pub fn remove(&mut self, bus: &dyn Bus, id: &str) -> bool {
        let Some(index) = self.entries.iter().position(|e| e.modifier.id() == id) else {
            return false;
        };
        let entry = self.entries.remove(index);
        Self::unsubscribe_entry(bus, &entry);
        true
    }

    /// Deregisters every owned modifier.
    pub fn clear(&mut self, bus: &dyn Bus) {
        for entry in self.entries.drain(..) {
            Self::unsubscribe_entry(bus, &entry);
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Modifier>> {
        self.entries
            .iter()
            .map(|e| &e.modifier)
            .find(|m| m.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Modifier>> {
        self.entries.iter().map(|e| &e.modifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn unsubscribe_entry(bus: &dyn Bus, entry: &Entry) {
        for &(kind, id) in &entry.subscriptions {
            bus.unsubscribe(kind, id);
        }
    }
}
